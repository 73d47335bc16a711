pub mod fields;
pub mod prompt;
pub mod throttle;
pub mod validate;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::leads::dedup;
use crate::leads::types::{
    Attribution, DedupKey, LeadRecord, Operation, PropertyType, StoreEntry, UpsertOutcome,
    Urgency,
};
use crate::leads::LeadStore;

use fields::{FieldKey, FIELD_COUNT};
use validate::FieldValue;

pub const ACCEPTED_ACK: &str = "✅ Entendi!";

pub const COMPLETED_MESSAGE: &str = "Perfeito! Lead completo e salvo.\n\n\
     Em breve nossa equipe entrará em contato. \
     Se quiser, pode me contar mais preferências (bairro, vagas, pet-friendly etc.).";

/// Reply to anything said after the funnel is complete.
pub const THANK_YOU: &str = "Obrigada! Se quiser, posso anotar mais preferências (bairro, vagas, pet-friendly, \
     condomínio, lazer). Também posso encaminhar seu contato para um corretor agora.";

pub fn welcome_message(company: &str, blurb: &str) -> String {
    format!(
        "Oi! Sou a **Ayla**, da **{}**. {}\n\n\
         Posso te ajudar a encontrar o seu imóvel dos sonhos, que cabe no seu bolso. Vamos começar?",
        company, blurb
    )
}

/// Per-conversation funnel progress. Only [`FunnelEngine::submit`] moves it
/// forward; a new conversation gets a new state.
///
/// `answers` holds exactly the fields whose position is below `current_step`.
#[derive(Debug, Clone)]
pub struct FunnelState {
    session_id: String,
    created_at: DateTime<Utc>,
    current_step: usize,
    answers: BTreeMap<FieldKey, FieldValue>,
    origin: String,
    attribution: Attribution,
}

impl FunnelState {
    pub fn new(origin: &str, attribution: Attribution) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            current_step: 0,
            answers: BTreeMap::new(),
            origin: origin.to_string(),
            attribution,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 0..=9; 9 means completed.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current_field(&self) -> Option<FieldKey> {
        FieldKey::at(self.current_step)
    }

    pub fn is_completed(&self) -> bool {
        self.current_step >= FIELD_COUNT
    }

    pub fn answers(&self) -> &BTreeMap<FieldKey, FieldValue> {
        &self.answers
    }
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Answer failed validation; nothing changed.
    Rejected {
        field: FieldKey,
        error: &'static str,
        re_prompt: &'static str,
    },
    /// Answer stored, funnel moved to `next_field`.
    Accepted {
        next_field: FieldKey,
        next_prompt: &'static str,
    },
    /// Last answer stored and the lead persisted.
    Finalized {
        lead: LeadRecord,
        dedup_key: DedupKey,
        store: UpsertOutcome,
    },
    /// Funnel already complete; the message was ignored.
    Acknowledged { message: &'static str },
}

pub struct FunnelEngine {
    store: Arc<LeadStore>,
}

impl FunnelEngine {
    pub fn new(store: Arc<LeadStore>) -> Self {
        Self { store }
    }

    pub fn current_prompt(&self, state: &FunnelState) -> &'static str {
        match state.current_field() {
            Some(field) => field.prompt(),
            None => THANK_YOU,
        }
    }

    /// Feed one raw answer into the funnel.
    ///
    /// Errors only when the completed lead could not be written anywhere; the
    /// state is then left on the last field so the answer can be resent.
    pub fn submit(&self, state: &mut FunnelState, raw: &str) -> Result<Outcome> {
        let Some(field) = state.current_field() else {
            return Ok(Outcome::Acknowledged { message: THANK_YOU });
        };

        if !validate::validate(field, raw) {
            debug!(session = %state.session_id, field = %field, "answer rejected");
            return Ok(Outcome::Rejected {
                field,
                error: field.error_message(),
                re_prompt: field.prompt(),
            });
        }

        let value = validate::normalize(field, raw);
        let next_step = state.current_step + 1;

        let Some(next_field) = FieldKey::at(next_step) else {
            let mut answers = state.answers.clone();
            answers.insert(field, value);
            let (lead, dedup_key, store) = self.finalize(state, &answers)?;
            state.answers = answers;
            state.current_step = next_step;
            return Ok(Outcome::Finalized {
                lead,
                dedup_key,
                store,
            });
        };

        state.answers.insert(field, value);
        state.current_step = next_step;
        debug!(session = %state.session_id, field = %field, step = next_step, "answer accepted");
        Ok(Outcome::Accepted {
            next_field,
            next_prompt: next_field.prompt(),
        })
    }

    fn finalize(
        &self,
        state: &FunnelState,
        answers: &BTreeMap<FieldKey, FieldValue>,
    ) -> Result<(LeadRecord, DedupKey, UpsertOutcome)> {
        let lead = assemble_lead(answers)?;
        let dedup_key = dedup::dedup_key(&lead.phone, &lead.email);
        let entry = StoreEntry {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339(),
            origin: state.origin.clone(),
            attribution: state.attribution.clone(),
            dedup_key: dedup_key.clone(),
            lead: lead.clone(),
        };
        let outcome = self
            .store
            .upsert(&entry)
            .with_context(|| format!("Failed to persist lead for session {}", state.session_id))?;
        info!(
            session = %state.session_id,
            dedup_key = %dedup_key,
            status = outcome.status.as_str(),
            location = ?outcome.location,
            store = %outcome.file_name,
            "lead finalized"
        );
        Ok((lead, dedup_key, outcome))
    }
}

/// Build the typed record from a complete answer map.
pub fn assemble_lead(answers: &BTreeMap<FieldKey, FieldValue>) -> Result<LeadRecord> {
    let text = |field: FieldKey| -> Result<String> {
        answers
            .get(&field)
            .map(|v| v.to_string())
            .with_context(|| format!("missing answer for {}", field))
    };
    let number = |field: FieldKey| -> Result<u64> {
        answers
            .get(&field)
            .and_then(FieldValue::as_number)
            .with_context(|| format!("missing numeric answer for {}", field))
    };

    let operation = Operation::parse(&text(FieldKey::Operation)?)
        .context("unrecognized operacao")?;
    let property_type = PropertyType::parse(&text(FieldKey::PropertyType)?)
        .context("unrecognized tipo_imovel")?;
    let urgency = Urgency::parse(&text(FieldKey::Urgency)?).context("unrecognized urgencia")?;

    Ok(LeadRecord {
        name: text(FieldKey::Name)?,
        phone: text(FieldKey::Phone)?,
        email: text(FieldKey::Email)?,
        operation,
        property_type,
        area: number(FieldKey::Area)?,
        bedrooms: number(FieldKey::Bedrooms)?,
        price_range: text(FieldKey::PriceRange)?,
        urgency,
    })
}
