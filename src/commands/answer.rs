use anyhow::Context as _;
use tracing::{debug, error, info};

use super::say_private;
use crate::funnel::{Outcome, ACCEPTED_ACK, COMPLETED_MESSAGE};
use crate::leads::types::StoreStatus;
use crate::state::Context;

const NO_SESSION: &str = "Ainda não começamos! Use `/ayla iniciar` para abrir seu atendimento.";

const PERSIST_FAILED: &str = "⚠️ Não consegui salvar seus dados agora. \
     Por favor, envie sua última resposta novamente em instantes.";

/// Responder à pergunta atual
#[poise::command(slash_command, rename = "responder")]
pub async fn answer(
    ctx: Context<'_>,
    #[description = "Sua resposta"] texto: String,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    let Some(handle) = ctx.data().session(user_id).await else {
        return say_private(&ctx, NO_SESSION).await;
    };

    // Throttle wait and store I/O can outlast the interaction deadline
    ctx.defer_ephemeral().await?;

    let min_interval = ctx.data().funnel_config.read().await.min_interval;
    let mut session = handle.lock().await;
    session.throttle.pace(min_interval).await;

    let engine = ctx.data().engine.clone();
    let mut funnel = session.funnel.clone();
    let (funnel, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = engine.submit(&mut funnel, &texto);
        (funnel, outcome)
    })
    .await
    .context("spawn_blocking join failed")?;
    let session_id = funnel.session_id().to_string();
    session.funnel = funnel;
    drop(session);

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(session = %session_id, "lead persistence failed: {:#}", e);
            return say_private(&ctx, PERSIST_FAILED).await;
        }
    };

    let reply = match outcome {
        Outcome::Rejected {
            field,
            error,
            re_prompt,
        } => {
            debug!(session = %session_id, field = %field, "re-prompting");
            let prompt = ctx.data().render_prompt(re_prompt).await;
            format!("⚠️ {}\n\n{}", error, prompt)
        }
        Outcome::Accepted {
            next_field,
            next_prompt,
        } => {
            debug!(session = %session_id, next = %next_field, "moving on");
            let prompt = ctx.data().render_prompt(next_prompt).await;
            format!("{}\n\n{}", ACCEPTED_ACK, prompt)
        }
        Outcome::Finalized {
            lead,
            dedup_key,
            store,
        } => {
            info!(
                user = ctx.author().name,
                session = %session_id,
                operation = lead.operation.as_str(),
                status = store.status.as_str(),
                "lead captured"
            );
            format!(
                "{}\n\n{}\n\n_{} Protocolo `{}`._",
                ACCEPTED_ACK,
                COMPLETED_MESSAGE,
                status_line(store.status),
                &dedup_key[..12]
            )
        }
        Outcome::Acknowledged { message } => message.to_string(),
    };

    say_private(&ctx, reply).await
}

fn status_line(status: StoreStatus) -> &'static str {
    match status {
        StoreStatus::Created => "Cadastro criado.",
        StoreStatus::Updated => "Cadastro atualizado.",
        StoreStatus::AppendedFallback => "Cadastro salvo em modo de contingência.",
    }
}
