use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::funnel::prompt::PromptRenderer;
use crate::funnel::throttle::{Throttle, MIN_SUBMIT_INTERVAL};
use crate::funnel::{FunnelEngine, FunnelState};
use crate::leads::LeadStore;

/// Funnel knobs admins can change at runtime.
pub struct FunnelConfig {
    /// Reword prompts through the LLM before showing them.
    pub paraphrase: bool,
    pub min_interval: Duration,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            paraphrase: false,
            min_interval: MIN_SUBMIT_INTERVAL,
        }
    }
}

/// Storefront text shown in the welcome message.
pub struct Branding {
    pub company_name: String,
    pub company_blurb: String,
}

impl Branding {
    pub fn from_env() -> Self {
        Self {
            company_name: dotenv::var("COMPANY_NAME")
                .unwrap_or_else(|_| "Imobiliária XYZ".to_string()),
            company_blurb: dotenv::var("COMPANY_BLURB")
                .unwrap_or_else(|_| "A melhor escolha para sua casa nova!".to_string()),
        }
    }
}

/// One user's conversation: funnel progress plus submission pacing.
pub struct Session {
    pub funnel: FunnelState,
    pub throttle: Throttle,
}

impl Session {
    pub fn new(funnel: FunnelState) -> Self {
        Self {
            funnel,
            throttle: Throttle::new(),
        }
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

pub struct AppState {
    pub store: Arc<LeadStore>,
    pub engine: Arc<FunnelEngine>,
    pub renderer: PromptRenderer,
    pub branding: Branding,
    pub admin_ids: HashSet<u64>,
    pub funnel_config: Arc<RwLock<FunnelConfig>>,
    /// Keyed by Discord user id.
    pub sessions: RwLock<HashMap<u64, SessionHandle>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Replace the user's session with a fresh one.
    pub async fn start_session(&self, user_id: u64, funnel: FunnelState) -> SessionHandle {
        let handle = Arc::new(Mutex::new(Session::new(funnel)));
        self.sessions.write().await.insert(user_id, handle.clone());
        handle
    }

    pub async fn session(&self, user_id: u64) -> Option<SessionHandle> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    /// Canonical or paraphrased text for a prompt, per current config.
    pub async fn render_prompt(&self, canonical: &str) -> String {
        let enabled = self.funnel_config.read().await.paraphrase;
        self.renderer.render(canonical, enabled).await
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
