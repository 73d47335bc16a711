mod commands;
mod funnel;
mod leads;
mod llm;
mod state;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tokio::sync::RwLock;
use tracing::{error, info, warn, Level};

use funnel::prompt::{Paraphraser, PromptRenderer};
use funnel::FunnelEngine;
use leads::LeadStore;
use llm::LlmClient;
use state::{AppState, Branding, FunnelConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let token = dotenv::var("DISCORD_TOKEN").expect("DISCORD_TOKEN required");
    let guild_id: Option<serenity::GuildId> = dotenv::var("DISCORD_GUILD_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::GuildId::new);

    // Init lead storage
    let leads_dir =
        std::path::PathBuf::from(dotenv::var("LEADS_DIR").unwrap_or_else(|_| ".".to_string()));
    let store = Arc::new(LeadStore::open(&leads_dir)?);
    info!(
        primary = %store.primary_path().display(),
        fallback = %store.secondary_path().display(),
        "Lead store initialized"
    );

    // Paraphrasing is optional; the funnel never depends on it
    let paraphraser: Option<Arc<dyn Paraphraser>> = match LlmClient::from_env() {
        Ok(client) if client.has_api_key() || dotenv::var("LLM_BASE_URL").is_ok() => {
            info!("LLM client initialized for prompt paraphrasing");
            Some(Arc::new(client))
        }
        Ok(_) => {
            info!("No LLM configured, prompts will be sent verbatim");
            None
        }
        Err(e) => {
            warn!("LLM client unavailable: {:#}", e);
            None
        }
    };

    let paraphrase = dotenv::var("PARAPHRASE_ENABLED")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "on"))
        .unwrap_or(false);
    let funnel_config = Arc::new(RwLock::new(FunnelConfig {
        paraphrase,
        ..Default::default()
    }));

    // Parse admin user IDs from env
    let admin_ids: HashSet<u64> = dotenv::var("ADMIN_USER_IDS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect();
    if !admin_ids.is_empty() {
        info!(count = admin_ids.len(), "Admin users configured");
    }

    let app_state = AppState {
        engine: Arc::new(FunnelEngine::new(store.clone())),
        store,
        renderer: PromptRenderer::new(paraphraser),
        branding: Branding::from_env(),
        admin_ids,
        funnel_config,
        sessions: RwLock::new(HashMap::new()),
    };

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::ayla()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        gid,
                    )
                    .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    )
                    .await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting Ayla lead intake bot...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
