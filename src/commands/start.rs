use tracing::info;

use super::say_private;
use crate::funnel::{welcome_message, FunnelState};
use crate::leads::types::Attribution;
use crate::state::Context;

/// Começar um novo atendimento (descarta o anterior)
#[poise::command(slash_command, rename = "iniciar")]
pub async fn start(
    ctx: Context<'_>,
    #[description = "De onde você veio (ex.: instagram, site)"] origem: Option<String>,
    #[description = "Atribuição, ex.: utm_source=google&utm_campaign=verao"] campanha: Option<String>,
) -> Result<(), anyhow::Error> {
    let origin = origem
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("discord");
    let attribution = campanha.as_deref().map(Attribution::parse).unwrap_or_default();

    let funnel = FunnelState::new(origin, attribution);
    let first_prompt = ctx.data().engine.current_prompt(&funnel);
    info!(
        user = ctx.author().name,
        session = funnel.session_id(),
        origin,
        "funnel session started"
    );
    ctx.data().start_session(ctx.author().id.get(), funnel).await;

    let branding = &ctx.data().branding;
    let prompt = ctx.data().render_prompt(first_prompt).await;
    say_private(
        &ctx,
        format!(
            "{}\n\n{}",
            welcome_message(&branding.company_name, &branding.company_blurb),
            prompt
        ),
    )
    .await
}
