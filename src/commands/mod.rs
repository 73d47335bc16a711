mod answer;
mod config;
mod leads;
mod progress;
mod start;

use crate::state::Context;

/// Ayla - assistente de captação de leads da imobiliária
#[poise::command(
    slash_command,
    subcommands(
        "start::start",
        "answer::answer",
        "progress::progress",
        "leads::leads",
        "config::config"
    )
)]
pub async fn ayla(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Reply visible only to the invoking user; leads carry personal data.
pub(crate) async fn say_private(ctx: &Context<'_>, text: impl Into<String>) -> Result<(), anyhow::Error> {
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

/// Split text into Discord-safe chunks (max 1990 chars), preferring line breaks.
pub(crate) fn chunk_message(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let mut end = remaining.len().min(1990);
        while !remaining.is_char_boundary(end) {
            end -= 1;
        }
        let split_at = if end < remaining.len() {
            remaining[..end]
                .rfind('\n')
                .or_else(|| remaining[..end].rfind(' '))
                .map(|i| i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    chunks
}
