use anyhow::Context as _;
use serde_json::Value;

use super::{chunk_message, say_private};
use crate::state::Context;

/// Listar os leads mais recentes (admin)
#[poise::command(slash_command, guild_only)]
pub async fn leads(
    ctx: Context<'_>,
    #[description = "Quantos leads mostrar"] limite: Option<u32>,
) -> Result<(), anyhow::Error> {
    if !ctx.data().is_admin(ctx.author().id.get()) {
        return say_private(&ctx, "Este comando é restrito a administradores.").await;
    }
    ctx.defer_ephemeral().await?;

    let limit = limite.unwrap_or(10).clamp(1, 50) as usize;
    let store = ctx.data().store.clone();
    let rows = tokio::task::spawn_blocking(move || store.recent(limit))
        .await
        .context("spawn_blocking join failed")??;

    if rows.is_empty() {
        return say_private(&ctx, "Nenhum lead salvo ainda.").await;
    }

    let cell = |row: &serde_json::Map<String, Value>, key: &str| -> String {
        match row.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    };

    let mut output = format!("**Últimos {} leads**\n\n", rows.len());
    for row in &rows {
        output.push_str(&format!(
            "- **{}** · {} · {}\n  {} {} · {} m² · {} quartos · {} · urgência {}\n  origem {} · `{}`\n",
            cell(row, "nome"),
            cell(row, "telefone"),
            cell(row, "email"),
            cell(row, "operacao"),
            cell(row, "tipo_imovel"),
            cell(row, "metragem"),
            cell(row, "quartos"),
            cell(row, "faixa_preco"),
            cell(row, "urgencia"),
            cell(row, "origem"),
            cell(row, "created_at"),
        ));
    }

    for chunk in chunk_message(&output) {
        say_private(&ctx, chunk).await?;
    }
    Ok(())
}
