use std::time::Duration;

use super::say_private;
use crate::state::Context;

/// Configurar o funil (admin)
#[poise::command(slash_command, guild_only)]
pub async fn config(
    ctx: Context<'_>,
    #[description = "paraphrase | min_interval_ms"] param: Option<String>,
    #[description = "Novo valor"] value: Option<String>,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        return say_private(&ctx, "Este comando é restrito a administradores.").await;
    }

    match (param.as_deref(), value.as_deref().map(str::trim)) {
        // Show current config
        (None, _) => {
            let config = ctx.data().funnel_config.read().await;
            say_private(
                &ctx,
                format!(
                    "**Configuração do funil:**\n\
                     `paraphrase`: {}\n\
                     `min_interval_ms`: {}",
                    if config.paraphrase { "on" } else { "off" },
                    config.min_interval.as_millis()
                ),
            )
            .await?;
        }
        (Some("paraphrase"), Some(val)) => match parse_switch(val) {
            Some(on) => {
                ctx.data().funnel_config.write().await.paraphrase = on;
                say_private(&ctx, format!("`paraphrase` set to {}", if on { "on" } else { "off" }))
                    .await?;
            }
            None => say_private(&ctx, "Use `on` ou `off`.").await?,
        },
        (Some("min_interval_ms"), Some(val)) => match val.parse::<u64>() {
            Ok(ms) => {
                ctx.data().funnel_config.write().await.min_interval = Duration::from_millis(ms);
                say_private(&ctx, format!("`min_interval_ms` set to {}", ms)).await?;
            }
            Err(_) => say_private(&ctx, "Informe um número de milissegundos.").await?,
        },
        (Some(key), Some(_)) => {
            say_private(
                &ctx,
                format!("Unknown param `{}`. Valid: `paraphrase`, `min_interval_ms`", key),
            )
            .await?;
        }
        (Some(_), None) => {
            say_private(
                &ctx,
                "Provide both `param` and `value`. Example: `/ayla config paraphrase on`",
            )
            .await?;
        }
    }

    Ok(())
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "sim" => Some(true),
        "off" | "false" | "0" | "nao" | "não" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch("não"), Some(false));
        assert_eq!(parse_switch("talvez"), None);
    }
}
