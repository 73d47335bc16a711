use super::say_private;
use crate::funnel::fields::FIELD_COUNT;
use crate::state::Context;

/// Ver em que pergunta você está
#[poise::command(slash_command, rename = "progresso")]
pub async fn progress(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let Some(handle) = ctx.data().session(ctx.author().id.get()).await else {
        return say_private(&ctx, "Nenhum atendimento em andamento. Use `/ayla iniciar`.").await;
    };

    let (step, done, collected, started, prompt) = {
        let session = handle.lock().await;
        let funnel = &session.funnel;
        let collected: Vec<&str> = funnel.answers().keys().map(|k| k.as_str()).collect();
        (
            funnel.current_step(),
            funnel.is_completed(),
            collected.join(", "),
            funnel.created_at().format("%d/%m/%Y %H:%M UTC").to_string(),
            ctx.data().engine.current_prompt(funnel),
        )
    };
    let prompt = ctx.data().render_prompt(prompt).await;

    let mut out = format!(
        "**Progresso:** {}/{} (desde {})\n",
        step, FIELD_COUNT, started
    );
    if done {
        out.push_str("**Atendimento concluído.** Seu cadastro já foi salvo.\n");
    } else if !collected.is_empty() {
        out.push_str(&format!("**Já respondido:** {}\n", collected));
    }
    out.push_str(&format!("\n{}", prompt));
    say_private(&ctx, out).await
}
