use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Rewords a canonical prompt for display. Never sees answers and has no
/// say in validation or state.
#[async_trait]
pub trait Paraphraser: Send + Sync {
    async fn paraphrase(&self, canonical: &str) -> Result<String>;
}

/// Produces the text actually shown for a prompt.
#[derive(Clone, Default)]
pub struct PromptRenderer {
    paraphraser: Option<Arc<dyn Paraphraser>>,
}

impl PromptRenderer {
    pub fn new(paraphraser: Option<Arc<dyn Paraphraser>>) -> Self {
        Self { paraphraser }
    }

    /// Paraphrased text when `enabled` and the paraphraser answers with
    /// something non-blank; the canonical prompt verbatim otherwise.
    pub async fn render(&self, canonical: &str, enabled: bool) -> String {
        let Some(paraphraser) = self.paraphraser.as_ref().filter(|_| enabled) else {
            return canonical.to_string();
        };
        match paraphraser.paraphrase(canonical).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => canonical.to_string(),
            Err(e) => {
                debug!(error = %e, "paraphrase failed, using canonical prompt");
                canonical.to_string()
            }
        }
    }
}
