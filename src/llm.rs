use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::funnel::prompt::Paraphraser;

const PARAPHRASE_SYSTEM_PROMPT: &str = "Você é a Ayla, atendente simpática de uma imobiliária. \
Reescreva a pergunta do usuário de forma calorosa e curta, em português do Brasil. \
Mantenha exatamente as mesmas opções, exemplos e formatos pedidos (números, 1/2, alta/media/baixa). \
Responda somente com a pergunta reescrita.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// OpenAI-compatible chat client. Optional: the funnel runs without it.
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn from_env() -> Result<Self> {
        let base_url = dotenv::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = dotenv::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let api_key = dotenv::var("LLM_API_KEY")
            .or_else(|_| dotenv::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            model,
            api_key,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Non-streaming chat completion.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.3,
            "max_tokens": 256,
        });

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await.context("LLM request failed")?;
        let resp = resp.error_for_status().context("LLM returned an error status")?;
        let text = resp.text().await.context("Failed to read LLM response")?;
        let json: serde_json::Value =
            serde_json::from_str(&text).context("Failed to parse LLM JSON")?;

        // choices[0].message.content, null treated as empty
        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(content)
    }
}

#[async_trait]
impl Paraphraser for LlmClient {
    async fn paraphrase(&self, canonical: &str) -> Result<String> {
        let messages = vec![
            Message {
                role: "system".to_string(),
                content: PARAPHRASE_SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: canonical.to_string(),
            },
        ];
        self.chat(&messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> LlmClient {
        LlmClient {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            model: "test".to_string(),
            api_key: None,
        }
    }

    #[test]
    fn test_endpoint_resolution() {
        assert_eq!(
            client("http://localhost:1234/v1").endpoint(),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(
            client("http://localhost:1234/").endpoint(),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(
            client("https://x.example/v1/chat/completions").endpoint(),
            "https://x.example/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_unreachable_llm_is_an_error() {
        // Nothing listens on port 9; the renderer turns this into the canonical prompt.
        let llm = client("http://127.0.0.1:9");
        assert!(llm.paraphrase("Qual é o seu e-mail?").await.is_err());
    }
}
