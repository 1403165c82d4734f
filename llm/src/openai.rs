//! OpenAI chat backend.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::chat::{ChatMessage, ChatModel};
use crate::error::{LlmError, Result};

/// Environment variable holding the API key.
const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Chat backend using the OpenAI chat-completions API.
pub struct OpenAiChat {
    /// API key.
    api_key: String,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model to request.
    model: String,

    /// Sampling temperature.
    temperature: f64,

    /// Nucleus sampling parameter.
    top_p: f64,
}

impl OpenAiChat {
    /// Create a backend with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            top_p: 0.9,
        }
    }

    /// Create a backend from the `OPENAI_API_KEY` environment variable,
    /// failing immediately when the key is absent.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::ApiKeyMissing(API_KEY_VAR))?;
        Ok(Self::new(api_key))
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        max_output_tokens: u32,
    ) -> Result<String> {
        debug!(
            "Generating completion with {} ({} messages)",
            self.model,
            messages.len()
        );

        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": max_output_tokens,
            "temperature": self.temperature,
            "top_p": self.top_p,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiRequest(format!("API error: {error_text}")));
        }

        let result: ChatCompletionResponse = response.json().await?;
        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no completion in response".to_string()))?;

        debug!("Generated completion ({} chars)", content.len());
        Ok(content)
    }
}

/// Chat-completions API response format.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_sends_sampling_params_and_parses_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 500,
                "temperature": 0.3,
                "top_p": 0.9,
                "messages": [
                    { "role": "system", "content": "rules" },
                    { "role": "user", "content": "question" },
                ],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [ { "message": { "role": "assistant", "content": "the answer" } } ],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let chat = OpenAiChat::new("test-key").with_base_url(server.uri());
        let messages = vec![ChatMessage::system("rules"), ChatMessage::user("question")];

        let answer = chat.generate(messages, 500).await.unwrap();
        assert_eq!(answer, "the answer");
    }

    #[tokio::test]
    async fn test_generate_maps_rate_limit() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new("test-key").with_base_url(server.uri());
        let err = chat
            .generate(vec![ChatMessage::user("q")], 100)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LlmError::RateLimited {
                retry_after_secs: 7
            }
        ));
    }

    #[tokio::test]
    async fn test_generate_surfaces_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new("test-key").with_base_url(server.uri());
        let err = chat
            .generate(vec![ChatMessage::user("q")], 100)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::ApiRequest(detail) if detail.contains("boom")));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_choices() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let chat = OpenAiChat::new("test-key").with_base_url(server.uri());
        let err = chat
            .generate(vec![ChatMessage::user("q")], 100)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
