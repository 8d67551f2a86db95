//! Client for an OpenAI-compatible chat-completion endpoint.

use crate::{
    config::AiConfig,
    errors::{ServiceError, ServiceResult},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct AiClient {
    client: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// True when an API key is configured.
    pub fn enabled(&self) -> bool {
        self.config.enabled()
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Sends one system + user exchange and returns the assistant text.
    ///
    /// The whole call, including reading the body, is bounded by the configured timeout.
    #[instrument(skip_all, fields(model = %self.config.model))]
    pub async fn complete(&self, system: &str, user: &str) -> ServiceResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ServiceError::ExternalServiceError("AI provider is not configured".into()))?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let call = async {
            let response = self
                .client
                .post(&self.config.api_url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| ServiceError::ExternalServiceError(format!("AI request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ServiceError::ExternalServiceError(format!(
                    "AI provider returned {status}"
                )));
            }

            response
                .json::<ChatResponse>()
                .await
                .map_err(|e| ServiceError::ExternalServiceError(format!("Malformed AI response: {e}")))
        };

        let body = tokio::time::timeout(self.timeout(), call)
            .await
            .map_err(|_| ServiceError::ExternalServiceError("AI request timed out".into()))??;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ServiceError::ExternalServiceError("AI response had no content".into()))?;

        debug!(chars = content.len(), "AI completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String, timeout_secs: u64) -> AiConfig {
        AiConfig {
            api_key: Some("test-key".into()),
            api_url: url,
            model: "test-model".into(),
            timeout_secs,
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "{\"predictedUsage\": 12}"}}]
            })))
            .mount(&server)
            .await;

        let client = AiClient::new(config(server.uri(), 5));
        let text = client.complete("system", "user").await.unwrap();
        assert_eq!(text, "{\"predictedUsage\": 12}");
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = AiClient::new(config(server.uri(), 1));
        assert_matches!(
            client.complete("s", "u").await,
            Err(ServiceError::ExternalServiceError(msg)) if msg.contains("timed out")
        );
    }

    #[tokio::test]
    async fn missing_key_is_an_error() {
        let client = AiClient::new(AiConfig::default());
        assert!(!client.enabled());
        assert_matches!(
            client.complete("s", "u").await,
            Err(ServiceError::ExternalServiceError(_))
        );
    }
}
