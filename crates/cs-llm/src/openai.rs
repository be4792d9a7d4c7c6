//! Provider for any OpenAI-compatible chat completions endpoint.
//!
//! Covers the hosted services (OpenAI, Groq, Gemini's OpenAI surface) and the
//! local servers (Ollama, LM Studio) with one implementation: a `POST` to
//! `{base_url}/chat/completions` with an optional bearer token.

use std::time::Duration;

use async_trait::async_trait;
use cs_core::ProviderConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::message::{Message, Role};
use crate::provider::GenerationProvider;

/// Chat completions client for OpenAI-compatible services.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    endpoint: String,
    name: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiCompatibleProvider {
    /// Builds a provider from configuration.
    ///
    /// The API key is read from the environment here, once. Providers with
    /// no key variable (local servers) send no `Authorization` header.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Config`] if the base URL or model can't be resolved
    /// - [`ProviderError::MissingApiKey`] if a key variable is configured but unset
    /// - [`ProviderError::Client`] if the HTTP client can't be built
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base_url = config.base_url().ok_or_else(|| {
            ProviderError::config(format!("no base URL for provider {}", config.kind.label()))
        })?;
        let model = config.model().ok_or_else(|| {
            ProviderError::config(format!("no model for provider {}", config.kind.label()))
        })?;

        let api_key = match config.api_key_env() {
            Some(var) => Some(
                config
                    .api_key()
                    .ok_or_else(|| ProviderError::MissingApiKey(var.to_owned()))?,
            ),
            None => None,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            client,
            endpoint: format!("{base_url}/chat/completions"),
            name: config.kind.label().to_owned(),
            model: model.to_owned(),
            api_key,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    /// Returns the full chat completions URL.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one request, without retries.
    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, ProviderError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<unreadable body>"));
            return Err(ProviderError::Api {
                provider: self.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response.json().await.map_err(ProviderError::Decode)?;
        completion_text(completion)
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatibleProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let body = ChatRequest::new(&self.model, messages, self.temperature);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                // 1s, 2s, 4s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(6));
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&body).await {
                Ok(text) => {
                    debug!(
                        provider = %self.name,
                        model = %self.model,
                        chars = text.len(),
                        "Received completion"
                    );
                    return Ok(text);
                }
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        provider = %self.name,
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "Provider request failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

/// Request body for `/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, messages: &'a [Message], temperature: f32) -> Self {
        Self {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Takes the text of the first choice.
fn completion_text(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use cs_core::ProviderKind;
    use insta::assert_snapshot;

    use super::*;

    fn local_config() -> ProviderConfig {
        ProviderConfig {
            kind: ProviderKind::Ollama,
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_request_body_shape() {
        let messages = [Message::system("Be precise."), Message::user("Hi")];
        let body = ChatRequest::new("llama3.1", &messages, 0.5);
        assert_snapshot!(
            serde_json::to_string(&body).unwrap(),
            @r#"{"model":"llama3.1","messages":[{"role":"system","content":"Be precise."},{"role":"user","content":"Hi"}],"temperature":0.5}"#
        );
    }

    #[test]
    fn test_completion_text_takes_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id": "x", "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"a\": 1}"}},
                {"index": 1, "message": {"role": "assistant", "content": "other"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(completion_text(response).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_completion_text_empty() {
        let no_choices: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            completion_text(no_choices),
            Err(ProviderError::EmptyResponse)
        ));

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(
            completion_text(null_content),
            Err(ProviderError::EmptyResponse)
        ));
    }

    #[test]
    fn test_from_config_local_provider() {
        let provider = OpenAiCompatibleProvider::from_config(&local_config()).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), Some("llama3.1"));
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = ProviderConfig {
            kind: ProviderKind::Custom,
            base_url: Some("http://gateway.internal/v1/".to_owned()),
            model: Some("mixtral".to_owned()),
            ..ProviderConfig::default()
        };
        let provider = OpenAiCompatibleProvider::from_config(&config).unwrap();
        assert_eq!(provider.endpoint(), "http://gateway.internal/v1/chat/completions");
    }

    #[test]
    fn test_from_config_requires_model() {
        let config = ProviderConfig {
            kind: ProviderKind::Custom,
            base_url: Some("http://localhost:8080/v1".to_owned()),
            ..ProviderConfig::default()
        };
        let err = OpenAiCompatibleProvider::from_config(&config).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn test_from_config_missing_key() {
        let config = ProviderConfig {
            kind: ProviderKind::Custom,
            base_url: Some("http://localhost:8080/v1".to_owned()),
            model: Some("m".to_owned()),
            api_key_env: Some("CODESHIFT_TEST_KEY_THAT_IS_NEVER_SET".to_owned()),
            ..ProviderConfig::default()
        };
        let err = OpenAiCompatibleProvider::from_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing API key: environment variable CODESHIFT_TEST_KEY_THAT_IS_NEVER_SET is not set"
        );
    }
}
