//! Schema-validated generation on top of a free-text provider.
//!
//! [`StructuredGenerator`] runs a small bounded state machine per request:
//!
//! ```text
//! Attempt(0) ──ok──▶ Done(T)
//!     │ err
//!     ▼
//! Attempt(1) ──ok──▶ Done(T)
//!     │ err            ...
//!     ▼
//! Failed(GenerationError)   (after `max_attempts`)
//! ```
//!
//! Each attempt sends the whole conversation, extracts a payload from the
//! reply, parses it, and validates it against the schema. A parse or
//! validation failure appends a corrective user message to the same
//! conversation, so the next attempt sees its own mistake described. Attempts
//! follow each other immediately; there is no backoff at this level.

use std::sync::Arc;

use cs_core::GenerationConfig;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{AttemptError, GenerationError};
use crate::extract::extract_payload;
use crate::message::Conversation;
use crate::provider::GenerationProvider;
use crate::schema::{Schema, SerdeSchema, Validation};

/// Appended to every system prompt.
const STRICT_JSON_SUFFIX: &str = "Ensure your output is strictly valid JSON.";

/// Builds the corrective message sent after a failed attempt.
#[must_use]
pub fn correction_message(error: &AttemptError) -> String {
    format!(
        "Your previous response failed validation. Error: {error}. Please try again and fix the JSON format."
    )
}

/// Produces schema-validated values from a [`GenerationProvider`].
///
/// Cheap to clone: the provider is shared through an `Arc`, so every phase
/// of a pipeline can hold its own handle to the same provider.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Arc;
/// use cs_core::AnalysisResult;
/// use cs_llm::{OpenAiCompatibleProvider, StructuredGenerator};
///
/// let provider = Arc::new(OpenAiCompatibleProvider::from_config(&config.provider)?);
/// let generator = StructuredGenerator::new(provider);
/// let analysis: AnalysisResult = generator.generate_as(&prompt).await?;
/// ```
#[derive(Clone)]
pub struct StructuredGenerator {
    provider: Arc<dyn GenerationProvider>,
    config: GenerationConfig,
}

impl std::fmt::Debug for StructuredGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredGenerator")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl StructuredGenerator {
    /// Creates a generator with the default [`GenerationConfig`].
    #[must_use]
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self::with_config(provider, GenerationConfig::default())
    }

    /// Creates a generator with an explicit configuration.
    ///
    /// A `max_attempts` of zero is treated as one.
    #[must_use]
    pub fn with_config(provider: Arc<dyn GenerationProvider>, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    /// Returns the underlying provider.
    #[inline]
    #[must_use]
    pub fn provider(&self) -> &dyn GenerationProvider {
        self.provider.as_ref()
    }

    /// Returns the generation configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generates a value of type `T` using its `serde` shape as the schema.
    ///
    /// # Errors
    ///
    /// See [`generate`](Self::generate).
    pub async fn generate_as<T>(&self, prompt: &str) -> Result<T, GenerationError>
    where
        T: DeserializeOwned + Send,
    {
        self.generate(prompt, &SerdeSchema::<T>::new(), None).await
    }

    /// Generates a value validated by `schema`.
    ///
    /// `system_prompt` replaces the configured default system instruction;
    /// either way the strict-JSON requirement is appended to it.
    ///
    /// Only parse and validation failures add a corrective message. A failed
    /// provider call uses up an attempt and leaves the conversation as it was.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Exhausted`] once `max_attempts` attempts
    /// have failed, carrying the attempt count and the last failure.
    pub async fn generate<S>(
        &self,
        prompt: &str,
        schema: &S,
        system_prompt: Option<&str>,
    ) -> Result<S::Output, GenerationError>
    where
        S: Schema,
    {
        let system = system_prompt.unwrap_or(&self.config.system_prompt);
        let mut conversation =
            Conversation::new(format!("{system}\n{STRICT_JSON_SUFFIX}"), prompt);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            debug!(
                schema = schema.name(),
                attempt = attempts + 1,
                messages = conversation.len(),
                chars = conversation.char_count(),
                "Requesting structured generation"
            );

            let error = match self.attempt(&conversation, schema).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            attempts += 1;

            warn!(
                schema = schema.name(),
                attempt = attempts,
                max_attempts,
                error = %error,
                "Structured generation attempt failed"
            );

            if attempts >= max_attempts {
                return Err(GenerationError::Exhausted {
                    attempts,
                    last_error: error,
                });
            }

            if error.is_correctable() {
                conversation = conversation.with_user(correction_message(&error));
            }
        }
    }

    /// Runs one provider round trip and validates the reply.
    async fn attempt<S>(
        &self,
        conversation: &Conversation,
        schema: &S,
    ) -> Result<S::Output, AttemptError>
    where
        S: Schema,
    {
        let raw = self.provider.chat(conversation.messages()).await?;
        let payload = extract_payload(&raw);
        let value = serde_json::from_str(payload)?;
        match schema.validate(value) {
            Validation::Valid(output) => Ok(output),
            Validation::Invalid(detail) => Err(AttemptError::Invalid(detail)),
        }
    }
}

#[cfg(test)]
mod tests {
    use cs_core::{AnalysisResult, DEFAULT_SYSTEM_PROMPT};
    use serde_json::Value;

    use super::*;
    use crate::error::ProviderError;
    use crate::message::Role;
    use crate::scripted::ScriptedProvider;

    const VALID_ANALYSIS: &str = r#"{"patterns": ["Module"], "dependencies": [], "potentialIssues": [], "summary": "ok"}"#;

    fn generator(provider: &Arc<ScriptedProvider>) -> StructuredGenerator {
        StructuredGenerator::new(Arc::clone(provider) as Arc<dyn GenerationProvider>)
    }

    #[tokio::test]
    async fn test_first_valid_response_returns_immediately() {
        let provider = Arc::new(ScriptedProvider::new([
            format!("```json\n{VALID_ANALYSIS}\n```"),
            "never used".to_owned(),
        ]));

        let analysis: AnalysisResult = generator(&provider).generate_as("analyze").await.unwrap();

        assert_eq!(analysis.summary, "ok");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.remaining(), 1);

        let call = &provider.calls()[0];
        assert_eq!(call.len(), 2);
        assert_eq!(call[0].role, Role::System);
        assert_eq!(
            call[0].content,
            format!("{DEFAULT_SYSTEM_PROMPT}\n{STRICT_JSON_SUFFIX}")
        );
        assert_eq!(call[1].role, Role::User);
        assert_eq!(call[1].content, "analyze");
    }

    #[tokio::test]
    async fn test_self_correction_carries_prior_context() {
        let provider = Arc::new(ScriptedProvider::new([
            r#"{"patterns": [], "dependencies": [], "summary": "missing issues"}"#.to_owned(),
            VALID_ANALYSIS.to_owned(),
        ]));

        let analysis: AnalysisResult = generator(&provider).generate_as("analyze").await.unwrap();
        assert_eq!(analysis.patterns, ["Module"]);

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        // Final attempt: original two messages plus exactly one correction.
        assert_eq!(calls[1].len(), 3);
        assert_eq!(calls[1][..2], calls[0][..]);
        let correction = &calls[1][2];
        assert_eq!(correction.role, Role::User);
        assert!(correction.content.starts_with("Your previous response failed validation."));
        assert!(correction.content.contains("potentialIssues"));
        assert!(correction.content.ends_with("Please try again and fix the JSON format."));
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts_and_last_error() {
        let provider = Arc::new(ScriptedProvider::new([
            "not json at all".to_owned(),
            r#"{"patterns": "wrong", "dependencies": [], "potentialIssues": [], "summary": ""}"#
                .to_owned(),
        ]));

        let err = generator(&provider)
            .generate_as::<AnalysisResult>("analyze")
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), 2);
        assert!(matches!(err.last_error(), AttemptError::Invalid(_)));
        let message = err.to_string();
        assert!(message.contains("after 2 attempts"), "{message}");
        assert!(message.contains("invalid type"), "{message}");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_parse_failure_is_corrected() {
        let provider = Arc::new(ScriptedProvider::new([
            "Sure! {patterns: []}".to_owned(),
            VALID_ANALYSIS.to_owned(),
        ]));

        let result = generator(&provider)
            .generate_as::<AnalysisResult>("analyze")
            .await;

        assert!(result.is_ok());
        let calls = provider.calls();
        assert!(calls[1][2].content.contains("response is not valid JSON"));
    }

    #[tokio::test]
    async fn test_provider_failure_consumes_attempt_without_correction() {
        let provider = Arc::new(ScriptedProvider::from_results([
            Err(ProviderError::EmptyResponse),
            Ok(VALID_ANALYSIS.to_owned()),
        ]));

        let result = generator(&provider)
            .generate_as::<AnalysisResult>("analyze")
            .await;

        assert!(result.is_ok());
        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].len(), 2);
    }

    #[tokio::test]
    async fn test_provider_failures_exhaust() {
        let provider = Arc::new(ScriptedProvider::from_results([
            Err(ProviderError::config("no model")),
            Err(ProviderError::EmptyResponse),
        ]));

        let err = generator(&provider)
            .generate_as::<AnalysisResult>("analyze")
            .await
            .unwrap_err();

        assert!(matches!(
            err.last_error(),
            AttemptError::Provider(ProviderError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_custom_system_prompt_and_attempt_bound() {
        let provider = Arc::new(ScriptedProvider::new([
            "x".to_owned(),
            "y".to_owned(),
            "z".to_owned(),
        ]));
        let config = GenerationConfig {
            max_attempts: 3,
            ..GenerationConfig::default()
        };
        let generator = StructuredGenerator::with_config(
            Arc::clone(&provider) as Arc<dyn GenerationProvider>,
            config,
        );

        let err = generator
            .generate(
                "prompt",
                &SerdeSchema::<Value>::new(),
                Some("You are a QA engineer."),
            )
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), 3);
        let calls = provider.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].len(), 4);
        assert_eq!(
            calls[0][0].content,
            format!("You are a QA engineer.\n{STRICT_JSON_SUFFIX}")
        );
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let provider = Arc::new(ScriptedProvider::new(["{}".to_owned()]));
        let config = GenerationConfig {
            max_attempts: 0,
            ..GenerationConfig::default()
        };
        let generator = StructuredGenerator::with_config(
            Arc::clone(&provider) as Arc<dyn GenerationProvider>,
            config,
        );

        let value: Value = generator.generate_as("p").await.unwrap();
        assert!(value.is_object());
    }
}
