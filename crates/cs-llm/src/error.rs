//! Error types for the cs-llm crate.
//!
//! - [`ProviderError`]: a single provider round trip failed (transport, auth,
//!   provider-side error, unusable response).
//! - [`AttemptError`]: one structured generation attempt failed, either in the
//!   provider call or because the response wasn't acceptable data.
//! - [`GenerationError`]: structured generation gave up after its attempt bound.
//!
//! # Error Recovery Strategy
//!
//! - **Provider errors**: retried by the provider itself for transient causes
//!   (connect failures, timeouts, 429, 5xx), then consume one structured attempt
//! - **Parse/validation errors**: consume one structured attempt and trigger a
//!   corrective message in the same conversation
//! - **Exhausted attempts**: surfaced to the caller as [`GenerationError`]

/// Errors from a single provider round trip.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider was misconfigured (missing base URL or model).
    #[error("invalid provider configuration: {0}")]
    Config(String),

    /// The configured API key variable is unset.
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    /// The HTTP client couldn't be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never produced an HTTP response.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        /// The URL that was called.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        /// Provider name.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The response body wasn't the expected completion shape.
    #[error("failed to decode provider response: {0}")]
    Decode(#[source] reqwest::Error),

    /// The provider answered without any completion text.
    #[error("provider returned no completion")]
    EmptyResponse,
}

impl ProviderError {
    /// Creates a new [`ProviderError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if repeating the same request may succeed.
    ///
    /// Connection failures, timeouts, rate limits (429) and server errors
    /// (5xx) are transient; everything else is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Config(_)
            | Self::MissingApiKey(_)
            | Self::Client(_)
            | Self::Decode(_)
            | Self::EmptyResponse => false,
        }
    }
}

/// Why a single structured generation attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// The provider call itself failed.
    #[error("provider call failed: {0}")]
    Provider(#[from] ProviderError),

    /// The extracted payload isn't JSON.
    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload is JSON but doesn't match the schema.
    #[error("response failed schema validation: {0}")]
    Invalid(String),
}

impl AttemptError {
    /// Returns `true` if the model produced a response that it can be asked to fix.
    ///
    /// Provider failures yield no response, so there is nothing to correct.
    #[inline]
    #[must_use]
    pub const fn is_correctable(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Invalid(_))
    }
}

/// Structured generation failed after exhausting its attempts.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Every attempt failed; carries the last failure.
    #[error("failed to generate valid JSON after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The failure of the final attempt.
        last_error: AttemptError,
    },
}

impl GenerationError {
    /// Returns the number of attempts made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Returns the failure of the final attempt.
    #[must_use]
    pub const fn last_error(&self) -> &AttemptError {
        match self {
            Self::Exhausted { last_error, .. } => last_error,
        }
    }
}
