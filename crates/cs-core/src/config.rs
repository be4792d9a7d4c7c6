//! Configuration structures for the codeshift pipeline.
//!
//! This module provides configuration types for all components of the application:
//!
//! - [`ProviderConfig`] - Generation provider endpoint, model, and transport settings
//! - [`GenerationConfig`] - Structured generation settings (attempt bound, system prompt)
//! - [`OutputConfig`] - Report format and migrated-file output
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`], and every struct is
//! `#[serde(default)]` so a partial JSON file only overrides what it names.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default system instruction for structured generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a precise JSON generator.";

/// Default bound on structured generation attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Which family of OpenAI-compatible endpoint to talk to.
///
/// Each kind carries a preset base URL, default model, and API key variable.
/// [`Custom`](Self::Custom) has no presets and requires `base_url` and `model`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ProviderKind {
    /// OpenAI's hosted API.
    #[serde(rename = "openai", alias = "open_ai")]
    OpenAi,
    /// Groq's OpenAI-compatible API.
    Groq,
    /// Google's OpenAI-compatible Gemini endpoint.
    #[default]
    Google,
    /// A local Ollama server.
    Ollama,
    /// A local LM Studio server.
    #[serde(rename = "lmstudio", alias = "lm_studio")]
    LmStudio,
    /// Any other OpenAI-compatible endpoint.
    Custom,
}

impl ProviderKind {
    /// Returns the preset base URL for this kind, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use cs_core::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::Ollama.default_base_url(), Some("http://localhost:11434/v1"));
    /// assert_eq!(ProviderKind::Custom.default_base_url(), None);
    /// ```
    #[must_use]
    pub const fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Groq => Some("https://api.groq.com/openai/v1"),
            Self::Google => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Self::Ollama => Some("http://localhost:11434/v1"),
            Self::LmStudio => Some("http://localhost:1234/v1"),
            Self::Custom => None,
        }
    }

    /// Returns the preset model for this kind, if any.
    #[must_use]
    pub const fn default_model(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("gpt-4o-mini"),
            Self::Groq => Some("llama-3.3-70b-versatile"),
            Self::Google => Some("gemini-2.5-flash"),
            Self::Ollama => Some("llama3.1"),
            Self::LmStudio => Some("local-model"),
            Self::Custom => None,
        }
    }

    /// Returns the environment variable conventionally holding this kind's API key.
    ///
    /// Local servers don't need a key.
    #[must_use]
    pub const fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::Ollama | Self::LmStudio | Self::Custom => None,
        }
    }

    /// Returns a short label for logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::Google => "google",
            Self::Ollama => "ollama",
            Self::LmStudio => "lmstudio",
            Self::Custom => "custom",
        }
    }
}

/// Configuration for the generation provider.
///
/// Unset `base_url`, `model` and `api_key_env` fall back to the presets of
/// [`kind`](Self::kind).
///
/// # Examples
///
/// ```
/// use cs_core::{ProviderConfig, ProviderKind};
///
/// let config = ProviderConfig {
///     kind: ProviderKind::Groq,
///     ..ProviderConfig::default()
/// };
/// assert_eq!(config.base_url(), Some("https://api.groq.com/openai/v1"));
/// assert_eq!(config.api_key_env(), Some("GROQ_API_KEY"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Endpoint family.
    pub kind: ProviderKind,

    /// Base URL override (e.g. `http://localhost:8080/v1`).
    pub base_url: Option<String>,

    /// Model override.
    pub model: Option<String>,

    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,

    /// Per-request timeout in seconds.
    ///
    /// Generations for large files routinely take minutes.
    pub timeout_secs: u64,

    /// Transport-level retries for connection failures, rate limits and 5xx.
    pub max_retries: u32,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            model: None,
            api_key_env: None,
            timeout_secs: 300,
            max_retries: 2,
            temperature: 0.1,
        }
    }
}

impl ProviderConfig {
    /// Returns the effective base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.kind.default_base_url())
            .map(|url| url.trim_end_matches('/'))
    }

    /// Returns the effective model name.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().or_else(|| self.kind.default_model())
    }

    /// Returns the effective API key variable name.
    #[must_use]
    pub fn api_key_env(&self) -> Option<&str> {
        self.api_key_env
            .as_deref()
            .or_else(|| self.kind.default_api_key_env())
    }

    /// Reads the API key from the configured environment variable.
    ///
    /// Returns `None` when no variable is configured or it is unset/empty.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        let var = self.api_key_env()?;
        std::env::var(var).ok().filter(|key| !key.trim().is_empty())
    }
}

/// Configuration for the structured generation service.
///
/// # Examples
///
/// ```
/// use cs_core::GenerationConfig;
///
/// let config = GenerationConfig::default();
/// assert_eq!(config.max_attempts, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Total attempts (first try included) before giving up.
    pub max_attempts: u32,

    /// System instruction used when a caller doesn't supply one.
    pub system_prompt: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
        }
    }
}

/// Output format for the final verification report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// Human-readable summary.
    Text,
}

/// Configuration for report and migrated-file output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format.
    pub report_format: ReportFormat,

    /// Whether migrated files are written when an output directory is given.
    pub write_files: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_format: ReportFormat::Json,
            write_files: true,
        }
    }
}

/// Root configuration for codeshift.
///
/// # Examples
///
/// ```
/// use cs_core::Config;
///
/// let config = Config::default();
/// assert!(config.validate().is_ok());
///
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// let parsed: Config = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, parsed);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation provider configuration.
    pub provider: ProviderConfig,

    /// Structured generation configuration.
    pub generation: GenerationConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file doesn't exist,
    /// [`ConfigError::Io`] / [`ConfigError::Parse`] if it can't be read or parsed,
    /// and [`ConfigError::InvalidOption`] if a value is out of range.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_owned()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde can't express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] naming the first bad option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.max_attempts == 0 {
            return Err(ConfigError::invalid_option(
                "generation.max_attempts",
                "must be at least 1",
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::invalid_option(
                "provider.timeout_secs",
                "must be positive",
            ));
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::invalid_option(
                "provider.temperature",
                "must be between 0.0 and 2.0",
            ));
        }
        if self.provider.base_url().is_none() {
            return Err(ConfigError::invalid_option(
                "provider.base_url",
                format!("required for provider kind '{}'", self.provider.kind.label()),
            ));
        }
        if self.provider.model().is_none() {
            return Err(ConfigError::invalid_option(
                "provider.model",
                format!("required for provider kind '{}'", self.provider.kind.label()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.kind, ProviderKind::Google);
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.model(), Some("gemini-2.5-flash"));
    }

    #[test]
    fn test_provider_overrides_win_over_presets() {
        let config = ProviderConfig {
            kind: ProviderKind::Ollama,
            base_url: Some("http://gpu-box:11434/v1/".to_owned()),
            model: Some("qwen2.5-coder".to_owned()),
            ..ProviderConfig::default()
        };
        assert_eq!(config.base_url(), Some("http://gpu-box:11434/v1"));
        assert_eq!(config.model(), Some("qwen2.5-coder"));
        assert_eq!(config.api_key_env(), None);
    }

    #[test]
    fn test_generation_config_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"provider": {"kind": "groq"}, "generation": {"max_attempts": 3}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Groq);
        assert_eq!(config.generation.max_attempts, 3);
        // Other fields should have defaults
        assert_eq!(config.generation.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.output.report_format, ReportFormat::Json);
        assert!(config.output.write_files);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.generation.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("generation.max_attempts"));
    }

    #[test]
    fn test_validate_custom_requires_endpoint() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Custom;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider.base_url"));

        config.provider.base_url = Some("http://localhost:9000/v1".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider.model"));

        config.provider.model = Some("m".to_owned());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codeshift.json");
        std::fs::write(&path, r#"{"provider": {"kind": "lmstudio", "timeout_secs": 30}}"#)
            .unwrap();

        let path = Utf8Path::from_path(&path).unwrap();
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::LmStudio);
        assert_eq!(config.provider.timeout_secs, 30);
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file(Utf8Path::new("/nonexistent/codeshift.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_provider_kind_serialization_matches_labels() {
        for kind in [
            ProviderKind::OpenAi,
            ProviderKind::Groq,
            ProviderKind::Google,
            ProviderKind::Ollama,
            ProviderKind::LmStudio,
            ProviderKind::Custom,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.label()));
        }

        // Snake-case spellings are still accepted.
        let kind: ProviderKind = serde_json::from_str(r#""lm_studio""#).unwrap();
        assert_eq!(kind, ProviderKind::LmStudio);
        let kind: ProviderKind = serde_json::from_str(r#""open_ai""#).unwrap();
        assert_eq!(kind, ProviderKind::OpenAi);
    }
}
