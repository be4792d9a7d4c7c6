//! The generation provider interface.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::message::Message;

/// A text-generation backend.
///
/// One call is one round trip: an ordered conversation goes in, one
/// completion string comes out. No streaming, and no determinism is promised.
///
/// Providers are constructed once at startup and shared as
/// `Arc<dyn GenerationProvider>` with every pipeline phase.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Returns the completion for `messages`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when no completion text could be obtained.
    async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError>;

    /// Returns a short name for logs.
    fn name(&self) -> &str;

    /// Returns the model identifier, if the provider has one.
    fn model(&self) -> Option<&str> {
        None
    }
}
