//! Deterministic provider for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ProviderError;
use crate::message::Message;
use crate::provider::GenerationProvider;

type Responder = Box<dyn Fn(&[Message]) -> Result<String, ProviderError> + Send + Sync>;

enum Script {
    Queue(VecDeque<Result<String, ProviderError>>),
    Responder(Responder),
}

/// A provider that replays canned responses and records every request.
///
/// Built either from a queue of responses, consumed one per call, or from a
/// responder closure that picks a reply based on the messages. A drained
/// queue answers with [`ProviderError::EmptyResponse`].
pub struct ScriptedProvider {
    script: Mutex<Script>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    /// Creates a provider that answers with `responses` in order.
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_results(responses.into_iter().map(Ok))
    }

    /// Creates a provider that replays `results`, failures included.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ProviderError>>,
    {
        Self {
            script: Mutex::new(Script::Queue(results.into_iter().collect())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a provider that computes each reply from the request.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&[Message]) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(Script::Responder(Box::new(responder))),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of every request received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().clone()
    }

    /// Returns the number of requests received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the number of queued responses not yet consumed.
    ///
    /// Always zero for responder-backed providers.
    #[must_use]
    pub fn remaining(&self) -> usize {
        match &*self.script.lock() {
            Script::Queue(queue) => queue.len(),
            Script::Responder(_) => 0,
        }
    }
}

impl std::fmt::Debug for ScriptedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedProvider")
            .field("remaining", &self.remaining())
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError> {
        self.calls.lock().push(messages.to_vec());
        match &mut *self.script.lock() {
            Script::Queue(queue) => queue
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyResponse)),
            Script::Responder(responder) => responder(messages),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_is_consumed_in_order() {
        let provider = ScriptedProvider::new(["a".to_owned(), "b".to_owned()]);
        let messages = [Message::user("x")];

        assert_eq!(provider.chat(&messages).await.unwrap(), "a");
        assert_eq!(provider.chat(&messages).await.unwrap(), "b");
        assert!(matches!(
            provider.chat(&messages).await,
            Err(ProviderError::EmptyResponse)
        ));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_responder_sees_messages() {
        let provider = ScriptedProvider::with_responder(|messages| {
            Ok(format!("{} messages", messages.len()))
        });

        let reply = provider
            .chat(&[Message::system("s"), Message::user("u")])
            .await
            .unwrap();

        assert_eq!(reply, "2 messages");
        assert_eq!(provider.calls()[0][1].content, "u");
        assert_eq!(provider.remaining(), 0);
    }
}
