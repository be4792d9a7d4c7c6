//! Role-tagged messages and the conversation value sent to a provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the whole conversation.
    System,
    /// Caller input.
    User,
    /// Model output.
    Assistant,
}

impl Role {
    /// Returns the wire name of the role.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered, append-only conversation.
///
/// Grows by value: [`with_user`](Self::with_user) consumes the conversation
/// and returns it with one more message, so each retry carries everything
/// that came before it.
///
/// # Examples
///
/// ```
/// use cs_llm::{Conversation, Role};
///
/// let conversation = Conversation::new("Be precise.", "List three primes.")
///     .with_user("Use JSON.");
/// assert_eq!(conversation.len(), 3);
/// assert_eq!(conversation.messages()[0].role, Role::System);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Starts a conversation with one system and one user message.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    /// Returns the conversation extended by a user message.
    #[must_use]
    pub fn with_user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Returns the messages in order.
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the conversation holds no messages.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Total characters across all messages, for logging request size.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_with_user_appends_in_order() {
        let conversation = Conversation::new("sys", "first").with_user("second");
        let contents: Vec<_> = conversation
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, ["sys", "first", "second"]);
        assert_eq!(conversation.messages()[2].role, Role::User);
    }

    #[test]
    fn test_char_count() {
        let conversation = Conversation::new("ab", "cde");
        assert_eq!(conversation.char_count(), 5);
    }
}
