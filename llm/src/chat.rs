//! Chat model abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// Instructions to the model.
    System,

    /// End-user input.
    User,

    /// A previous model reply.
    Assistant,
}

/// One message of a chat prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who the message is from.
    pub role: ChatRole,

    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Trait for generative chat backends.
///
/// Single shot: one prompt in, one completion out. Streaming, retries, and
/// tool use are out of scope; a failed call surfaces as an error for the
/// caller to report.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Generate a completion for the given messages, bounded to
    /// `max_output_tokens`.
    async fn generate(&self, messages: Vec<ChatMessage>, max_output_tokens: u32)
    -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_message_constructors() {
        let system = ChatMessage::system("rules");
        let user = ChatMessage::user("question");

        assert_eq!(system.role, ChatRole::System);
        assert_eq!(user.role, ChatRole::User);
        assert_eq!(user.content, "question");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let serialized = serde_json::to_string(&ChatRole::System).unwrap();
        assert_eq!(serialized, "\"system\"");
    }
}
