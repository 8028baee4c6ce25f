use chatrelay_llm::{Message, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored transcript entry; immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Everything a caller supplies for a new entry; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl NewChatMessage {
    /// Create a message stamped with the current time and no generation metadata
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Record the settings the turn ran with
    pub fn with_generation(mut self, model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        self.model = Some(model.into());
        self.temperature = Some(temperature);
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// Conversion: ChatMessage → prompt context
impl From<&ChatMessage> for Message {
    fn from(message: &ChatMessage) -> Self {
        Message::new(message.role, message.content.clone())
    }
}

impl From<ChatMessage> for Message {
    fn from(message: ChatMessage) -> Self {
        Message::new(message.role, message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_generation_stamps_metadata() {
        let message = NewChatMessage::user("hi").with_generation("gpt-4o", 0.5, 256);
        assert_eq!(message.role, Role::User);
        assert_eq!(message.model.as_deref(), Some("gpt-4o"));
        assert_eq!(message.temperature, Some(0.5));
        assert_eq!(message.max_tokens, Some(256));
    }

    #[test]
    fn test_into_prompt_message() {
        let stored = ChatMessage {
            id: 7,
            role: Role::Assistant,
            content: "answer".into(),
            timestamp: Utc::now(),
            model: None,
            temperature: None,
            max_tokens: None,
        };
        assert_eq!(Message::from(&stored), Message::assistant("answer"));
    }
}
