use serde::{Deserialize, Serialize};

/// Client → server frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Start a chat turn
    Message(TurnRequest),
    /// Stop the turn currently streaming, if any
    Abort,
}

/// One user message plus its per-turn overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Falls back to the current settings when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl TurnRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            command: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_frame() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"type":"message","content":"explain this","command":"/explain","temperature":0.3}"#,
        )
        .unwrap();

        match frame {
            ClientFrame::Message(turn) => {
                assert_eq!(turn.content, "explain this");
                assert_eq!(turn.command.as_deref(), Some("/explain"));
                assert_eq!(turn.temperature, Some(0.3));
                assert_eq!(turn.max_tokens, None);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_parse_abort_frame() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"abort"}"#).unwrap();
        assert_eq!(frame, ClientFrame::Abort);
    }

    #[test]
    fn test_reject_unknown_or_incomplete_frames() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"ping"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"message"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>(r#"{"content":"no type"}"#).is_err());
    }
}
