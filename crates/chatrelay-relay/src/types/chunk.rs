use serde::{Deserialize, Serialize};

/// Server → client envelope for one step of a chat turn
///
/// A turn emits zero or more `content` chunks, at most one `error`, then
/// exactly one `done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamChunk {
    Content { data: String },
    Error { error: String },
    Done,
}

impl StreamChunk {
    pub fn content(data: impl Into<String>) -> Self {
        Self::Content { data: data.into() }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error { error: error.into() }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_value(StreamChunk::content("Hi")).unwrap(),
            json!({"type": "content", "data": "Hi"})
        );
        assert_eq!(
            serde_json::to_value(StreamChunk::error("Generation aborted")).unwrap(),
            json!({"type": "error", "error": "Generation aborted"})
        );
        assert_eq!(serde_json::to_value(StreamChunk::Done).unwrap(), json!({"type": "done"}));
    }
}
