use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("upstream request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Whether a fresh attempt of the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http { status, .. } => is_retryable_status(*status),
            LlmError::Timeout | LlmError::Transport(_) => true,
            LlmError::InvalidResponse(_) | LlmError::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::Transport(err)
        }
    }
}

/// HTTP statuses worth retrying: request timeout, rate limiting and server faults
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable_status(status), "{status} should retry");
        }
        for status in [200, 400, 401, 403, 404, 422] {
            assert!(!is_retryable_status(status), "{status} should not retry");
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Timeout.is_transient());
        assert!(LlmError::Http { status: 503, body: String::new() }.is_transient());
        assert!(!LlmError::Http { status: 401, body: String::new() }.is_transient());
        assert!(!LlmError::InvalidResponse("bad".into()).is_transient());
        assert!(!LlmError::Config("missing".into()).is_transient());
    }
}
