//! Error types for the debate relay.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Invalid base64 audio data: {0}")]
    Decode(String),

    #[error("Gemini API blocked the request: {reason}")]
    BlockedContent { reason: String },

    #[error("Error generating response from Gemini API: {0}")]
    Generation(String),

    #[error("{message}")]
    Synthesis {
        /// HTTP status returned by the synthesis provider, if it answered at all.
        status: Option<u16>,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DebateError {
    /// Whether the failure was caused by the caller's input rather than by
    /// this service or one of its providers.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DebateError::Decode(_) | DebateError::BlockedContent { .. } | DebateError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_message_carries_reason() {
        let err = DebateError::BlockedContent {
            reason: "SAFETY".to_string(),
        };
        assert!(err.to_string().contains("SAFETY"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_provider_failures_are_server_errors() {
        let err = DebateError::Synthesis {
            status: Some(503),
            message: "Deepgram API Error: 503 - unavailable".to_string(),
        };
        assert!(!err.is_client_error());
        assert!(!DebateError::Generation("quota".into()).is_client_error());
    }
}
