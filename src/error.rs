use thiserror::Error;

/// Failures that end a request. The `Display` text is what the user sees
/// after the `❌ Error: ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The server answered with a non-2xx status. The body is never read.
    #[error("Server returned {status}")]
    Transport { status: u16 },

    /// The request never produced a response (connection refused, DNS, ...).
    #[error("{0}")]
    Network(String),

    /// Reading the response body failed part way through.
    #[error("{0}")]
    Stream(String),
}

impl ChatError {
    pub fn user_message(&self) -> String {
        format!("❌ Error: {}", self)
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ChatError::Transport { status: status.as_u16() }
        } else if err.is_body() || err.is_decode() {
            ChatError::Stream(err.to_string())
        } else {
            ChatError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_mentions_status() {
        let err = ChatError::Transport { status: 503 };
        assert_eq!(err.user_message(), "❌ Error: Server returned 503");
    }

    #[test]
    fn test_stream_error_passes_message_through() {
        let err = ChatError::Stream("connection reset".to_string());
        assert_eq!(err.user_message(), "❌ Error: connection reset");
    }
}
