// Document Repository Client Error Handling
// Central location for the client error taxonomy and its helpers

use thiserror::Error;

// Re-export common error handling tools for convenience
pub use anyhow;
pub use thiserror;

// Module structure
mod common;
mod envelope;

// Public exports
pub use common::*; // Helper constructors such as not_found_error
pub use envelope::RemoteErrorEnvelope;

/// Standard Result type for every client call
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Every failure the client surfaces to a caller.
///
/// The invocation engine translates each failure path into exactly one of
/// these values. Nothing is retried and nothing is swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Connection or timeout failure, no server response was received
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The server answered with a non-success status
    #[error("Remote error ({status}): {message}")]
    Remote {
        status: u16,
        message: String,
        remote_stack_trace: Option<String>,
    },

    /// The response body matched no known entity type or marshaller
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// The operation input has no resolvable marshaller
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl ClientError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport {
            message: message.into(),
        }
    }

    /// Create a remote error without a stack trace
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        ClientError::Remote {
            status,
            message: message.into(),
            remote_stack_trace: None,
        }
    }

    /// Create a decoding error
    pub fn decoding(message: impl Into<String>) -> Self {
        ClientError::Decoding(message.into())
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        ClientError::Encoding(message.into())
    }

    /// Build a remote error from an error response body.
    ///
    /// The structured envelope is used when the body parses as one; any
    /// other body becomes the message verbatim. The HTTP status always wins
    /// over a status embedded in the envelope.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<RemoteErrorEnvelope>(body) {
            Ok(envelope) => envelope.into_error(status),
            Err(_) => {
                let text = String::from_utf8_lossy(body).into_owned();
                tracing::debug!(status, "error body is not a structured envelope");
                let message = if text.trim().is_empty() {
                    format!("HTTP status {}", status)
                } else {
                    text
                };
                ClientError::remote(status, message)
            }
        }
    }

    /// Status code of a remote error, preserved verbatim
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            ClientError::Transport { message } => message,
            ClientError::Remote { message, .. } => message,
            ClientError::Decoding(message) | ClientError::Encoding(message) => message,
        }
    }

    /// Stack trace text reported by the server, if any
    pub fn remote_stack_trace(&self) -> Option<&str> {
        match self {
            ClientError::Remote {
                remote_stack_trace, ..
            } => remote_stack_trace.as_deref(),
            _ => None,
        }
    }

    /// Whether the server reported the target as missing
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns a unique static string code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "CLIENT_TRANSPORT",
            ClientError::Remote { status: 404, .. } => "CLIENT_REMOTE_NOT_FOUND",
            ClientError::Remote { .. } => "CLIENT_REMOTE",
            ClientError::Decoding(_) => "CLIENT_DECODING",
            ClientError::Encoding(_) => "CLIENT_ENCODING",
        }
    }

    /// Indicates if retrying might succeed.
    ///
    /// Informational only, the client itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport { .. } => true,
            ClientError::Remote { status, .. } => matches!(status, 502 | 503 | 504),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_body_is_decoded() {
        let body = br#"{"entity-type":"exception","status":404,
            "message":"Document not found","stacktrace":"at Foo.bar"}"#;
        let err = ClientError::from_response(404, body);

        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Document not found");
        assert_eq!(err.remote_stack_trace(), Some("at Foo.bar"));
        assert_eq!(err.error_code(), "CLIENT_REMOTE_NOT_FOUND");
    }

    #[test]
    fn test_plain_body_is_kept_verbatim() {
        let err = ClientError::from_response(500, b"  internal failure \n");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.message(), "  internal failure \n");
        assert_eq!(err.remote_stack_trace(), None);
    }

    #[test]
    fn test_empty_body_gets_status_message() {
        let err = ClientError::from_response(503, b"");
        assert_eq!(err.message(), "HTTP status 503");
        assert!(err.is_transient());
    }

    #[test]
    fn test_http_status_wins_over_envelope_status() {
        let body = br#"{"status":500,"message":"wrapped"}"#;
        let err = ClientError::from_response(404, body);
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_only_remote_errors_carry_status() {
        assert_eq!(ClientError::transport("refused").status(), None);
        assert_eq!(ClientError::decoding("bad tag").status(), None);
        assert!(!ClientError::encoding("no marshaller").is_transient());
        assert!(ClientError::transport("timeout").is_transient());
    }
}
