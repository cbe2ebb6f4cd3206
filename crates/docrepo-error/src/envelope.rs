// Remote error envelope
// The structured body a server sends along with a failure status

use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Server-side exception body.
///
/// ```json
/// {"entity-type": "exception", "status": 404, "message": "...", "stacktrace": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteErrorEnvelope {
    #[serde(rename = "entity-type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    pub message: String,

    #[serde(default, alias = "stackTrace", skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
}

impl RemoteErrorEnvelope {
    /// Create an envelope for the given status and message
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            entity_type: Some("exception".to_string()),
            status: Some(status),
            message: message.into(),
            stacktrace: None,
        }
    }

    /// Attach a stack trace
    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    /// Convert into a client error; `http_status` is the status actually
    /// observed on the response.
    pub fn into_error(self, http_status: u16) -> ClientError {
        ClientError::Remote {
            status: http_status,
            message: self.message,
            remote_stack_trace: self.stacktrace,
        }
    }
}
