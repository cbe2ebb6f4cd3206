//! Transport Layer
//!
//! The transport moves one request to the server and brings back one
//! response. It knows nothing about entity types or marshallers: encoding
//! happens before a [`WireRequest`] is built and decoding after a
//! [`WireResponse`] arrives. Retry and deadline policy, if any, belong to
//! the transport implementation; the invocation engine never retries.
//!
//! * [`HttpTransport`]: reqwest-backed transport against a live server
//! * [`crate::mock::MockRepositoryServer`]: in-memory server for tests

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use docrepo_error::ClientResult;
use docrepo_types::Blob;
use serde_json::Value;

pub mod http;
pub mod multipart;

pub use http::HttpTransport;

//-----------------------------------------------------------------------------
// Wire Constants
//-----------------------------------------------------------------------------

/// Repository the request targets
pub const REPOSITORY_HEADER: &str = "X-NXRepository";

/// Comma-separated enrichers to attach to document responses
pub const ENRICHERS_HEADER: &str = "X-NXenrichers.document";

/// Comma-separated schemas to include in document properties
pub const SCHEMAS_HEADER: &str = "X-NXDocumentProperties";

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Content type of an automation request envelope
pub const AUTOMATION_CONTENT_TYPE: &str = "application/json+nxrequest";

pub const JSON_CONTENT_TYPE: &str = "application/json";

//-----------------------------------------------------------------------------
// Request and Response
//-----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Body of an outgoing request
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// JSON request part followed by one part per blob
    Multipart { request: Value, blobs: Vec<Blob> },
}

/// One outgoing request, addressed relative to the API root
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl WireRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_multipart(mut self, request: Value, blobs: Vec<Blob>) -> Self {
        self.body = RequestBody::Multipart { request, blobs };
        self
    }

    /// First header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// `METHOD path`, for logs
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// One response, body fully received
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub body: Bytes,
}

impl WireResponse {
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type,
            filename: None,
            body: body.into(),
        }
    }

    /// JSON response
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(
            status,
            Some(JSON_CONTENT_TYPE.to_string()),
            body.to_string().into_bytes(),
        )
    }

    /// Response without a body
    pub fn empty(status: u16) -> Self {
        Self::new(status, None, Bytes::new())
    }

    /// Binary response carrying one blob
    pub fn blob(blob: &Blob) -> Self {
        Self {
            status: 200,
            content_type: Some(blob.mime_type().to_string()),
            filename: blob.filename().map(str::to_string),
            body: blob.data().clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().starts_with("multipart/"))
            .unwrap_or(false)
    }
}

//-----------------------------------------------------------------------------
// Transport Interface
//-----------------------------------------------------------------------------

/// Sends one request and returns the complete response.
///
/// Implementations report connection and timeout failures as
/// `ClientError::Transport`; any status the server answers with, success or
/// not, is returned as a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: WireRequest) -> ClientResult<WireResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = WireRequest::get("path/").with_header(REPOSITORY_HEADER, "test");
        assert_eq!(request.header("x-nxrepository"), Some("test"));
        assert_eq!(request.header(ENRICHERS_HEADER), None);
        assert_eq!(request.route(), "GET path/");
    }

    #[test]
    fn test_response_kinds() {
        let json = WireResponse::json(200, &json!({"entity-type": "document"}));
        assert!(json.is_json() && !json.is_multipart() && json.is_success());

        let multipart = WireResponse::new(
            200,
            Some("Multipart/Mixed; boundary=abc".to_string()),
            Bytes::new(),
        );
        assert!(multipart.is_multipart());

        let blob = WireResponse::blob(&Blob::new("data", "text/plain").with_filename("a.txt"));
        assert!(!blob.is_json());
        assert_eq!(blob.filename.as_deref(), Some("a.txt"));

        assert!(!WireResponse::empty(404).is_success());
    }
}
