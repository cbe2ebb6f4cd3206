//! HTTP transport backed by reqwest

use std::time::{Duration, Instant};

use async_trait::async_trait;
use docrepo_error::{ClientError, ClientResult};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use super::multipart::{self, Part};
use super::{
    HttpMethod, RequestBody, Transport, WireRequest, WireResponse, AUTOMATION_CONTENT_TYPE,
    JSON_CONTENT_TYPE,
};
use crate::config::{ClientConfig, Credentials};

/// Transport talking to a live repository server over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client, shares its connection pool across clones
    http_client: HttpClient,

    /// Absolute API root
    endpoint: String,

    credentials: Option<Credentials>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint(),
            credentials: config.credentials.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WireRequest) -> ClientResult<WireResponse> {
        let url = self.url(&request.path);
        let started = Instant::now();

        let mut builder = self.http_client.request(Self::method(request.method), &url);
        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let explicit_content_type = request.header(CONTENT_TYPE.as_str()).map(str::to_string);
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => {
                if explicit_content_type.is_none() {
                    builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
                }
                builder.body(body.to_string())
            }
            RequestBody::Multipart { request: envelope, blobs } => {
                let boundary = multipart::new_boundary();
                let mut parts = Vec::with_capacity(blobs.len() + 1);
                let request_part = Part::new(AUTOMATION_CONTENT_TYPE, envelope.to_string())
                    .with_content_id("request");
                parts.push(request_part);
                parts.extend(blobs.iter().map(Part::from_blob));
                builder
                    .header(CONTENT_TYPE, multipart::related_content_type(&boundary))
                    .body(multipart::encode(&boundary, &parts))
            }
        };

        let response = builder.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Request failed");
            ClientError::transport(format!("Request to {} failed: {}", url, e))
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(multipart::filename_of);
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                ClientError::transport(format!("Failed to read response from {}: {}", url, e))
            })?;

        debug!(
            url = %url,
            status,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "HTTP exchange complete"
        );

        Ok(WireResponse {
            status,
            content_type,
            filename,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_endpoint_and_path() {
        let config = ClientConfig::new("http://localhost:8080/nuxeo/");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:8080/nuxeo/api/v1");
        assert_eq!(
            transport.url("/automation/Repository.GetDocument"),
            "http://localhost:8080/nuxeo/api/v1/automation/Repository.GetDocument"
        );
        assert_eq!(transport.url("path/"), "http://localhost:8080/nuxeo/api/v1/path/");
    }
}
