//! Configuration for the repository client

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Basic authentication credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:8080/nuxeo`
    pub base_url: String,

    /// API root below `base_url`
    pub api_path: String,

    /// Per-request timeout applied by the HTTP transport
    pub timeout_secs: u64,

    pub credentials: Option<Credentials>,

    /// Initial active repository; `None` targets the server default
    pub repository_name: Option<String>,

    /// Initial active document enrichers
    pub enrichers: Vec<String>,

    /// Initial active schemas; empty lets the server decide
    pub schemas: Vec<String>,

    /// Whether repository fetches go through the response cache
    pub cache_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/nuxeo".to_string(),
            api_path: "api/v1".to_string(),
            timeout_secs: 60,
            credentials: None,
            repository_name: None,
            enrichers: Vec::new(),
            schemas: Vec::new(),
            cache_enabled: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_repository_name(mut self, repository_name: impl Into<String>) -> Self {
        self.repository_name = Some(repository_name.into());
        self
    }

    pub fn with_enrichers<I, S>(mut self, enrichers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enrichers = enrichers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache(mut self, cache_enabled: bool) -> Self {
        self.cache_enabled = cache_enabled;
        self
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("Invalid client configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
        Self::from_toml_str(&source)
    }

    /// Reject configurations the client cannot start with
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            anyhow::bail!("base_url must be an http(s) URL, got '{}'", self.base_url);
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be positive");
        }
        Ok(())
    }

    /// Absolute API root, without trailing slash
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let api = self.api_path.trim_matches('/');
        if api.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, api)
        }
    }
}
