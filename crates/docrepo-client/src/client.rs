//! Client handle

use std::sync::Arc;

use docrepo_error::{ClientError, ClientResult};
use tracing::info;

use crate::automation::Automation;
use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::context::ClientContext;
use crate::invocation::Invoker;
use crate::marshaller::Marshaller;
use crate::repository::Repository;
use crate::transport::{HttpTransport, Transport};

/// Entry point of the library.
///
/// Cloning is cheap and every clone shares the same transport, context,
/// marshallers and cache, so one client can serve any number of tasks.
/// Setters take `&self` and apply to calls started afterwards; see
/// [`crate::context`] for what in-flight calls observe.
#[derive(Debug, Clone)]
pub struct DocRepoClient {
    config: Arc<ClientConfig>,
    invoker: Invoker,
}

impl DocRepoClient {
    /// Client talking HTTP to the configured server
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config
            .validate()
            .map_err(|e| ClientError::transport(format!("Invalid configuration: {}", e)))?;
        let transport = HttpTransport::new(&config)?;
        info!(endpoint = transport.endpoint(), "Repository client created");
        Self::with_transport(config, Arc::new(transport))
    }

    /// Client over any transport, e.g. [`crate::mock::MockRepositoryServer`].
    ///
    /// Callback-mode calls run on the tokio runtime this is called from. Outside
    /// of a runtime a shared background runtime is started for them.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> ClientResult<Self> {
        let context = Arc::new(ClientContext::from_config(&config));
        Ok(Self {
            config: Arc::new(config),
            invoker: Invoker::new(transport, context)?,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        self.invoker.context()
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Start building a call to the automation operation `id`
    pub fn automation(&self, id: impl Into<String>) -> Automation {
        Automation::new(self.invoker.clone(), id)
    }

    pub fn repository(&self) -> Repository {
        Repository::new(self.invoker.clone())
    }

    pub fn enable_cache(&self) -> &Self {
        self.context().set_cache_enabled(true);
        self
    }

    pub fn disable_cache(&self) -> &Self {
        self.context().set_cache_enabled(false);
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        self.context().cache()
    }

    /// Register a marshaller; replaces any other for the same tag or type
    pub fn register_marshaller(&self, marshaller: impl Marshaller + 'static) -> &Self {
        self.context().marshallers().register(Arc::new(marshaller));
        self
    }

    /// Drop custom marshallers and restore the built-in ones
    pub fn clear_marshallers(&self) -> &Self {
        self.context().marshallers().unregister_all();
        self
    }

    /// Replace the active document enrichers
    pub fn enrichers<I, S>(&self, enrichers: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context()
            .set_enrichers(enrichers.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the active schemas; an empty list lets the server decide
    pub fn schemas<I, S>(&self, schemas: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context()
            .set_schemas(schemas.into_iter().map(Into::into).collect());
        self
    }

    /// Target `repository_name` instead of the server default
    pub fn repository_name(&self, repository_name: impl Into<String>) -> &Self {
        self.context().set_repository_name(Some(repository_name.into()));
        self
    }

    /// Target the server default repository again
    pub fn default_repository(&self) -> &Self {
        self.context().set_repository_name(None);
        self
    }
}
