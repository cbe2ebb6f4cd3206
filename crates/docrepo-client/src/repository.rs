//! Repository Facade
//!
//! Document verbs expressed as requests through the invocation engine.
//! Every request carries the active repository name, enrichers and schemas.
//! Fetching the root, a path or an id goes through the response cache when
//! caching is enabled; every other verb always goes to the network and
//! leaves the cache untouched, so a cached read may be stale after an update
//! until [`Repository::refresh_cache`] is called.

use docrepo_error::{ClientError, ClientResult};
use docrepo_types::{Acp, Audit, Blob, Document, Documents, OperationResult};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::Fingerprint;
use crate::context::ContextState;
use crate::invocation::{with_context_headers, Callback, Invoker};
use crate::operation::Operation;
use crate::transport::WireRequest;

/// Automation operation backing [`Repository::query`]
pub const QUERY_OPERATION: &str = "Repository.Query";

#[derive(Debug, Clone)]
pub struct Repository {
    invoker: Invoker,
    repository_name: Option<String>,
}

impl Repository {
    pub(crate) fn new(invoker: Invoker) -> Self {
        Self {
            invoker,
            repository_name: None,
        }
    }

    /// Facade bound to `repository_name`, whatever the client context says
    pub fn repository_name(mut self, repository_name: impl Into<String>) -> Self {
        self.repository_name = Some(repository_name.into());
        self
    }

    fn state(&self) -> ContextState {
        let mut state = self.invoker.context().snapshot();
        if let Some(repository_name) = &self.repository_name {
            state.repository_name = Some(repository_name.clone());
        }
        state
    }

    fn route(&self, state: &ContextState, resource: &str) -> String {
        match &state.repository_name {
            Some(name) => format!("repo/{}/{}", name, resource),
            None => resource.to_string(),
        }
    }

    //-------------------------------------------------------------------------
    // Cached fetches
    //-------------------------------------------------------------------------

    pub async fn fetch_document_root(&self) -> ClientResult<Document> {
        self.fetch_cached("path/").await
    }

    /// Fetch by path; `folder_1/note_0` and `/folder_1/note_0` are the same
    pub async fn fetch_document_by_path(&self, path: &str) -> ClientResult<Document> {
        self.fetch_cached(&format!("path/{}", path.trim_start_matches('/'))).await
    }

    pub async fn fetch_document_by_id(&self, id: &str) -> ClientResult<Document> {
        self.fetch_cached(&format!("id/{}", id)).await
    }

    /// Fetch the root on a spawned task and report to `callback`
    pub fn fetch_document_root_with_callback<C>(&self, callback: C) -> JoinHandle<()>
    where
        C: Callback<Document>,
    {
        let repository = self.clone();
        self.invoker
            .spawn_with_callback(async move { repository.fetch_document_root().await }, callback)
    }

    /// Fetch by path on a spawned task and report to `callback`
    pub fn fetch_document_by_path_with_callback<C>(&self, path: &str, callback: C) -> JoinHandle<()>
    where
        C: Callback<Document>,
    {
        let repository = self.clone();
        let path = path.to_string();
        self.invoker.spawn_with_callback(
            async move { repository.fetch_document_by_path(&path).await },
            callback,
        )
    }

    async fn fetch_cached(&self, resource: &str) -> ClientResult<Document> {
        let state = self.state();
        let request = with_context_headers(WireRequest::get(self.route(&state, resource)), &state);

        if !state.cache_enabled {
            return self.invoker.send(request).await?.into_document();
        }

        let cache = self.invoker.context().cache();
        let fingerprint = Fingerprint::compute(
            &request.route(),
            &Value::Null,
            state.repository_name.as_deref(),
            state.enrichers.iter().map(String::as_str),
        );
        if let Some(hit) = cache.get(&fingerprint) {
            debug!(route = %request.route(), "Served from cache");
            return hit.into_document();
        }

        let document = self.invoker.send(request).await?.into_document()?;
        cache.put(fingerprint, OperationResult::Document(Box::new(document.clone())));
        Ok(document)
    }

    /// Empty the response cache; the next fetch goes to the network
    pub fn refresh_cache(&self) -> &Self {
        debug!(entries = self.invoker.context().cache().size(), "Refreshing cache");
        self.invoker.context().cache().clear();
        self
    }

    //-------------------------------------------------------------------------
    // Network-only verbs
    //-------------------------------------------------------------------------

    async fn send(
        &self,
        request: WireRequest,
        state: &ContextState,
    ) -> ClientResult<OperationResult> {
        self.invoker.send(with_context_headers(request, state)).await
    }

    /// Create `document` under the folder at `parent_path`
    pub async fn create_document_by_path(
        &self,
        parent_path: &str,
        document: &Document,
    ) -> ClientResult<Document> {
        let state = self.state();
        let route = self.route(&state, &format!("path/{}", parent_path.trim_start_matches('/')));
        self.send(WireRequest::post(route).with_json(to_body(document)?), &state)
            .await?
            .into_document()
    }

    /// Create `document` under the folder with id `parent_id`
    pub async fn create_document_by_id(
        &self,
        parent_id: &str,
        document: &Document,
    ) -> ClientResult<Document> {
        let state = self.state();
        let route = self.route(&state, &format!("id/{}", parent_id));
        self.send(WireRequest::post(route).with_json(to_body(document)?), &state)
            .await?
            .into_document()
    }

    /// Push `document`'s properties to the server; returns the stored state
    pub async fn update_document(&self, document: &Document) -> ClientResult<Document> {
        let uid = require_uid(document)?;
        let state = self.state();
        let route = self.route(&state, &format!("id/{}", uid));
        self.send(WireRequest::put(route).with_json(to_body(document)?), &state)
            .await?
            .into_document()
    }

    pub async fn delete_document(&self, document: &Document) -> ClientResult<()> {
        self.delete_document_by_id(require_uid(document)?).await
    }

    pub async fn delete_document_by_id(&self, id: &str) -> ClientResult<()> {
        let state = self.state();
        let route = self.route(&state, &format!("id/{}", id));
        self.send(WireRequest::delete(route), &state).await.map(|_| ())
    }

    /// Run an NXQL query; `total_size` is what the server reports
    pub async fn query(&self, nxql: &str) -> ClientResult<Documents> {
        let mut operation = Operation::builder(QUERY_OPERATION).param("query", nxql);
        if let Some(repository_name) = &self.repository_name {
            operation = operation.repository_name(repository_name.clone());
        }
        self.invoker.execute(&operation.build()).await?.into_documents()
    }

    pub async fn fetch_children(&self, document: &Document) -> ClientResult<Documents> {
        self.fetch_adapter(document, "@children").await?.into_documents()
    }

    pub async fn fetch_acp(&self, document: &Document) -> ClientResult<Acp> {
        self.fetch_adapter(document, "@acl").await?.into_acp()
    }

    pub async fn fetch_audit(&self, document: &Document) -> ClientResult<Audit> {
        self.fetch_adapter(document, "@audit").await?.into_audit()
    }

    /// Main content blob (`file:content`) of `document`
    pub async fn fetch_blob(&self, document: &Document) -> ClientResult<Blob> {
        self.fetch_adapter(document, "@blob/file:content").await?.into_blob()
    }

    async fn fetch_adapter(
        &self,
        document: &Document,
        adapter: &str,
    ) -> ClientResult<OperationResult> {
        let uid = require_uid(document)?;
        let state = self.state();
        let route = self.route(&state, &format!("id/{}/{}", uid, adapter));
        self.send(WireRequest::get(route), &state).await
    }
}

fn require_uid(document: &Document) -> ClientResult<&str> {
    document
        .id()
        .ok_or_else(|| ClientError::encoding("document has no uid; fetch or create it first"))
}

fn to_body(document: &Document) -> ClientResult<Value> {
    serde_json::to_value(document)
        .map_err(|e| ClientError::encoding(format!("Failed to encode document: {}", e)))
}
