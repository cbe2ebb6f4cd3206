//! Client context.
//!
//! Mutable configuration shared by every call made through one client: the
//! active repository name, enrichers and schemas, the cache switch, plus the
//! marshaller registry and the response cache themselves.
//!
//! Every invocation takes a [`ContextState`] snapshot when it starts and
//! works from that copy. Mutating the context while other tasks are
//! mid-invocation is allowed: the last writer wins, and an in-flight call
//! observes either the old or the new configuration depending on whether
//! its snapshot was taken before or after the write. Callers that need a
//! particular configuration for a particular call should set it on the
//! operation instead.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::marshaller::MarshallerRegistry;
use crate::operation::ContextOptions;

/// Point-in-time copy of the mutable settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextState {
    pub repository_name: Option<String>,
    pub enrichers: BTreeSet<String>,
    pub schemas: BTreeSet<String>,
    pub cache_enabled: bool,
}

impl ContextState {
    /// Apply per-operation overrides on top of this snapshot
    pub fn with_overrides(mut self, options: &ContextOptions) -> Self {
        if let Some(enrichers) = &options.enrichers {
            self.enrichers = enrichers.clone();
        }
        if let Some(schemas) = &options.schemas {
            self.schemas = schemas.clone();
        }
        if let Some(repository_name) = &options.repository_name {
            self.repository_name = Some(repository_name.clone());
        }
        self
    }
}

#[derive(Debug, Default)]
pub struct ClientContext {
    state: RwLock<ContextState>,
    marshallers: MarshallerRegistry,
    cache: ResponseCache,
}

impl ClientContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let state = ContextState {
            repository_name: config.repository_name.clone(),
            enrichers: config.enrichers.iter().cloned().collect(),
            schemas: config.schemas.iter().cloned().collect(),
            cache_enabled: config.cache_enabled,
        };
        Self {
            state: RwLock::new(state),
            marshallers: MarshallerRegistry::new(),
            cache: ResponseCache::new(),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> ContextState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, apply: impl FnOnce(&mut ContextState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
    }

    pub fn set_repository_name(&self, repository_name: Option<String>) {
        debug!(repository = ?repository_name, "Active repository changed");
        self.update(|state| state.repository_name = repository_name);
    }

    pub fn set_enrichers(&self, enrichers: BTreeSet<String>) {
        debug!(?enrichers, "Active enrichers changed");
        self.update(|state| state.enrichers = enrichers);
    }

    pub fn set_schemas(&self, schemas: BTreeSet<String>) {
        debug!(?schemas, "Active schemas changed");
        self.update(|state| state.schemas = schemas);
    }

    pub fn set_cache_enabled(&self, cache_enabled: bool) {
        debug!(cache_enabled, "Cache switch changed");
        self.update(|state| state.cache_enabled = cache_enabled);
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.snapshot().cache_enabled
    }

    pub fn marshallers(&self) -> &MarshallerRegistry {
        &self.marshallers
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_from_config() {
        let config = ClientConfig::default()
            .with_repository_name("test")
            .with_enrichers(["acls"])
            .with_cache(true);
        let context = ClientContext::from_config(&config);
        let state = context.snapshot();

        assert_eq!(state.repository_name.as_deref(), Some("test"));
        assert!(state.enrichers.contains("acls"));
        assert!(state.cache_enabled);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_writes() {
        let context = ClientContext::new();
        let before = context.snapshot();
        context.set_enrichers(["breadcrumb".to_string()].into_iter().collect());
        context.set_cache_enabled(true);

        assert!(before.enrichers.is_empty());
        assert!(!before.cache_enabled);
        assert!(context.snapshot().enrichers.contains("breadcrumb"));
        assert!(context.is_cache_enabled());
    }

    #[test]
    fn test_operation_overrides_win() {
        let context = ClientContext::new();
        context.set_repository_name(Some("default".to_string()));
        context.set_schemas(["dublincore".to_string()].into_iter().collect());

        let options = ContextOptions {
            enrichers: Some(["acls".to_string()].into_iter().collect()),
            schemas: None,
            repository_name: Some("test".to_string()),
        };
        let effective = context.snapshot().with_overrides(&options);
        assert_eq!(effective.repository_name.as_deref(), Some("test"));
        assert!(effective.enrichers.contains("acls"));
        assert!(effective.schemas.contains("dublincore"));
    }
}
