//! Operation descriptors.
//!
//! An [`Operation`] describes one automation call and is immutable once
//! built, so it can be shared freely between tasks. Build a new one per call
//! through [`OperationBuilder`].

use std::collections::BTreeSet;

use docrepo_types::OperationInput;
use serde_json::{Map, Value};

/// Per-operation context overrides; `None` falls back to the client context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextOptions {
    pub enrichers: Option<BTreeSet<String>>,
    pub schemas: Option<BTreeSet<String>>,
    pub repository_name: Option<String>,
}

/// Immutable description of one automation call
#[derive(Debug, Clone)]
pub struct Operation {
    id: String,
    params: Map<String, Value>,
    input: Option<OperationInput>,
    context: ContextOptions,
}

impl Operation {
    pub fn builder(id: impl Into<String>) -> OperationBuilder {
        OperationBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parameters in insertion order
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn input(&self) -> Option<&OperationInput> {
        self.input.as_ref()
    }

    pub fn context(&self) -> &ContextOptions {
        &self.context
    }
}

/// Incremental builder for [`Operation`]
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    id: String,
    params: Map<String, Value>,
    input: Option<OperationInput>,
    context: ContextOptions,
}

impl OperationBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Map::new(),
            input: None,
            context: ContextOptions::default(),
        }
    }

    /// Set a parameter; setting an existing name keeps its original position
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in params {
            self.params.insert(name.into(), value.into());
        }
        self
    }

    pub fn input(mut self, input: impl Into<OperationInput>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn enrichers<I, S>(mut self, enrichers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.enrichers = Some(enrichers.into_iter().map(Into::into).collect());
        self
    }

    pub fn schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.schemas = Some(schemas.into_iter().map(Into::into).collect());
        self
    }

    pub fn repository_name(mut self, repository_name: impl Into<String>) -> Self {
        self.context.repository_name = Some(repository_name.into());
        self
    }

    pub fn build(self) -> Operation {
        Operation {
            id: self.id,
            params: self.params,
            input: self.input,
            context: self.context,
        }
    }
}
