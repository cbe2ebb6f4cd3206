//! Fluent entry point for automation calls bound to a client

use docrepo_error::ClientResult;
use docrepo_types::{OperationInput, OperationResult};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::invocation::{Callback, Invoker};
use crate::operation::{Operation, OperationBuilder};

/// Operation under construction, executable against its client
#[derive(Debug, Clone)]
pub struct Automation {
    invoker: Invoker,
    builder: OperationBuilder,
}

impl Automation {
    pub(crate) fn new(invoker: Invoker, id: impl Into<String>) -> Self {
        Self {
            invoker,
            builder: OperationBuilder::new(id),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.builder = self.builder.param(name, value);
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.builder = self.builder.params(params);
        self
    }

    pub fn input(mut self, input: impl Into<OperationInput>) -> Self {
        self.builder = self.builder.input(input);
        self
    }

    pub fn enrichers<I, S>(mut self, enrichers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builder = self.builder.enrichers(enrichers);
        self
    }

    pub fn schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builder = self.builder.schemas(schemas);
        self
    }

    pub fn repository_name(mut self, repository_name: impl Into<String>) -> Self {
        self.builder = self.builder.repository_name(repository_name);
        self
    }

    /// Freeze into a reusable descriptor
    pub fn build(self) -> Operation {
        self.builder.build()
    }

    pub async fn execute(self) -> ClientResult<OperationResult> {
        let operation = self.builder.build();
        self.invoker.execute(&operation).await
    }

    /// Execute on a spawned task and report to `callback`
    pub fn execute_with_callback<C>(self, callback: C) -> JoinHandle<()>
    where
        C: Callback<OperationResult>,
    {
        let operation = self.builder.build();
        self.invoker.execute_with_callback(operation, callback)
    }
}
