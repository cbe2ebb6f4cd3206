//! Invocation Engine
//!
//! Turns an [`Operation`] into a wire request, sends it through the
//! transport and decodes the response into exactly one
//! [`OperationResult`] variant. The engine never retries and never touches
//! the response cache; the repository facade owns cache interaction.
//!
//! Two calling modes are offered:
//!
//! * [`Invoker::execute`]: awaited; suspends only the calling task until the
//!   decoded result or the error is ready.
//! * [`Invoker::execute_with_callback`]: returns at once; the call runs on a
//!   spawned tokio task and exactly one of the callback's methods fires,
//!   exactly once. Tasks go to the runtime the client was built in, or to a
//!   shared background runtime when it was built outside of one, so plain
//!   threads can use this mode too.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use docrepo_error::{ClientError, ClientResult};
use docrepo_types::blob::OCTET_STREAM;
use docrepo_types::{entity_types, Blob, OperationResult};
use serde_json::{json, Map, Value};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::context::{ClientContext, ContextState};
use crate::marshaller::Payload;
use crate::operation::Operation;
use crate::transport::multipart;
use crate::transport::{
    Transport, WireRequest, WireResponse, AUTOMATION_CONTENT_TYPE, CONTENT_TYPE_HEADER,
    ENRICHERS_HEADER, REPOSITORY_HEADER, SCHEMAS_HEADER,
};

//-----------------------------------------------------------------------------
// Completion Callbacks
//-----------------------------------------------------------------------------

/// Completion handler for callback-mode calls.
///
/// Both methods consume the callback, so at most one of them can run.
pub trait Callback<T>: Send + 'static {
    fn on_success(self, result: T);

    fn on_failure(self, error: ClientError);
}

/// Callback assembled from two closures
pub struct FnCallback<S, F> {
    on_success: S,
    on_failure: F,
}

/// Build a callback from a success and a failure closure
pub fn callback<T, S, F>(on_success: S, on_failure: F) -> FnCallback<S, F>
where
    S: FnOnce(T) + Send + 'static,
    F: FnOnce(ClientError) + Send + 'static,
{
    FnCallback { on_success, on_failure }
}

impl<T, S, F> Callback<T> for FnCallback<S, F>
where
    S: FnOnce(T) + Send + 'static,
    F: FnOnce(ClientError) + Send + 'static,
{
    fn on_success(self, result: T) {
        (self.on_success)(result)
    }

    fn on_failure(self, error: ClientError) {
        (self.on_failure)(error)
    }
}

/// Deliver the outcome through a channel; a dropped receiver is ignored
impl<T: Send + 'static> Callback<T> for oneshot::Sender<ClientResult<T>> {
    fn on_success(self, result: T) {
        let _ = self.send(Ok(result));
    }

    fn on_failure(self, error: ClientError) {
        let _ = self.send(Err(error));
    }
}

/// Background runtime for clients built outside of any tokio runtime
static BACKGROUND_RUNTIME: OnceLock<std::io::Result<Runtime>> = OnceLock::new();

/// Handle of the current runtime, or of the shared background one
fn runtime_handle() -> ClientResult<Handle> {
    if let Ok(handle) = Handle::try_current() {
        return Ok(handle);
    }
    let runtime = BACKGROUND_RUNTIME.get_or_init(|| {
        debug!("Starting background runtime for callback-mode calls");
        Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("docrepo-callback")
            .enable_all()
            .build()
    });
    match runtime {
        Ok(runtime) => Ok(runtime.handle().clone()),
        Err(e) => Err(ClientError::transport(format!("Failed to start async runtime: {}", e))),
    }
}

//-----------------------------------------------------------------------------
// Invoker
//-----------------------------------------------------------------------------

/// Executes operations against one transport under one client context
#[derive(Clone)]
pub struct Invoker {
    transport: Arc<dyn Transport>,
    context: Arc<ClientContext>,
    runtime: Handle,
}

impl Invoker {
    /// Bind to the caller's runtime, starting a background one if there is none
    pub fn new(transport: Arc<dyn Transport>, context: Arc<ClientContext>) -> ClientResult<Self> {
        Ok(Self {
            transport,
            context,
            runtime: runtime_handle()?,
        })
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        &self.context
    }

    /// Execute and wait for the decoded result
    pub async fn execute(&self, operation: &Operation) -> ClientResult<OperationResult> {
        let state = self.context.snapshot().with_overrides(operation.context());
        let request = self.encode(operation, &state)?;
        debug!(operation = operation.id(), "Executing operation");
        self.send(request).await
    }

    /// Execute on a spawned task; returns immediately
    pub fn execute_with_callback<C>(&self, operation: Operation, callback: C) -> JoinHandle<()>
    where
        C: Callback<OperationResult>,
    {
        let invoker = self.clone();
        self.spawn_with_callback(async move { invoker.execute(&operation).await }, callback)
    }

    /// Run `call` on the bound runtime and report its outcome to `callback`
    pub(crate) fn spawn_with_callback<T, Fut, C>(&self, call: Fut, callback: C) -> JoinHandle<()>
    where
        T: Send + 'static,
        Fut: std::future::Future<Output = ClientResult<T>> + Send + 'static,
        C: Callback<T>,
    {
        self.runtime.spawn(async move {
            match call.await {
                Ok(result) => callback.on_success(result),
                Err(error) => callback.on_failure(error),
            }
        })
    }

    /// Build the wire request of an automation call
    pub fn encode(&self, operation: &Operation, state: &ContextState) -> ClientResult<WireRequest> {
        let mut envelope = Map::new();
        envelope.insert("params".to_string(), Value::Object(operation.params().clone()));
        envelope.insert("context".to_string(), json!({}));

        let route = format!("automation/{}", operation.id());
        let request = with_context_headers(WireRequest::post(route), state);

        match operation.input() {
            Some(input) if input.is_binary() => {
                Ok(request.with_multipart(Value::Object(envelope), input.blobs()))
            }
            Some(input) => {
                let encoded = self.context.marshallers().encode(input)?;
                envelope.insert("input".to_string(), encoded);
                Ok(request
                    .with_header(CONTENT_TYPE_HEADER, AUTOMATION_CONTENT_TYPE)
                    .with_json(Value::Object(envelope)))
            }
            None => Ok(request
                .with_header(CONTENT_TYPE_HEADER, AUTOMATION_CONTENT_TYPE)
                .with_json(Value::Object(envelope))),
        }
    }

    /// Send a request and decode the response
    pub async fn send(&self, request: WireRequest) -> ClientResult<OperationResult> {
        let response = self.invoke(request).await?;
        self.decode(response)
    }

    /// Send a request through the transport, undecoded
    pub async fn invoke(&self, request: WireRequest) -> ClientResult<WireResponse> {
        let route = request.route();
        let started = Instant::now();
        let response = self.transport.send(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &response {
            Ok(response) => {
                debug!(route = %route, status = response.status, elapsed_ms, "Response received")
            }
            Err(error) => warn!(route = %route, error = %error, elapsed_ms, "Transport failure"),
        }
        response
    }

    /// Map a complete response onto one result variant.
    ///
    /// Error statuses become remote errors. A response with no body, a 204,
    /// a JSON `null` or `{}` is a void result. Multipart bodies decode as
    /// blobs, attachments and other non-JSON bodies as a single blob, and
    /// JSON bodies by their entity-type tag.
    pub fn decode(&self, response: WireResponse) -> ClientResult<OperationResult> {
        if !response.is_success() {
            let error = ClientError::from_response(response.status, &response.body);
            debug!(status = response.status, error = %error, "Remote error");
            return Err(error);
        }

        if response.status == 204 || response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(OperationResult::Void);
        }

        let marshallers = self.context.marshallers();

        if response.is_multipart() {
            let content_type = response.content_type.as_deref().unwrap_or_default();
            let blobs = multipart::decode(content_type, &response.body)?
                .into_iter()
                .map(multipart::Part::into_blob)
                .collect();
            return marshallers.decode(entity_types::BLOBS, Payload::Parts(blobs));
        }

        if response.is_json() && response.filename.is_none() {
            let body: Value = serde_json::from_slice(&response.body)
                .map_err(|e| ClientError::decoding(format!("Invalid JSON response: {}", e)))?;
            return match body.get("entity-type").and_then(Value::as_str) {
                Some(tag) => {
                    let tag = tag.to_string();
                    marshallers.decode(&tag, Payload::Json(body))
                }
                None if body.is_null() || body.as_object().map(Map::is_empty).unwrap_or(false) => {
                    Ok(OperationResult::Void)
                }
                None => Err(ClientError::decoding("JSON response carries no entity-type")),
            };
        }

        marshallers.decode(entity_types::BLOB, Payload::Binary(into_blob(response)))
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker").field("context", &self.context).finish_non_exhaustive()
    }
}

fn into_blob(response: WireResponse) -> Blob {
    let mime_type = response.content_type.unwrap_or_else(|| OCTET_STREAM.to_string());
    let blob = Blob::new(response.body, mime_type);
    match response.filename {
        Some(filename) => blob.with_filename(filename),
        None => blob,
    }
}

/// Attach the repository, enricher and schema headers of `state`
pub(crate) fn with_context_headers(mut request: WireRequest, state: &ContextState) -> WireRequest {
    if let Some(repository_name) = &state.repository_name {
        request = request.with_header(REPOSITORY_HEADER, repository_name.clone());
    }
    if !state.enrichers.is_empty() {
        request = request.with_header(ENRICHERS_HEADER, join(&state.enrichers));
    }
    if !state.schemas.is_empty() {
        request = request.with_header(SCHEMAS_HEADER, join(&state.schemas));
    }
    request
}

fn join(values: &std::collections::BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}
