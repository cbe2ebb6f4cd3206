//! Document Repository Client: automation and repository access to a remote
//! document repository.
//!
//! The client invokes named server-side operations with typed parameters and
//! input and decodes their polymorphic results, offers the usual repository
//! verbs on top, and optionally caches fetched documents.
//!
//! ```no_run
//! # async fn demo() -> docrepo_client::ClientResult<()> {
//! use docrepo_client::{ClientConfig, DocRepoClient};
//!
//! let client = DocRepoClient::new(
//!     ClientConfig::new("http://localhost:8080/nuxeo")
//!         .with_credentials("Administrator", "Administrator"),
//! )?;
//! let folder = client.enable_cache().repository().fetch_document_by_path("folder_1").await?;
//! let notes = client.repository().fetch_children(&folder).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! * **Client**: entry point and shared context (`client`, `context`, `config`)
//! * **Automation**: operation descriptors and the invocation engine
//!   (`operation`, `automation`, `invocation`)
//! * **Marshalling**: entity-type and input-type marshallers (`marshaller`)
//! * **Repository**: document verbs and the response cache (`repository`, `cache`)
//! * **Transport**: HTTP and multipart plumbing (`transport`), in-memory server (`mock`)
//! * **Logging**: subscriber setup for applications (`logging`)

//-----------------------------------------------------------------------------
// Client and Context
//-----------------------------------------------------------------------------

pub mod client;
pub mod config;
pub mod context;

//-----------------------------------------------------------------------------
// Automation
//-----------------------------------------------------------------------------

pub mod automation;
pub mod invocation;
pub mod marshaller;
pub mod operation;

//-----------------------------------------------------------------------------
// Repository and Cache
//-----------------------------------------------------------------------------

pub mod cache;
pub mod repository;

//-----------------------------------------------------------------------------
// Transport and Support
//-----------------------------------------------------------------------------

pub mod logging;
pub mod mock;
pub mod transport;

pub use automation::Automation;
pub use cache::{Fingerprint, ResponseCache};
pub use client::DocRepoClient;
pub use config::{ClientConfig, Credentials};
pub use context::{ClientContext, ContextState};
pub use invocation::{callback, Callback, FnCallback, Invoker};
pub use marshaller::{Marshaller, MarshallerRegistry, ObjectMarshaller, Payload};
pub use operation::{ContextOptions, Operation, OperationBuilder};
pub use repository::Repository;
pub use transport::{HttpTransport, Transport, WireRequest, WireResponse};

pub use docrepo_error::{ClientError, ClientResult};
pub use docrepo_types::{
    Acp, Audit, Blob, DocRef, DocRefs, Document, Documents, EntityObject, OperationInput,
    OperationResult, RecordSet,
};
