//! Document Repository Types: the data model shared by the client crates.
//!
//! This crate holds the values that travel between application code and the
//! wire: documents and document lists, blobs, record sets, audit entries,
//! access control, document references, operation inputs, and the
//! polymorphic operation result.
//!
//! ## Module Organization
//!
//! * **Documents**: single documents, paged document lists (`document`)
//! * **References**: document references used as operation input (`reference`)
//! * **Blobs**: binary content with its metadata (`blob`)
//! * **Audit / ACP / Record sets**: secondary result shapes (`audit`, `acl`, `record_set`)
//! * **Business objects**: registered custom types (`object`)
//! * **Operation values**: inputs and tagged results (`operation`)

pub mod acl;
pub mod audit;
pub mod blob;
pub mod document;
pub mod object;
pub mod operation;
pub mod record_set;
pub mod reference;

pub use acl::{Ace, Acl, Acp};
pub use audit::{Audit, LogEntry};
pub use blob::Blob;
pub use document::{Document, Documents};
pub use object::EntityObject;
pub use operation::{OperationInput, OperationResult};
pub use record_set::RecordSet;
pub use reference::{DocRef, DocRefs};

/// Entity-type tags the server puts on response bodies
pub mod entity_types {
    pub const DOCUMENT: &str = "document";
    pub const DOCUMENTS: &str = "documents";
    pub const RECORD_SET: &str = "recordSet";
    pub const AUDIT: &str = "audit";
    pub const ACLS: &str = "acls";
    pub const EXCEPTION: &str = "exception";

    /// Assigned by the client to a single binary response body
    pub const BLOB: &str = "blob";
    /// Assigned by the client to a multipart response body
    pub const BLOBS: &str = "blobs";
}
