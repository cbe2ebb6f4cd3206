//! Operation inputs and polymorphic operation results.

use std::any::{Any, TypeId};

use docrepo_error::{unexpected_result_error, ClientResult};
use serde_json::Value;

use crate::{Acp, Audit, Blob, DocRef, DocRefs, Document, Documents, EntityObject, RecordSet};

/// Typed input of an automation operation
#[derive(Debug, Clone)]
pub enum OperationInput {
    DocRef(DocRef),
    DocRefs(DocRefs),
    Document(Box<Document>),
    Blob(Blob),
    Blobs(Vec<Blob>),
    Value(Value),
    Object(EntityObject),
}

impl OperationInput {
    /// Short name of the input kind, for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            OperationInput::DocRef(_) => "docref",
            OperationInput::DocRefs(_) => "docrefs",
            OperationInput::Document(_) => "document",
            OperationInput::Blob(_) => "blob",
            OperationInput::Blobs(_) => "blobs",
            OperationInput::Value(_) => "value",
            OperationInput::Object(object) => object.type_name(),
        }
    }

    /// Whether the input travels as multipart binary content
    pub fn is_binary(&self) -> bool {
        matches!(self, OperationInput::Blob(_) | OperationInput::Blobs(_))
    }

    /// Blobs carried by a binary input
    pub fn blobs(&self) -> Vec<Blob> {
        match self {
            OperationInput::Blob(blob) => vec![blob.clone()],
            OperationInput::Blobs(blobs) => blobs.clone(),
            _ => Vec::new(),
        }
    }

    /// Discriminator used to look up the encoder; `None` for binary input
    pub fn discriminator(&self) -> Option<TypeId> {
        match self {
            OperationInput::DocRef(_) => Some(TypeId::of::<DocRef>()),
            OperationInput::DocRefs(_) => Some(TypeId::of::<DocRefs>()),
            OperationInput::Document(_) => Some(TypeId::of::<Document>()),
            OperationInput::Value(_) => Some(TypeId::of::<Value>()),
            OperationInput::Object(object) => Some(object.value_type_id()),
            OperationInput::Blob(_) | OperationInput::Blobs(_) => None,
        }
    }

    /// The wrapped value, type-erased for the encoder
    pub fn as_any(&self) -> Option<&dyn Any> {
        match self {
            OperationInput::DocRef(r) => Some(r as &dyn Any),
            OperationInput::DocRefs(r) => Some(r as &dyn Any),
            OperationInput::Document(d) => Some(&**d as &dyn Any),
            OperationInput::Value(v) => Some(v as &dyn Any),
            OperationInput::Object(object) => Some(object.value() as &dyn Any),
            OperationInput::Blob(_) | OperationInput::Blobs(_) => None,
        }
    }
}

impl From<DocRef> for OperationInput {
    fn from(reference: DocRef) -> Self {
        OperationInput::DocRef(reference)
    }
}

/// A plain string is a document reference (uid or path)
impl From<&str> for OperationInput {
    fn from(reference: &str) -> Self {
        OperationInput::DocRef(DocRef::from(reference))
    }
}

impl From<DocRefs> for OperationInput {
    fn from(references: DocRefs) -> Self {
        OperationInput::DocRefs(references)
    }
}

impl From<Document> for OperationInput {
    fn from(document: Document) -> Self {
        OperationInput::Document(Box::new(document))
    }
}

impl From<&Document> for OperationInput {
    fn from(document: &Document) -> Self {
        OperationInput::Document(Box::new(document.clone()))
    }
}

impl From<Blob> for OperationInput {
    fn from(blob: Blob) -> Self {
        OperationInput::Blob(blob)
    }
}

impl From<Vec<Blob>> for OperationInput {
    fn from(blobs: Vec<Blob>) -> Self {
        OperationInput::Blobs(blobs)
    }
}

impl From<Value> for OperationInput {
    fn from(value: Value) -> Self {
        OperationInput::Value(value)
    }
}

impl From<EntityObject> for OperationInput {
    fn from(object: EntityObject) -> Self {
        OperationInput::Object(object)
    }
}

/// Decoded result of one invocation; exactly one variant per call.
#[derive(Debug, Clone)]
pub enum OperationResult {
    /// The operation produced no body
    Void,
    Document(Box<Document>),
    Documents(Documents),
    Blob(Blob),
    Blobs(Vec<Blob>),
    RecordSet(RecordSet),
    Audit(Audit),
    Acp(Acp),
    Object(EntityObject),
}

impl OperationResult {
    /// Short name of the result kind
    pub fn kind(&self) -> &str {
        match self {
            OperationResult::Void => "void",
            OperationResult::Document(_) => "document",
            OperationResult::Documents(_) => "documents",
            OperationResult::Blob(_) => "blob",
            OperationResult::Blobs(_) => "blobs",
            OperationResult::RecordSet(_) => "recordSet",
            OperationResult::Audit(_) => "audit",
            OperationResult::Acp(_) => "acls",
            OperationResult::Object(object) => object.entity_type(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, OperationResult::Void)
    }

    pub fn into_document(self) -> ClientResult<Document> {
        match self {
            OperationResult::Document(document) => Ok(*document),
            other => Err(unexpected_result_error("document", other.kind())),
        }
    }

    pub fn into_documents(self) -> ClientResult<Documents> {
        match self {
            OperationResult::Documents(documents) => Ok(documents),
            other => Err(unexpected_result_error("documents", other.kind())),
        }
    }

    pub fn into_blob(self) -> ClientResult<Blob> {
        match self {
            OperationResult::Blob(blob) => Ok(blob),
            other => Err(unexpected_result_error("blob", other.kind())),
        }
    }

    /// Blobs of a multipart result; a single blob becomes a one-element list
    pub fn into_blobs(self) -> ClientResult<Vec<Blob>> {
        match self {
            OperationResult::Blobs(blobs) => Ok(blobs),
            OperationResult::Blob(blob) => Ok(vec![blob]),
            other => Err(unexpected_result_error("blobs", other.kind())),
        }
    }

    pub fn into_record_set(self) -> ClientResult<RecordSet> {
        match self {
            OperationResult::RecordSet(records) => Ok(records),
            other => Err(unexpected_result_error("recordSet", other.kind())),
        }
    }

    pub fn into_audit(self) -> ClientResult<Audit> {
        match self {
            OperationResult::Audit(audit) => Ok(audit),
            other => Err(unexpected_result_error("audit", other.kind())),
        }
    }

    pub fn into_acp(self) -> ClientResult<Acp> {
        match self {
            OperationResult::Acp(acp) => Ok(acp),
            other => Err(unexpected_result_error("acls", other.kind())),
        }
    }

    /// Concrete business object of type `T`
    pub fn into_object<T: Any + Clone>(self) -> ClientResult<T> {
        match self {
            OperationResult::Object(object) => object
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| {
                    unexpected_result_error(std::any::type_name::<T>(), object.type_name())
                }),
            other => Err(unexpected_result_error(std::any::type_name::<T>(), other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_input_is_a_doc_ref() {
        let input = OperationInput::from("/folder_2/file");
        assert!(matches!(input, OperationInput::DocRef(ref r) if r.as_str() == "/folder_2/file"));
        assert_eq!(input.discriminator(), Some(TypeId::of::<DocRef>()));
    }

    #[test]
    fn test_binary_inputs_have_no_encoder_discriminator() {
        let input = OperationInput::from(Blob::new("x", "text/plain"));
        assert!(input.is_binary());
        assert!(input.discriminator().is_none());
        assert!(input.as_any().is_none());
        assert_eq!(input.blobs().len(), 1);
    }

    #[test]
    fn test_object_input_uses_value_type() {
        #[derive(Debug, Clone)]
        struct Bean;
        let input = OperationInput::from(EntityObject::new("BeanAdapter", Bean));
        assert_eq!(input.discriminator(), Some(TypeId::of::<Bean>()));
        assert!(input.as_any().unwrap().downcast_ref::<Bean>().is_some());
    }

    #[test]
    fn test_wrong_variant_is_a_decoding_error() {
        let result = OperationResult::Documents(Documents::new(vec![]));
        let err = result.into_document().unwrap_err();
        assert_eq!(err.error_code(), "CLIENT_DECODING");

        let void = OperationResult::Void;
        assert!(void.is_void());
        assert!(void.into_record_set().is_err());
    }

    #[test]
    fn test_object_result_downcasts() {
        let result = OperationResult::Object(EntityObject::new("Adapter", json!({"a": 1})));
        let value: Value = result.into_object().unwrap();
        assert_eq!(value["a"], 1);
    }
}
