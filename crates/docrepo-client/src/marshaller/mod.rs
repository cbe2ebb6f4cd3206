//! Marshaller Registry
//!
//! A marshaller converts between a wire payload and a typed value. Each
//! marshaller declares the entity-type tag it decodes and/or the Rust input
//! type it encodes; the registry indexes them under those two
//! discriminators. At most one marshaller is active per discriminator:
//! registering another one for the same tag or type replaces it.
//! [`MarshallerRegistry::unregister_all`] drops every custom registration and
//! restores the built-in set.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use docrepo_error::{unknown_entity_type_error, unregistered_input_error, ClientError, ClientResult};
use docrepo_types::{Blob, OperationInput, OperationResult};
use serde_json::Value;
use tracing::debug;

pub mod builtin;
pub mod object;

pub use builtin::builtin_marshallers;
pub use object::ObjectMarshaller;

/// Response body as handed to a decoder
#[derive(Debug, Clone)]
pub enum Payload {
    /// Parsed JSON body
    Json(Value),
    /// Single binary body
    Binary(Blob),
    /// Ordered parts of a multipart body
    Parts(Vec<Blob>),
}

impl Payload {
    pub fn into_json(self) -> ClientResult<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Binary(_) => {
                Err(ClientError::decoding("expected a JSON body, got binary content"))
            }
            Payload::Parts(_) => {
                Err(ClientError::decoding("expected a JSON body, got multipart content"))
            }
        }
    }
}

/// Bidirectional conversion strategy for one discriminator.
///
/// Implement `entity_type` + `decode` to handle a response tag, and
/// `input_type` + `encode` to handle an input type. The defaults opt out of
/// either direction.
pub trait Marshaller: Send + Sync {
    /// Entity-type tag this marshaller decodes
    fn entity_type(&self) -> Option<&str> {
        None
    }

    /// Input type this marshaller encodes
    fn input_type(&self) -> Option<TypeId> {
        None
    }

    /// Encode an input value into its wire representation
    fn encode(&self, value: &dyn Any) -> ClientResult<Value> {
        let _ = value;
        Err(ClientError::encoding("marshaller does not encode inputs"))
    }

    /// Decode a response payload into a typed result
    fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
        let _ = payload;
        Err(ClientError::decoding("marshaller does not decode responses"))
    }
}

#[derive(Default)]
struct Entries {
    decoders: HashMap<String, Arc<dyn Marshaller>>,
    encoders: HashMap<TypeId, Arc<dyn Marshaller>>,
}

impl Entries {
    fn with_builtins() -> Self {
        let mut entries = Self::default();
        for marshaller in builtin_marshallers() {
            entries.insert(marshaller);
        }
        entries
    }

    fn insert(&mut self, marshaller: Arc<dyn Marshaller>) {
        if let Some(tag) = marshaller.entity_type() {
            self.decoders.insert(tag.to_string(), marshaller.clone());
        }
        if let Some(type_id) = marshaller.input_type() {
            self.encoders.insert(type_id, marshaller);
        }
    }
}

/// Shared, internally synchronized registry of marshallers
pub struct MarshallerRegistry {
    entries: RwLock<Entries>,
}

impl MarshallerRegistry {
    /// Registry holding the built-in marshallers
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::with_builtins()),
        }
    }

    // A panic while holding the lock cannot leave the maps half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a marshaller, replacing any other for the same discriminators
    pub fn register(&self, marshaller: Arc<dyn Marshaller>) {
        debug!(
            entity_type = marshaller.entity_type().unwrap_or("-"),
            encodes = marshaller.input_type().is_some(),
            "Registering marshaller"
        );
        self.write().insert(marshaller);
    }

    /// Drop custom registrations and restore the built-in marshallers
    pub fn unregister_all(&self) {
        debug!("Restoring built-in marshallers");
        *self.write() = Entries::with_builtins();
    }

    pub fn resolve_for_decode(&self, entity_type: &str) -> Option<Arc<dyn Marshaller>> {
        self.read().decoders.get(entity_type).cloned()
    }

    pub fn resolve_for_encode(&self, input_type: TypeId) -> Option<Arc<dyn Marshaller>> {
        self.read().encoders.get(&input_type).cloned()
    }

    /// Decode `payload` with the marshaller registered for `entity_type`
    pub fn decode(&self, entity_type: &str, payload: Payload) -> ClientResult<OperationResult> {
        // Resolve first so the lock is released before decoding runs
        let marshaller = self
            .resolve_for_decode(entity_type)
            .ok_or_else(|| unknown_entity_type_error(entity_type))?;
        marshaller.decode(payload)
    }

    /// Encode a structured input; binary inputs are framed by the transport
    pub fn encode(&self, input: &OperationInput) -> ClientResult<Value> {
        let (type_id, value) = match (input.discriminator(), input.as_any()) {
            (Some(type_id), Some(value)) => (type_id, value),
            _ => {
                return Err(ClientError::encoding(format!(
                    "{} input is sent as multipart content, not encoded",
                    input.kind()
                )))
            }
        };
        let marshaller = self
            .resolve_for_encode(type_id)
            .ok_or_else(|| unregistered_input_error(input.kind()))?;
        marshaller.encode(value)
    }

    /// Tags that currently have a decoder, sorted
    pub fn entity_types(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.read().decoders.keys().cloned().collect();
        tags.sort();
        tags
    }
}

impl Default for MarshallerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MarshallerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarshallerRegistry")
            .field("entity_types", &self.entity_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrepo_types::entity_types;
    use docrepo_types::{DocRef, Document, EntityObject};
    use serde_json::json;

    struct ShoutingDocuments;

    impl Marshaller for ShoutingDocuments {
        fn entity_type(&self) -> Option<&str> {
            Some(entity_types::DOCUMENT)
        }

        fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
            let mut document: Document = serde_json::from_value(payload.into_json()?)?;
            document.title = document.title.map(|t| t.to_uppercase());
            Ok(OperationResult::Document(Box::new(document)))
        }
    }

    fn note() -> Payload {
        Payload::Json(json!({"entity-type": "document", "type": "Note", "title": "note"}))
    }

    #[test]
    fn test_builtins_cover_standard_entity_types() {
        let registry = MarshallerRegistry::new();
        let tags = registry.entity_types();
        for tag in ["document", "documents", "blob", "blobs", "recordSet", "audit", "acls"] {
            assert!(tags.contains(&tag.to_string()), "missing {}", tag);
        }
        assert!(registry.resolve_for_encode(TypeId::of::<DocRef>()).is_some());
    }

    #[test]
    fn test_last_registration_wins_and_reset_restores_builtins() {
        let registry = MarshallerRegistry::new();
        registry.register(Arc::new(ShoutingDocuments));

        let shouted = registry.decode("document", note()).unwrap().into_document().unwrap();
        assert_eq!(shouted.title.as_deref(), Some("NOTE"));

        registry.unregister_all();
        let plain = registry.decode("document", note()).unwrap().into_document().unwrap();
        assert_eq!(plain.title.as_deref(), Some("note"));
    }

    #[test]
    fn test_unknown_tag_is_a_decoding_error() {
        let registry = MarshallerRegistry::new();
        let err = registry.decode("BusinessBeanAdapter", note()).unwrap_err();
        assert_eq!(err.error_code(), "CLIENT_DECODING");
    }

    #[test]
    fn test_unregistered_object_is_an_encoding_error() {
        #[derive(Debug)]
        struct Unknown;
        let registry = MarshallerRegistry::new();
        let input = OperationInput::from(EntityObject::new("UnknownAdapter", Unknown));
        assert_eq!(registry.encode(&input).unwrap_err().error_code(), "CLIENT_ENCODING");

        let blob = OperationInput::from(Blob::new("x", "text/plain"));
        assert_eq!(registry.encode(&blob).unwrap_err().error_code(), "CLIENT_ENCODING");
    }
}
