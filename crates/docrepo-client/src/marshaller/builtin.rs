//! Built-in marshallers for the standard entity types and input kinds

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use docrepo_error::{ClientError, ClientResult};
use docrepo_types::entity_types;
use docrepo_types::{Acp, Audit, DocRef, DocRefs, Document, Documents, OperationResult, RecordSet};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Marshaller, Payload};

/// The marshallers every registry starts with
pub fn builtin_marshallers() -> Vec<Arc<dyn Marshaller>> {
    vec![
        Arc::new(DocumentMarshaller),
        Arc::new(JsonMarshaller::<Documents>::new(
            entity_types::DOCUMENTS,
            OperationResult::Documents,
        )),
        Arc::new(RecordSetMarshaller),
        Arc::new(JsonMarshaller::<Audit>::new(entity_types::AUDIT, OperationResult::Audit)),
        Arc::new(JsonMarshaller::<Acp>::new(entity_types::ACLS, OperationResult::Acp)),
        Arc::new(BlobMarshaller),
        Arc::new(BlobsMarshaller),
        Arc::new(DocRefMarshaller),
        Arc::new(DocRefsMarshaller),
        Arc::new(ValueMarshaller),
    ]
}

fn downcast<'a, T: Any>(value: &'a dyn Any, what: &str) -> ClientResult<&'a T> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| {
            ClientError::encoding(format!("{} marshaller received another input type", what))
        })
}

/// Decodes `document` bodies; encodes a document input as its reference
pub struct DocumentMarshaller;

impl Marshaller for DocumentMarshaller {
    fn entity_type(&self) -> Option<&str> {
        Some(entity_types::DOCUMENT)
    }

    fn input_type(&self) -> Option<TypeId> {
        Some(TypeId::of::<Document>())
    }

    fn encode(&self, value: &dyn Any) -> ClientResult<Value> {
        let document = downcast::<Document>(value, "document")?;
        let reference = document
            .reference()
            .ok_or_else(|| ClientError::encoding("document input has neither uid nor path"))?;
        Ok(Value::String(DocRef::new(reference).to_input()))
    }

    fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
        let document: Document = serde_json::from_value(payload.into_json()?)?;
        Ok(OperationResult::Document(Box::new(document)))
    }
}

/// Decode-only marshaller for any serde type wrapped by one result variant
pub struct JsonMarshaller<T> {
    entity_type: &'static str,
    wrap: fn(T) -> OperationResult,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonMarshaller<T> {
    pub fn new(entity_type: &'static str, wrap: fn(T) -> OperationResult) -> Self {
        Self {
            entity_type,
            wrap,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Marshaller for JsonMarshaller<T> {
    fn entity_type(&self) -> Option<&str> {
        Some(self.entity_type)
    }

    fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
        let value: T = serde_json::from_value(payload.into_json()?)?;
        Ok((self.wrap)(value))
    }
}

/// Decodes `recordSet` bodies.
///
/// Accepts the compact `{"uuids": [...]}` form and the paginated form whose
/// `entries` are rows keyed by `ecm:uuid`.
pub struct RecordSetMarshaller;

impl Marshaller for RecordSetMarshaller {
    fn entity_type(&self) -> Option<&str> {
        Some(entity_types::RECORD_SET)
    }

    fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
        let body = payload.into_json()?;
        if let Some(rows) = body.get("entries").and_then(Value::as_array) {
            let uuids = rows
                .iter()
                .map(|row| {
                    row.get("ecm:uuid")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| ClientError::decoding("recordSet row without ecm:uuid"))
                })
                .collect::<ClientResult<Vec<_>>>()?;
            return Ok(OperationResult::RecordSet(RecordSet { uuids }));
        }
        let records: RecordSet = serde_json::from_value(body)?;
        Ok(OperationResult::RecordSet(records))
    }
}

/// Decodes a single binary body
pub struct BlobMarshaller;

impl Marshaller for BlobMarshaller {
    fn entity_type(&self) -> Option<&str> {
        Some(entity_types::BLOB)
    }

    fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
        match payload {
            Payload::Binary(blob) => Ok(OperationResult::Blob(blob)),
            Payload::Parts(mut parts) if parts.len() == 1 => {
                Ok(OperationResult::Blob(parts.remove(0)))
            }
            _ => Err(ClientError::decoding("blob result requires binary content")),
        }
    }
}

/// Decodes a multipart body into its blobs, in order
pub struct BlobsMarshaller;

impl Marshaller for BlobsMarshaller {
    fn entity_type(&self) -> Option<&str> {
        Some(entity_types::BLOBS)
    }

    fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
        match payload {
            Payload::Parts(parts) => Ok(OperationResult::Blobs(parts)),
            Payload::Binary(blob) => Ok(OperationResult::Blobs(vec![blob])),
            Payload::Json(_) => {
                Err(ClientError::decoding("blobs result requires multipart content"))
            }
        }
    }
}

/// Encodes a single reference as `doc:<ref>`
pub struct DocRefMarshaller;

impl Marshaller for DocRefMarshaller {
    fn input_type(&self) -> Option<TypeId> {
        Some(TypeId::of::<DocRef>())
    }

    fn encode(&self, value: &dyn Any) -> ClientResult<Value> {
        Ok(Value::String(downcast::<DocRef>(value, "docref")?.to_input()))
    }
}

/// Encodes a reference list as `docs:<ref>,<ref>`
pub struct DocRefsMarshaller;

impl Marshaller for DocRefsMarshaller {
    fn input_type(&self) -> Option<TypeId> {
        Some(TypeId::of::<DocRefs>())
    }

    fn encode(&self, value: &dyn Any) -> ClientResult<Value> {
        let references = downcast::<DocRefs>(value, "docrefs")?;
        if references.is_empty() {
            return Err(ClientError::encoding("document reference list is empty"));
        }
        Ok(Value::String(references.to_input()))
    }
}

/// Raw JSON input, sent as is
pub struct ValueMarshaller;

impl Marshaller for ValueMarshaller {
    fn input_type(&self) -> Option<TypeId> {
        Some(TypeId::of::<Value>())
    }

    fn encode(&self, value: &dyn Any) -> ClientResult<Value> {
        Ok(downcast::<Value>(value, "value")?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrepo_types::Blob;
    use serde_json::json;

    #[test]
    fn test_document_input_encodes_as_reference() {
        let mut document = Document::new("note_0", "Note");
        document.path = Some("/folder_1/note_0".to_string());
        let encoded = DocumentMarshaller.encode(&document).unwrap();
        assert_eq!(encoded, json!("doc:/folder_1/note_0"));

        let unsaved = Document::new("draft", "Note");
        assert!(DocumentMarshaller.encode(&unsaved).is_err());
        assert!(DocumentMarshaller.encode(&json!({})).is_err());
    }

    #[test]
    fn test_reference_inputs() {
        let refs: DocRefs = ["uid-1", "uid-2"].into_iter().map(DocRef::from).collect();
        assert_eq!(DocRefsMarshaller.encode(&refs).unwrap(), json!("docs:uid-1,uid-2"));
        assert!(DocRefsMarshaller.encode(&DocRefs::default()).is_err());
        assert_eq!(DocRefMarshaller.encode(&DocRef::from("/")).unwrap(), json!("doc:/"));
    }

    #[test]
    fn test_record_set_forms() {
        let compact = RecordSetMarshaller
            .decode(Payload::Json(json!({"entity-type": "recordSet", "uuids": ["a", "b"]})))
            .unwrap()
            .into_record_set()
            .unwrap();
        assert_eq!(compact.uuids(), ["a", "b"]);

        let paginated = RecordSetMarshaller
            .decode(Payload::Json(json!({
                "entity-type": "recordSet",
                "isPaginable": true,
                "entries": [{"ecm:uuid": "a"}, {"ecm:uuid": "c"}]
            })))
            .unwrap()
            .into_record_set()
            .unwrap();
        assert_eq!(paginated.uuids(), ["a", "c"]);
    }

    #[test]
    fn test_acp_decodes_nested_entries() {
        let acp = builtin_marshallers()
            .into_iter()
            .find(|m| m.entity_type() == Some("acls"))
            .unwrap()
            .decode(Payload::Json(json!({
                "entity-type": "acls",
                "acl": [{
                    "name": "inherited",
                    "ace": [{"username": "Administrator", "permission": "Everything"}]
                }]
            })))
            .unwrap()
            .into_acp()
            .unwrap();
        assert_eq!(acp.acls().len(), 1);
        assert!(acp.acl("inherited").unwrap().aces[0].granted);
    }

    #[test]
    fn test_blob_payload_shapes() {
        let blob = Blob::new("content", "text/plain");
        let single = BlobMarshaller.decode(Payload::Binary(blob.clone())).unwrap();
        assert_eq!(single.into_blob().unwrap(), blob);

        let many = BlobsMarshaller
            .decode(Payload::Parts(vec![blob.clone(), blob.clone()]))
            .unwrap();
        assert_eq!(many.into_blobs().unwrap().len(), 2);

        assert!(BlobMarshaller.decode(Payload::Json(json!({}))).is_err());
    }
}
