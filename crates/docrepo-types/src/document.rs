//! Documents and document lists.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity_types;

fn document_entity_type() -> String {
    entity_types::DOCUMENT.to_string()
}

fn documents_entity_type() -> String {
    entity_types::DOCUMENTS.to_string()
}

/// A repository document as exchanged with the server.
///
/// Fields the server fills in (uid, path, state, ...) are optional so the
/// same type can describe a document about to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "entity-type", default = "document_entity_type")]
    pub entity_type: String,

    #[serde(rename = "repository", default, skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Name segment used when creating the document under a parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<String>,

    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Enricher output, keyed by enricher name
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context_parameters: Map<String, Value>,
}

impl Document {
    /// Create a new, not yet persisted document
    pub fn new(name: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            entity_type: document_entity_type(),
            repository_name: None,
            uid: None,
            path: None,
            name: Some(name.into()),
            doc_type: doc_type.into(),
            state: None,
            parent_ref: None,
            title: None,
            change_token: None,
            last_modified: None,
            facets: Vec::new(),
            properties: Map::new(),
            context_parameters: Map::new(),
        }
    }

    /// Document id (the server-assigned uid)
    pub fn id(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Set the document id
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.uid = Some(id.into());
    }

    /// Set the document title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Get a property value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Get a property as a string slice
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Set a property value, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get an enricher entry from the context parameters
    pub fn context_parameter(&self, enricher: &str) -> Option<&Value> {
        self.context_parameters.get(enricher)
    }

    /// Reference usable as operation input: the uid when known, the path otherwise
    pub fn reference(&self) -> Option<&str> {
        self.uid.as_deref().or(self.path.as_deref())
    }
}

/// An ordered page of documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documents {
    #[serde(rename = "entity-type", default = "documents_entity_type")]
    pub entity_type: String,

    #[serde(default)]
    pub entries: Vec<Document>,

    /// Match count reported by the server, may exceed `entries.len()`
    #[serde(
        rename = "totalSize",
        alias = "resultsCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reported_total_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page_index: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_next_page_available: Option<bool>,
}

impl Documents {
    /// Create a document list; the total size is the number of entries
    pub fn new(entries: Vec<Document>) -> Self {
        Self {
            entity_type: documents_entity_type(),
            reported_total_size: Some(entries.len() as u64),
            entries,
            current_page_index: None,
            page_size: None,
            is_next_page_available: None,
        }
    }

    /// Set the total size reported independently of the page
    pub fn with_total_size(mut self, total_size: u64) -> Self {
        self.reported_total_size = Some(total_size);
        self
    }

    /// Documents of this page, in server order
    pub fn documents(&self) -> &[Document] {
        &self.entries
    }

    /// Total match count; falls back to the page length when the server
    /// did not report one. Not validated against the page.
    pub fn total_size(&self) -> u64 {
        self.reported_total_size
            .unwrap_or(self.entries.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_decodes_server_shape() {
        let body = json!({
            "entity-type": "document",
            "repository": "test",
            "uid": "abc",
            "path": "/folder_1",
            "type": "Folder",
            "state": "project",
            "parentRef": "root-id",
            "title": "Folder 1",
            "properties": { "dc:title": "Folder 1" },
            "contextParameters": { "breadcrumb": { "entity-type": "documents", "entries": [] } }
        });

        let doc: Document = serde_json::from_value(body).unwrap();
        assert_eq!(doc.entity_type, "document");
        assert_eq!(doc.repository_name.as_deref(), Some("test"));
        assert_eq!(doc.parent_ref.as_deref(), Some("root-id"));
        assert_eq!(doc.get_str("dc:title"), Some("Folder 1"));
        assert!(doc.context_parameter("breadcrumb").is_some());
        assert!(doc.context_parameter("acls").is_none());
    }

    #[test]
    fn test_new_document_serializes_only_known_fields() {
        let mut doc = Document::new("file", "File");
        doc.set("dc:title", "new title");

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["entity-type"], "document");
        assert_eq!(value["name"], "file");
        assert_eq!(value["type"], "File");
        assert_eq!(value["properties"]["dc:title"], "new title");
        assert!(value.get("uid").is_none());
        assert!(value.get("contextParameters").is_none());
    }

    #[test]
    fn test_total_size_may_exceed_page() {
        let docs: Documents = serde_json::from_value(json!({
            "entity-type": "documents",
            "entries": [{ "type": "Note" }],
            "totalSize": 42
        }))
        .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs.total_size(), 42);

        let unreported: Documents = serde_json::from_value(json!({
            "entries": [{ "type": "Note" }, { "type": "Note" }]
        }))
        .unwrap();
        assert_eq!(unreported.total_size(), 2);
    }

    #[test]
    fn test_reference_prefers_uid() {
        let mut doc = Document::new("n", "Note");
        doc.path = Some("/folder_1/n".to_string());
        assert_eq!(doc.reference(), Some("/folder_1/n"));
        doc.set_id("uid-1");
        assert_eq!(doc.reference(), Some("uid-1"));
    }
}
