//! In-memory repository server for testing
//!
//! [`MockRepositoryServer`] implements [`Transport`] by answering requests
//! from an in-memory document tree instead of the network. It understands
//! the repository routes (`path/`, `id/` and their adapters), the automation
//! operations the client exercises, repository selection, enrichers and the
//! remote error envelope, and it records every request so tests can tell
//! whether a call reached the "network".
//!
//! The seeded tree, in repository `test`:
//!
//! ```text
//! /                  Root
//! /folder_1          Folder "Folder 1"
//! /folder_1/note_0   Note "Note 0" .. /folder_1/note_4 Note "Note 4"
//! /folder_2          Folder "Folder 2"
//! /folder_2/file     File "File", main blob fields.json
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use docrepo_error::{ClientResult, RemoteErrorEnvelope};
use docrepo_types::{Blob, Document, LogEntry};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::transport::multipart::{self, Part};
use crate::transport::{
    HttpMethod, RequestBody, Transport, WireRequest, WireResponse, ENRICHERS_HEADER,
    REPOSITORY_HEADER,
};

//-----------------------------------------------------------------------------
// Fixture Data
//-----------------------------------------------------------------------------

/// Name of the only repository the mock serves
pub const REPOSITORY_NAME: &str = "test";

/// Adapter tag of the business bean operations
pub const BUSINESS_BEAN_ADAPTER: &str = "BusinessBeanAdapter";

/// Content of the blob attached to `/folder_2/file`
pub const FILE_BLOB_CONTENT: &str = r#"[
  {
    "fieldType": "string",
    "description": "desc field0",
    "roles": [
      "Decision",
      "Score"
    ],
    "name": "field0",
    "columnName": "col0",
    "sqlTypeHint": "whatever"
  }
]
"#;

const LIFE_CYCLE_STATE: &str = "project";

//-----------------------------------------------------------------------------
// Repository State
//-----------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry {
    document: Document,
    /// Attached blobs; the last one is the main content
    blobs: Vec<Blob>,
}

#[derive(Debug, Default)]
struct RepositoryState {
    /// Documents in creation order
    entries: Vec<Entry>,
    audit: Vec<LogEntry>,
    log: Vec<String>,
}

impl RepositoryState {
    fn seeded() -> Self {
        let mut state = Self::default();
        let root = state.create(None, "", "Root", "");
        let folder_1 = state.create(Some(root.as_str()), "folder_1", "Folder", "Folder 1");
        for i in 0..5 {
            let name = format!("note_{}", i);
            state.create(Some(folder_1.as_str()), &name, "Note", &format!("Note {}", i));
        }
        let folder_2 = state.create(Some(root.as_str()), "folder_2", "Folder", "Folder 2");
        let file = state.create(Some(folder_2.as_str()), "file", "File", "File");
        if let Some(entry) = state.by_id_mut(&file) {
            entry
                .blobs
                .push(
                    Blob::new(FILE_BLOB_CONTENT, "application/json").with_filename("fields.json"),
                );
        }
        state
    }

    /// Create a document under `parent` (uid) and return its uid
    fn create(&mut self, parent: Option<&str>, name: &str, doc_type: &str, title: &str) -> String {
        let uid = Uuid::new_v4().to_string();
        let (path, parent_ref) = match parent.and_then(|p| self.by_id(p)) {
            Some(parent) => {
                let parent_path = parent.document.path.clone().unwrap_or_default();
                let path = format!("{}/{}", parent_path.trim_end_matches('/'), name);
                (path, parent.document.uid.clone().unwrap_or_default())
            }
            None => ("/".to_string(), "/".to_string()),
        };

        let mut document = Document::new(name, doc_type);
        if name.is_empty() {
            document.name = None;
        }
        document.set_id(uid.clone());
        document.path = Some(path);
        document.parent_ref = Some(parent_ref);
        document.repository_name = Some(REPOSITORY_NAME.to_string());
        document.state = Some(LIFE_CYCLE_STATE.to_string());
        document.change_token = Some("0".to_string());
        document.last_modified = Some(Utc::now().to_rfc3339());
        document.set_title(title);
        document.set("dc:title", title);

        self.record("documentCreated", &document);
        self.entries.push(Entry {
            document,
            blobs: Vec::new(),
        });
        uid
    }

    fn by_id(&self, uid: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.document.uid.as_deref() == Some(uid))
    }

    fn by_id_mut(&mut self, uid: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.document.uid.as_deref() == Some(uid))
    }

    fn by_path(&self, path: &str) -> Option<&Entry> {
        let path = normalize_path(path);
        self.entries.iter().find(|e| e.document.path.as_deref() == Some(path.as_str()))
    }

    /// Resolve a uid or an absolute path
    fn resolve(&self, reference: &str) -> Option<&Entry> {
        if reference.starts_with('/') {
            self.by_path(reference)
        } else {
            self.by_id(reference)
        }
    }

    fn uid_of(&self, reference: &str) -> Option<String> {
        self.resolve(reference).and_then(|e| e.document.uid.clone())
    }

    fn children(&self, uid: &str) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| {
                e.document.parent_ref.as_deref() == Some(uid)
                    && e.document.uid.as_deref() != Some(uid)
            })
            .collect()
    }

    /// Merge `properties` into the document; `dc:title` also sets the title
    fn update(&mut self, uid: &str, properties: &Map<String, Value>) -> Option<Document> {
        let entry = self.by_id_mut(uid)?;
        for (key, value) in properties {
            entry.document.properties.insert(key.clone(), value.clone());
        }
        if let Some(title) = properties.get("dc:title").and_then(Value::as_str) {
            entry.document.title = Some(title.to_string());
        }
        let token = entry
            .document
            .change_token
            .as_deref()
            .and_then(|t| t.parse::<u64>().ok())
            .unwrap_or(0);
        entry.document.change_token = Some((token + 1).to_string());
        entry.document.last_modified = Some(Utc::now().to_rfc3339());
        let document = entry.document.clone();
        self.record("documentModified", &document);
        Some(document)
    }

    /// Remove a document and everything below it
    fn remove(&mut self, uid: &str) -> bool {
        let Some(path) = self.by_id(uid).and_then(|e| e.document.path.clone()) else {
            return false;
        };
        let prefix = format!("{}/", path);
        self.entries.retain(|e| {
            let doc_path = e.document.path.as_deref().unwrap_or_default();
            doc_path != path && !doc_path.starts_with(&prefix)
        });
        true
    }

    fn record(&mut self, event_id: &str, document: &Document) {
        self.audit.push(LogEntry {
            id: Some(self.audit.len() as u64 + 1),
            category: "eventDocumentCategory".to_string(),
            event_id: event_id.to_string(),
            principal_name: Some("Administrator".to_string()),
            comment: None,
            doc_uuid: document.uid.clone(),
            doc_path: document.path.clone(),
            doc_type: Some(document.doc_type.clone()),
            doc_life_cycle: document.state.clone(),
            repository_id: Some(REPOSITORY_NAME.to_string()),
            event_date: Some(Utc::now()),
        });
    }

    /// Query by `FROM <type>`; `Document` matches everything but the root
    fn query(&self, nxql: &str) -> Vec<&Entry> {
        let doc_type = query_type(nxql);
        self.entries
            .iter()
            .filter(|e| e.document.doc_type != "Root")
            .filter(|e| match doc_type.as_deref() {
                None | Some("Document") => true,
                Some(t) => e.document.doc_type == t,
            })
            .collect()
    }

    fn render(&self, entry: &Entry, enrichers: &[String]) -> Value {
        let mut document = entry.document.clone();
        for enricher in enrichers {
            match enricher.as_str() {
                "acls" => {
                    document
                        .context_parameters
                        .insert(
                            "acls".to_string(),
                            json!([{ "name": "inherited", "users": ["Administrator"] }]),
                        );
                }
                "breadcrumb" => {
                    let ancestors: Vec<Value> = self
                        .ancestors(entry)
                        .into_iter()
                        .map(|a| {
                            json!({
                                "uid": a.document.uid,
                                "path": a.document.path,
                                "type": a.document.doc_type
                            })
                        })
                        .collect();
                    document.context_parameters.insert(
                        "breadcrumb".to_string(),
                        json!({ "entity-type": "documents", "entries": ancestors }),
                    );
                }
                _ => {}
            }
        }
        serde_json::to_value(&document).unwrap_or(Value::Null)
    }

    fn ancestors(&self, entry: &Entry) -> Vec<&Entry> {
        let mut ancestors = Vec::new();
        let mut current = entry;
        while let Some(parent) = current
            .document
            .parent_ref
            .as_deref()
            .and_then(|p| self.by_id(p))
            .filter(|p| p.document.uid != current.document.uid)
        {
            ancestors.push(parent);
            current = parent;
        }
        ancestors.reverse();
        ancestors
    }

    fn documents(&self, entries: &[&Entry], enrichers: &[String], total_size: usize) -> Value {
        let rendered: Vec<Value> = entries.iter().map(|e| self.render(e, enrichers)).collect();
        json!({
            "entity-type": "documents",
            "entries": rendered,
            "totalSize": total_size,
            "currentPageIndex": 0,
            "isNextPageAvailable": entries.len() < total_size,
        })
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

fn query_type(nxql: &str) -> Option<String> {
    let upper = nxql.to_ascii_uppercase();
    let from = upper.find(" FROM ")?;
    nxql[from + " FROM ".len()..]
        .split_whitespace()
        .next()
        .map(str::to_string)
}

//-----------------------------------------------------------------------------
// Responses
//-----------------------------------------------------------------------------

fn error(status: u16, message: impl Into<String>) -> WireResponse {
    let message = message.into();
    let envelope = RemoteErrorEnvelope::new(status, message.clone())
        .with_stacktrace(format!("MockRepositoryServer: {}\n\tat handle(mock.rs)", message));
    WireResponse::json(status, &serde_json::to_value(envelope).unwrap_or(Value::Null))
}

fn not_found(target: &str) -> WireResponse {
    error(404, format!("{} not found", target))
}

fn multipart_response(blobs: &[Blob]) -> WireResponse {
    let boundary = multipart::new_boundary();
    let parts: Vec<Part> = blobs.iter().map(Part::from_blob).collect();
    WireResponse::new(
        200,
        Some(multipart::mixed_content_type(&boundary)),
        multipart::encode(&boundary, &parts),
    )
}

/// `doc:<ref>` or `docs:<ref>,<ref>` into plain references
fn references(input: Option<&Value>) -> Vec<String> {
    match input.and_then(Value::as_str) {
        Some(input) => {
            if let Some(list) = input.strip_prefix("docs:") {
                list.split(',').filter(|r| !r.is_empty()).map(str::to_string).collect()
            } else {
                vec![input.strip_prefix("doc:").unwrap_or(input).to_string()]
            }
        }
        None => Vec::new(),
    }
}

//-----------------------------------------------------------------------------
// Mock Server
//-----------------------------------------------------------------------------

/// In-memory stand-in for a repository server
#[derive(Debug)]
pub struct MockRepositoryServer {
    state: Mutex<RepositoryState>,
    requests: Mutex<Vec<WireRequest>>,
    latency: Option<Duration>,
}

impl MockRepositoryServer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RepositoryState::seeded()),
            requests: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Delay every response, to widen race windows in concurrency tests
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn state(&self) -> MutexGuard<'_, RepositoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Messages written by the `Log` operation
    pub fn logged_messages(&self) -> Vec<String> {
        self.state().log.clone()
    }

    /// Current server-side state of the document at `path`
    pub fn document_by_path(&self, path: &str) -> Option<Document> {
        self.state().by_path(path).map(|e| e.document.clone())
    }

    pub fn exists(&self, uid: &str) -> bool {
        self.state().by_id(uid).is_some()
    }

    /// Change a property behind the client's back
    pub fn set_property(&self, path: &str, key: &str, value: impl Into<Value>) -> bool {
        let mut state = self.state();
        let Some(uid) = state.uid_of(&normalize_path(path)) else {
            return false;
        };
        let mut properties = Map::new();
        properties.insert(key.to_string(), value.into());
        state.update(&uid, &properties).is_some()
    }

    fn handle(&self, request: &WireRequest) -> WireResponse {
        let (repository, resource) = match request.path.strip_prefix("repo/") {
            Some(rest) => match rest.split_once('/') {
                Some((name, resource)) => (Some(name), resource),
                None => (Some(rest), ""),
            },
            None => (request.header(REPOSITORY_HEADER), request.path.as_str()),
        };
        if let Some(name) = repository {
            if name != REPOSITORY_NAME {
                return error(404, format!("Repository '{}' not found", name));
            }
        }

        let enrichers: Vec<String> = request
            .header(ENRICHERS_HEADER)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut state = self.state();

        if let Some(operation) = resource.strip_prefix("automation/") {
            return match (&request.method, &request.body) {
                (HttpMethod::Post, RequestBody::Json(envelope)) => {
                    automation(&mut state, operation, envelope, &[], &enrichers)
                }
                (HttpMethod::Post, RequestBody::Multipart { request, blobs }) => {
                    automation(&mut state, operation, request, blobs, &enrichers)
                }
                _ => error(400, "Automation calls require a POST with a body"),
            };
        }

        if let Some(path) = resource.strip_prefix("path") {
            let path = normalize_path(path);
            return match request.method {
                HttpMethod::Get => match state.by_path(&path) {
                    Some(entry) => WireResponse::json(200, &state.render(entry, &enrichers)),
                    None => not_found(&path),
                },
                HttpMethod::Post => match state.uid_of(&path) {
                    Some(parent) => create_child(&mut state, &parent, &request.body, &enrichers),
                    None => not_found(&path),
                },
                _ => error(405, format!("{} not allowed on {}", request.method, resource)),
            };
        }

        if let Some(rest) = resource.strip_prefix("id/") {
            let (uid, adapter) = match rest.split_once('/') {
                Some((uid, adapter)) => (uid, Some(adapter)),
                None => (rest.trim_end_matches('/'), None),
            };
            if state.by_id(uid).is_none() {
                return not_found(uid);
            }
            return match (request.method, adapter) {
                (HttpMethod::Get, None) => match state.by_id(uid) {
                    Some(entry) => WireResponse::json(200, &state.render(entry, &enrichers)),
                    None => not_found(uid),
                },
                (HttpMethod::Post, None) => {
                    create_child(&mut state, uid, &request.body, &enrichers)
                }
                (HttpMethod::Put, None) => {
                    update_document(&mut state, uid, &request.body, &enrichers)
                }
                (HttpMethod::Delete, None) => {
                    state.remove(uid);
                    WireResponse::empty(204)
                }
                (HttpMethod::Get, Some(adapter)) => {
                    document_adapter(&state, uid, adapter, &enrichers)
                }
                _ => error(405, format!("{} not allowed on {}", request.method, resource)),
            };
        }

        not_found(resource)
    }
}

impl Default for MockRepositoryServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockRepositoryServer {
    async fn send(&self, request: WireRequest) -> ClientResult<WireResponse> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let response = self.handle(&request);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        Ok(response)
    }
}

//-----------------------------------------------------------------------------
// Repository Routes
//-----------------------------------------------------------------------------

fn create_child(
    state: &mut RepositoryState,
    parent: &str,
    body: &RequestBody,
    enrichers: &[String],
) -> WireResponse {
    let RequestBody::Json(body) = body else {
        return error(400, "Document creation requires a JSON body");
    };
    let Ok(requested) = serde_json::from_value::<Document>(body.clone()) else {
        return error(400, "Malformed document");
    };
    let Some(name) = requested.name.clone().filter(|n| !n.is_empty()) else {
        return error(400, "Document name is required");
    };

    let parent_path = state
        .by_id(parent)
        .and_then(|e| e.document.path.clone())
        .unwrap_or_default();
    let path = format!("{}/{}", parent_path.trim_end_matches('/'), name);
    if state.by_path(&path).is_some() {
        return error(409, format!("{} already exists", path));
    }

    let title = requested
        .get_str("dc:title")
        .map(str::to_string)
        .or_else(|| requested.title.clone())
        .unwrap_or_else(|| name.clone());
    let uid = state.create(Some(parent), &name, &requested.doc_type, &title);
    state.update(&uid, &requested.properties);
    match state.by_id(&uid) {
        Some(entry) => WireResponse::json(201, &state.render(entry, enrichers)),
        None => error(500, "Created document vanished"),
    }
}

fn update_document(
    state: &mut RepositoryState,
    uid: &str,
    body: &RequestBody,
    enrichers: &[String],
) -> WireResponse {
    let RequestBody::Json(body) = body else {
        return error(400, "Document update requires a JSON body");
    };
    let properties = body
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    state.update(uid, &properties);
    match state.by_id(uid) {
        Some(entry) => WireResponse::json(200, &state.render(entry, enrichers)),
        None => not_found(uid),
    }
}

fn document_adapter(
    state: &RepositoryState,
    uid: &str,
    adapter: &str,
    enrichers: &[String],
) -> WireResponse {
    match adapter.trim_end_matches('/') {
        "@children" => {
            let children = state.children(uid);
            WireResponse::json(200, &state.documents(&children, enrichers, children.len()))
        }
        "@acl" => WireResponse::json(
            200,
            &json!({
                "entity-type": "acls",
                "acl": [{
                    "name": "inherited",
                    "ace": [
                        {
                            "id": "Administrator:Everything:true",
                            "username": "Administrator",
                            "permission": "Everything",
                            "granted": true
                        },
                        {
                            "id": "members:Read:true",
                            "username": "members",
                            "permission": "Read",
                            "granted": true
                        }
                    ]
                }]
            }),
        ),
        "@audit" => {
            let entries: Vec<&LogEntry> = state
                .audit
                .iter()
                .rev()
                .filter(|e| e.doc_uuid.as_deref() == Some(uid))
                .collect();
            WireResponse::json(200, &json!({ "entity-type": "audit", "entries": entries }))
        }
        "@blob/file:content" => match state.by_id(uid).and_then(|e| e.blobs.last()) {
            Some(blob) => WireResponse::blob(blob),
            None => not_found(&format!("file:content of {}", uid)),
        },
        other => not_found(other),
    }
}

//-----------------------------------------------------------------------------
// Automation Operations
//-----------------------------------------------------------------------------

fn automation(
    state: &mut RepositoryState,
    operation: &str,
    envelope: &Value,
    blobs: &[Blob],
    enrichers: &[String],
) -> WireResponse {
    let empty = Map::new();
    let params = envelope.get("params").and_then(Value::as_object).unwrap_or(&empty);
    let input = envelope.get("input");

    match operation {
        "Repository.GetDocument" => {
            let reference = params
                .get("value")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| references(input).into_iter().next());
            match reference.as_deref().and_then(|r| state.resolve(r)) {
                Some(entry) => WireResponse::json(200, &state.render(entry, enrichers)),
                None => not_found(reference.as_deref().unwrap_or("document")),
            }
        }
        "Repository.Query" => {
            let nxql = params.get("query").and_then(Value::as_str).unwrap_or_default();
            let matches = state.query(nxql);
            let page_size = params
                .get("pageSize")
                .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
                .map(|n| n as usize)
                .unwrap_or(matches.len());
            let page: Vec<&Entry> = matches.iter().take(page_size).copied().collect();
            WireResponse::json(200, &state.documents(&page, enrichers, matches.len()))
        }
        "Repository.ResultSetQuery" => {
            let nxql = params.get("query").and_then(Value::as_str).unwrap_or_default();
            let rows: Vec<Value> = state
                .query(nxql)
                .into_iter()
                .map(|e| json!({ "ecm:uuid": e.document.uid }))
                .collect();
            WireResponse::json(
                200,
                &json!({ "entity-type": "recordSet", "isPaginable": false, "entries": rows }),
            )
        }
        "Document.GetBlob" => match references(input).first().and_then(|r| state.resolve(r)) {
            Some(entry) => match entry.blobs.last() {
                Some(blob) => WireResponse::blob(blob),
                None => WireResponse::empty(204),
            },
            None => not_found("input document"),
        },
        "Document.GetBlobs" => match references(input).first().and_then(|r| state.resolve(r)) {
            Some(entry) => multipart_response(&entry.blobs),
            None => not_found("input document"),
        },
        "Blob.AttachOnDocument" => {
            let target = params.get("document").and_then(Value::as_str).unwrap_or_default();
            if blobs.is_empty() {
                return error(400, "Blob.AttachOnDocument requires blob input");
            }
            let Some(uid) = state.uid_of(target) else {
                return not_found(target);
            };
            if let Some(entry) = state.by_id_mut(&uid) {
                entry.blobs.extend(blobs.iter().cloned());
            }
            match blobs {
                [blob] => WireResponse::blob(blob),
                _ => multipart_response(blobs),
            }
        }
        "Document.Update" => {
            let properties = params
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let input_is_list = input
                .and_then(Value::as_str)
                .map(|i| i.starts_with("docs:"))
                .unwrap_or(false);
            let mut updated = Vec::new();
            for reference in references(input) {
                match state.uid_of(&reference) {
                    Some(uid) => updated.push(uid),
                    None => return not_found(&reference),
                }
            }
            if updated.is_empty() {
                return error(400, "Document.Update requires document input");
            }
            for uid in &updated {
                state.update(uid, &properties);
            }
            let entries: Vec<&Entry> = updated.iter().filter_map(|uid| state.by_id(uid)).collect();
            if input_is_list {
                WireResponse::json(200, &state.documents(&entries, enrichers, entries.len()))
            } else {
                WireResponse::json(200, &state.render(entries[0], enrichers))
            }
        }
        "Log" => {
            let message = params.get("message").and_then(Value::as_str).unwrap_or_default();
            let level = params.get("level").and_then(Value::as_str).unwrap_or("info");
            state.log.push(format!("[{}] {}", level, message));
            WireResponse::empty(204)
        }
        "Business.BusinessCreateOperation" => {
            let Some(bean) = bean_value(input) else {
                return error(400, "Business operations require a bean input");
            };
            let parent_path = params.get("parentPath").and_then(Value::as_str).unwrap_or("/");
            let Some(parent) = state.uid_of(parent_path) else {
                return not_found(parent_path);
            };
            let name = params
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| bean.get("title").and_then(Value::as_str))
                .unwrap_or("bean");
            let doc_type = bean.get("type").and_then(Value::as_str).unwrap_or("Note");
            let title = bean.get("title").and_then(Value::as_str).unwrap_or(name);
            let uid = state.create(Some(parent.as_str()), name, doc_type, title);
            state.update(&uid, &bean_properties(&bean));
            bean_response(state, &uid)
        }
        "Business.BusinessFetchOperation" => match bean_value(input).and_then(|b| bean_id(&b)) {
            Some(uid) if state.by_id(&uid).is_some() => bean_response(state, &uid),
            Some(uid) => not_found(&uid),
            None => error(400, "Business fetch requires a bean with an id"),
        },
        "Business.BusinessUpdateOperation" => {
            let Some(bean) = bean_value(input) else {
                return error(400, "Business operations require a bean input");
            };
            match bean_id(&bean) {
                Some(uid) if state.by_id(&uid).is_some() => {
                    state.update(&uid, &bean_properties(&bean));
                    bean_response(state, &uid)
                }
                Some(uid) => not_found(&uid),
                None => error(400, "Business update requires a bean with an id"),
            }
        }
        other => error(404, format!("Operation {} not found", other)),
    }
}

fn bean_value(input: Option<&Value>) -> Option<Value> {
    let input = input?;
    if input.get("entity-type").and_then(Value::as_str) != Some(BUSINESS_BEAN_ADAPTER) {
        return None;
    }
    input.get("value").cloned()
}

fn bean_id(bean: &Value) -> Option<String> {
    bean.get("id").and_then(Value::as_str).map(str::to_string)
}

fn bean_properties(bean: &Value) -> Map<String, Value> {
    let mut properties = Map::new();
    if let Some(title) = bean.get("title") {
        properties.insert("dc:title".to_string(), title.clone());
    }
    if let Some(description) = bean.get("description") {
        properties.insert("dc:description".to_string(), description.clone());
    }
    properties
}

fn bean_response(state: &RepositoryState, uid: &str) -> WireResponse {
    let Some(entry) = state.by_id(uid) else {
        return not_found(uid);
    };
    let document = &entry.document;
    WireResponse::json(
        200,
        &json!({
            "entity-type": BUSINESS_BEAN_ADAPTER,
            "value": {
                "id": document.uid,
                "type": document.doc_type,
                "title": document.get("dc:title"),
                "description": document.get("dc:description"),
            }
        }),
    )
}
