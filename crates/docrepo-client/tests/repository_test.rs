//! Repository facade tests against the in-memory server
//!
//! These tests cover the document verbs, caching, enrichers, custom
//! marshallers, callbacks and concurrent use of one client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use docrepo_client::marshaller::Payload;
use docrepo_client::mock::MockRepositoryServer;
use docrepo_client::{
    callback, ClientConfig, ClientResult, DocRepoClient, Document, Marshaller, OperationResult,
};
use docrepo_types::entity_types;
use tokio::sync::oneshot;

fn setup() -> (DocRepoClient, Arc<MockRepositoryServer>) {
    let server = Arc::new(MockRepositoryServer::new());
    let client = DocRepoClient::with_transport(ClientConfig::default(), server.clone()).unwrap();
    (client, server)
}

#[tokio::test]
async fn test_fetch_root() -> Result<()> {
    let (client, _server) = setup();
    let root = client.repository().fetch_document_root().await?;

    assert_eq!(root.doc_type, "Root");
    assert_eq!(root.entity_type, "document");
    assert_eq!(root.parent_ref.as_deref(), Some("/"));
    assert_eq!(root.path.as_deref(), Some("/"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_with_repository_name() -> Result<()> {
    let (client, server) = setup();
    let root = client.repository().fetch_document_root().await?;
    let repository_name = root.repository_name.clone().unwrap();

    let folder = client
        .repository()
        .repository_name(repository_name)
        .fetch_document_by_path("folder_2")
        .await?;
    assert_eq!(folder.doc_type, "Folder");
    assert_eq!(folder.parent_ref, root.uid);
    assert_eq!(folder.path.as_deref(), Some("/folder_2"));
    assert_eq!(folder.title.as_deref(), Some("Folder 2"));
    assert_eq!(server.requests().last().unwrap().path, "repo/test/path/folder_2");

    let err = client
        .repository()
        .repository_name("elsewhere")
        .fetch_document_root()
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_fetch_note_by_path_and_id() -> Result<()> {
    let (client, _server) = setup();
    let folder = client.repository().fetch_document_by_path("folder_1").await?;
    let note = client.repository().fetch_document_by_path("/folder_1/note_1").await?;

    assert_eq!(note.doc_type, "Note");
    assert_eq!(note.parent_ref, folder.uid);
    assert_eq!(note.path.as_deref(), Some("/folder_1/note_1"));
    assert_eq!(note.title.as_deref(), Some("Note 1"));

    let by_id = client.repository().fetch_document_by_id(note.id().unwrap()).await?;
    assert_eq!(by_id, note);
    Ok(())
}

#[tokio::test]
async fn test_create_document() -> Result<()> {
    let (client, _server) = setup();
    let folder = client.repository().fetch_document_by_path("folder_1").await?;

    let mut document = Document::new("file", "File");
    document.set("dc:title", "new title");
    let created = client
        .repository()
        .create_document_by_path("folder_1", &document)
        .await?;

    assert_eq!(created.doc_type, "File");
    assert_eq!(created.entity_type, "document");
    assert_eq!(created.parent_ref, folder.uid);
    assert_eq!(created.path.as_deref(), Some("/folder_1/file"));
    assert_eq!(created.title.as_deref(), Some("new title"));
    assert_eq!(created.get_str("dc:title"), Some("new title"));

    let nested = client
        .repository()
        .create_document_by_id(created.id().unwrap(), &Document::new("child", "Note"))
        .await?;
    assert_eq!(nested.path.as_deref(), Some("/folder_1/file/child"));
    Ok(())
}

#[tokio::test]
async fn test_query_reports_server_total() -> Result<()> {
    let (client, _server) = setup();
    let notes = client.repository().query("SELECT * From Note").await?;

    assert_eq!(notes.len(), 5);
    let first = &notes.documents()[0];
    assert_eq!(first.doc_type, "Note");
    assert_eq!(first.repository_name.as_deref(), Some("test"));
    assert_eq!(first.state.as_deref(), Some("project"));

    let page = client
        .automation("Repository.Query")
        .param("query", "SELECT * FROM Document")
        .param("pageSize", 2)
        .execute()
        .await?
        .into_documents()?;
    assert_eq!(page.len(), 2);
    assert!(page.total_size() > 2);
    Ok(())
}

#[tokio::test]
async fn test_cache_is_populated_and_refreshed() -> Result<()> {
    let (client, server) = setup();
    let repository = client.enable_cache().repository();

    let document = repository.fetch_document_by_path("folder_1/note_3").await?;
    assert_eq!(document.get_str("dc:title"), Some("Note 3"));
    assert_eq!(client.cache().size(), 1);

    // Mutating calls neither read nor invalidate the cache
    let mut update = Document::new("test update", "Note");
    update.set_id(document.id().unwrap());
    update.set("dc:title", "note updated");
    let updated = repository.update_document(&update).await?;
    assert_eq!(updated.get_str("dc:title"), Some("note updated"));

    let requests = server.request_count();
    let cached = repository.fetch_document_by_path("/folder_1/note_3").await?;
    assert_eq!(cached, document);
    assert_eq!(client.cache().size(), 1);
    assert_eq!(server.request_count(), requests);

    let refreshed = repository.refresh_cache().fetch_document_by_path("folder_1/note_3").await?;
    assert_eq!(refreshed.get_str("dc:title"), Some("note updated"));
    assert_eq!(client.cache().size(), 1);
    assert_eq!(server.request_count(), requests + 1);
    Ok(())
}

#[tokio::test]
async fn test_cache_keeps_enricher_variants_apart() -> Result<()> {
    let (client, server) = setup();
    client.enable_cache();

    client.repository().fetch_document_by_path("folder_2").await?;
    client.enrichers(["acls"]);
    let enriched = client.repository().fetch_document_by_path("folder_2").await?;

    assert_eq!(client.cache().size(), 2);
    assert!(enriched.context_parameter("acls").is_some());

    server.set_property("/folder_2", "dc:title", "changed");
    client.disable_cache();
    let live = client.repository().fetch_document_by_path("folder_2").await?;
    assert_eq!(live.get_str("dc:title"), Some("changed"));
    assert_eq!(client.cache().size(), 2);
    Ok(())
}

#[tokio::test]
async fn test_update_document() -> Result<()> {
    let (client, _server) = setup();
    let document = client.repository().fetch_document_by_path("folder_1/note_0").await?;
    assert_eq!(document.title.as_deref(), Some("Note 0"));

    let mut update = Document::new("test update", "Note");
    update.set_id(document.id().unwrap());
    update.set("dc:title", "note updated");
    update.set_title("note updated");
    update.set("dc:nature", "test");
    let updated = client.repository().update_document(&update).await?;
    assert_eq!(updated.get_str("dc:title"), Some("note updated"));
    assert_eq!(updated.get_str("dc:nature"), Some("test"));

    let stored = client.repository().fetch_document_by_id(updated.id().unwrap()).await?;
    assert_eq!(stored.get_str("dc:title"), Some("note updated"));
    assert_eq!(stored.get_str("dc:nature"), Some("test"));

    let unsaved = client
        .repository()
        .update_document(&Document::new("draft", "Note"))
        .await
        .unwrap_err();
    assert_eq!(unsaved.error_code(), "CLIENT_ENCODING");
    Ok(())
}

#[tokio::test]
async fn test_delete_document() -> Result<()> {
    let (client, server) = setup();
    let document = client.repository().fetch_document_by_path("folder_1/note_1").await?;
    let uid = document.id().unwrap().to_string();
    assert!(server.exists(&uid));

    client.repository().delete_document(&document).await?;
    assert!(!server.exists(&uid));
    Ok(())
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let (client, _server) = setup();
    let err = client
        .repository()
        .fetch_document_by_path("folder_1/wrong")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(err.remote_stack_trace().is_some());
    assert!(!err.is_transient());
}

struct FolderOnlyMarshaller;

impl Marshaller for FolderOnlyMarshaller {
    fn entity_type(&self) -> Option<&str> {
        Some(entity_types::DOCUMENT)
    }

    fn decode(&self, payload: Payload) -> ClientResult<OperationResult> {
        let mut document: Document = serde_json::from_value(payload.into_json()?)?;
        document.set("custom:decoded", true);
        Ok(OperationResult::Document(Box::new(document)))
    }
}

#[tokio::test]
async fn test_custom_marshaller_and_reset() -> Result<()> {
    let (client, _server) = setup();
    let folder = client
        .register_marshaller(FolderOnlyMarshaller)
        .repository()
        .fetch_document_by_path("folder_1")
        .await?;
    assert_eq!(folder.path.as_deref(), Some("/folder_1"));
    assert_eq!(folder.state.as_deref(), Some("project"));
    assert_eq!(folder.doc_type, "Folder");
    assert_eq!(folder.get("custom:decoded"), Some(&serde_json::json!(true)));

    client.clear_marshallers();
    let plain = client.repository().fetch_document_by_path("folder_1").await?;
    assert!(plain.get("custom:decoded").is_none());
    Ok(())
}

#[tokio::test]
async fn test_document_adapters() -> Result<()> {
    let (client, _server) = setup();
    let repository = client.repository();

    let folder = repository.fetch_document_by_path("folder_2").await?;
    let children = repository.fetch_children(&folder).await?;
    assert_eq!(children.len(), 1);
    assert_eq!(children.documents()[0].path.as_deref(), Some("/folder_2/file"));

    let acp = repository.fetch_acp(&folder).await?;
    assert_eq!(acp.acls()[0].name, "inherited");
    assert_eq!(acp.acls()[0].aces[0].username, "Administrator");

    let root = repository.fetch_document_root().await?;
    let audit = repository.fetch_audit(&root).await?;
    assert!(!audit.entries.is_empty());
    assert_eq!(audit.entries[0].category, "eventDocumentCategory");

    let file = repository.fetch_document_by_path("folder_2/file").await?;
    let blob = repository.fetch_blob(&file).await?;
    assert_eq!(blob.filename(), Some("fields.json"));
    assert!(blob.as_text().unwrap().starts_with("[\n  {\n    \"fieldType\": \"string\","));
    Ok(())
}

#[tokio::test]
async fn test_enrichers_fill_context_parameters() -> Result<()> {
    let (client, server) = setup();
    let document = client
        .enrichers(["acls", "breadcrumb"])
        .repository()
        .fetch_document_by_path("folder_2")
        .await?;

    let acls = document.context_parameter("acls").and_then(|v| v.as_array()).unwrap();
    assert_eq!(acls.len(), 1);
    let breadcrumb = document.context_parameter("breadcrumb").and_then(|v| v.as_object()).unwrap();
    assert_eq!(breadcrumb.len(), 2);
    assert_eq!(
        server.requests().last().unwrap().header("X-NXenrichers.document"),
        Some("acls,breadcrumb")
    );

    // Unknown enrichers are simply absent
    let document = client
        .enrichers(["unknown"])
        .repository()
        .fetch_document_by_path("folder_2")
        .await?;
    assert!(document.context_parameters.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fetch_with_callback() -> Result<()> {
    let (client, _server) = setup();

    let (tx, rx) = oneshot::channel::<ClientResult<Document>>();
    client.repository().fetch_document_root_with_callback(tx);
    let root = rx.await??;
    assert_eq!(root.doc_type, "Root");

    let (tx, rx) = oneshot::channel();
    client.repository().fetch_document_by_path_with_callback(
        "folder_1/wrong",
        callback(
            |_document: Document| panic!("expected a failure"),
            move |error| {
                let _ = tx.send(error.status());
            },
        ),
    );
    assert_eq!(rx.await?, Some(404));
    Ok(())
}

#[test]
fn test_fetch_with_callback_from_plain_threads() {
    let (client, _server) = setup();
    let (tx, rx) = std::sync::mpsc::channel();

    let workers: Vec<_> = ["", "folder_1/note_0"]
        .into_iter()
        .map(|path| {
            let client = client.clone();
            let tx = tx.clone();
            std::thread::spawn(move || {
                let deliver = callback(
                    move |document: Document| {
                        let _ = tx.send(document.doc_type);
                    },
                    |error| panic!("unexpected failure: {}", error),
                );
                if path.is_empty() {
                    client.repository().fetch_document_root_with_callback(deliver);
                } else {
                    client.repository().fetch_document_by_path_with_callback(path, deliver);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    drop(tx);

    // Every sender is gone once both callbacks have fired
    let mut types: Vec<String> = rx.iter().collect();
    types.sort();
    assert_eq!(types, vec!["Note".to_string(), "Root".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fetches_are_independent() -> Result<()> {
    let server = Arc::new(MockRepositoryServer::new().with_latency(Duration::from_millis(20)));
    let client = DocRepoClient::with_transport(ClientConfig::default(), server.clone())?;
    let note = client.repository().fetch_document_by_path("folder_1/note_2").await?;
    let uid = note.id().unwrap().to_string();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            let uid = uid.clone();
            tokio::spawn(async move {
                if i % 4 == 3 {
                    client.repository().fetch_document_by_path("folder_1/missing").await
                } else {
                    client.repository().fetch_document_by_id(&uid).await
                }
            })
        })
        .collect();

    let mut failures = 0;
    for handle in handles {
        match handle.await? {
            Ok(document) => assert_eq!(document.id(), Some(uid.as_str())),
            Err(error) => {
                assert!(error.is_not_found());
                failures += 1;
            }
        }
    }
    assert_eq!(failures, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cache_under_concurrent_fetches() -> Result<()> {
    let (client, _server) = setup();
    client.enable_cache();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let path = format!("folder_1/note_{}", i % 4);
                client.repository().fetch_document_by_path(&path).await
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await??.doc_type, "Note");
    }
    assert_eq!(client.cache().size(), 4);
    Ok(())
}
