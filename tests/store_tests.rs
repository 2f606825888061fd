//! SQLite realtime store tests

mod common;

use common::*;
use serde_json::{Value, json};
use support_chat_sync::{SqliteRealtimeStore, SyncSettings};
use support_chat_sync::StoreError;
use support_chat_sync::infrastructure::database::DatabaseConnection;
use support_chat_sync::infrastructure::documents::FieldWrites;
use support_chat_sync::infrastructure::query::{Direction, Filter, Query};
use support_chat_sync::infrastructure::traits::DocumentStore;
use tokio_test::{assert_err, assert_ok};

async fn next_ids(listener: &mut support_chat_sync::infrastructure::traits::Listener) -> Vec<String> {
    let snapshot = tokio::time::timeout(WAIT, listener.next())
        .await
        .expect("snapshot should arrive")
        .expect("listener should stay open")
        .expect("snapshot should not be an error");
    snapshot.into_iter().map(|d| d.id).collect()
}

#[tokio::test]
async fn test_migrations_create_documents_table() {
    init_logging();
    let connection = assert_ok!(DatabaseConnection::in_memory().await);

    let tables: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'documents'")
            .fetch_all(&*connection)
            .await
            .unwrap();

    assert_eq!(tables.len(), 1);
}

#[tokio::test]
async fn test_add_and_get() {
    let store = setup_store().await;

    let id = assert_ok!(
        store
            .add(
                "notes",
                FieldWrites::new()
                    .set("title", "hello")
                    .set("meta.tags", json!(["a", "b"]))
                    .server_timestamp("createdAt")
                    .server_timestamp("updatedAt"),
            )
            .await
    );

    let document = assert_ok!(store.get("notes", &id).await).expect("document should exist");
    assert_eq!(document.id, id);
    assert_eq!(document.get("title"), Some(&json!("hello")));
    assert_eq!(document.get("meta.tags"), Some(&json!(["a", "b"])));
    assert!(document.get("id").is_none());
    assert_eq!(document.get("createdAt"), document.get("updatedAt"));

    assert!(assert_ok!(store.get("notes", "missing").await).is_none());
    assert!(assert_ok!(store.get("other", &id).await).is_none());
}

#[tokio::test]
async fn test_server_timestamps_strictly_increase() {
    let store = setup_store().await;
    let mut previous = 0;

    for _ in 0..20 {
        let id = store
            .add("ticks", FieldWrites::new().server_timestamp("at"))
            .await
            .unwrap();
        let document = store.get("ticks", &id).await.unwrap().unwrap();
        let at = document.get("at").and_then(Value::as_i64).unwrap();
        assert!(at > previous);
        previous = at;
    }
}

#[tokio::test]
async fn test_update_missing_document_is_not_found() {
    let store = setup_store().await;

    let error = assert_err!(
        store
            .update("notes", "missing", FieldWrites::new().set("title", "x"))
            .await
    );

    assert!(matches!(error, StoreError::NotFound { ref id, .. } if id == "missing"));
}

#[tokio::test]
async fn test_update_merges_fields() -> anyhow::Result<()> {
    let store = setup_store().await;
    let id = store
        .add(
            "notes",
            FieldWrites::new().set("title", "a").set("counts.views", 1),
        )
        .await?;

    store
        .update(
            "notes",
            &id,
            FieldWrites::new()
                .increment("counts.views", 2)
                .increment("counts.likes", 1)
                .set("body", "text"),
        )
        .await?;

    let document = store
        .get("notes", &id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("note {id} vanished"))?;
    assert_eq!(document.get("title"), Some(&json!("a")));
    assert_eq!(document.get("counts.views"), Some(&json!(3)));
    assert_eq!(document.get("counts.likes"), Some(&json!(1)));
    assert_eq!(document.get("body"), Some(&json!("text")));

    Ok(())
}

#[tokio::test]
async fn test_listener_filters_orders_and_limits() {
    let store = setup_store().await;

    let rank = |n: i64, tag: &str| FieldWrites::new().set("rank", n).set("tag", tag);
    let low = store.add("items", rank(1, "keep")).await.unwrap();
    let high = store.add("items", rank(5, "keep")).await.unwrap();
    let tied = store.add("items", rank(5, "keep")).await.unwrap();
    store.add("items", rank(9, "drop")).await.unwrap();
    store.add("items", FieldWrites::new().set("tag", "keep")).await.unwrap();

    let query = Query::collection("items")
        .filter(Filter::not_eq("tag", "drop"))
        .order_by("rank", Direction::Descending)
        .limit(2);
    let mut listener = assert_ok!(store.listen(query).await);

    let (first, second) = if high > tied { (&high, &tied) } else { (&tied, &high) };
    assert_eq!(next_ids(&mut listener).await, vec![first.clone(), second.clone()]);

    let query = Query::collection("items")
        .filter(Filter::eq("tag", "keep"))
        .order_by("rank", Direction::Ascending);
    let mut listener = assert_ok!(store.listen(query).await);
    let ids = next_ids(&mut listener).await;
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], low);
}

#[tokio::test]
async fn test_listener_follows_changes_and_skips_identical_results() {
    let store = setup_store().await;
    let query = Query::collection("items")
        .filter(Filter::eq("visible", true))
        .order_by("rank", Direction::Ascending);

    let mut listener = assert_ok!(store.listen(query).await);
    assert_eq!(store.active_listeners(), 1);
    assert!(next_ids(&mut listener).await.is_empty());

    let visible = store
        .add("items", FieldWrites::new().set("visible", true).set("rank", 1))
        .await
        .unwrap();
    assert_eq!(next_ids(&mut listener).await, vec![visible.clone()]);

    // Neither of these changes the result.
    store
        .add("items", FieldWrites::new().set("visible", false).set("rank", 0))
        .await
        .unwrap();
    store
        .add("elsewhere", FieldWrites::new().set("visible", true).set("rank", 0))
        .await
        .unwrap();
    assert!(tokio::time::timeout(QUIET, listener.next()).await.is_err());

    store
        .update("items", &visible, FieldWrites::new().set("visible", false))
        .await
        .unwrap();
    assert!(next_ids(&mut listener).await.is_empty());

    listener.unsubscribe();
    assert_eq!(store.active_listeners(), 0);
}

#[tokio::test]
async fn test_dropping_listener_cancels_it() {
    let store = setup_store().await;

    let first = store.listen(Query::collection("items")).await.unwrap();
    let second = store.listen(Query::collection("items")).await.unwrap();
    assert_eq!(store.active_listeners(), 2);

    drop(first);
    assert_eq!(store.active_listeners(), 1);
    drop(second);
    assert_eq!(store.active_listeners(), 0);
}

#[tokio::test]
async fn test_file_database_persists_between_connections() {
    init_logging();
    let path = std::env::temp_dir().join(format!("support-chat-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let id = {
        let store = assert_ok!(SqliteRealtimeStore::connect(&url).await);
        store
            .add("notes", FieldWrites::new().set("title", "kept"))
            .await
            .unwrap()
    };

    let store = assert_ok!(SqliteRealtimeStore::connect(&url).await);
    let document = store.get("notes", &id).await.unwrap().unwrap();
    assert_eq!(document.get("title"), Some(&json!("kept")));

    drop(store);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_store_opens_the_configured_database() -> anyhow::Result<()> {
    init_logging();
    let path = std::env::temp_dir().join(format!("support-chat-{}.db", uuid::Uuid::new_v4()));
    let settings = SyncSettings {
        database_url: format!("sqlite://{}?mode=rwc", path.display()),
        ..SyncSettings::default()
    };

    let store = SqliteRealtimeStore::from_settings(&settings).await?;
    let id = store
        .add("notes", FieldWrites::new().set("title", "configured"))
        .await?;
    drop(store);
    assert!(path.exists());

    let reopened = SqliteRealtimeStore::connect(&settings.database_url).await?;
    assert!(reopened.get("notes", &id).await?.is_some());
    drop(reopened);
    let _ = std::fs::remove_file(&path);

    let in_memory = SqliteRealtimeStore::from_settings(&SyncSettings::default()).await?;
    assert!(in_memory.get("notes", &id).await?.is_none());

    Ok(())
}
