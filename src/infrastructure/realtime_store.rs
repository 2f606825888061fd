//! Realtime document store backed by SQLite.
//!
//! Documents are kept as JSON text in a single table. Live queries are re-evaluated after every
//! committed write to their collection and a snapshot is pushed whenever the result changed.

use crate::config::SyncSettings;
use crate::error::StoreError;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::documents::{Document, FieldWrites};
use crate::infrastructure::query::Query;
use crate::infrastructure::traits::{DocumentStore, Listener, Snapshot};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

const CHANGE_FEED_CAPACITY: usize = 256;
const SNAPSHOT_BUFFER: usize = 16;

pub struct SqliteRealtimeStore {
    connection: DatabaseConnection,
    changes: broadcast::Sender<String>,
    last_timestamp: Mutex<i64>,
    active_listeners: Arc<AtomicUsize>,
}

impl SqliteRealtimeStore {
    pub fn new(connection: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Self {
            connection,
            changes,
            last_timestamp: Mutex::new(0),
            active_listeners: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(DatabaseConnection::connect(database_url).await?))
    }

    /// Connects to the configured `database_url`.
    pub async fn from_settings(settings: &SyncSettings) -> Result<Self, StoreError> {
        Self::connect(&settings.database_url).await
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(DatabaseConnection::in_memory().await?))
    }

    /// Number of live queries that have not been cancelled yet.
    pub fn active_listeners(&self) -> usize {
        self.active_listeners.load(Ordering::SeqCst)
    }

    /// Commit time in microseconds. Strictly increasing for this store instance.
    fn server_timestamp(&self) -> i64 {
        let mut last = self
            .last_timestamp
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Utc::now().timestamp_micros().max(*last + 1);
        *last = now;
        now
    }

    fn notify(&self, collection: &str) {
        // No receivers simply means nobody is listening.
        let _ = self.changes.send(collection.to_owned());
    }
}

#[async_trait]
impl DocumentStore for SqliteRealtimeStore {
    async fn listen(&self, query: Query) -> Result<Listener, StoreError> {
        // Subscribe before the first read so no commit can slip in between.
        let mut changes = self.changes.subscribe();
        let initial = run_query(&self.connection, &query).await?;

        let (sender, receiver) = mpsc::channel::<Snapshot>(SNAPSHOT_BUFFER);
        let connection = self.connection.clone();

        debug!(
            "listening on {} with limit {:?}",
            query.collection, query.limit
        );

        let task = tokio::spawn(async move {
            let mut last = initial;
            if sender.send(Ok(last.clone())).await.is_err() {
                return;
            }

            loop {
                match changes.recv().await {
                    Ok(collection) if collection != query.collection => continue,
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }

                match run_query(&connection, &query).await {
                    Ok(documents) => {
                        if documents == last {
                            continue;
                        }
                        last = documents;
                        if sender.send(Ok(last.clone())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("live query on {} failed: {e}", query.collection);
                        let _ = sender.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        self.active_listeners.fetch_add(1, Ordering::SeqCst);
        let active_listeners = Arc::clone(&self.active_listeners);

        Ok(Listener::new(receiver, move || {
            task.abort();
            active_listeners.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    async fn add(&self, collection: &str, fields: FieldWrites) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let mut body = Map::new();
        fields.apply_to(&mut body, self.server_timestamp());

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(&id)
            .bind(serde_json::to_string(&Value::Object(body))?)
            .execute(&*self.connection)
            .await
            .map_err(|e| {
                error!("{e}");
                StoreError::from(e)
            })?;

        debug!("added {collection}/{id}");
        self.notify(collection);

        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: FieldWrites,
    ) -> Result<(), StoreError> {
        let mut transaction = self.connection.begin().await?;

        let body: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&mut *transaction)
                .await?;

        let Some((body,)) = body else {
            return Err(StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            });
        };

        let mut document = parse_body(id, &body)?;
        fields.apply_to(&mut document, self.server_timestamp());

        sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND id = ?")
            .bind(serde_json::to_string(&Value::Object(document))?)
            .bind(collection)
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;

        debug!("updated {collection}/{id}");
        self.notify(collection);

        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&*self.connection)
                .await?;

        row.map(|(body,)| parse_body(id, &body).map(|fields| Document::new(id, fields)))
            .transpose()
    }
}

async fn run_query(pool: &SqlitePool, query: &Query) -> Result<Vec<Document>, StoreError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT id, body FROM documents WHERE collection = ?")
            .bind(&query.collection)
            .fetch_all(pool)
            .await?;

    let documents = rows
        .into_iter()
        .map(|(id, body)| parse_body(&id, &body).map(|fields| Document::new(id, fields)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(query.apply(documents))
}

fn parse_body(id: &str, body: &str) -> Result<Map<String, Value>, StoreError> {
    match serde_json::from_str(body)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::Malformed {
            id: id.to_owned(),
            reason: "document body is not an object".to_owned(),
        }),
    }
}
