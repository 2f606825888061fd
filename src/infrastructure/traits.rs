//! Infrastructure traits, used for DI on higher levels

use crate::error::StoreError;
use crate::infrastructure::documents::{Document, FieldWrites};
use crate::infrastructure::query::Query;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub type Snapshot = Result<Vec<Document>, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a live query. The first snapshot reflects the current state, later ones follow
    /// every committed change that alters the result.
    async fn listen(&self, query: Query) -> Result<Listener, StoreError>;

    /// Appends a document with a generated id and returns that id once committed.
    async fn add(&self, collection: &str, fields: FieldWrites) -> Result<String, StoreError>;

    /// Updates fields of an existing document.
    ///
    /// Returns `Err(StoreError::NotFound)` if the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: FieldWrites)
    -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
}

/// Handle to one live query. Dropping it, or calling [`Listener::unsubscribe`], cancels the
/// query on the store side.
pub struct Listener {
    snapshots: mpsc::Receiver<Snapshot>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Listener {
    pub fn new(snapshots: mpsc::Receiver<Snapshot>, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            snapshots,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Waits for the next snapshot. `None` means the store closed the query.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.snapshots.recv().await
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
