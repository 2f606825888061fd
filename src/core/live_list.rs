//! A paginated, live-updating list over one store query.
//!
//! Both sync engines are built on this. It owns at most one listener at a time and is the only
//! writer of its item list: every snapshot replaces the list as a whole.

use crate::core::pagination::PaginationCursor;
use crate::error::{ChatError, StoreError};
use crate::infrastructure::documents::Document;
use crate::infrastructure::query::Query;
use crate::infrastructure::traits::{DocumentStore, Listener};
use async_stream::stream;
use futures_util::Stream;
use log::{debug, error};
use std::sync::Arc;

pub type Decoder<T> = fn(&Document) -> Result<T, StoreError>;

pub struct LiveList<T> {
    store: Arc<dyn DocumentStore>,
    query: Query,
    decode: Decoder<T>,
    cursor: PaginationCursor,
    listener: Option<Listener>,
    items: Vec<T>,
    loading: bool,
}

impl<T: Clone> LiveList<T> {
    /// `query` must not carry a limit; the cursor supplies it.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        query: Query,
        decode: Decoder<T>,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            query,
            decode,
            cursor: PaginationCursor::new(page_size),
            listener: None,
            items: Vec::new(),
            loading: false,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> &PaginationCursor {
        &self.cursor
    }

    /// A subscription is open but has not delivered its first snapshot yet.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_subscribed(&self) -> bool {
        self.listener.is_some()
    }

    /// Opens the live query at the current limit, cancelling any previous one first.
    pub async fn subscribe(&mut self) -> Result<(), ChatError> {
        self.unsubscribe();

        let query = self.query.clone().limit(self.cursor.documents_needed());
        debug!(
            "subscribing to {} with limit {}",
            query.collection,
            self.cursor.documents_needed()
        );

        self.loading = true;
        match self.store.listen(query).await {
            Ok(listener) => {
                self.listener = Some(listener);
                Ok(())
            }
            Err(e) => {
                error!("failed to subscribe to {}: {e}", self.query.collection);
                self.loading = false;
                Err(ChatError::Subscription(e))
            }
        }
    }

    /// Grows the window by one page and re-subscribes.
    ///
    /// Returns `Ok(false)` and does nothing while the current subscription is still loading or
    /// once the end of the collection has been reached.
    pub async fn request_more(&mut self) -> Result<bool, ChatError> {
        if self.loading || !self.cursor.request_more() {
            debug!(
                "not loading more from {} (loading: {}, end reached: {})",
                self.query.collection,
                self.loading,
                self.cursor.end_reached()
            );
            return Ok(false);
        }

        self.subscribe().await?;
        Ok(true)
    }

    /// Waits for the next snapshot and makes it the current list.
    ///
    /// Returns `None` when there is no subscription or the store ended it. A store error ends
    /// the subscription; nothing is retried.
    pub async fn next_snapshot(&mut self) -> Option<Result<&[T], ChatError>> {
        let snapshot = self.listener.as_mut()?.next().await;
        self.loading = false;

        match snapshot {
            None => {
                debug!("store closed the query on {}", self.query.collection);
                self.listener = None;
                None
            }
            Some(Err(e)) => {
                error!("subscription to {} failed: {e}", self.query.collection);
                self.listener = None;
                Some(Err(ChatError::Subscription(e)))
            }
            Some(Ok(documents)) => {
                let decode = self.decode;
                let decoded = documents.iter().map(decode).collect::<Result<Vec<T>, _>>();

                match decoded {
                    Ok(items) => {
                        self.cursor.observe(documents.len());
                        self.items = items;
                        Some(Ok(&self.items))
                    }
                    Err(e) => {
                        error!("undecodable snapshot from {}: {e}", self.query.collection);
                        Some(Err(ChatError::Subscription(e)))
                    }
                }
            }
        }
    }

    /// The snapshots as a stream of owned lists.
    pub fn snapshots(&mut self) -> impl Stream<Item = Result<Vec<T>, ChatError>> + '_ {
        let list = self;
        stream! {
            while let Some(snapshot) = list.next_snapshot().await {
                yield snapshot.map(|items| items.to_vec());
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(listener) = self.listener.take() {
            debug!("unsubscribing from {}", self.query.collection);
            listener.unsubscribe();
        }
        self.loading = false;
    }
}
