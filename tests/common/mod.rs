//! Shared setup for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use support_chat_sync::error::StoreError;
use support_chat_sync::infrastructure::converters::{
    conversation_from_persisted, conversation_to_persisted,
};
use support_chat_sync::infrastructure::documents::{Document, FieldWrites};
use support_chat_sync::infrastructure::entities::{
    Conversation, ConversationParticipant, Deletion, Message,
};
use support_chat_sync::infrastructure::query::Query;
use support_chat_sync::infrastructure::traits::{DocumentStore, Listener};
use support_chat_sync::{
    ConversationSyncEngine, MessageSyncEngine, SqliteRealtimeStore, SyncSettings,
};

pub const WAIT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(150);

pub fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Fresh in-memory store per test.
pub async fn setup_store() -> Arc<SqliteRealtimeStore> {
    init_logging();
    Arc::new(
        SqliteRealtimeStore::in_memory()
            .await
            .expect("in-memory store should open"),
    )
}

pub fn settings() -> SyncSettings {
    SyncSettings::default()
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
}

/// A conversation that already carries a message, updated at `updated_at`.
pub fn listed_conversation(a: &str, b: &str, updated_at: DateTime<Utc>) -> Conversation {
    let (first, second) = if a < b { (a, b) } else { (b, a) };

    Conversation {
        id: String::new(),
        first_participant: ConversationParticipant::fresh(first),
        second_participant: ConversationParticipant::fresh(second),
        last_message: format!("hello from {a}"),
        last_message_id: format!("message-{a}-{b}"),
        created_at: updated_at,
        updated_at,
    }
}

pub fn deleted(mut participant: ConversationParticipant, at: DateTime<Utc>) -> ConversationParticipant {
    participant.deletion = Deletion::DeletedAt(at);
    participant
}

pub async fn seed_conversation(store: &dyn DocumentStore, conversation: &Conversation) -> String {
    store
        .add("conversations", conversation_to_persisted(conversation))
        .await
        .expect("seeding a conversation should succeed")
}

/// Reads snapshots until one satisfies `accept`, failing after [`WAIT`].
pub async fn wait_for_conversations(
    engine: &mut ConversationSyncEngine,
    accept: impl Fn(&[Conversation]) -> bool,
) -> Vec<Conversation> {
    tokio::time::timeout(WAIT, async {
        loop {
            match engine.next_snapshot().await {
                Some(Ok(conversations)) if accept(conversations) => return conversations.to_vec(),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("conversation subscription failed: {e}"),
                None => panic!("conversation subscription ended"),
            }
        }
    })
    .await
    .expect("expected conversation snapshot did not arrive in time")
}

pub async fn wait_for_messages(
    engine: &mut MessageSyncEngine,
    accept: impl Fn(&[Message]) -> bool,
) -> Vec<Message> {
    tokio::time::timeout(WAIT, async {
        loop {
            match engine.next_snapshot().await {
                Some(Ok(messages)) if accept(messages) => return messages.to_vec(),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("message subscription failed: {e}"),
                None => panic!("message subscription ended"),
            }
        }
    })
    .await
    .expect("expected message snapshot did not arrive in time")
}

pub async fn load_conversation(store: &dyn DocumentStore, id: &str) -> Conversation {
    let document = store
        .get("conversations", id)
        .await
        .expect("reading a conversation should succeed")
        .expect("conversation should exist");
    conversation_from_persisted(&document).expect("conversation should decode")
}

/// Store wrapper that fails selected operations on demand and counts writes.
pub struct FlakyStore {
    pub inner: Arc<SqliteRealtimeStore>,
    pub fail_adds_to: std::sync::Mutex<Option<String>>,
    pub fail_updates_to: std::sync::Mutex<Option<String>>,
    pub fail_listen: AtomicBool,
    pub updates: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteRealtimeStore>) -> Self {
        Self {
            inner,
            fail_adds_to: std::sync::Mutex::new(None),
            fail_updates_to: std::sync::Mutex::new(None),
            fail_listen: AtomicBool::new(false),
            updates: AtomicUsize::new(0),
        }
    }

    pub fn fail_adds_to(&self, collection: Option<&str>) {
        *self.fail_adds_to.lock().unwrap() = collection.map(str::to_owned);
    }

    pub fn fail_updates_to(&self, collection: Option<&str>) {
        *self.fail_updates_to.lock().unwrap() = collection.map(str::to_owned);
    }

    fn fails(slot: &std::sync::Mutex<Option<String>>, collection: &str) -> bool {
        slot.lock().unwrap().as_deref() == Some(collection)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn listen(&self, query: Query) -> Result<Listener, StoreError> {
        if self.fail_listen.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("listen refused".to_owned()));
        }
        self.inner.listen(query).await
    }

    async fn add(&self, collection: &str, fields: FieldWrites) -> Result<String, StoreError> {
        if Self::fails(&self.fail_adds_to, collection) {
            return Err(StoreError::Rejected(format!("add to {collection} refused")));
        }
        self.inner.add(collection, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: FieldWrites,
    ) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if Self::fails(&self.fail_updates_to, collection) {
            return Err(StoreError::Rejected(format!(
                "update of {collection}/{id} refused"
            )));
        }
        self.inner.update(collection, id, fields).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }
}
