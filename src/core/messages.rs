//! Live message list of one conversation, and sending into it.

use crate::config::SyncSettings;
use crate::core::live_list::LiveList;
use crate::core::participants::{Roles, receiver_slot};
use crate::core::unread::UnreadAggregator;
use crate::error::ChatError;
use crate::infrastructure::converters::{
    CONVERSATION_ID, CREATED_AT, TIME_READ, message_from_persisted, new_text_message_to_persisted,
};
use crate::infrastructure::documents::FieldWrites;
use crate::infrastructure::entities::Message;
use crate::infrastructure::query::{Direction, Filter, Query};
use crate::infrastructure::traits::DocumentStore;
use futures_util::Stream;
use log::{debug, error, warn};
use std::sync::Arc;

/// Messages of one conversation, newest first.
pub fn conversation_query(collection: &str, conversation_id: &str) -> Query {
    Query::collection(collection)
        .filter(Filter::eq(CONVERSATION_ID, conversation_id))
        .order_by(CREATED_AT, Direction::Descending)
}

/// What happened to a message that was accepted by the store.
#[derive(Debug)]
pub enum SendOutcome {
    /// The message and the conversation preview were both written.
    Delivered { message_id: String },
    /// The message exists but the conversation still shows the previous preview and unread
    /// count. The next successful send overwrites both.
    PreviewStale {
        message_id: String,
        reason: ChatError,
    },
}

impl SendOutcome {
    pub fn message_id(&self) -> &str {
        match self {
            SendOutcome::Delivered { message_id } => message_id,
            SendOutcome::PreviewStale { message_id, .. } => message_id,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered { .. })
    }
}

pub struct MessageSyncEngine {
    conversation_id: String,
    store: Arc<dyn DocumentStore>,
    collection: String,
    aggregator: UnreadAggregator,
    list: LiveList<Message>,
}

impl MessageSyncEngine {
    /// Fails with [`ChatError::InvalidParticipants`] when `conversation_id` is empty.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        conversation_id: impl Into<String>,
        settings: &SyncSettings,
    ) -> Result<Self, ChatError> {
        let conversation_id = conversation_id.into();
        if conversation_id.is_empty() {
            return Err(ChatError::InvalidParticipants(
                "a conversation id is required".to_owned(),
            ));
        }

        let collection = settings.messages_collection.clone();
        let list = LiveList::new(
            Arc::clone(&store),
            conversation_query(&collection, &conversation_id),
            message_from_persisted,
            settings.message_page_size,
        );

        Ok(Self {
            aggregator: UnreadAggregator::new(
                Arc::clone(&store),
                settings.conversations_collection.clone(),
            ),
            conversation_id,
            store,
            collection,
            list,
        })
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// The latest snapshot, newest first.
    pub fn messages(&self) -> &[Message] {
        self.list.items()
    }

    /// The latest snapshot, oldest first.
    pub fn messages_for_display(&self) -> Vec<&Message> {
        self.list.items().iter().rev().collect()
    }

    pub fn is_loading(&self) -> bool {
        self.list.is_loading()
    }

    pub fn is_subscribed(&self) -> bool {
        self.list.is_subscribed()
    }

    pub fn end_reached(&self) -> bool {
        self.list.cursor().end_reached()
    }

    pub fn documents_needed(&self) -> usize {
        self.list.cursor().documents_needed()
    }

    pub async fn subscribe(&mut self) -> Result<(), ChatError> {
        self.list.subscribe().await
    }

    pub async fn request_more(&mut self) -> Result<bool, ChatError> {
        self.list.request_more().await
    }

    pub async fn next_snapshot(&mut self) -> Option<Result<&[Message], ChatError>> {
        self.list.next_snapshot().await
    }

    pub fn snapshots(&mut self) -> impl Stream<Item = Result<Vec<Message>, ChatError>> + '_ {
        self.list.snapshots()
    }

    pub fn unsubscribe(&mut self) {
        self.list.unsubscribe();
    }

    /// Appends a text message, then updates the conversation preview and the receiver's unread
    /// count.
    ///
    /// The message is written first so the conversation never points at a message that does
    /// not exist. If the append fails nothing else is written and the error is returned.
    pub async fn send_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<SendOutcome, ChatError> {
        if sender_id.is_empty() {
            return Err(ChatError::MissingIdentity);
        }
        if content.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        receiver_slot(sender_id, receiver_id)?;

        let message_id = self
            .store
            .add(
                &self.collection,
                new_text_message_to_persisted(
                    &self.conversation_id,
                    sender_id,
                    receiver_id,
                    content,
                ),
            )
            .await
            .map_err(|e| {
                error!(
                    "failed to send message into {}: {e}",
                    self.conversation_id
                );
                ChatError::WriteFailure(e)
            })?;
        debug!("sent message {message_id} into {}", self.conversation_id);

        match self
            .aggregator
            .record_message(
                &self.conversation_id,
                &message_id,
                content,
                sender_id,
                receiver_id,
            )
            .await
        {
            Ok(()) => Ok(SendOutcome::Delivered { message_id }),
            Err(reason) => {
                warn!(
                    "message {message_id} was stored but conversation {} was not updated: {reason}",
                    self.conversation_id
                );
                Ok(SendOutcome::PreviewStale { message_id, reason })
            }
        }
    }

    /// Stamps `timeRead` on every loaded message addressed to `reader_id` that is still unread,
    /// then clears the reader's unread count. Returns how many messages were stamped.
    pub async fn acknowledge(&self, reader_id: &str) -> Result<usize, ChatError> {
        if reader_id.is_empty() {
            return Err(ChatError::MissingIdentity);
        }

        let unread: Vec<&Message> = self
            .list
            .items()
            .iter()
            .filter(|message| message.receiver_id == reader_id && !message.is_read())
            .collect();

        for message in &unread {
            self.store
                .update(
                    &self.collection,
                    &message.id,
                    FieldWrites::new().server_timestamp(TIME_READ),
                )
                .await
                .map_err(|e| {
                    error!("failed to mark message {} as read: {e}", message.id);
                    ChatError::WriteFailure(e)
                })?;
        }

        if let Some(message) = self.list.items().first() {
            let roles = Roles::resolve(&message.sender_id, &message.receiver_id)?;
            if let Some(slot) = roles.slot_of(reader_id) {
                self.aggregator
                    .mark_read(&self.conversation_id, slot)
                    .await?;
            }
        }

        Ok(unread.len())
    }
}
