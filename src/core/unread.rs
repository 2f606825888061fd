//! Unread counters and last-message previews of conversations.
//!
//! The conversation document is derived data: it is rewritten after every message append and
//! only ever charges the unread count of the receiving side.

use crate::core::participants::receiver_slot;
use crate::error::{ChatError, StoreError};
use crate::infrastructure::converters::{LAST_MESSAGE, LAST_MESSAGE_ID, UNREAD_MESSAGES, UPDATED_AT};
use crate::infrastructure::documents::FieldWrites;
use crate::infrastructure::entities::{Conversation, ParticipantSlot};
use crate::infrastructure::traits::DocumentStore;
use log::{debug, error};
use std::sync::Arc;

/// Path of a participant's field inside a conversation, e.g. `secondParticipant.unreadMessages`.
pub fn participant_field(slot: ParticipantSlot, field: &str) -> String {
    format!("{}.{field}", slot.field())
}

/// The conversation update that follows a message append.
pub fn preview_update(message_id: &str, content: &str, receiver: ParticipantSlot) -> FieldWrites {
    FieldWrites::new()
        .set(LAST_MESSAGE, content)
        .set(LAST_MESSAGE_ID, message_id)
        .increment(participant_field(receiver, UNREAD_MESSAGES), 1)
        .server_timestamp(UPDATED_AT)
}

/// Unread count shown to `viewer_id`, or zero if they are not part of the conversation.
pub fn unread_for(conversation: &Conversation, viewer_id: &str) -> u32 {
    conversation
        .slot_of(viewer_id)
        .map(|slot| conversation.participant(slot).unread_messages)
        .unwrap_or(0)
}

#[derive(Clone)]
pub struct UnreadAggregator {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl UnreadAggregator {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Points the conversation at its newest message and charges the receiver one unread.
    pub async fn record_message(
        &self,
        conversation_id: &str,
        message_id: &str,
        content: &str,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<(), ChatError> {
        let receiver = receiver_slot(sender_id, receiver_id)?;
        debug!("charging {receiver:?} of {conversation_id} for message {message_id}");

        self.apply(conversation_id, preview_update(message_id, content, receiver))
            .await
            .map_err(ChatError::WriteFailure)
    }

    pub async fn mark_read(
        &self,
        conversation_id: &str,
        reader: ParticipantSlot,
    ) -> Result<(), ChatError> {
        let update = FieldWrites::new().set(participant_field(reader, UNREAD_MESSAGES), 0);

        self.apply(conversation_id, update)
            .await
            .map_err(ChatError::WriteFailure)
    }

    async fn apply(&self, conversation_id: &str, update: FieldWrites) -> Result<(), StoreError> {
        self.store
            .update(&self.collection, conversation_id, update)
            .await
            .inspect_err(|e| error!("failed to update conversation {conversation_id}: {e}"))
    }
}
