//! Live conversation list of one user.

use crate::config::SyncSettings;
use crate::core::live_list::LiveList;
use crate::core::participants::Roles;
use crate::core::unread::{UnreadAggregator, participant_field};
use crate::error::ChatError;
use crate::infrastructure::converters::{
    DELETED_AT, IS_TYPING, LAST_MESSAGE_ID, UPDATED_AT, conversation_from_persisted,
    empty_conversation_to_persisted,
};
use crate::infrastructure::documents::FieldWrites;
use crate::infrastructure::entities::{Conversation, ConversationParticipant, ParticipantSlot};
use crate::infrastructure::query::{Direction, Filter, Query};
use crate::infrastructure::traits::DocumentStore;
use futures_util::Stream;
use log::{error, info};
use serde_json::Value;
use std::sync::Arc;

/// Conversations listed for `user_id`: at least one message, not deleted on the user's side,
/// most recently updated first.
pub fn listing_query(collection: &str, user_id: &str) -> Query {
    let side = |slot: ParticipantSlot| {
        Filter::and([
            Filter::eq(participant_field(slot, "id"), user_id),
            Filter::eq(participant_field(slot, DELETED_AT), Value::Null),
        ])
    };

    Query::collection(collection)
        .filter(Filter::and([
            Filter::not_eq(LAST_MESSAGE_ID, ""),
            Filter::or([side(ParticipantSlot::First), side(ParticipantSlot::Second)]),
        ]))
        .order_by(UPDATED_AT, Direction::Descending)
}

pub struct ConversationSyncEngine {
    user_id: String,
    store: Arc<dyn DocumentStore>,
    collection: String,
    aggregator: UnreadAggregator,
    list: LiveList<Conversation>,
}

impl std::fmt::Debug for ConversationSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSyncEngine")
            .field("user_id", &self.user_id)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl ConversationSyncEngine {
    /// Fails with [`ChatError::MissingIdentity`] when `user_id` is empty.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        user_id: impl Into<String>,
        settings: &SyncSettings,
    ) -> Result<Self, ChatError> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(ChatError::MissingIdentity);
        }

        let collection = settings.conversations_collection.clone();
        let list = LiveList::new(
            Arc::clone(&store),
            listing_query(&collection, &user_id),
            conversation_from_persisted,
            settings.conversation_page_size,
        );

        Ok(Self {
            aggregator: UnreadAggregator::new(Arc::clone(&store), collection.clone()),
            user_id,
            store,
            collection,
            list,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The latest snapshot, most recently updated first.
    pub fn conversations(&self) -> &[Conversation] {
        self.list.items()
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

    pub async fn next_snapshot(&mut self) -> Option<Result<&[Conversation], ChatError>> {
        self.list.next_snapshot().await
    }

    pub fn snapshots(&mut self) -> impl Stream<Item = Result<Vec<Conversation>, ChatError>> + '_ {
        self.list.snapshots()
    }

    pub fn unsubscribe(&mut self) {
        self.list.unsubscribe();
    }

    /// Creates a conversation with no message yet and returns its id.
    ///
    /// The participants are stored in canonical order regardless of argument order. The
    /// conversation stays out of every listing until a message is sent into it.
    pub async fn create_empty_conversation(
        &self,
        first: ConversationParticipant,
        second: ConversationParticipant,
    ) -> Result<String, ChatError> {
        let roles = Roles::resolve(&first.id, &second.id)?;
        let (first, second) = if roles.first() == first.id {
            (first, second)
        } else {
            (second, first)
        };

        let id = self
            .store
            .add(
                &self.collection,
                empty_conversation_to_persisted(&first, &second),
            )
            .await
            .map_err(|e| {
                error!("failed to create conversation: {e}");
                ChatError::WriteFailure(e)
            })?;

        info!(
            "created conversation {id} between {} and {}",
            first.id, second.id
        );
        Ok(id)
    }

    /// Creates an empty conversation between this engine's user and `other_user_id`.
    pub async fn start_conversation_with(&self, other_user_id: &str) -> Result<String, ChatError> {
        self.create_empty_conversation(
            ConversationParticipant::fresh(self.user_id.as_str()),
            ConversationParticipant::fresh(other_user_id),
        )
        .await
    }

    pub async fn mark_read(
        &self,
        conversation_id: &str,
        reader: ParticipantSlot,
    ) -> Result<(), ChatError> {
        self.aggregator.mark_read(conversation_id, reader).await
    }

    /// Hides the conversation from one participant. The other side keeps seeing it.
    pub async fn delete_for(
        &self,
        conversation_id: &str,
        slot: ParticipantSlot,
    ) -> Result<(), ChatError> {
        let update = FieldWrites::new().server_timestamp(participant_field(slot, DELETED_AT));
        self.write(conversation_id, update).await?;

        info!("deleted conversation {conversation_id} for {slot:?}");
        Ok(())
    }

    pub async fn set_typing(
        &self,
        conversation_id: &str,
        slot: ParticipantSlot,
        typing: bool,
    ) -> Result<(), ChatError> {
        let update = FieldWrites::new().set(participant_field(slot, IS_TYPING), typing);
        self.write(conversation_id, update).await
    }

    async fn write(&self, conversation_id: &str, update: FieldWrites) -> Result<(), ChatError> {
        self.store
            .update(&self.collection, conversation_id, update)
            .await
            .map_err(|e| {
                error!("failed to update conversation {conversation_id}: {e}");
                ChatError::WriteFailure(e)
            })
    }
}
