//! Conversation list rows as a viewer sees them, and search over them.

use crate::core::time_format::format_relative;
use crate::core::unread::unread_for;
use crate::infrastructure::entities::Conversation;
use chrono::{DateTime, TimeZone};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationPreview {
    pub conversation_id: String,
    pub counterpart_id: String,
    pub last_message: String,
    pub updated_label: String,
    pub unread_messages: u32,
}

impl ConversationPreview {
    /// `None` if `viewer_id` is not a participant of `conversation`.
    pub fn build<Tz: TimeZone>(
        conversation: &Conversation,
        viewer_id: &str,
        now: &DateTime<Tz>,
    ) -> Option<Self> {
        let slot = conversation.slot_of(viewer_id)?;

        Some(Self {
            conversation_id: conversation.id.clone(),
            counterpart_id: conversation.participant(slot.other()).id.clone(),
            last_message: conversation.last_message.clone(),
            updated_label: format_relative(
                &conversation.updated_at.with_timezone(&now.timezone()),
                now,
            ),
            unread_messages: unread_for(conversation, viewer_id),
        })
    }

    pub fn has_unread(&self) -> bool {
        self.unread_messages > 0
    }
}

pub fn previews<Tz: TimeZone>(
    conversations: &[Conversation],
    viewer_id: &str,
    now: &DateTime<Tz>,
) -> Vec<ConversationPreview> {
    conversations
        .iter()
        .filter_map(|conversation| ConversationPreview::build(conversation, viewer_id, now))
        .collect()
}

/// Case-insensitive search over the last message and the counterpart id. A blank term keeps
/// everything.
pub fn filter_previews<'a>(
    previews: &'a [ConversationPreview],
    term: &str,
) -> Vec<&'a ConversationPreview> {
    let term = term.trim().to_lowercase();

    previews
        .iter()
        .filter(|preview| {
            term.is_empty()
                || preview.last_message.to_lowercase().contains(&term)
                || preview.counterpart_id.to_lowercase().contains(&term)
        })
        .collect()
}
