//! Domain entities

use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::str::FromStr;

/// Per-participant visibility of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Active,
    DeletedAt(DateTime<Utc>),
}

impl Deletion {
    pub fn is_active(&self) -> bool {
        matches!(self, Deletion::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationParticipant {
    pub id: String,
    pub unread_messages: u32,
    pub deletion: Deletion,
    pub is_typing: bool,
}

impl ConversationParticipant {
    /// A participant with nothing unread, not deleted and not typing.
    pub fn fresh(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unread_messages: 0,
            deletion: Deletion::Active,
            is_typing: false,
        }
    }
}

/// Which side of a conversation a participant occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantSlot {
    First,
    Second,
}

impl ParticipantSlot {
    /// Name of the participant object inside a persisted conversation.
    pub fn field(&self) -> &'static str {
        match self {
            ParticipantSlot::First => "firstParticipant",
            ParticipantSlot::Second => "secondParticipant",
        }
    }

    pub fn other(&self) -> ParticipantSlot {
        match self {
            ParticipantSlot::First => ParticipantSlot::Second,
            ParticipantSlot::Second => ParticipantSlot::First,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub first_participant: ConversationParticipant,
    pub second_participant: ConversationParticipant,
    pub last_message: String,
    pub last_message_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn participant(&self, slot: ParticipantSlot) -> &ConversationParticipant {
        match slot {
            ParticipantSlot::First => &self.first_participant,
            ParticipantSlot::Second => &self.second_participant,
        }
    }

    pub fn slot_of(&self, user_id: &str) -> Option<ParticipantSlot> {
        if self.first_participant.id == user_id {
            Some(ParticipantSlot::First)
        } else if self.second_participant.id == user_id {
            Some(ParticipantSlot::Second)
        } else {
            None
        }
    }

    /// Created but no message sent into it yet.
    pub fn is_empty(&self) -> bool {
        self.last_message_id.is_empty()
    }

    /// Whether the conversation belongs in `user_id`'s conversation list.
    pub fn is_listed_for(&self, user_id: &str) -> bool {
        !self.is_empty()
            && [ParticipantSlot::First, ParticipantSlot::Second]
                .into_iter()
                .map(|slot| self.participant(slot))
                .any(|participant| participant.id == user_id && participant.deletion.is_active())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Video,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Video => "video",
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageKind::Text),
            "image" => Ok(MessageKind::Image),
            "video" => Ok(MessageKind::Video),
            other => Err(format!("unknown message type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    pub kind: MessageKind,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub conversation_id: String,
    pub body: MessageBody,
    pub created_at: DateTime<Utc>,
    pub time_read: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_read(&self) -> bool {
        self.time_read.is_some()
    }
}
