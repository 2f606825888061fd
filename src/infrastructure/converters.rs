//! Mapping between domain entities and persisted documents.
//!
//! Both directions use explicit field lists. The document id is never written into the body;
//! on read it is taken from the document key.

use crate::error::StoreError;
use crate::infrastructure::documents::{Document, FieldWrites};
use crate::infrastructure::entities::{
    Conversation, ConversationParticipant, Deletion, Message, MessageBody, MessageKind,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

pub const CONVERSATION_ID: &str = "conversationId";
pub const CREATED_AT: &str = "createdAt";
pub const DELETED_AT: &str = "deletedAt";
pub const IS_TYPING: &str = "isTyping";
pub const LAST_MESSAGE: &str = "lastMessage";
pub const LAST_MESSAGE_ID: &str = "lastMessageId";
pub const TIME_READ: &str = "timeRead";
pub const UNREAD_MESSAGES: &str = "unreadMessages";
pub const UPDATED_AT: &str = "updatedAt";

pub fn timestamp_to_value(timestamp: &DateTime<Utc>) -> Value {
    Value::from(timestamp.timestamp_micros())
}

pub fn participant_to_persisted(participant: &ConversationParticipant) -> Value {
    let deleted_at = match participant.deletion {
        Deletion::Active => Value::Null,
        Deletion::DeletedAt(at) => timestamp_to_value(&at),
    };

    json!({
        "id": participant.id,
        UNREAD_MESSAGES: participant.unread_messages,
        DELETED_AT: deleted_at,
        IS_TYPING: participant.is_typing,
    })
}

pub fn conversation_to_persisted(conversation: &Conversation) -> FieldWrites {
    FieldWrites::new()
        .set(
            "firstParticipant",
            participant_to_persisted(&conversation.first_participant),
        )
        .set(
            "secondParticipant",
            participant_to_persisted(&conversation.second_participant),
        )
        .set(LAST_MESSAGE, conversation.last_message.as_str())
        .set(LAST_MESSAGE_ID, conversation.last_message_id.as_str())
        .set(CREATED_AT, timestamp_to_value(&conversation.created_at))
        .set(UPDATED_AT, timestamp_to_value(&conversation.updated_at))
}

/// A conversation without any message; both timestamps are assigned by the store.
pub fn empty_conversation_to_persisted(
    first: &ConversationParticipant,
    second: &ConversationParticipant,
) -> FieldWrites {
    FieldWrites::new()
        .set("firstParticipant", participant_to_persisted(first))
        .set("secondParticipant", participant_to_persisted(second))
        .set(LAST_MESSAGE, "")
        .set(LAST_MESSAGE_ID, "")
        .server_timestamp(CREATED_AT)
        .server_timestamp(UPDATED_AT)
}

fn body_to_persisted(body: &MessageBody) -> Value {
    json!({
        "type": body.kind.as_str(),
        "content": body.content,
    })
}

pub fn message_to_persisted(message: &Message) -> FieldWrites {
    FieldWrites::new()
        .set("senderId", message.sender_id.as_str())
        .set("receiverId", message.receiver_id.as_str())
        .set(CONVERSATION_ID, message.conversation_id.as_str())
        .set("message", body_to_persisted(&message.body))
        .set(CREATED_AT, timestamp_to_value(&message.created_at))
        .set(
            TIME_READ,
            message
                .time_read
                .as_ref()
                .map_or(Value::Null, timestamp_to_value),
        )
}

/// A new unread text message stamped by the store.
pub fn new_text_message_to_persisted(
    conversation_id: &str,
    sender_id: &str,
    receiver_id: &str,
    content: &str,
) -> FieldWrites {
    FieldWrites::new()
        .set("senderId", sender_id)
        .set("receiverId", receiver_id)
        .set(CONVERSATION_ID, conversation_id)
        .set(
            "message",
            body_to_persisted(&MessageBody {
                kind: MessageKind::Text,
                content: content.to_owned(),
            }),
        )
        .server_timestamp(CREATED_AT)
        .set(TIME_READ, Value::Null)
}

pub fn conversation_from_persisted(document: &Document) -> Result<Conversation, StoreError> {
    let fields = Fields::new(&document.id, &document.fields);
    let first = fields.object("firstParticipant")?;
    let second = fields.object("secondParticipant")?;

    Ok(Conversation {
        id: document.id.clone(),
        first_participant: participant_from_persisted(&document.id, first)?,
        second_participant: participant_from_persisted(&document.id, second)?,
        last_message: fields.string(LAST_MESSAGE)?,
        last_message_id: fields.string(LAST_MESSAGE_ID)?,
        created_at: fields.timestamp(CREATED_AT)?,
        updated_at: fields.timestamp(UPDATED_AT)?,
    })
}

fn participant_from_persisted(
    id: &str,
    value: &Map<String, Value>,
) -> Result<ConversationParticipant, StoreError> {
    let fields = Fields::new(id, value);

    let unread_messages = fields.integer(UNREAD_MESSAGES)?;
    let unread_messages = u32::try_from(unread_messages).map_err(|_| {
        fields.malformed(format!("`{UNREAD_MESSAGES}` out of range: {unread_messages}"))
    })?;

    Ok(ConversationParticipant {
        id: fields.string("id")?,
        unread_messages,
        deletion: match fields.optional_timestamp(DELETED_AT)? {
            None => Deletion::Active,
            Some(at) => Deletion::DeletedAt(at),
        },
        is_typing: fields.boolean(IS_TYPING)?,
    })
}

pub fn message_from_persisted(document: &Document) -> Result<Message, StoreError> {
    let fields = Fields::new(&document.id, &document.fields);
    let body = Fields::new(&document.id, fields.object("message")?);

    let kind = body.string("type")?;
    let kind = kind
        .parse::<MessageKind>()
        .map_err(|reason| fields.malformed(reason))?;

    Ok(Message {
        id: document.id.clone(),
        sender_id: fields.string("senderId")?,
        receiver_id: fields.string("receiverId")?,
        conversation_id: fields.string(CONVERSATION_ID)?,
        body: MessageBody {
            kind,
            content: body.string("content")?,
        },
        created_at: fields.timestamp(CREATED_AT)?,
        time_read: fields.optional_timestamp(TIME_READ)?,
    })
}

/// Typed accessors over one level of a document body.
struct Fields<'a> {
    id: &'a str,
    fields: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(id: &'a str, fields: &'a Map<String, Value>) -> Self {
        Self { id, fields }
    }

    fn malformed(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Malformed {
            id: self.id.to_owned(),
            reason: reason.into(),
        }
    }

    fn required(&self, name: &str) -> Result<&'a Value, StoreError> {
        self.fields
            .get(name)
            .ok_or_else(|| self.malformed(format!("missing `{name}`")))
    }

    fn string(&self, name: &str) -> Result<String, StoreError> {
        self.required(name)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.malformed(format!("`{name}` is not a string")))
    }

    fn integer(&self, name: &str) -> Result<i64, StoreError> {
        self.required(name)?
            .as_i64()
            .ok_or_else(|| self.malformed(format!("`{name}` is not an integer")))
    }

    fn boolean(&self, name: &str) -> Result<bool, StoreError> {
        self.required(name)?
            .as_bool()
            .ok_or_else(|| self.malformed(format!("`{name}` is not a boolean")))
    }

    fn object(&self, name: &str) -> Result<&'a Map<String, Value>, StoreError> {
        self.required(name)?
            .as_object()
            .ok_or_else(|| self.malformed(format!("`{name}` is not an object")))
    }

    fn timestamp(&self, name: &str) -> Result<DateTime<Utc>, StoreError> {
        let micros = self.integer(name)?;
        DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| self.malformed(format!("`{name}` is not a valid timestamp")))
    }

    fn optional_timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.timestamp(name).map(Some),
        }
    }
}
