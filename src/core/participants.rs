//! First/second role assignment for the two sides of a conversation.

use crate::error::ChatError;
use crate::infrastructure::entities::ParticipantSlot;

/// Whether `current_user_id` takes the first slot opposite `other_user_id`.
pub fn current_is_first_participant(current_user_id: &str, other_user_id: &str) -> bool {
    current_user_id < other_user_id
}

/// Canonical ordering of two participant ids. The smaller id is always first, whichever
/// order the ids are given in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Roles {
    first: String,
    second: String,
}

impl Roles {
    pub fn resolve(a: &str, b: &str) -> Result<Roles, ChatError> {
        if a == b {
            return Err(ChatError::InvalidParticipants(format!(
                "both participants are `{a}`"
            )));
        }

        let (first, second) = if current_is_first_participant(a, b) {
            (a, b)
        } else {
            (b, a)
        };

        Ok(Roles {
            first: first.to_owned(),
            second: second.to_owned(),
        })
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn slot_of(&self, user_id: &str) -> Option<ParticipantSlot> {
        if user_id == self.first {
            Some(ParticipantSlot::First)
        } else if user_id == self.second {
            Some(ParticipantSlot::Second)
        } else {
            None
        }
    }
}

/// Slot of the receiving side of a message from `sender_id` to `receiver_id`.
pub fn receiver_slot(sender_id: &str, receiver_id: &str) -> Result<ParticipantSlot, ChatError> {
    let roles = Roles::resolve(sender_id, receiver_id)?;

    roles
        .slot_of(receiver_id)
        .ok_or_else(|| ChatError::InvalidParticipants(format!("unknown receiver `{receiver_id}`")))
}
