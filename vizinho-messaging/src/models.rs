use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{conversations, messages};

/// One conversation per (request, helper) pair. The requester side is always
/// the request owner.
#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = conversations)]
pub struct Conversation {
    pub id: Uuid,
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub helper_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.helper_id == user_id
    }

    pub fn partner_of(&self, user_id: Uuid) -> Uuid {
        if self.requester_id == user_id {
            self.helper_id
        } else {
            self.requester_id
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversation {
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub helper_id: Uuid,
}

/// Append-only; `read` is the only column that ever changes.
#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// The id is supplied by the client so retried sends stay idempotent.
#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(requester_id: Uuid, helper_id: Uuid) -> Conversation {
        Conversation {
            id: Uuid::now_v7(),
            request_id: Uuid::now_v7(),
            requester_id,
            helper_id,
            created_at: Utc::now(),
            last_message_at: Utc::now(),
        }
    }

    #[test]
    fn participants_are_exactly_the_two_sides() {
        let requester = Uuid::now_v7();
        let helper = Uuid::now_v7();
        let conv = conversation(requester, helper);

        assert!(conv.is_participant(requester));
        assert!(conv.is_participant(helper));
        assert!(!conv.is_participant(Uuid::now_v7()));
    }

    #[test]
    fn partner_is_the_other_side() {
        let requester = Uuid::now_v7();
        let helper = Uuid::now_v7();
        let conv = conversation(requester, helper);

        assert_eq!(conv.partner_of(requester), helper);
        assert_eq!(conv.partner_of(helper), requester);
    }
}
