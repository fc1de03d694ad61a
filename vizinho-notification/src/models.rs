use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::notifications;

/// Notification type tags the frontend switches on.
pub mod types {
    pub const OFFER_RECEIVED: &str = "offer_received";
    pub const OFFER_ACCEPTED: &str = "offer_accepted";
    pub const OFFER_REJECTED: &str = "offer_rejected";
    pub const MESSAGE: &str = "message";
    pub const REVIEW: &str = "review";
    pub const SYSTEM: &str = "system";
}

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: Option<String>,
    pub data: Option<serde_json::Value>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: Option<String>,
    pub data: Option<serde_json::Value>,
}
