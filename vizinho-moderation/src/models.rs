use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{admin_actions, reports};

pub mod report_status {
    pub const PENDING: &str = "pending";
    pub const ACTIONED: &str = "actioned";
    pub const DISMISSED: &str = "dismissed";
}

// --- Report ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = reports)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reported_request_id: Option<Uuid>,
    pub report_type: String,
    pub reason: String,
    pub context: Option<String>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reported_request_id: Option<Uuid>,
    pub report_type: String,
    pub reason: String,
    pub context: Option<String>,
}

// --- AdminAction (append-only audit log) ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = admin_actions)]
pub struct AdminAction {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = admin_actions)]
pub struct NewAdminAction {
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}
