use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::{business_categories, business_reviews, businesses};

/// Moderation state of a listing. Only `approved` listings are publicly
/// visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown approval status: {other}")),
        }
    }
}

// --- BusinessCategory ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = business_categories)]
pub struct BusinessCategory {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub slug: String,
    pub position: i32,
}

// --- Business ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = businesses)]
pub struct Business {
    pub id: Uuid,
    pub category_id: Uuid,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub working_hours: Option<String>,
    pub approval_status: String,
    pub rejection_reason: Option<String>,
    pub verified: bool,
    pub rating: f64,
    pub total_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Business {
    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved.to_string()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = businesses)]
pub struct NewBusiness {
    pub category_id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub working_hours: Option<String>,
    pub approval_status: String,
}

// --- BusinessReview ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = business_reviews)]
pub struct BusinessReview {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = business_reviews)]
pub struct NewBusinessReview {
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_status_round_trips() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<ApprovalStatus>(), Ok(status));
        }
        assert!("banana".parse::<ApprovalStatus>().is_err());
    }
}
