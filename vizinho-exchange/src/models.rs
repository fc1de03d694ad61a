use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{offers, request_images, requests, reviews, users};

// --- User ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating_as_requester: f64,
    pub rating_as_helper: f64,
    pub total_requests: i32,
    pub total_helps: i32,
    pub role: String,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

// --- Request ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = requests)]
pub struct Request {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub urgency: String,
    pub status: String,
    pub needed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = requests)]
pub struct NewRequest {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub urgency: String,
    pub needed_until: Option<DateTime<Utc>>,
}

// --- RequestImage ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = request_images)]
pub struct RequestImage {
    pub id: Uuid,
    pub request_id: Uuid,
    pub url: String,
    pub position: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = request_images)]
pub struct NewRequestImage {
    pub request_id: Uuid,
    pub url: String,
    pub position: i32,
}

// --- Offer ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = offers)]
pub struct Offer {
    pub id: Uuid,
    pub request_id: Uuid,
    pub helper_id: Uuid,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = offers)]
pub struct NewOffer {
    pub request_id: Uuid,
    pub helper_id: Uuid,
    pub message: Option<String>,
}

// --- Review ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = reviews)]
pub struct Review {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,
    pub review_type: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReview {
    pub offer_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,
    pub review_type: String,
    pub rating: i32,
    pub comment: Option<String>,
}
