use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult};

use crate::models::{NewUser, User};
use crate::schema::users;
use crate::AppState;

// --- POST /internal/users ---

#[derive(Debug, Deserialize)]
pub struct ProvisionUserRequest {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

/// Provisioning webhook called by the identity provider after signup.
/// Idempotent: re-delivery of the same user is a no-op.
pub async fn provision_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProvisionUserRequest>,
) -> AppResult<Json<User>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    diesel::insert_into(users::table)
        .values(&NewUser {
            id: req.id,
            email: req.email,
            name: req.name,
        })
        .on_conflict(users::id)
        .do_nothing()
        .execute(&mut conn)?;

    let user: User = users::table.find(req.id).first(&mut conn)?;

    tracing::info!(user_id = %user.id, "user provisioned");

    Ok(Json(user))
}

// --- POST /internal/profiles/batch ---

#[derive(Debug, Deserialize)]
pub struct BatchProfilesRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BatchProfileEntry {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub neighborhood: Option<String>,
    pub blocked: bool,
}

/// Profile summaries for other services (no auth, internal network only).
pub async fn batch_profiles(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchProfilesRequest>,
) -> Json<Vec<BatchProfileEntry>> {
    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to get db connection for batch profiles");
            return Json(vec![]);
        }
    };

    let found: Vec<User> = users::table
        .filter(users::id.eq_any(&req.user_ids))
        .load::<User>(&mut conn)
        .unwrap_or_default();

    let entries = found
        .into_iter()
        .map(|u| BatchProfileEntry {
            user_id: u.id,
            name: u.name,
            avatar_url: u.avatar_url,
            neighborhood: u.neighborhood,
            blocked: u.blocked,
        })
        .collect();

    Json(entries)
}
