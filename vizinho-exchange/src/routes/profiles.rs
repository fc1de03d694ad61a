use axum::extract::{Multipart, Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::ApiResponse;

use crate::models::User;
use crate::schema::users;
use crate::AppState;

// --- GET /me ---

pub async fn get_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = users::table
        .find(user.id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}

// --- PATCH /me ---

#[derive(Debug, Deserialize, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub async fn update_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateProfile>,
) -> AppResult<Json<ApiResponse<User>>> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() || name.len() > 100 {
            return Err(AppError::new(
                ErrorCode::ValidationError,
                "name must be between 1 and 100 characters",
            ));
        }
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated = diesel::update(users::table.find(user.id))
        .set(&payload)
        .get_result::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- POST /me/avatar ---

pub async fn upload_avatar(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<User>>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            AppError::new(ErrorCode::ImageUploadFailed, format!("failed to read multipart: {e}"))
        })?
        .ok_or_else(|| AppError::new(ErrorCode::ImageUploadFailed, "no file provided"))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let ext = super::images::extension_for(&content_type)?;

    let data = field.bytes().await.map_err(|e| {
        AppError::new(ErrorCode::ImageUploadFailed, format!("failed to read file data: {e}"))
    })?;

    let key = format!("avatars/{}.{ext}", user.id);
    let url = state
        .minio
        .upload(&key, data.to_vec(), &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::ImageUploadFailed, e))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated = diesel::update(users::table.find(user.id))
        .set(users::avatar_url.eq(&url))
        .get_result::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    tracing::info!(user_id = %user.id, "avatar updated");

    Ok(Json(ApiResponse::ok(updated)))
}

// --- GET /users/:id ---

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = users::table
        .find(id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "user not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}
