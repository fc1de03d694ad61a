use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use vizinho_shared::errors::AppResult;
use vizinho_shared::types::api::ApiResponse;
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::Notification;
use crate::services::notification_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// GET /notifications?unread_only=true
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<Paginated<Notification>>>> {
    let (items, total) = notification_service::list_notifications(
        &state.db,
        auth_user.id,
        params.unread_only,
        params.pagination.limit() as i64,
        params.pagination.offset() as i64,
    )?;

    Ok(Json(ApiResponse::ok(Paginated::new(
        items,
        total as u64,
        &params.pagination,
    ))))
}

#[derive(Debug, serde::Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// GET /notifications/unread-count, polled by the header badge.
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let count = notification_service::count_unread(&state.db, auth_user.id)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { count })))
}

#[derive(Debug, serde::Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// POST /notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let updated = notification_service::mark_all_read(&state.db, auth_user.id)?;

    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}

/// POST /notifications/:id/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = notification_service::mark_read(&state.db, id, auth_user.id)?;

    Ok(Json(ApiResponse::ok(notification)))
}
