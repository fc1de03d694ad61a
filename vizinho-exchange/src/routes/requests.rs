use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{NewRequest, Request, RequestImage, User};
use crate::schema::{offers, request_images, requests, users};
use crate::services::lifecycle_service;
use crate::AppState;

// --- POST /requests ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    #[validate(length(min = 1, max = 150, message = "title must be between 1 and 150 characters"))]
    pub title: String,
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub category: String,
    #[serde(default = "default_urgency")]
    pub urgency: String,
    pub needed_until: Option<chrono::DateTime<chrono::Utc>>,
}

fn default_urgency() -> String {
    "medium".into()
}

pub async fn create_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRequest>,
) -> AppResult<Json<ApiResponse<Request>>> {
    payload
        .validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "title must not be blank",
        ));
    }
    lifecycle_service::validate_new_request(&payload.category, &payload.urgency)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    lifecycle_service::ensure_not_blocked(&mut conn, user.id)?;

    let request: Request = diesel::insert_into(requests::table)
        .values(&NewRequest {
            user_id: user.id,
            title: title.to_string(),
            description: payload.description,
            category: payload.category,
            urgency: payload.urgency,
            needed_until: payload.needed_until,
        })
        .get_result(&mut conn)?;

    tracing::info!(request_id = %request.id, user_id = %user.id, "request created");

    Ok(Json(ApiResponse::ok(request)))
}

// --- GET /requests ---

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub urgency: Option<String>,
    pub user_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize)]
pub struct RequestSummary {
    #[serde(flatten)]
    pub request: Request,
    pub requester_name: Option<String>,
    pub requester_rating: f64,
    pub offer_count: i64,
}

pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRequestsQuery>,
) -> AppResult<Json<ApiResponse<Paginated<RequestSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let mut filtered = requests::table.into_boxed();
    let mut counted = requests::table.into_boxed();

    // Open requests by default; explicit status filters override.
    let status = query.status.as_deref().unwrap_or("open").to_string();
    if status != "all" {
        filtered = filtered.filter(requests::status.eq(status.clone()));
        counted = counted.filter(requests::status.eq(status));
    }
    if let Some(category) = &query.category {
        filtered = filtered.filter(requests::category.eq(category.clone()));
        counted = counted.filter(requests::category.eq(category.clone()));
    }
    if let Some(urgency) = &query.urgency {
        filtered = filtered.filter(requests::urgency.eq(urgency.clone()));
        counted = counted.filter(requests::urgency.eq(urgency.clone()));
    }
    if let Some(user_id) = query.user_id {
        filtered = filtered.filter(requests::user_id.eq(user_id));
        counted = counted.filter(requests::user_id.eq(user_id));
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search.trim());
        filtered = filtered.filter(requests::title.ilike(pattern.clone()));
        counted = counted.filter(requests::title.ilike(pattern));
    }

    let total: i64 = counted.select(count_star()).get_result(&mut conn)?;

    let rows: Vec<Request> = filtered
        .order(requests::created_at.desc())
        .limit(query.pagination.limit() as i64)
        .offset(query.pagination.offset() as i64)
        .load(&mut conn)?;

    let items = enrich_requests(&mut conn, rows)?;

    Ok(Json(ApiResponse::ok(Paginated::new(
        items,
        total as u64,
        &query.pagination,
    ))))
}

fn enrich_requests(
    conn: &mut PgConnection,
    rows: Vec<Request>,
) -> AppResult<Vec<RequestSummary>> {
    let owner_ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
    let owners: Vec<User> = users::table
        .filter(users::id.eq_any(&owner_ids))
        .load(conn)?;

    let request_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let counts: Vec<(Uuid, i64)> = offers::table
        .filter(offers::request_id.eq_any(&request_ids))
        .group_by(offers::request_id)
        .select((offers::request_id, count_star()))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|request| {
            let owner = owners.iter().find(|u| u.id == request.user_id);
            let offer_count = counts
                .iter()
                .find(|(id, _)| *id == request.id)
                .map(|(_, c)| *c)
                .unwrap_or(0);
            RequestSummary {
                requester_name: owner.and_then(|u| u.name.clone()),
                requester_rating: owner.map(|u| u.rating_as_requester).unwrap_or(5.0),
                offer_count,
                request,
            }
        })
        .collect())
}

// --- GET /requests/:id ---

#[derive(Debug, Serialize)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: Request,
    pub requester_name: Option<String>,
    pub requester_rating: f64,
    pub images: Vec<RequestImage>,
    pub offer_count: i64,
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RequestDetail>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let request = requests::table
        .find(id)
        .first::<Request>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RequestNotFound, "request not found"))?;

    let owner: Option<User> = users::table
        .find(request.user_id)
        .first(&mut conn)
        .optional()?;

    let images: Vec<RequestImage> = request_images::table
        .filter(request_images::request_id.eq(request.id))
        .order(request_images::position.asc())
        .load(&mut conn)?;

    let offer_count: i64 = offers::table
        .filter(offers::request_id.eq(request.id))
        .select(count_star())
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(RequestDetail {
        requester_name: owner.as_ref().and_then(|u| u.name.clone()),
        requester_rating: owner.map(|u| u.rating_as_requester).unwrap_or(5.0),
        images,
        offer_count,
        request,
    })))
}

// --- POST /requests/:id/cancel ---

pub async fn cancel_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Request>>> {
    let outcome = lifecycle_service::cancel_request(&state.db, id, user.id, user.role)?;

    let pending_helper_ids: Vec<Uuid> = outcome
        .cancelled_offers
        .iter()
        .map(|o| o.helper_id)
        .collect();
    publisher::publish_request_cancelled(&state.rabbitmq, &outcome.request, pending_helper_ids)
        .await;

    Ok(Json(ApiResponse::ok(outcome.request)))
}
