use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::domain::ReviewType;
use crate::events::publisher;
use crate::models::{Review, User};
use crate::schema::{reviews, users};
use crate::services::lifecycle_service;
use crate::AppState;

// --- POST /reviews ---

#[derive(Debug, Deserialize)]
pub struct CreateReview {
    pub offer_id: Uuid,
    pub review_type: String,
    pub rating: i32,
    pub comment: Option<String>,
}

pub async fn create_review(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateReview>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let review_type = ReviewType::from_str(&payload.review_type)
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e))?;

    let outcome = lifecycle_service::submit_review(
        &state.db,
        payload.offer_id,
        user.id,
        review_type,
        payload.rating,
        payload.comment,
    )?;

    publisher::publish_review_created(&state.rabbitmq, &outcome.review).await;

    Ok(Json(ApiResponse::ok(outcome.review)))
}

// --- GET /users/:id/reviews ---

#[derive(Debug, Deserialize)]
pub struct ListReviewsQuery {
    pub review_type: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub reviewer_name: Option<String>,
}

pub async fn list_reviews_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ListReviewsQuery>,
) -> AppResult<Json<ApiResponse<Paginated<ReviewWithAuthor>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let mut filtered = reviews::table
        .filter(reviews::reviewed_id.eq(user_id))
        .into_boxed();
    let mut counted = reviews::table
        .filter(reviews::reviewed_id.eq(user_id))
        .into_boxed();

    if let Some(review_type) = &query.review_type {
        ReviewType::from_str(review_type)
            .map_err(|e| AppError::new(ErrorCode::ValidationError, e))?;
        filtered = filtered.filter(reviews::review_type.eq(review_type.clone()));
        counted = counted.filter(reviews::review_type.eq(review_type.clone()));
    }

    let total: i64 = counted.select(count_star()).get_result(&mut conn)?;

    let rows: Vec<Review> = filtered
        .order(reviews::created_at.desc())
        .limit(query.pagination.limit() as i64)
        .offset(query.pagination.offset() as i64)
        .load(&mut conn)?;

    let reviewer_ids: Vec<Uuid> = rows.iter().map(|r| r.reviewer_id).collect();
    let reviewers: Vec<User> = users::table
        .filter(users::id.eq_any(&reviewer_ids))
        .load(&mut conn)?;

    let items = rows
        .into_iter()
        .map(|review| ReviewWithAuthor {
            reviewer_name: reviewers
                .iter()
                .find(|u| u.id == review.reviewer_id)
                .and_then(|u| u.name.clone()),
            review,
        })
        .collect();

    Ok(Json(ApiResponse::ok(Paginated::new(
        items,
        total as u64,
        &query.pagination,
    ))))
}
