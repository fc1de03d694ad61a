use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::models::{Business, BusinessReview, NewBusinessReview};
use crate::ratings::BusinessRating;
use crate::routes::businesses::load_business;
use crate::schema::{business_reviews, businesses};
use crate::AppState;

// --- POST /businesses/:id/reviews ---

#[derive(Debug, Deserialize)]
pub struct CreateBusinessReview {
    pub rating: i32,
    pub comment: Option<String>,
}

pub async fn create_review(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<CreateBusinessReview>,
) -> AppResult<Json<ApiResponse<BusinessReview>>> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "rating must be between 1 and 5",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let business = load_business(&mut conn, business_id)?;
    if !business.is_approved() {
        return Err(AppError::new(
            ErrorCode::BusinessNotApproved,
            "only approved businesses can be reviewed",
        ));
    }
    if business.created_by == user.id {
        return Err(AppError::new(
            ErrorCode::Forbidden,
            "you cannot review your own business",
        ));
    }

    // Insert and rating recompute succeed or fail together
    let review = conn.transaction::<BusinessReview, AppError, _>(|conn| {
        let existing: i64 = business_reviews::table
            .filter(business_reviews::business_id.eq(business_id))
            .filter(business_reviews::user_id.eq(user.id))
            .select(count_star())
            .first(conn)?;
        if existing > 0 {
            return Err(AppError::new(
                ErrorCode::DuplicateBusinessReview,
                "you have already reviewed this business",
            ));
        }

        let review: BusinessReview = diesel::insert_into(business_reviews::table)
            .values(&NewBusinessReview {
                business_id,
                user_id: user.id,
                rating: req.rating,
                comment: req.comment.clone(),
            })
            .get_result(conn)?;

        // Row lock so concurrent reviews fold in sequentially
        let locked: Business = businesses::table
            .find(business_id)
            .for_update()
            .first(conn)?;

        let next = BusinessRating::new(locked.rating, locked.total_reviews).apply(req.rating);
        diesel::update(businesses::table.find(business_id))
            .set((
                businesses::rating.eq(next.average),
                businesses::total_reviews.eq(next.count),
            ))
            .execute(conn)?;

        Ok(review)
    })?;

    tracing::info!(business_id = %business_id, user_id = %user.id, "business review created");

    Ok(Json(ApiResponse::ok(review)))
}

// --- GET /businesses/:id/reviews ---

#[derive(Debug, Deserialize)]
pub struct ListReviewsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<ListReviewsQuery>,
) -> AppResult<Json<ApiResponse<Paginated<BusinessReview>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    load_business(&mut conn, business_id)?;

    let total: i64 = business_reviews::table
        .filter(business_reviews::business_id.eq(business_id))
        .select(count_star())
        .first(&mut conn)?;

    let items: Vec<BusinessReview> = business_reviews::table
        .filter(business_reviews::business_id.eq(business_id))
        .order(business_reviews::created_at.desc())
        .offset(query.pagination.offset() as i64)
        .limit(query.pagination.limit() as i64)
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(
        items,
        total as u64,
        &query.pagination,
    ))))
}
