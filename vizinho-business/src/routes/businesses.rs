use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::middleware::AdminUser;
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{ApprovalStatus, Business, NewBusiness};
use crate::schema::{business_categories, businesses};
use crate::AppState;

pub(crate) fn load_business(
    conn: &mut PgConnection,
    business_id: Uuid,
) -> AppResult<Business> {
    businesses::table
        .find(business_id)
        .first::<Business>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound, "business not found"))
}

// --- GET /businesses ---

#[derive(Debug, Deserialize)]
pub struct ListBusinessesQuery {
    pub category_id: Option<Uuid>,
    pub neighborhood: Option<String>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Public directory browse. Only `approved` listings ever show up here.
pub async fn list_businesses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBusinessesQuery>,
) -> AppResult<Json<ApiResponse<Paginated<Business>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let approved = ApprovalStatus::Approved.to_string();
    let mut filtered = businesses::table
        .filter(businesses::approval_status.eq(approved.clone()))
        .into_boxed();
    let mut counted = businesses::table
        .filter(businesses::approval_status.eq(approved))
        .into_boxed();

    if let Some(category_id) = query.category_id {
        filtered = filtered.filter(businesses::category_id.eq(category_id));
        counted = counted.filter(businesses::category_id.eq(category_id));
    }
    if let Some(neighborhood) = &query.neighborhood {
        filtered = filtered.filter(businesses::neighborhood.eq(neighborhood.clone()));
        counted = counted.filter(businesses::neighborhood.eq(neighborhood.clone()));
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search.trim());
        filtered = filtered.filter(businesses::name.ilike(pattern.clone()));
        counted = counted.filter(businesses::name.ilike(pattern));
    }

    let total: i64 = counted.select(count_star()).first(&mut conn)?;

    let items: Vec<Business> = filtered
        .order((businesses::rating.desc(), businesses::total_reviews.desc()))
        .offset(query.pagination.offset() as i64)
        .limit(query.pagination.limit() as i64)
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(
        items,
        total as u64,
        &query.pagination,
    ))))
}

// --- GET /businesses/mine ---

pub async fn list_my_businesses(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<Business>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let items = businesses::table
        .filter(businesses::created_by.eq(user.id))
        .order(businesses::created_at.desc())
        .load::<Business>(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}

// --- GET /businesses/:id ---

pub async fn get_business(
    user: Option<AuthUser>,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let business = load_business(&mut conn, business_id)?;

    // Pending and rejected listings stay visible to the owner and admins
    if !business.is_approved() {
        let allowed = user
            .as_ref()
            .map(|u| u.id == business.created_by || u.is_admin())
            .unwrap_or(false);
        if !allowed {
            return Err(AppError::new(
                ErrorCode::BusinessNotApproved,
                "this business has not been approved yet",
            ));
        }
    }

    Ok(Json(ApiResponse::ok(business)))
}

// --- POST /businesses ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBusiness {
    pub category_id: Uuid,
    #[validate(length(min = 2, max = 150, message = "name must be between 2 and 150 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub working_hours: Option<String>,
}

pub async fn create_business(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBusiness>,
) -> AppResult<Json<ApiResponse<Business>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let category_exists: i64 = business_categories::table
        .find(req.category_id)
        .select(count_star())
        .first(&mut conn)?;
    if category_exists == 0 {
        return Err(AppError::new(
            ErrorCode::BusinessCategoryNotFound,
            "business category not found",
        ));
    }

    let business: Business = diesel::insert_into(businesses::table)
        .values(&NewBusiness {
            category_id: req.category_id,
            created_by: user.id,
            name: req.name.trim().to_string(),
            description: req.description,
            phone: req.phone,
            whatsapp: req.whatsapp,
            email: req.email,
            address: req.address,
            neighborhood: req.neighborhood,
            latitude: req.latitude,
            longitude: req.longitude,
            logo_url: req.logo_url,
            cover_url: req.cover_url,
            working_hours: req.working_hours,
            approval_status: ApprovalStatus::Pending.to_string(),
        })
        .get_result(&mut conn)?;

    tracing::info!(business_id = %business.id, user_id = %user.id, "business submitted");

    publisher::publish_listing_submitted(&state.rabbitmq, &business).await;

    Ok(Json(ApiResponse::ok_with_message(
        business,
        "business submitted for approval",
    )))
}

// --- PATCH /businesses/:id ---

#[derive(Debug, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = businesses)]
pub struct UpdateBusiness {
    #[validate(length(min = 2, max = 150, message = "name must be between 2 and 150 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub working_hours: Option<String>,
}

pub async fn update_business(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<UpdateBusiness>,
) -> AppResult<Json<ApiResponse<Business>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let business = load_business(&mut conn, business_id)?;
    if business.created_by != user.id {
        return Err(AppError::new(
            ErrorCode::Forbidden,
            "only the business owner can edit this listing",
        ));
    }

    let was_rejected = business.approval_status == ApprovalStatus::Rejected.to_string();

    let updated: Business = diesel::update(businesses::table.find(business_id))
        .set((&req, businesses::updated_at.eq(Utc::now())))
        .get_result(&mut conn)?;

    // An edited rejection goes back into the moderation queue
    let updated = if was_rejected {
        let resubmitted: Business = diesel::update(businesses::table.find(business_id))
            .set((
                businesses::approval_status.eq(ApprovalStatus::Pending.to_string()),
                businesses::rejection_reason.eq(None::<String>),
            ))
            .get_result(&mut conn)?;
        publisher::publish_listing_submitted(&state.rabbitmq, &resubmitted).await;
        resubmitted
    } else {
        updated
    };

    Ok(Json(ApiResponse::ok(updated)))
}

// --- GET /admin/businesses ---

#[derive(Debug, Deserialize)]
pub struct ModerationQueueQuery {
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

pub async fn list_for_moderation(
    AdminUser(_admin): AdminUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModerationQueueQuery>,
) -> AppResult<Json<ApiResponse<Paginated<Business>>>> {
    let status = query.status.as_deref().unwrap_or("pending");
    status
        .parse::<ApprovalStatus>()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let total: i64 = businesses::table
        .filter(businesses::approval_status.eq(status))
        .select(count_star())
        .first(&mut conn)?;

    let items: Vec<Business> = businesses::table
        .filter(businesses::approval_status.eq(status))
        .order(businesses::created_at.asc())
        .offset(query.pagination.offset() as i64)
        .limit(query.pagination.limit() as i64)
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(
        items,
        total as u64,
        &query.pagination,
    ))))
}

// --- POST /businesses/:id/approve ---

pub async fn approve_business(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Guarded update: only a pending listing can be approved
    let approved: Business = diesel::update(
        businesses::table
            .find(business_id)
            .filter(businesses::approval_status.eq(ApprovalStatus::Pending.to_string())),
    )
    .set((
        businesses::approval_status.eq(ApprovalStatus::Approved.to_string()),
        businesses::approved_by.eq(admin.id),
        businesses::approved_at.eq(Utc::now()),
        businesses::rejection_reason.eq(None::<String>),
    ))
    .get_result(&mut conn)
    .optional()?
    .ok_or_else(|| {
        AppError::new(
            ErrorCode::BusinessAlreadyModerated,
            "business is not awaiting approval",
        )
    })?;

    tracing::info!(business_id = %business_id, admin_id = %admin.id, "business approved");

    publisher::publish_listing_approved(&state.rabbitmq, &approved, admin.id).await;

    Ok(Json(ApiResponse::ok(approved)))
}

// --- POST /businesses/:id/reject ---

#[derive(Debug, Deserialize)]
pub struct RejectBusinessRequest {
    pub reason: String,
}

pub async fn reject_business(
    AdminUser(admin): AdminUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<RejectBusinessRequest>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "a rejection reason is required",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rejected: Business = diesel::update(
        businesses::table
            .find(business_id)
            .filter(businesses::approval_status.eq(ApprovalStatus::Pending.to_string())),
    )
    .set((
        businesses::approval_status.eq(ApprovalStatus::Rejected.to_string()),
        businesses::approved_by.eq(admin.id),
        businesses::rejection_reason.eq(reason),
    ))
    .get_result(&mut conn)
    .optional()?
    .ok_or_else(|| {
        AppError::new(
            ErrorCode::BusinessAlreadyModerated,
            "business is not awaiting approval",
        )
    })?;

    tracing::info!(business_id = %business_id, admin_id = %admin.id, "business rejected");

    publisher::publish_listing_rejected(&state.rabbitmq, &rejected, admin.id).await;

    Ok(Json(ApiResponse::ok(rejected)))
}
