use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::api::ApiResponse;
use vizinho_shared::middleware::{AdminUser, ModeratorUser};
use vizinho_shared::types::auth::UserRole;
use vizinho_shared::types::pagination::{Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{report_status, AdminAction, NewAdminAction, Report};
use crate::schema::{admin_actions, reports};
use crate::AppState;

/// Every back-office mutation leaves a row in the audit log.
fn log_action(
    conn: &mut PgConnection,
    admin_id: Uuid,
    action: &str,
    target_user_id: Option<Uuid>,
    details: Option<serde_json::Value>,
) -> AppResult<()> {
    diesel::insert_into(admin_actions::table)
        .values(&NewAdminAction {
            admin_id,
            action: action.to_string(),
            target_user_id,
            details,
        })
        .execute(conn)
        .map_err(|e| AppError::internal(format!("failed to log admin action: {e}")))?;
    Ok(())
}

// --- List reports (paginated, optional status filter) ---

#[derive(Debug, Deserialize)]
pub struct ReportFilterParams {
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    ModeratorUser(_mod): ModeratorUser,
    Query(params): Query<ReportFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<Report>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let offset = params.pagination.offset() as i64;
    let limit = params.pagination.limit() as i64;

    let mut filtered = reports::table.into_boxed();
    let mut counted = reports::table.into_boxed();
    if let Some(status) = &params.status {
        filtered = filtered.filter(reports::status.eq(status.clone()));
        counted = counted.filter(reports::status.eq(status.clone()));
    }

    let items = filtered
        .order(reports::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<Report>(&mut conn)?;

    let total: i64 = counted.count().get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(
        items,
        total as u64,
        &params.pagination,
    ))))
}

// --- Get report details ---

pub async fn get_report(
    State(state): State<Arc<AppState>>,
    ModeratorUser(_mod): ModeratorUser,
    Path(report_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Report>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let report = reports::table
        .find(report_id)
        .first::<Report>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, "report not found"))?;

    Ok(Json(ApiResponse::ok(report)))
}

// --- Review report ---

#[derive(Debug, Deserialize)]
pub struct ReviewReportRequest {
    pub status: String, // "actioned" or "dismissed"
}

pub async fn review_report(
    State(state): State<Arc<AppState>>,
    ModeratorUser(moderator): ModeratorUser,
    Path(report_id): Path<Uuid>,
    Json(body): Json<ReviewReportRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    if body.status != report_status::ACTIONED && body.status != report_status::DISMISSED {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "status must be 'actioned' or 'dismissed'",
        ));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    // Guarded update: a report is reviewed at most once
    let updated: Report = diesel::update(
        reports::table
            .find(report_id)
            .filter(reports::status.eq(report_status::PENDING)),
    )
    .set((
        reports::status.eq(&body.status),
        reports::reviewed_by.eq(moderator.id),
        reports::reviewed_at.eq(Utc::now()),
    ))
    .get_result(&mut conn)
    .optional()?
    .ok_or_else(|| {
        // Distinguish missing from already-reviewed for the client
        let exists = reports::table
            .find(report_id)
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap_or(0);
        if exists == 0 {
            AppError::new(ErrorCode::ReportNotFound, "report not found")
        } else {
            AppError::new(
                ErrorCode::ReportAlreadyReviewed,
                "this report has already been reviewed",
            )
        }
    })?;

    log_action(
        &mut conn,
        moderator.id,
        &format!("review_report_{}", body.status),
        Some(updated.reported_id),
        Some(serde_json::json!({ "report_id": report_id, "status": body.status })),
    )?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- Block / unblock user ---

#[derive(Debug, Deserialize, Default)]
pub struct BlockUserRequest {
    pub reason: Option<String>,
}

pub async fn block_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
    body: Option<Json<BlockUserRequest>>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    set_blocked(state, admin.id, user_id, true, body.and_then(|Json(b)| b.reason)).await
}

pub async fn unblock_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    set_blocked(state, admin.id, user_id, false, None).await
}

async fn set_blocked(
    state: Arc<AppState>,
    admin_id: Uuid,
    user_id: Uuid,
    blocked: bool,
    reason: Option<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if admin_id == user_id {
        return Err(AppError::new(ErrorCode::Forbidden, "you cannot block yourself"));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let action = if blocked { "block_user" } else { "unblock_user" };
    log_action(
        &mut conn,
        admin_id,
        action,
        Some(user_id),
        reason.as_ref().map(|r| serde_json::json!({ "reason": r })),
    )?;

    tracing::info!(user_id = %user_id, admin_id = %admin_id, blocked, "user block state changed");

    // The exchange service applies the flag on its user row
    publisher::publish_user_blocked(&state.rabbitmq, user_id, blocked).await;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "user_id": user_id,
        "blocked": blocked,
    }))))
}

// --- Change role ---

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

pub async fn change_role(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<ChangeRoleRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    body.role
        .parse::<UserRole>()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e))?;

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    log_action(
        &mut conn,
        admin.id,
        "change_role",
        Some(user_id),
        Some(serde_json::json!({ "role": body.role })),
    )?;

    tracing::info!(user_id = %user_id, admin_id = %admin.id, role = %body.role, "role changed");

    publisher::publish_user_role_changed(&state.rabbitmq, user_id, &body.role).await;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "user_id": user_id,
        "role": body.role,
    }))))
}

// --- Delete user ---

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if admin.id == user_id {
        return Err(AppError::new(ErrorCode::Forbidden, "you cannot delete yourself"));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    log_action(&mut conn, admin.id, "delete_user", Some(user_id), None)?;

    tracing::info!(user_id = %user_id, admin_id = %admin.id, "user deleted");

    // The exchange service cancels open work and drops the user row
    publisher::publish_user_deleted(&state.rabbitmq, user_id).await;

    Ok(Json(ApiResponse::ok(serde_json::json!({ "user_id": user_id, "deleted": true }))))
}

// --- Remove request ---

#[derive(Debug, Deserialize, Default)]
pub struct RemoveRequestRequest {
    pub reason: Option<String>,
}

pub async fn remove_request(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(request_id): Path<Uuid>,
    body: Option<Json<RemoveRequestRequest>>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let reason = body.and_then(|Json(b)| b.reason);

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    log_action(
        &mut conn,
        admin.id,
        "remove_request",
        None,
        Some(serde_json::json!({ "request_id": request_id, "reason": reason })),
    )?;

    tracing::info!(request_id = %request_id, admin_id = %admin.id, "request removed");

    publisher::publish_request_removed(&state.rabbitmq, request_id, admin.id, reason).await;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "request_id": request_id,
        "removed": true,
    }))))
}

// --- Dashboard stats ---

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub pending_reports: i64,
    pub reports_today: i64,
    pub actions_today: i64,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    ModeratorUser(_mod): ModeratorUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let today = Utc::now().date_naive().and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or_else(Utc::now);

    let pending_reports: i64 = reports::table
        .filter(reports::status.eq(report_status::PENDING))
        .count()
        .get_result(&mut conn)?;

    let reports_today: i64 = reports::table
        .filter(reports::created_at.ge(today))
        .count()
        .get_result(&mut conn)?;

    let actions_today: i64 = admin_actions::table
        .filter(admin_actions::created_at.ge(today))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(DashboardStats {
        pending_reports,
        reports_today,
        actions_today,
    })))
}

// --- Audit log ---

pub async fn get_audit_log(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<AdminAction>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let items = admin_actions::table
        .order(admin_actions::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load::<AdminAction>(&mut conn)?;

    let total: i64 = admin_actions::table.count().get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}
