use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::api::ApiResponse;
use vizinho_shared::types::auth::AuthUser;

use crate::events::publisher;
use crate::models::{report_status, NewReport, Report};
use crate::schema::reports;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub reported_id: Uuid,
    /// Optionally pin the report to a specific request
    pub reported_request_id: Option<Uuid>,
    pub report_type: String,
    pub reason: String,
    pub context: Option<String>,
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateReportRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    if auth.id == body.reported_id {
        return Err(AppError::new(ErrorCode::CannotReportSelf, "you cannot report yourself"));
    }

    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "a reason is required"));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    // One open report per reporter against the same user
    let existing: i64 = reports::table
        .filter(reports::reporter_id.eq(auth.id))
        .filter(reports::reported_id.eq(body.reported_id))
        .filter(reports::status.eq(report_status::PENDING))
        .count()
        .get_result(&mut conn)?;

    if existing > 0 {
        return Err(AppError::new(
            ErrorCode::DuplicateReport,
            "you already have a pending report against this user",
        ));
    }

    let report: Report = diesel::insert_into(reports::table)
        .values(&NewReport {
            reporter_id: auth.id,
            reported_id: body.reported_id,
            reported_request_id: body.reported_request_id,
            report_type: body.report_type.clone(),
            reason: reason.to_string(),
            context: body.context,
        })
        .get_result(&mut conn)?;

    tracing::info!(report_id = %report.id, reporter = %auth.id, "report created");

    publisher::publish_report_created(
        &state.rabbitmq,
        report.id,
        report.reporter_id,
        report.reported_id,
        &report.report_type,
    )
    .await;

    Ok(Json(ApiResponse::ok(report)))
}

// --- GET /reports/mine ---

pub async fn list_my_reports(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Report>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let items = reports::table
        .filter(reports::reporter_id.eq(auth.id))
        .order(reports::created_at.desc())
        .load::<Report>(&mut conn)?;

    Ok(Json(ApiResponse::ok(items)))
}
