use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use vizinho_shared::errors::{AppError, AppResult};
use vizinho_shared::types::ApiResponse;

use crate::models::BusinessCategory;
use crate::schema::business_categories;
use crate::AppState;

// --- GET /categories ---

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<BusinessCategory>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let categories = business_categories::table
        .order(business_categories::position.asc())
        .load::<BusinessCategory>(&mut conn)?;

    Ok(Json(ApiResponse::ok(categories)))
}
