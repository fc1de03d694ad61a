use axum::extract::{Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::ApiResponse;

use crate::models::User;
use crate::schema::users;
use crate::AppState;

// --- GET /ranking ---

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    #[serde(default = "default_by")]
    pub by: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_by() -> String {
    "helpers".into()
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct RankingEntry {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub neighborhood: Option<String>,
    pub rating: f64,
    pub count: i32,
}

/// Neighborhood leaderboard, ordered by exchanges completed then rating.
pub async fn get_ranking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RankingQuery>,
) -> AppResult<Json<ApiResponse<Vec<RankingEntry>>>> {
    let limit = query.limit.clamp(1, 50);
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<User> = match query.by.as_str() {
        "helpers" => users::table
            .filter(users::blocked.eq(false))
            .filter(users::total_helps.gt(0))
            .order((users::total_helps.desc(), users::rating_as_helper.desc()))
            .limit(limit)
            .load(&mut conn)?,
        "requesters" => users::table
            .filter(users::blocked.eq(false))
            .filter(users::total_requests.gt(0))
            .order((users::total_requests.desc(), users::rating_as_requester.desc()))
            .limit(limit)
            .load(&mut conn)?,
        other => {
            return Err(AppError::new(
                ErrorCode::ValidationError,
                format!("unknown ranking: {other}"),
            ))
        }
    };

    let helpers = query.by == "helpers";
    let items = rows
        .into_iter()
        .map(|u| RankingEntry {
            user_id: u.id,
            name: u.name,
            avatar_url: u.avatar_url,
            neighborhood: u.neighborhood,
            rating: if helpers { u.rating_as_helper } else { u.rating_as_requester },
            count: if helpers { u.total_helps } else { u.total_requests },
        })
        .collect();

    Ok(Json(ApiResponse::ok(items)))
}
