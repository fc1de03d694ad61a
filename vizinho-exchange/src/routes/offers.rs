use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{Offer, Request, User};
use crate::schema::{offers, requests, users};
use crate::services::lifecycle_service;
use crate::AppState;

// --- POST /requests/:id/offers ---

#[derive(Debug, Deserialize)]
pub struct SubmitOffer {
    pub message: Option<String>,
}

pub async fn submit_offer(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<SubmitOffer>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let (offer, request) =
        lifecycle_service::submit_offer(&state.db, request_id, user.id, payload.message)?;

    let helper_name = helper_name(&state, user.id);
    publisher::publish_offer_submitted(&state.rabbitmq, &offer, &request, helper_name).await;

    Ok(Json(ApiResponse::ok(offer)))
}

fn helper_name(state: &AppState, helper_id: Uuid) -> Option<String> {
    let mut conn = state.db.get().ok()?;
    users::table
        .find(helper_id)
        .select(users::name)
        .first::<Option<String>>(&mut conn)
        .ok()
        .flatten()
}

// --- GET /requests/:id/offers ---

#[derive(Debug, Serialize)]
pub struct OfferWithHelper {
    #[serde(flatten)]
    pub offer: Offer,
    pub helper_name: Option<String>,
    pub helper_rating: f64,
    pub helper_total_helps: i32,
}

/// The request owner sees every offer; a helper only sees their own.
pub async fn list_offers_for_request(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<OfferWithHelper>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let request = requests::table
        .find(request_id)
        .first::<Request>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RequestNotFound, "request not found"))?;

    let mut query = offers::table
        .filter(offers::request_id.eq(request_id))
        .into_boxed();
    if request.user_id != user.id {
        query = query.filter(offers::helper_id.eq(user.id));
    }

    let rows: Vec<Offer> = query.order(offers::created_at.asc()).load(&mut conn)?;

    let helper_ids: Vec<Uuid> = rows.iter().map(|o| o.helper_id).collect();
    let helpers: Vec<User> = users::table
        .filter(users::id.eq_any(&helper_ids))
        .load(&mut conn)?;

    let items = rows
        .into_iter()
        .map(|offer| {
            let helper = helpers.iter().find(|u| u.id == offer.helper_id);
            OfferWithHelper {
                helper_name: helper.and_then(|u| u.name.clone()),
                helper_rating: helper.map(|u| u.rating_as_helper).unwrap_or(5.0),
                helper_total_helps: helper.map(|u| u.total_helps).unwrap_or(0),
                offer,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(items)))
}

// --- GET /offers/mine ---

#[derive(Debug, Serialize)]
pub struct OfferWithRequest {
    #[serde(flatten)]
    pub offer: Offer,
    pub request_title: String,
    pub request_status: String,
}

pub async fn list_my_offers(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<OfferWithRequest>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<(Offer, Request)> = offers::table
        .inner_join(requests::table)
        .filter(offers::helper_id.eq(user.id))
        .order(offers::created_at.desc())
        .load(&mut conn)?;

    let items = rows
        .into_iter()
        .map(|(offer, request)| OfferWithRequest {
            request_title: request.title,
            request_status: request.status,
            offer,
        })
        .collect();

    Ok(Json(ApiResponse::ok(items)))
}

// --- POST /offers/:id/accept ---

pub async fn accept_offer(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(offer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let outcome = lifecycle_service::accept_offer(&state.db, offer_id, user.id)?;

    publisher::publish_offer_accepted(&state.rabbitmq, &outcome.offer, &outcome.request).await;
    for rejected in &outcome.rejected {
        publisher::publish_offer_rejected(&state.rabbitmq, rejected, &outcome.request).await;
    }

    Ok(Json(ApiResponse::ok(outcome.offer)))
}

// --- POST /offers/:id/reject ---

pub async fn reject_offer(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(offer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let (offer, request) = lifecycle_service::reject_offer(&state.db, offer_id, user.id)?;

    publisher::publish_offer_rejected(&state.rabbitmq, &offer, &request).await;

    Ok(Json(ApiResponse::ok(offer)))
}

// --- POST /offers/:id/borrowed ---

pub async fn mark_borrowed(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(offer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let offer = lifecycle_service::mark_borrowed(&state.db, offer_id, user.id)?;
    Ok(Json(ApiResponse::ok(offer)))
}

// --- POST /offers/:id/returned ---

pub async fn mark_returned(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(offer_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let outcome = lifecycle_service::mark_returned(&state.db, offer_id, user.id)?;

    publisher::publish_request_completed(&state.rabbitmq, &outcome.offer, &outcome.request).await;

    Ok(Json(ApiResponse::ok(outcome.offer)))
}
