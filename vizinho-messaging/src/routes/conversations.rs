use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::api::ApiResponse;
use vizinho_shared::types::auth::AuthUser;

use crate::models::{Conversation, Message, NewConversation};
use crate::schema::{conversations, messages};
use crate::AppState;

// --- Response DTOs ---

#[derive(Debug, Serialize)]
pub struct ConversationPreview {
    pub id: Uuid,
    pub request_id: Uuid,
    pub partner_id: Uuid,
    pub partner_name: Option<String>,
    pub partner_avatar: Option<String>,
    pub partner_online: bool,
    pub created_at: DateTime<Utc>,
    pub last_message: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

// --- GET /conversations ---

pub async fn list_conversations(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ConversationPreview>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let user_id = auth_user.id;

    let convs: Vec<Conversation> = conversations::table
        .filter(
            conversations::requester_id
                .eq(user_id)
                .or(conversations::helper_id.eq(user_id)),
        )
        .order(conversations::last_message_at.desc())
        .load::<Conversation>(&mut conn)?;

    if convs.is_empty() {
        return Ok(Json(ApiResponse::ok(vec![])));
    }

    let mut previews = Vec::with_capacity(convs.len());
    for conv in &convs {
        let last_msg: Option<Message> = messages::table
            .filter(messages::conversation_id.eq(conv.id))
            .order(messages::created_at.desc())
            .first::<Message>(&mut conn)
            .optional()?;

        let unread: i64 = messages::table
            .filter(messages::conversation_id.eq(conv.id))
            .filter(messages::read.eq(false))
            .filter(messages::sender_id.ne(user_id))
            .select(count_star())
            .first::<i64>(&mut conn)?;

        previews.push(ConversationPreview {
            id: conv.id,
            request_id: conv.request_id,
            partner_id: conv.partner_of(user_id),
            partner_name: None,
            partner_avatar: None,
            partner_online: false,
            created_at: conv.created_at,
            last_message: last_msg.map(|m| m.content),
            last_message_at: conv.last_message_at,
            unread_count: unread,
        });
    }

    enrich_with_partners(&state, &mut previews).await;

    Ok(Json(ApiResponse::ok(previews)))
}

/// Fill in partner names and avatars from the exchange service, and online
/// flags from Redis presence keys. Best-effort on both counts.
async fn enrich_with_partners(state: &AppState, previews: &mut [ConversationPreview]) {
    let partner_ids: Vec<Uuid> = previews.iter().map(|p| p.partner_id).collect();
    if partner_ids.is_empty() {
        return;
    }

    let url = format!("{}/internal/profiles/batch", state.config.exchange_service_url);
    if let Ok(resp) = state
        .http_client
        .post(&url)
        .json(&serde_json::json!({ "user_ids": partner_ids }))
        .send()
        .await
    {
        if let Ok(profiles) = resp.json::<Vec<serde_json::Value>>().await {
            let profile_map: HashMap<String, serde_json::Value> = profiles
                .into_iter()
                .filter_map(|p| {
                    p.get("user_id")
                        .and_then(|v| v.as_str())
                        .map(|id| (id.to_string(), p.clone()))
                })
                .collect();

            for preview in previews.iter_mut() {
                if let Some(profile) = profile_map.get(&preview.partner_id.to_string()) {
                    preview.partner_name = profile
                        .get("name")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                    preview.partner_avatar = profile
                        .get("avatar_url")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                }
            }
        }
    }

    let presence_keys: Vec<String> = previews
        .iter()
        .map(|p| format!("online:{}", p.partner_id))
        .collect();
    if let Ok(flags) = state.redis.exists_multi(&presence_keys).await {
        for (preview, online) in previews.iter_mut().zip(flags) {
            preview.partner_online = online;
        }
    }
}

// --- POST /conversations ---

#[derive(Debug, Deserialize)]
pub struct OpenConversationRequest {
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub helper_id: Uuid,
}

/// Open (or return the existing) conversation for a request/helper pair.
/// The caller must be one of the two participants.
pub async fn open_conversation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenConversationRequest>,
) -> AppResult<Json<ApiResponse<Conversation>>> {
    if auth_user.id != req.requester_id && auth_user.id != req.helper_id {
        return Err(AppError::new(
            ErrorCode::NotConversationParticipant,
            "you are not part of this conversation",
        ));
    }
    if req.requester_id == req.helper_id {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "requester and helper must differ",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    let conversation =
        find_or_create(&mut conn, req.request_id, req.requester_id, req.helper_id)?;

    Ok(Json(ApiResponse::ok(conversation)))
}

pub fn find_or_create(
    conn: &mut PgConnection,
    request_id: Uuid,
    requester_id: Uuid,
    helper_id: Uuid,
) -> AppResult<Conversation> {
    let existing: Option<Conversation> = conversations::table
        .filter(conversations::request_id.eq(request_id))
        .filter(conversations::helper_id.eq(helper_id))
        .first::<Conversation>(conn)
        .optional()?;

    if let Some(conversation) = existing {
        return Ok(conversation);
    }

    let conversation: Conversation = diesel::insert_into(conversations::table)
        .values(&NewConversation {
            request_id,
            requester_id,
            helper_id,
        })
        .get_result(conn)?;

    tracing::info!(
        conversation_id = %conversation.id,
        request_id = %request_id,
        "conversation created"
    );

    Ok(conversation)
}

// --- GET /conversations/:id ---

pub async fn get_conversation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Conversation>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    let conversation = load_for_participant(&mut conn, id, auth_user.id)?;

    Ok(Json(ApiResponse::ok(conversation)))
}

pub fn load_for_participant(
    conn: &mut PgConnection,
    conversation_id: Uuid,
    user_id: Uuid,
) -> AppResult<Conversation> {
    let conversation: Conversation = conversations::table
        .find(conversation_id)
        .first::<Conversation>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ConversationNotFound, "conversation not found"))?;

    if !conversation.is_participant(user_id) {
        return Err(AppError::new(
            ErrorCode::NotConversationParticipant,
            "you are not part of this conversation",
        ));
    }

    Ok(conversation)
}
