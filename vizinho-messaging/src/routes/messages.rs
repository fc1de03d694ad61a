use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use vizinho_shared::errors::{AppError, AppResult, ErrorCode};
use vizinho_shared::types::api::ApiResponse;
use vizinho_shared::types::auth::AuthUser;
use vizinho_shared::types::pagination::{Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{Conversation, Message, NewMessage};
use crate::routes::conversations::load_for_participant;
use crate::schema::{conversations, messages};
use crate::AppState;

// --- GET /conversations/:id/messages ---

pub async fn list_messages(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Message>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    load_for_participant(&mut conn, conversation_id, auth_user.id)?;

    let total: i64 = messages::table
        .filter(messages::conversation_id.eq(conversation_id))
        .select(count_star())
        .first::<i64>(&mut conn)?;

    // Newest first; clients render in reverse
    let items: Vec<Message> = messages::table
        .filter(messages::conversation_id.eq(conversation_id))
        .order(messages::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load::<Message>(&mut conn)?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}

// --- POST /conversations/:id/messages ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Client-generated id; resending with the same id is a no-op.
    pub id: Option<Uuid>,
    pub content: String,
}

pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "message content must not be empty",
        ));
    }
    if content.len() > 2000 {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "message content must be at most 2000 characters",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    let conversation = load_for_participant(&mut conn, conversation_id, auth_user.id)?;

    let message_id = req.id.unwrap_or_else(Uuid::now_v7);

    // Idempotent append: a retried send with the same id inserts nothing.
    let inserted = diesel::insert_into(messages::table)
        .values(&NewMessage {
            id: message_id,
            conversation_id,
            sender_id: auth_user.id,
            content: content.to_string(),
        })
        .on_conflict(messages::id)
        .do_nothing()
        .execute(&mut conn)?;

    let message: Message = messages::table.find(message_id).first(&mut conn)?;

    if inserted == 0 {
        // Duplicate delivery; do not re-emit or re-publish
        return Ok(Json(ApiResponse::ok(message)));
    }

    diesel::update(conversations::table.find(conversation_id))
        .set(conversations::last_message_at.eq(message.created_at))
        .execute(&mut conn)?;

    let recipient_id = conversation.partner_of(auth_user.id);
    emit_new_message(&state, &conversation, &message, recipient_id);

    let content_preview = content.chars().take(100).collect::<String>();
    publisher::publish_message_sent(
        &state.rabbitmq,
        &message,
        recipient_id,
        &content_preview,
    )
    .await;

    Ok(Json(ApiResponse::ok(message)))
}

/// Deliver to the conversation room (open chat windows) and to the
/// recipient's user room (badge and preview refresh).
fn emit_new_message(
    state: &AppState,
    conversation: &Conversation,
    message: &Message,
    recipient_id: Uuid,
) {
    let payload = serde_json::json!({
        "conversation_id": conversation.id,
        "request_id": conversation.request_id,
        "message": {
            "id": message.id,
            "conversation_id": message.conversation_id,
            "sender_id": message.sender_id,
            "content": message.content,
            "created_at": message.created_at,
        }
    });

    let conv_room = format!("conversation:{}", conversation.id);
    let _ = state.io.to(conv_room).emit("new-message", &payload);

    let user_room = format!("user:{recipient_id}");
    let result = state.io.to(user_room).emit("new-message", &payload);

    tracing::debug!(
        sender = %message.sender_id,
        recipient = %recipient_id,
        conversation = %conversation.id,
        success = result.is_ok(),
        "socket emit new-message"
    );
}

// --- POST /conversations/:id/read ---

pub async fn mark_as_read(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    load_for_participant(&mut conn, conversation_id, auth_user.id)?;

    let updated = diesel::update(
        messages::table
            .filter(messages::conversation_id.eq(conversation_id))
            .filter(messages::sender_id.ne(auth_user.id))
            .filter(messages::read.eq(false)),
    )
    .set(messages::read.eq(true))
    .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "conversation_id": conversation_id,
        "marked_read": updated,
        "read_at": Utc::now()
    }))))
}

// --- GET /unread-count ---

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub total_unread: i64,
}

pub async fn get_unread_count(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let user_id = auth_user.id;

    let conv_ids: Vec<Uuid> = conversations::table
        .filter(
            conversations::requester_id
                .eq(user_id)
                .or(conversations::helper_id.eq(user_id)),
        )
        .select(conversations::id)
        .load::<Uuid>(&mut conn)?;

    let total_unread: i64 = messages::table
        .filter(messages::conversation_id.eq_any(&conv_ids))
        .filter(messages::read.eq(false))
        .filter(messages::sender_id.ne(user_id))
        .select(count_star())
        .first::<i64>(&mut conn)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { total_unread })))
}
