use std::sync::Arc;

use serde::Serialize;
use socketioxide::extract::{Data, SocketRef};
use uuid::Uuid;

use crate::routes::conversations::load_for_participant;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

fn get_user_id(socket: &SocketRef) -> Option<Uuid> {
    socket.extensions.get::<Uuid>()
}

pub async fn on_connect_with_state(socket: SocketRef, state: Arc<AppState>) {
    let user_id = match authenticate_socket(&socket, &state) {
        Ok(id) => id,
        Err(msg) => {
            tracing::warn!(error = %msg, "messaging socket auth failed");
            let _ = socket.emit(
                "error",
                &ErrorPayload {
                    code: "AUTH_FAILED".into(),
                    message: msg,
                },
            );
            socket.disconnect().ok();
            return;
        }
    };

    socket.extensions.insert(user_id);

    // User-specific room so REST handlers can push to this user
    let user_room = format!("user:{user_id}");
    socket.join(user_room).ok();

    tracing::info!(user_id = %user_id, sid = %socket.id, "messaging socket connected");

    // Presence key with TTL; heartbeats refresh it
    let _ = state.redis.set(&format!("online:{user_id}"), "1", 120).await;

    let _ = socket.emit("connected", &serde_json::json!({ "user_id": user_id }));

    socket.on("heartbeat", {
        let state = state.clone();
        move |socket: SocketRef| {
            let state = state.clone();
            async move {
                if let Some(user_id) = get_user_id(&socket) {
                    let _ = state.redis.set(&format!("online:{user_id}"), "1", 120).await;
                }
            }
        }
    });

    // Clients join a conversation room when they open a chat window
    socket.on("join-conversation", {
        let state = state.clone();
        move |socket: SocketRef, Data::<serde_json::Value>(payload)| {
            let state = state.clone();
            async move {
                on_join_conversation(socket, payload, &state);
            }
        }
    });

    socket.on("leave-conversation", {
        move |socket: SocketRef, Data::<serde_json::Value>(payload)| async move {
            if let Some(id) = parse_conversation_id(&payload) {
                socket.leave(format!("conversation:{id}")).ok();
            }
        }
    });

    // Relay typing indicators to the conversation partner
    socket.on("typing", {
        let state = state.clone();
        move |socket: SocketRef, Data::<serde_json::Value>(payload)| {
            let state = state.clone();
            async move {
                on_typing(socket, payload, &state);
            }
        }
    });

    socket.on_disconnect({
        let state = state.clone();
        move |socket: SocketRef| {
            let state = state.clone();
            async move {
                on_disconnect_with_state(socket, state).await;
            }
        }
    });
}

async fn on_disconnect_with_state(socket: SocketRef, state: Arc<AppState>) {
    let user_id = match get_user_id(&socket) {
        Some(id) => id,
        None => return,
    };

    tracing::info!(user_id = %user_id, sid = %socket.id, "messaging socket disconnected");

    let _ = state.redis.del(&format!("online:{user_id}")).await;
}

fn parse_conversation_id(payload: &serde_json::Value) -> Option<Uuid> {
    payload
        .get("conversation_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn on_join_conversation(socket: SocketRef, payload: serde_json::Value, state: &Arc<AppState>) {
    let user_id = match get_user_id(&socket) {
        Some(id) => id,
        None => return,
    };

    let conversation_id = match parse_conversation_id(&payload) {
        Some(id) => id,
        None => {
            tracing::warn!("join-conversation event missing conversation_id");
            return;
        }
    };

    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to get db connection for room join");
            return;
        }
    };

    // Only participants may join the room
    if load_for_participant(&mut conn, conversation_id, user_id).is_err() {
        let _ = socket.emit(
            "error",
            &ErrorPayload {
                code: "NOT_PARTICIPANT".into(),
                message: "you are not part of this conversation".into(),
            },
        );
        return;
    }

    socket.join(format!("conversation:{conversation_id}")).ok();
    tracing::debug!(user_id = %user_id, conversation = %conversation_id, "joined conversation room");
}

fn on_typing(socket: SocketRef, payload: serde_json::Value, state: &Arc<AppState>) {
    let user_id = match get_user_id(&socket) {
        Some(id) => id,
        None => return,
    };

    let conversation_id = match parse_conversation_id(&payload) {
        Some(id) => id,
        None => {
            tracing::warn!("typing event missing conversation_id");
            return;
        }
    };

    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to get db connection for typing relay");
            return;
        }
    };

    let conversation = match load_for_participant(&mut conn, conversation_id, user_id) {
        Ok(c) => c,
        Err(_) => return,
    };

    let partner_room = format!("user:{}", conversation.partner_of(user_id));
    let _ = socket.to(partner_room).emit(
        "typing",
        &serde_json::json!({
            "conversation_id": conversation_id,
            "user_id": user_id,
        }),
    );
}

fn authenticate_socket(socket: &SocketRef, state: &Arc<AppState>) -> Result<Uuid, String> {
    let connect_info = socket.req_parts();

    // Token travels in the query string: ?token=xxx
    let query = connect_info.uri.query().unwrap_or_default();
    let token = query
        .split('&')
        .find_map(|pair| {
            let mut split = pair.splitn(2, '=');
            let key = split.next()?;
            let value = split.next()?;
            if key == "token" {
                Some(value.to_string())
            } else {
                None
            }
        })
        .ok_or_else(|| "missing token query parameter".to_string())?;

    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = jsonwebtoken::decode::<vizinho_shared::types::auth::Claims>(
        &token,
        &jsonwebtoken::DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("invalid token: {e}"))?;

    if token_data.claims.is_expired() {
        return Err("token has expired".into());
    }

    Ok(token_data.claims.sub)
}
