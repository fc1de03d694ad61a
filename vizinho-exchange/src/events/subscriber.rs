use std::sync::Arc;

use diesel::prelude::*;
use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;
use uuid::Uuid;

use vizinho_shared::types::event::{payloads, routing_keys, Event};

use crate::domain::RequestStatus;
use crate::schema::{requests, users};
use crate::AppState;

/// Apply moderation decisions to the user and request tables.
pub async fn listen_moderation_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state
        .rabbitmq
        .subscribe("vizinho-exchange.moderation", &["vizinho.moderation.#"])
        .await?;

    tracing::info!("listening for moderation events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                handle_delivery(&state, delivery.routing_key.as_str(), &delivery.data);
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "consumer error");
            }
        }
    }

    Ok(())
}

fn handle_delivery(state: &AppState, routing_key: &str, data: &[u8]) {
    let result = match routing_key {
        routing_keys::MODERATION_USER_BLOCKED | routing_keys::MODERATION_USER_UNBLOCKED => {
            match serde_json::from_slice::<Event<payloads::UserBlocked>>(data) {
                Ok(event) => set_user_blocked(state, event.data.user_id, event.data.blocked),
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            }
        }
        routing_keys::MODERATION_USER_ROLE_CHANGED => {
            match serde_json::from_slice::<Event<payloads::UserRoleChanged>>(data) {
                Ok(event) => set_user_role(state, event.data.user_id, &event.data.role),
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            }
        }
        routing_keys::MODERATION_USER_DELETED => {
            match serde_json::from_slice::<Event<payloads::UserDeleted>>(data) {
                Ok(event) => delete_user(state, event.data.user_id),
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            }
        }
        routing_keys::MODERATION_REQUEST_REMOVED => {
            match serde_json::from_slice::<Event<payloads::RequestRemoved>>(data) {
                Ok(event) => remove_request(state, event.data.request_id),
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            }
        }
        // report.created is for the notification service
        _ => return,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, routing_key, "failed to apply moderation event");
    }
}

fn set_user_blocked(state: &AppState, user_id: Uuid, blocked: bool) -> anyhow::Result<()> {
    let mut conn = state.db.get()?;
    diesel::update(users::table.find(user_id))
        .set(users::blocked.eq(blocked))
        .execute(&mut conn)?;
    tracing::info!(user_id = %user_id, blocked, "user block flag updated");
    Ok(())
}

fn set_user_role(state: &AppState, user_id: Uuid, role: &str) -> anyhow::Result<()> {
    let mut conn = state.db.get()?;
    diesel::update(users::table.find(user_id))
        .set(users::role.eq(role))
        .execute(&mut conn)?;
    tracing::info!(user_id = %user_id, role, "user role updated");
    Ok(())
}

/// Cancel the user's open requests, then drop the row. Offers and reviews
/// referencing the user cascade at the database level.
fn delete_user(state: &AppState, user_id: Uuid) -> anyhow::Result<()> {
    let mut conn = state.db.get()?;
    conn.transaction::<(), diesel::result::Error, _>(|conn| {
        diesel::update(
            requests::table
                .filter(requests::user_id.eq(user_id))
                .filter(requests::status.ne(RequestStatus::Completed.to_string()))
                .filter(requests::status.ne(RequestStatus::Cancelled.to_string())),
        )
        .set(requests::status.eq(RequestStatus::Cancelled.to_string()))
        .execute(conn)?;

        diesel::delete(users::table.find(user_id)).execute(conn)?;
        Ok(())
    })?;
    tracing::info!(user_id = %user_id, "user deleted");
    Ok(())
}

fn remove_request(state: &AppState, request_id: Uuid) -> anyhow::Result<()> {
    let mut conn = state.db.get()?;
    diesel::update(requests::table.find(request_id))
        .set((
            requests::status.eq(RequestStatus::Cancelled.to_string()),
            requests::closed_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)?;
    tracing::info!(request_id = %request_id, "request removed by moderation");
    Ok(())
}
