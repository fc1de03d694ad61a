use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use vizinho_shared::types::event::{payloads, routing_keys, Event};

use crate::models::types;
use crate::services::notification_service;
use crate::AppState;

/// Exchange lifecycle events drive most user-facing notifications.
pub async fn listen_exchange_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state
        .rabbitmq
        .subscribe("vizinho-notification.exchange", &["vizinho.exchange.#"])
        .await?;

    tracing::info!("listening for exchange events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                handle_exchange_event(&state, delivery.routing_key.as_str(), &delivery.data);
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "exchange consumer error");
            }
        }
    }

    Ok(())
}

fn handle_exchange_event(state: &AppState, routing_key: &str, data: &[u8]) {
    match routing_key {
        routing_keys::EXCHANGE_OFFER_SUBMITTED => {
            let event = match serde_json::from_slice::<Event<payloads::OfferSubmitted>>(data) {
                Ok(e) => e,
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            };
            let d = &event.data;
            let helper = d.helper_name.as_deref().unwrap_or("Um vizinho");
            if let Err(e) = notification_service::create_notification(
                &state.db,
                d.requester_id,
                types::OFFER_RECEIVED,
                "Nova oferta de ajuda",
                Some(format!("{helper} ofereceu ajuda no seu pedido \"{}\"", d.request_title)),
                Some(serde_json::json!({
                    "offer_id": d.offer_id,
                    "request_id": d.request_id,
                    "helper_id": d.helper_id,
                })),
            ) {
                tracing::error!(error = %e, "failed to create offer_received notification");
            }
        }
        routing_keys::EXCHANGE_OFFER_ACCEPTED => {
            let event = match serde_json::from_slice::<Event<payloads::OfferAccepted>>(data) {
                Ok(e) => e,
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            };
            let d = &event.data;
            if let Err(e) = notification_service::create_notification(
                &state.db,
                d.helper_id,
                types::OFFER_ACCEPTED,
                "Oferta aceita",
                Some(format!("Sua oferta no pedido \"{}\" foi aceita", d.request_title)),
                Some(serde_json::json!({
                    "offer_id": d.offer_id,
                    "request_id": d.request_id,
                })),
            ) {
                tracing::error!(error = %e, "failed to create offer_accepted notification");
            }
        }
        routing_keys::EXCHANGE_OFFER_REJECTED => {
            let event = match serde_json::from_slice::<Event<payloads::OfferRejected>>(data) {
                Ok(e) => e,
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            };
            let d = &event.data;
            if let Err(e) = notification_service::create_notification(
                &state.db,
                d.helper_id,
                types::OFFER_REJECTED,
                "Oferta recusada",
                Some(format!("Sua oferta no pedido \"{}\" nao foi aceita", d.request_title)),
                Some(serde_json::json!({
                    "offer_id": d.offer_id,
                    "request_id": d.request_id,
                })),
            ) {
                tracing::error!(error = %e, "failed to create offer_rejected notification");
            }
        }
        routing_keys::EXCHANGE_REQUEST_COMPLETED => {
            let event = match serde_json::from_slice::<Event<payloads::RequestCompleted>>(data) {
                Ok(e) => e,
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            };
            let d = &event.data;
            // Both sides get a review prompt once the item is back
            for user_id in [d.requester_id, d.helper_id] {
                if let Err(e) = notification_service::create_notification(
                    &state.db,
                    user_id,
                    types::SYSTEM,
                    "Troca concluida",
                    Some(format!("O pedido \"{}\" foi concluido. Avalie sua troca!", d.request_title)),
                    Some(serde_json::json!({
                        "offer_id": d.offer_id,
                        "request_id": d.request_id,
                    })),
                ) {
                    tracing::error!(error = %e, "failed to create completion notification");
                }
            }
        }
        routing_keys::EXCHANGE_REQUEST_CANCELLED => {
            let event = match serde_json::from_slice::<Event<payloads::RequestCancelled>>(data) {
                Ok(e) => e,
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            };
            let d = &event.data;
            for helper_id in &d.pending_helper_ids {
                if let Err(e) = notification_service::create_notification(
                    &state.db,
                    *helper_id,
                    types::SYSTEM,
                    "Pedido cancelado",
                    Some(format!("O pedido \"{}\" foi cancelado", d.request_title)),
                    Some(serde_json::json!({ "request_id": d.request_id })),
                ) {
                    tracing::error!(error = %e, "failed to create cancellation notification");
                }
            }
        }
        routing_keys::EXCHANGE_REVIEW_CREATED => {
            let event = match serde_json::from_slice::<Event<payloads::ReviewCreated>>(data) {
                Ok(e) => e,
                Err(e) => {
                    tracing::error!(error = %e, routing_key, "failed to deserialize event");
                    return;
                }
            };
            let d = &event.data;
            if let Err(e) = notification_service::create_notification(
                &state.db,
                d.reviewed_id,
                types::REVIEW,
                "Nova avaliacao",
                Some(format!("Voce recebeu uma avaliacao de {} estrelas", d.rating)),
                Some(serde_json::json!({
                    "review_id": d.review_id,
                    "offer_id": d.offer_id,
                    "rating": d.rating,
                })),
            ) {
                tracing::error!(error = %e, "failed to create review notification");
            }
        }
        _ => {}
    }
}

/// One notification per delivered chat message.
pub async fn listen_message_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state
        .rabbitmq
        .subscribe(
            "vizinho-notification.message.sent",
            &[routing_keys::MESSAGING_MESSAGE_SENT],
        )
        .await?;

    tracing::info!("listening for message events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::MessageSent>>(&delivery.data) {
                    Ok(event) => {
                        let d = &event.data;
                        if let Err(e) = notification_service::create_notification(
                            &state.db,
                            d.recipient_id,
                            types::MESSAGE,
                            "Nova mensagem",
                            Some(d.content_preview.clone()),
                            Some(serde_json::json!({
                                "conversation_id": d.conversation_id,
                                "message_id": d.message_id,
                                "sender_id": d.sender_id,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to create message notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize message.sent event");
                    }
                }
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "message consumer error");
            }
        }
    }

    Ok(())
}

/// Business listing moderation outcomes go back to the owner.
pub async fn listen_business_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state
        .rabbitmq
        .subscribe(
            "vizinho-notification.business",
            &[
                routing_keys::BUSINESS_LISTING_APPROVED,
                routing_keys::BUSINESS_LISTING_REJECTED,
            ],
        )
        .await?;

    tracing::info!("listening for business events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::ListingModerated>>(&delivery.data) {
                    Ok(event) => {
                        let d = &event.data;
                        let (title, message) = if d.approved {
                            (
                                "Comercio aprovado".to_string(),
                                format!("\"{}\" ja aparece no guia de comercios", d.business_name),
                            )
                        } else {
                            let reason = d
                                .rejection_reason
                                .as_deref()
                                .unwrap_or("sem motivo informado");
                            (
                                "Comercio recusado".to_string(),
                                format!("\"{}\" nao foi aprovado: {reason}", d.business_name),
                            )
                        };
                        if let Err(e) = notification_service::create_notification(
                            &state.db,
                            d.created_by,
                            types::SYSTEM,
                            &title,
                            Some(message.clone()),
                            Some(serde_json::json!({
                                "business_id": d.business_id,
                                "approved": d.approved,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to create listing notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize listing event");
                    }
                }
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "business consumer error");
            }
        }
    }

    Ok(())
}

/// Tell users when moderation blocks or unblocks their account.
pub async fn listen_moderation_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state
        .rabbitmq
        .subscribe(
            "vizinho-notification.moderation",
            &[
                routing_keys::MODERATION_USER_BLOCKED,
                routing_keys::MODERATION_USER_UNBLOCKED,
            ],
        )
        .await?;

    tracing::info!("listening for moderation events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::UserBlocked>>(&delivery.data) {
                    Ok(event) => {
                        let d = &event.data;
                        let (title, message) = if d.blocked {
                            ("Conta bloqueada", "Sua conta foi bloqueada pela moderacao")
                        } else {
                            ("Conta desbloqueada", "Sua conta foi reativada")
                        };
                        if let Err(e) = notification_service::create_notification(
                            &state.db,
                            d.user_id,
                            types::SYSTEM,
                            title,
                            Some(message.to_string()),
                            None,
                        ) {
                            tracing::error!(error = %e, "failed to create moderation notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize moderation event");
                    }
                }
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "moderation consumer error");
            }
        }
    }

    Ok(())
}
