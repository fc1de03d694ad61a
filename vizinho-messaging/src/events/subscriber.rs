use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use vizinho_shared::types::event::{payloads, routing_keys, Event};

use crate::routes::conversations::find_or_create;
use crate::AppState;

/// Open a conversation between requester and helper as soon as an offer
/// lands, so the two can talk before anything is accepted.
pub async fn listen_offer_submitted(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state
        .rabbitmq
        .subscribe(
            "vizinho-messaging.exchange.offer.submitted",
            &[routing_keys::EXCHANGE_OFFER_SUBMITTED],
        )
        .await?;

    tracing::info!("listening for offer.submitted events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::OfferSubmitted>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        let mut conn = match state.db.get() {
                            Ok(c) => c,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to get db connection");
                                let _ = delivery.ack(BasicAckOptions::default()).await;
                                continue;
                            }
                        };

                        match find_or_create(
                            &mut conn,
                            data.request_id,
                            data.requester_id,
                            data.helper_id,
                        ) {
                            Ok(conversation) => {
                                tracing::info!(
                                    conversation_id = %conversation.id,
                                    offer_id = %data.offer_id,
                                    "conversation ready for offer"
                                );
                            }
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    offer_id = %data.offer_id,
                                    "failed to open conversation for offer"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize offer.submitted event");
                    }
                }
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "consumer error");
            }
        }
    }

    Ok(())
}
