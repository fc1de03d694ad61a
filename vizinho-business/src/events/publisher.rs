use uuid::Uuid;

use vizinho_shared::clients::rabbitmq::RabbitMQClient;
use vizinho_shared::types::event::{payloads, routing_keys, Event};

use crate::models::Business;

pub async fn publish_listing_submitted(rabbitmq: &RabbitMQClient, business: &Business) {
    let event = Event::new(
        "vizinho-business",
        routing_keys::BUSINESS_LISTING_SUBMITTED,
        payloads::ListingSubmitted {
            business_id: business.id,
            business_name: business.name.clone(),
            created_by: business.created_by,
        },
    )
    .with_user(business.created_by);

    if let Err(e) = rabbitmq.publish(routing_keys::BUSINESS_LISTING_SUBMITTED, &event).await {
        tracing::error!(error = %e, "failed to publish listing.submitted event");
    }
}

pub async fn publish_listing_approved(
    rabbitmq: &RabbitMQClient,
    business: &Business,
    admin_id: Uuid,
) {
    let event = Event::new(
        "vizinho-business",
        routing_keys::BUSINESS_LISTING_APPROVED,
        payloads::ListingModerated {
            business_id: business.id,
            business_name: business.name.clone(),
            created_by: business.created_by,
            approved: true,
            rejection_reason: None,
        },
    )
    .with_user(admin_id);

    if let Err(e) = rabbitmq.publish(routing_keys::BUSINESS_LISTING_APPROVED, &event).await {
        tracing::error!(error = %e, "failed to publish listing.approved event");
    }
}

pub async fn publish_listing_rejected(
    rabbitmq: &RabbitMQClient,
    business: &Business,
    admin_id: Uuid,
) {
    let event = Event::new(
        "vizinho-business",
        routing_keys::BUSINESS_LISTING_REJECTED,
        payloads::ListingModerated {
            business_id: business.id,
            business_name: business.name.clone(),
            created_by: business.created_by,
            approved: false,
            rejection_reason: business.rejection_reason.clone(),
        },
    )
    .with_user(admin_id);

    if let Err(e) = rabbitmq.publish(routing_keys::BUSINESS_LISTING_REJECTED, &event).await {
        tracing::error!(error = %e, "failed to publish listing.rejected event");
    }
}
