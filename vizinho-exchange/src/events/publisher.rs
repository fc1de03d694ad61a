use uuid::Uuid;

use vizinho_shared::clients::rabbitmq::RabbitMQClient;
use vizinho_shared::types::event::{payloads, routing_keys, Event};

use crate::models::{Offer, Request, Review};

pub async fn publish_offer_submitted(
    rabbitmq: &RabbitMQClient,
    offer: &Offer,
    request: &Request,
    helper_name: Option<String>,
) {
    let event = Event::new(
        "vizinho-exchange",
        routing_keys::EXCHANGE_OFFER_SUBMITTED,
        payloads::OfferSubmitted {
            offer_id: offer.id,
            request_id: request.id,
            request_title: request.title.clone(),
            requester_id: request.user_id,
            helper_id: offer.helper_id,
            helper_name,
        },
    )
    .with_user(offer.helper_id);

    if let Err(e) = rabbitmq.publish(routing_keys::EXCHANGE_OFFER_SUBMITTED, &event).await {
        tracing::error!(error = %e, "failed to publish offer.submitted event");
    }
}

pub async fn publish_offer_accepted(rabbitmq: &RabbitMQClient, offer: &Offer, request: &Request) {
    let event = Event::new(
        "vizinho-exchange",
        routing_keys::EXCHANGE_OFFER_ACCEPTED,
        payloads::OfferAccepted {
            offer_id: offer.id,
            request_id: request.id,
            request_title: request.title.clone(),
            requester_id: request.user_id,
            helper_id: offer.helper_id,
        },
    )
    .with_user(request.user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::EXCHANGE_OFFER_ACCEPTED, &event).await {
        tracing::error!(error = %e, "failed to publish offer.accepted event");
    }
}

pub async fn publish_offer_rejected(rabbitmq: &RabbitMQClient, offer: &Offer, request: &Request) {
    let event = Event::new(
        "vizinho-exchange",
        routing_keys::EXCHANGE_OFFER_REJECTED,
        payloads::OfferRejected {
            offer_id: offer.id,
            request_id: request.id,
            request_title: request.title.clone(),
            helper_id: offer.helper_id,
        },
    )
    .with_user(request.user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::EXCHANGE_OFFER_REJECTED, &event).await {
        tracing::error!(error = %e, "failed to publish offer.rejected event");
    }
}

pub async fn publish_request_completed(
    rabbitmq: &RabbitMQClient,
    offer: &Offer,
    request: &Request,
) {
    let event = Event::new(
        "vizinho-exchange",
        routing_keys::EXCHANGE_REQUEST_COMPLETED,
        payloads::RequestCompleted {
            request_id: request.id,
            request_title: request.title.clone(),
            offer_id: offer.id,
            requester_id: request.user_id,
            helper_id: offer.helper_id,
        },
    )
    .with_user(request.user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::EXCHANGE_REQUEST_COMPLETED, &event).await {
        tracing::error!(error = %e, "failed to publish request.completed event");
    }
}

pub async fn publish_request_cancelled(
    rabbitmq: &RabbitMQClient,
    request: &Request,
    pending_helper_ids: Vec<Uuid>,
) {
    let event = Event::new(
        "vizinho-exchange",
        routing_keys::EXCHANGE_REQUEST_CANCELLED,
        payloads::RequestCancelled {
            request_id: request.id,
            request_title: request.title.clone(),
            requester_id: request.user_id,
            pending_helper_ids,
        },
    )
    .with_user(request.user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::EXCHANGE_REQUEST_CANCELLED, &event).await {
        tracing::error!(error = %e, "failed to publish request.cancelled event");
    }
}

pub async fn publish_review_created(rabbitmq: &RabbitMQClient, review: &Review) {
    let event = Event::new(
        "vizinho-exchange",
        routing_keys::EXCHANGE_REVIEW_CREATED,
        payloads::ReviewCreated {
            review_id: review.id,
            offer_id: review.offer_id,
            reviewer_id: review.reviewer_id,
            reviewed_id: review.reviewed_id,
            review_type: review.review_type.clone(),
            rating: review.rating,
        },
    )
    .with_user(review.reviewer_id);

    if let Err(e) = rabbitmq.publish(routing_keys::EXCHANGE_REVIEW_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish review.created event");
    }
}
