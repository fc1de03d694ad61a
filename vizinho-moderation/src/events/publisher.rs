use uuid::Uuid;

use vizinho_shared::clients::rabbitmq::RabbitMQClient;
use vizinho_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_report_created(
    rabbitmq: &RabbitMQClient,
    report_id: Uuid,
    reporter_id: Uuid,
    reported_id: Uuid,
    report_type: &str,
) {
    let event = Event::new(
        "vizinho-moderation",
        routing_keys::MODERATION_REPORT_CREATED,
        payloads::ReportCreated {
            report_id,
            reporter_id,
            reported_id,
            report_type: report_type.to_string(),
        },
    )
    .with_user(reporter_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_REPORT_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish report.created event");
    }
}

/// One publisher for block and unblock; the routing key carries the
/// distinction so subscribers can bind selectively.
pub async fn publish_user_blocked(rabbitmq: &RabbitMQClient, user_id: Uuid, blocked: bool) {
    let routing_key = if blocked {
        routing_keys::MODERATION_USER_BLOCKED
    } else {
        routing_keys::MODERATION_USER_UNBLOCKED
    };

    let event = Event::new(
        "vizinho-moderation",
        routing_key,
        payloads::UserBlocked { user_id, blocked },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_key, &event).await {
        tracing::error!(error = %e, blocked, "failed to publish user block event");
    }
}

pub async fn publish_user_role_changed(rabbitmq: &RabbitMQClient, user_id: Uuid, role: &str) {
    let event = Event::new(
        "vizinho-moderation",
        routing_keys::MODERATION_USER_ROLE_CHANGED,
        payloads::UserRoleChanged {
            user_id,
            role: role.to_string(),
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq
        .publish(routing_keys::MODERATION_USER_ROLE_CHANGED, &event)
        .await
    {
        tracing::error!(error = %e, "failed to publish user.role_changed event");
    }
}

pub async fn publish_user_deleted(rabbitmq: &RabbitMQClient, user_id: Uuid) {
    let event = Event::new(
        "vizinho-moderation",
        routing_keys::MODERATION_USER_DELETED,
        payloads::UserDeleted { user_id },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_USER_DELETED, &event).await {
        tracing::error!(error = %e, "failed to publish user.deleted event");
    }
}

pub async fn publish_request_removed(
    rabbitmq: &RabbitMQClient,
    request_id: Uuid,
    removed_by: Uuid,
    reason: Option<String>,
) {
    let event = Event::new(
        "vizinho-moderation",
        routing_keys::MODERATION_REQUEST_REMOVED,
        payloads::RequestRemoved {
            request_id,
            removed_by,
            reason,
        },
    )
    .with_user(removed_by);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_REQUEST_REMOVED, &event).await {
        tracing::error!(error = %e, "failed to publish request.removed event");
    }
}
