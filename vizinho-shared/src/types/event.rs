use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ event envelope wrapping all domain events.
///
/// Routing key format: `vizinho.{service}.{entity}.{action}`
/// Example: `vizinho.exchange.offer.accepted`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Exchange lifecycle events
    pub const EXCHANGE_OFFER_SUBMITTED: &str = "vizinho.exchange.offer.submitted";
    pub const EXCHANGE_OFFER_ACCEPTED: &str = "vizinho.exchange.offer.accepted";
    pub const EXCHANGE_OFFER_REJECTED: &str = "vizinho.exchange.offer.rejected";
    pub const EXCHANGE_REQUEST_COMPLETED: &str = "vizinho.exchange.request.completed";
    pub const EXCHANGE_REQUEST_CANCELLED: &str = "vizinho.exchange.request.cancelled";
    pub const EXCHANGE_REVIEW_CREATED: &str = "vizinho.exchange.review.created";

    // Messaging events
    pub const MESSAGING_MESSAGE_SENT: &str = "vizinho.messaging.message.sent";

    // Business directory events
    pub const BUSINESS_LISTING_SUBMITTED: &str = "vizinho.business.listing.submitted";
    pub const BUSINESS_LISTING_APPROVED: &str = "vizinho.business.listing.approved";
    pub const BUSINESS_LISTING_REJECTED: &str = "vizinho.business.listing.rejected";

    // Moderation events
    pub const MODERATION_REPORT_CREATED: &str = "vizinho.moderation.report.created";
    pub const MODERATION_USER_BLOCKED: &str = "vizinho.moderation.user.blocked";
    pub const MODERATION_USER_UNBLOCKED: &str = "vizinho.moderation.user.unblocked";
    pub const MODERATION_USER_ROLE_CHANGED: &str = "vizinho.moderation.user.role_changed";
    pub const MODERATION_USER_DELETED: &str = "vizinho.moderation.user.deleted";
    pub const MODERATION_REQUEST_REMOVED: &str = "vizinho.moderation.request.removed";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OfferSubmitted {
        pub offer_id: Uuid,
        pub request_id: Uuid,
        pub request_title: String,
        pub requester_id: Uuid,
        pub helper_id: Uuid,
        pub helper_name: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OfferAccepted {
        pub offer_id: Uuid,
        pub request_id: Uuid,
        pub request_title: String,
        pub requester_id: Uuid,
        pub helper_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OfferRejected {
        pub offer_id: Uuid,
        pub request_id: Uuid,
        pub request_title: String,
        pub helper_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RequestCompleted {
        pub request_id: Uuid,
        pub request_title: String,
        pub offer_id: Uuid,
        pub requester_id: Uuid,
        pub helper_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RequestCancelled {
        pub request_id: Uuid,
        pub request_title: String,
        pub requester_id: Uuid,
        pub pending_helper_ids: Vec<Uuid>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReviewCreated {
        pub review_id: Uuid,
        pub offer_id: Uuid,
        pub reviewer_id: Uuid,
        pub reviewed_id: Uuid,
        pub review_type: String,
        pub rating: i32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MessageSent {
        pub message_id: Uuid,
        pub conversation_id: Uuid,
        pub sender_id: Uuid,
        pub recipient_id: Uuid,
        pub content_preview: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ListingSubmitted {
        pub business_id: Uuid,
        pub business_name: String,
        pub created_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ListingModerated {
        pub business_id: Uuid,
        pub business_name: String,
        pub created_by: Uuid,
        pub approved: bool,
        pub rejection_reason: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReportCreated {
        pub report_id: Uuid,
        pub reporter_id: Uuid,
        pub reported_id: Uuid,
        pub report_type: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserBlocked {
        pub user_id: Uuid,
        pub blocked: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserRoleChanged {
        pub user_id: Uuid,
        pub role: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserDeleted {
        pub user_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RequestRemoved {
        pub request_id: Uuid,
        pub removed_by: Uuid,
        pub reason: Option<String>,
    }
}
