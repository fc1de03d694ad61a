use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{service}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Exchange errors (requests, offers, reviews, profiles)
/// - E2xxx: Messaging errors
/// - E3xxx: Notification errors
/// - E4xxx: Business directory errors
/// - E5xxx: Moderation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    ServiceUnavailable,
    BadRequest,
    PayloadTooLarge,
    TokenExpired,
    TokenInvalid,

    // Exchange (E1xxx)
    RequestNotFound,
    OfferNotFound,
    ProfileNotFound,
    ReviewNotFound,
    InvalidState,
    DuplicateOffer,
    DuplicateReview,
    NotEligible,
    CannotOfferOwnRequest,
    UserBlocked,
    ImageUploadFailed,
    ImageLimitReached,

    // Messaging (E2xxx)
    ConversationNotFound,
    NotConversationParticipant,
    MessageNotFound,

    // Notification (E3xxx)
    NotificationNotFound,

    // Business (E4xxx)
    BusinessNotFound,
    BusinessCategoryNotFound,
    BusinessNotApproved,
    BusinessAlreadyModerated,
    DuplicateBusinessReview,

    // Moderation (E5xxx)
    ReportNotFound,
    ReportAlreadyReviewed,
    CannotReportSelf,
    DuplicateReport,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::ServiceUnavailable => "E0006",
            Self::BadRequest => "E0007",
            Self::PayloadTooLarge => "E0008",
            Self::TokenExpired => "E0009",
            Self::TokenInvalid => "E0010",

            // Exchange
            Self::RequestNotFound => "E1001",
            Self::OfferNotFound => "E1002",
            Self::ProfileNotFound => "E1003",
            Self::ReviewNotFound => "E1004",
            Self::InvalidState => "E1005",
            Self::DuplicateOffer => "E1006",
            Self::DuplicateReview => "E1007",
            Self::NotEligible => "E1008",
            Self::CannotOfferOwnRequest => "E1009",
            Self::UserBlocked => "E1010",
            Self::ImageUploadFailed => "E1011",
            Self::ImageLimitReached => "E1012",

            // Messaging
            Self::ConversationNotFound => "E2001",
            Self::NotConversationParticipant => "E2002",
            Self::MessageNotFound => "E2003",

            // Notification
            Self::NotificationNotFound => "E3001",

            // Business
            Self::BusinessNotFound => "E4001",
            Self::BusinessCategoryNotFound => "E4002",
            Self::BusinessNotApproved => "E4003",
            Self::BusinessAlreadyModerated => "E4004",
            Self::DuplicateBusinessReview => "E4005",

            // Moderation
            Self::ReportNotFound => "E5001",
            Self::ReportAlreadyReviewed => "E5002",
            Self::CannotReportSelf => "E5003",
            Self::DuplicateReport => "E5004",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::ImageUploadFailed => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::RequestNotFound | Self::OfferNotFound
            | Self::ProfileNotFound | Self::ReviewNotFound | Self::ConversationNotFound
            | Self::MessageNotFound | Self::NotificationNotFound | Self::BusinessNotFound
            | Self::BusinessCategoryNotFound | Self::ReportNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::CannotOfferOwnRequest | Self::UserBlocked
            | Self::NotConversationParticipant | Self::CannotReportSelf
            | Self::BusinessNotApproved => StatusCode::FORBIDDEN,
            Self::InvalidState | Self::NotEligible | Self::DuplicateOffer
            | Self::DuplicateReview | Self::DuplicateBusinessReview | Self::DuplicateReport
            | Self::ReportAlreadyReviewed | Self::BusinessAlreadyModerated
            | Self::ImageLimitReached => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidState, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
