pub mod lifecycle;
pub mod rating;
pub mod status;

pub use lifecycle::{LifecycleError, OfferSnapshot, RequestSnapshot, ReviewTarget};
pub use rating::{next_rating, RatingAggregate};
pub use status::{is_valid_category, OfferStatus, RequestStatus, ReviewType, Urgency, CATEGORIES};
