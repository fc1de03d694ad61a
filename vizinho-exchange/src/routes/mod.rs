pub mod health;
pub mod images;
pub mod internal;
pub mod offers;
pub mod profiles;
pub mod ranking;
pub mod requests;
pub mod reviews;
