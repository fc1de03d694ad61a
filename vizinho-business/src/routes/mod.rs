pub mod businesses;
pub mod categories;
pub mod health;
pub mod reviews;
