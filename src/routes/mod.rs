pub mod analytics;
pub mod auth;
pub mod health;
pub mod share;
pub mod team;
pub mod upload;
pub mod validation;
pub mod vcards;

pub use health::health_check;
pub use validation::timestamp_to_rfc3339;
