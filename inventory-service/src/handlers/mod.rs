pub mod auth;
pub mod branches;
pub mod categories;
pub mod health;
pub mod invoices;
pub mod products;

pub use health::{health_check, metrics_endpoint, readiness_check};
