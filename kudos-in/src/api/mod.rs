//! HTTP API handlers for kudos-in

pub mod health;
pub mod submit;

pub use health::health_routes;
pub use submit::submit_feedback;
