//! # Kudos Common Library
//!
//! Shared code for the kudos pipeline services including:
//! - Feedback record model and store queries
//! - Event payloads and the push-delivery envelope codec
//! - Event bus publisher client
//! - Delivery acknowledgment taxonomy
//! - Configuration loading

pub mod ack;
pub mod bus;
pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use ack::Ack;
pub use error::{Error, Result};
