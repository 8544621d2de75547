//! Record store access
//!
//! All durable pipeline state lives in the `feedback` table; the stages are
//! stateless between invocations and never cache records across deliveries.

pub mod feedback;
pub mod init;

pub use feedback::*;
pub use init::*;
