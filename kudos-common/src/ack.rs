//! Delivery acknowledgment taxonomy for the push-driven stages
//!
//! Every push delivery is acknowledged with HTTP 200 regardless of what
//! happened inside the handler (a non-200 would make the bus redeliver
//! forever, since there is no dead-letter or retry budget). The `Ack` variants
//! keep "genuinely done" distinguishable from "swallowed a failure" for logs
//! and tests, which the status code alone cannot express.

use crate::Error;

/// Outcome of handling one push delivery
#[derive(Debug)]
pub enum Ack {
    /// The stage ran to completion
    Completed,

    /// The delivery was not actionable (malformed payload, unknown record);
    /// dropped as a no-op
    Ignored(&'static str),

    /// The stage failed but the failure is acknowledged to the bus anyway;
    /// the work is permanently lost unless a later redelivery succeeds
    Suppressed(Error),
}

impl Ack {
    pub fn is_completed(&self) -> bool {
        matches!(self, Ack::Completed)
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Ack::Ignored(_))
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Ack::Suppressed(_))
    }
}
