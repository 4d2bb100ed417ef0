//! Error Types for the Processing Governor
//!
//! ## Design Philosophy
//!
//! The governor has no fatal runtime error: every failure on the processing
//! path degrades to the neutral fallback result instead of propagating,
//! because the consuming classifier must always receive *some* timely answer.
//! The error types here exist at two boundaries:
//!
//! 1. **Into the governor**: the wrapped extraction call reports failure as
//!    [`ProcessError`]. The facade catches it, still records the call's
//!    latency, and substitutes the fallback result.
//!
//! 2. **Inside the governor**: the offload path reports [`OffloadError`]
//!    (busy slot, hard timeout, worker gone). These are likewise absorbed at
//!    the facade; they are public so diagnostics and tests can name them.
//!
//! The only error that does propagate is [`ConfigError`], and only at
//! construction time: a governor with inverted latency tiers would oscillate
//! or never trigger, so it is rejected before it exists.
//!
//! All variants are small `Copy` enums with inline `&'static str` payloads:
//! errors cross the hot path, so they must not allocate.

use thiserror_no_std::Error;

/// Failure reported by the wrapped feature-extraction call
///
/// Returned from the `process_fn` closure handed to
/// [`Governor::process_optimized`](crate::governor::Governor::process_optimized).
/// Never escapes the facade.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessError {
    /// Input buffer was empty or otherwise unusable
    #[error("invalid input sample buffer")]
    InvalidInput,

    /// Extraction pipeline failed mid-flight
    #[error("feature extraction failed: {reason}")]
    ExtractionFailed {
        /// What went wrong, for diagnostics
        reason: &'static str,
    },
}

/// Failure on the background offload path
///
/// Every variant maps to the fallback result at the facade; the distinction
/// only matters for logging and tests.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffloadError {
    /// No background worker was configured
    #[error("offload worker not available")]
    Unavailable,

    /// The single offload slot is already occupied
    #[error("offload slot busy")]
    Busy,

    /// The worker did not answer within the hard deadline
    #[error("offload timed out after {waited_ms}ms")]
    Timeout {
        /// How long the caller actually waited
        waited_ms: u64,
    },

    /// The worker thread is gone (channel disconnected)
    #[error("offload worker disconnected")]
    WorkerGone,
}

/// Invalid governor configuration, rejected at construction
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Latency tiers must satisfy `target < max < emergency`
    #[error("latency tiers not monotonic: target {target}ms, max {max}ms, emergency {emergency}ms")]
    InvalidLatencyTiers {
        /// Configured target latency
        target: f32,
        /// Configured max latency
        max: f32,
        /// Configured emergency latency
        emergency: f32,
    },

    /// Check cadences and timeouts must be non-zero
    #[error("{field} must be greater than zero")]
    ZeroInterval {
        /// Which field was zero
        field: &'static str,
    },
}

/// Result type for construction-time validation
pub type ConfigResult<T> = Result<T, ConfigError>;
