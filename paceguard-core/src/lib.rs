//! Adaptive processing governor for PaceGuard
//!
//! Wraps a latency-sensitive feature-extraction call and keeps its per-call
//! cost under a strict budget on whatever hardware it lands on.
//!
//! Key behaviors:
//! - One-time hardware assessment caps the complexity ladder
//! - Sliding-window latency feedback walks the ladder with hysteresis
//! - Sustained severe overload enters emergency mode (degrade, then suspend)
//! - A single background worker offers a bounded-latency offload path
//! - Every failure degrades to a fixed fallback result; callers always get
//!   a timely answer
//!
//! ```no_run
//! use paceguard_core::{Governor, GovernorConfig, FeatureResult};
//!
//! let mut governor = Governor::new(GovernorConfig::default()).unwrap();
//!
//! let samples = [0.0f32; 2048];
//! let result = governor.process_optimized(&samples, |input, scratch, config| {
//!     let window = scratch.samples_mut(config.transform_size);
//!     window.copy_from_slice(&input[..window.len()]);
//!     // ... run feature extraction at the requested complexity ...
//!     Ok(FeatureResult::fallback_neutral())
//! });
//!
//! if result.fallback {
//!     // degraded answer; decide whether to trust it
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Optional logging through the `log` facade; compiled away without it.
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}
#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

pub mod complexity;
pub mod config;
pub mod controller;
pub mod errors;
pub mod features;
pub mod governor;
pub mod hardware;
pub mod latency;
pub mod pool;
pub mod time;

#[cfg(feature = "offload")]
pub mod offload;

// Public API
pub use complexity::{ComplexityConfig, ComplexityLevel};
pub use config::GovernorConfig;
pub use errors::{ConfigError, OffloadError, ProcessError};
pub use features::{FeatureResult, FALLBACK_CONFIDENCE};
pub use governor::{Governor, GovernorBuilder, GovernorStatus};
pub use hardware::{DeviceClass, HardwareProfile, HardwareProfiler};
pub use latency::LatencySnapshot;
pub use pool::ScratchBuffer;
pub use time::{TimeSource, Timestamp};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
