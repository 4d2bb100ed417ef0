//! Governor Configuration
//!
//! All tunables live in [`GovernorConfig`], fixed for the governor's
//! lifetime. Defaults match the latency envelope the governor was built for:
//! a per-call budget of 80 ms with a hard ceiling of 100 ms, emergency entry
//! at 150 ms sustained, and a 50 ms bound on the offload path.
//!
//! The three latency tiers must be strictly ordered (`target < max <
//! emergency`); [`GovernorConfig::validate`] rejects anything else at
//! construction, since inverted tiers would either oscillate the complexity
//! ladder or make emergency mode unreachable.
//!
//! The sliding-window size and buffer-pool capacity are *not* here: bounded
//! hot-path structures carry their capacity as const generics
//! ([`Governor<C, W, P>`](crate::governor::Governor)), so those two knobs are
//! type parameters with defaults of 50 and 20.

use crate::errors::{ConfigError, ConfigResult};

/// Fixed configuration for a [`Governor`](crate::governor::Governor)
///
/// ```rust
/// use paceguard_core::config::GovernorConfig;
///
/// let config = GovernorConfig::default()
///     .with_target_latency_ms(60.0)
///     .with_offload_timeout_ms(40);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GovernorConfig {
    /// Per-call latency the controller steers toward (ms)
    pub target_latency_ms: f32,

    /// Acceptable ceiling before quality starts degrading (ms)
    pub max_latency_ms: f32,

    /// Sustained average beyond this enters emergency mode (ms)
    pub emergency_latency_ms: f32,

    /// Normalization constant for `processing_load = min(1, avg / reference)`
    pub reference_latency_ms: f32,

    /// Cadence of the emergency-entry/exit check (ms)
    pub performance_check_interval_ms: u64,

    /// Minimum spacing between complexity-ladder adjustments (ms)
    pub optimization_interval_ms: u64,

    /// Grace period after emergency entry before processing is suspended (ms)
    pub emergency_grace_ms: u64,

    /// Hard deadline on the offload path (ms)
    pub offload_timeout_ms: u64,

    /// Minimum processing load before a call is considered for offload
    pub offload_min_load: f32,

    /// Floor applied to `analysis_interval_ms` while emergency mode is active
    pub emergency_min_analysis_interval_ms: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            target_latency_ms: 80.0,
            max_latency_ms: 100.0,
            emergency_latency_ms: 150.0,
            reference_latency_ms: 100.0,
            performance_check_interval_ms: 1_000,
            optimization_interval_ms: 5_000,
            emergency_grace_ms: 2_000,
            offload_timeout_ms: 50,
            offload_min_load: 0.6,
            emergency_min_analysis_interval_ms: 250,
        }
    }
}

impl GovernorConfig {
    /// Set the latency target the controller steers toward
    pub fn with_target_latency_ms(mut self, ms: f32) -> Self {
        self.target_latency_ms = ms;
        self
    }

    /// Set the acceptable latency ceiling
    pub fn with_max_latency_ms(mut self, ms: f32) -> Self {
        self.max_latency_ms = ms;
        self
    }

    /// Set the emergency-entry threshold
    pub fn with_emergency_latency_ms(mut self, ms: f32) -> Self {
        self.emergency_latency_ms = ms;
        self
    }

    /// Set the cadence of the emergency-entry/exit check
    pub fn with_performance_check_interval_ms(mut self, ms: u64) -> Self {
        self.performance_check_interval_ms = ms;
        self
    }

    /// Set the minimum spacing between ladder adjustments
    pub fn with_optimization_interval_ms(mut self, ms: u64) -> Self {
        self.optimization_interval_ms = ms;
        self
    }

    /// Set the grace period before emergency suspension
    pub fn with_emergency_grace_ms(mut self, ms: u64) -> Self {
        self.emergency_grace_ms = ms;
        self
    }

    /// Set the hard deadline on the offload path
    pub fn with_offload_timeout_ms(mut self, ms: u64) -> Self {
        self.offload_timeout_ms = ms;
        self
    }

    /// Check internal consistency
    ///
    /// Called by the governor builder; exposed for harnesses that assemble
    /// configs from external sources.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.target_latency_ms < self.max_latency_ms
            && self.max_latency_ms < self.emergency_latency_ms)
        {
            return Err(ConfigError::InvalidLatencyTiers {
                target: self.target_latency_ms,
                max: self.max_latency_ms,
                emergency: self.emergency_latency_ms,
            });
        }

        if self.performance_check_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "performance_check_interval_ms",
            });
        }
        if self.optimization_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "optimization_interval_ms",
            });
        }
        if self.offload_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "offload_timeout_ms",
            });
        }
        if self.reference_latency_ms <= 0.0 {
            return Err(ConfigError::ZeroInterval {
                field: "reference_latency_ms",
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GovernorConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_tiers() {
        let config = GovernorConfig::default()
            .with_target_latency_ms(120.0)
            .with_max_latency_ms(100.0);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLatencyTiers { .. })
        ));
    }

    #[test]
    fn rejects_equal_tiers() {
        // Strictly ordered: target == max is as broken as target > max.
        let config = GovernorConfig::default()
            .with_target_latency_ms(100.0)
            .with_max_latency_ms(100.0);

        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_cadence() {
        let config = GovernorConfig::default().with_optimization_interval_ms(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval {
                field: "optimization_interval_ms"
            })
        ));
    }
}
