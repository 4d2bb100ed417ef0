//! Governor Facade: the Single Entry Point
//!
//! ## Overview
//!
//! [`Governor`] ties the subsystems together around one call:
//!
//! ```text
//! process_optimized(input, process_fn)
//!   │
//!   ├─ 1. cooperative tick (controller may adjust level / emergency state)
//!   ├─ 2. suspended? → fallback result, bookkeeping only
//!   ├─ 3. effective config (tier preset + emergency overlay)
//!   ├─ 4. route: offload worker (load high, slot free) ─ or ─ direct call
//!   │         with a pooled scratch buffer
//!   ├─ 5. record elapsed time, success or not
//!   └─ 6. always return a FeatureResult (real, reduced, or fallback)
//! ```
//!
//! Nothing escapes this boundary: extraction failures, offload timeouts,
//! and suspension all degrade to the fixed fallback result, and the call's
//! latency is recorded regardless of outcome so the controller keeps
//! steering on truthful data.
//!
//! ## Construction
//!
//! [`GovernorBuilder`] assembles a governor from a clock, a config, and an
//! optional pre-made hardware profile (tests inject one; production runs
//! the one-time assessment):
//!
//! ```rust
//! use paceguard_core::governor::GovernorBuilder;
//! use paceguard_core::config::GovernorConfig;
//! use paceguard_core::time::FixedClock;
//!
//! use paceguard_core::governor::Governor;
//!
//! let governor: Governor<_> = GovernorBuilder::new(FixedClock::new(0))
//!     .with_config(GovernorConfig::default())
//!     .build()
//!     .unwrap();
//! # let _ = governor;
//! ```
//!
//! The window size `W` and pool capacity `P` are const generics defaulting
//! to 50 and 20.

use crate::complexity::{ComplexityConfig, ComplexityLevel};
use crate::config::GovernorConfig;
use crate::controller::AdaptiveController;
use crate::errors::{ConfigResult, ProcessError};
use crate::features::FeatureResult;
use crate::hardware::{HardwareProfile, HardwareProfiler};
use crate::latency::{LatencySnapshot, LatencyWindow};
use crate::pool::{BufferPool, PoolStats, ScratchBuffer};
use crate::time::TimeSource;

#[cfg(feature = "offload")]
use crate::offload::OffloadWorker;

#[cfg(feature = "std")]
use crate::time::MonotonicClock;

/// Read-only snapshot for diagnostics and UI polling
///
/// Safe to request at any frequency; assembling it is a handful of copies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GovernorStatus {
    /// Active complexity tier
    pub level: ComplexityLevel,
    /// Emergency overlay active
    pub emergency_mode: bool,
    /// Real processing bypassed entirely
    pub processing_suspended: bool,
    /// Mean latency over the window (ms)
    pub avg_latency_ms: f32,
    /// Slowest call in the window (ms)
    pub max_latency_ms: f32,
    /// Normalized load in [0, 1]
    pub processing_load: f32,
    /// Samples currently in the window
    pub sample_count: usize,
    /// The latency the controller steers toward (ms)
    pub target_latency_ms: f32,
    /// The capability assessment this governor runs under
    pub hardware: HardwareProfile,
}

/// Builder for [`Governor`]
///
/// `W` (latency window size) and `P` (buffer pool capacity) are fixed at
/// the type level; everything else is runtime configuration.
pub struct GovernorBuilder<C: TimeSource, const W: usize = 50, const P: usize = 20> {
    clock: C,
    config: GovernorConfig,
    profiler: HardwareProfiler,
    profile: Option<HardwareProfile>,
    #[cfg(feature = "offload")]
    offload_enabled: bool,
    #[cfg(feature = "offload")]
    worker_fn: Option<alloc::boxed::Box<dyn Fn(&[f32]) -> FeatureResult + Send + 'static>>,
}

impl<C: TimeSource, const W: usize, const P: usize> GovernorBuilder<C, W, P> {
    /// Start a builder around the given clock
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            config: GovernorConfig::default(),
            profiler: HardwareProfiler::new(),
            profile: None,
            #[cfg(feature = "offload")]
            offload_enabled: true,
            #[cfg(feature = "offload")]
            worker_fn: None,
        }
    }

    /// Replace the default configuration
    pub fn with_config(mut self, config: GovernorConfig) -> Self {
        self.config = config;
        self
    }

    /// Customize the one-time hardware assessment
    pub fn with_profiler(mut self, profiler: HardwareProfiler) -> Self {
        self.profiler = profiler;
        self
    }

    /// Inject a pre-made hardware profile, skipping the assessment
    ///
    /// Test harnesses use this to pin the complexity ceiling.
    pub fn with_profile(mut self, profile: HardwareProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Enable or disable the background offload path
    #[cfg(feature = "offload")]
    pub fn with_offload(mut self, enabled: bool) -> Self {
        self.offload_enabled = enabled;
        self
    }

    /// Replace the offload worker's computation (test harnesses)
    #[cfg(feature = "offload")]
    pub fn with_offload_worker<F>(mut self, worker_fn: F) -> Self
    where
        F: Fn(&[f32]) -> FeatureResult + Send + 'static,
    {
        self.worker_fn = Some(alloc::boxed::Box::new(worker_fn));
        self.offload_enabled = true;
        self
    }

    /// Validate the configuration and assemble the governor
    ///
    /// The only fallible step is config validation; profiling always
    /// produces a usable profile.
    pub fn build(self) -> ConfigResult<Governor<C, W, P>> {
        self.config.validate()?;

        let profile = match self.profile {
            Some(profile) => profile,
            None => self.profiler.profile(&self.clock),
        };

        let now = self.clock.now();
        let controller = AdaptiveController::new(&profile, self.config, now);

        #[cfg(feature = "offload")]
        let offload = if self.offload_enabled {
            let timeout = self.config.offload_timeout_ms;
            let min_load = self.config.offload_min_load;
            Some(match self.worker_fn {
                Some(worker_fn) => OffloadWorker::spawn_with(timeout, min_load, worker_fn),
                None => OffloadWorker::spawn(timeout, min_load),
            })
        } else {
            None
        };

        Ok(Governor {
            clock: self.clock,
            config: self.config,
            profile,
            controller,
            tracker: LatencyWindow::new(self.config.reference_latency_ms),
            pool: BufferPool::new(),
            #[cfg(feature = "offload")]
            offload,
        })
    }
}

/// Adaptive processing governor
///
/// Owns all mutable state behind `&mut self`; the single-logical-thread
/// discipline is enforced by the borrow checker rather than a lock. The
/// one concurrent element, the offload worker, is reached only through
/// its bounded channel.
pub struct Governor<C: TimeSource, const W: usize = 50, const P: usize = 20> {
    clock: C,
    config: GovernorConfig,
    profile: HardwareProfile,
    controller: AdaptiveController,
    tracker: LatencyWindow<W>,
    pool: BufferPool<P>,
    #[cfg(feature = "offload")]
    offload: Option<OffloadWorker>,
}

#[cfg(feature = "std")]
impl Governor<MonotonicClock> {
    /// Governor with the system monotonic clock, default window and pool
    pub fn new(config: GovernorConfig) -> ConfigResult<Self> {
        GovernorBuilder::new(MonotonicClock::new())
            .with_config(config)
            .build()
    }
}

impl<C: TimeSource, const W: usize, const P: usize> Governor<C, W, P> {
    /// Run one governed feature-extraction call
    ///
    /// `process_fn` receives the raw input, a pooled scratch buffer, and
    /// the effective complexity parameters for this call. It must not
    /// retain the buffer and must report failure through its `Result`
    /// rather than panicking.
    ///
    /// Always returns within the configured bounds: a real result, the
    /// reduced offload result, or the neutral fallback.
    pub fn process_optimized<F>(&mut self, input: &[f32], process_fn: F) -> FeatureResult
    where
        F: FnOnce(&[f32], &mut ScratchBuffer, &ComplexityConfig) -> Result<FeatureResult, ProcessError>,
    {
        let now = self.clock.now();
        self.controller.on_tick(now, &self.tracker.snapshot());

        if self.controller.state().processing_suspended {
            // Bypassed entirely; the near-zero bookkeeping sample is what
            // eventually drags the window average back under target and
            // lets the controller lift the suspension.
            self.tracker.record(0.0);
            return FeatureResult::fallback_neutral();
        }

        let config = self.controller.effective_config();
        let started = self.clock.now();
        let result = self.route_call(input, &config, process_fn, started);
        let elapsed = self.clock.now().saturating_sub(started) as f32;

        self.tracker.record(elapsed);
        result
    }

    /// Step 3 of the call flow: offload when warranted, else direct
    fn route_call<F>(
        &mut self,
        input: &[f32],
        config: &ComplexityConfig,
        process_fn: F,
        started: crate::time::Timestamp,
    ) -> FeatureResult
    where
        F: FnOnce(&[f32], &mut ScratchBuffer, &ComplexityConfig) -> Result<FeatureResult, ProcessError>,
    {
        #[cfg(feature = "offload")]
        {
            let level = self.controller.state().current_level;
            let snapshot = self.tracker.snapshot();
            if let Some(offload) = self.offload.as_mut() {
                if offload.should_offload(level, &snapshot) {
                    return match offload.submit(input, started) {
                        Ok(result) => result,
                        Err(err) => {
                            log_debug!("offload failed ({}), returning fallback", err);
                            FeatureResult::fallback_neutral()
                        }
                    };
                }
            }
        }
        #[cfg(not(feature = "offload"))]
        let _ = started;

        let mut buffer = self.pool.acquire();
        let outcome = process_fn(input, &mut buffer, config);
        self.pool.release(buffer);

        match outcome {
            Ok(result) => result,
            Err(err) => {
                log_debug!("extraction failed ({}), returning fallback", err);
                FeatureResult::fallback_neutral()
            }
        }
    }

    /// Run the periodic checks without processing a call
    ///
    /// The facade ticks on every call already; hosts whose call rate can
    /// drop to zero may drive this from their own loop so emergency exit
    /// does not wait for the next call.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.controller.on_tick(now, &self.tracker.snapshot());
    }

    /// Manual tier override; `false` when the tier exceeds the hardware
    /// ceiling
    pub fn set_level(&mut self, level: ComplexityLevel) -> bool {
        let now = self.clock.now();
        self.controller.set_level(level, now)
    }

    /// Read-only status snapshot for diagnostics
    pub fn status(&self) -> GovernorStatus {
        let snapshot = self.tracker.snapshot();
        let state = self.controller.state();
        GovernorStatus {
            level: state.current_level,
            emergency_mode: state.emergency_mode,
            processing_suspended: state.processing_suspended,
            avg_latency_ms: snapshot.avg_ms,
            max_latency_ms: snapshot.max_ms,
            processing_load: snapshot.processing_load,
            sample_count: snapshot.sample_count,
            target_latency_ms: self.config.target_latency_ms,
            hardware: self.profile,
        }
    }

    /// Latency statistics over the sliding window
    pub fn latency(&self) -> LatencySnapshot {
        self.tracker.snapshot()
    }

    /// Buffer pool health counters
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// The capability assessment this governor runs under
    pub fn profile(&self) -> &HardwareProfile {
        &self.profile
    }

    /// The fixed configuration supplied at construction
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::DeviceClass;
    use crate::time::FixedClock;

    fn desktop_profile() -> HardwareProfile {
        HardwareProfile {
            device_class: DeviceClass::Desktop,
            cpu_core_count: 8,
            memory_estimate_gb: 8.0,
            max_complexity: 1.0,
            benchmark_score: 1.0,
        }
    }

    fn governor(clock: FixedClock) -> Governor<FixedClock, 50, 4> {
        GovernorBuilder::<FixedClock, 50, 4>::new(clock)
            .with_profile(desktop_profile())
            .with_offload(false)
            .build()
            .unwrap()
    }

    #[test]
    fn direct_call_records_latency() {
        let clock = FixedClock::new(0);
        let handle = clock.clone();
        let mut governor = governor(clock);

        let result = governor.process_optimized(&[0.1, 0.2], |input, buffer, config| {
            handle.advance(42);
            let _ = buffer.samples_mut(config.transform_size);
            assert!(!input.is_empty());
            Ok(FeatureResult {
                energy: 1.0,
                rms: 0.5,
                peak: 0.2,
                band_energy: heapless::Vec::new(),
                confidence: 0.9,
                fallback: false,
            })
        });

        assert!(!result.fallback);
        let snap = governor.latency();
        assert_eq!(snap.sample_count, 1);
        assert_eq!(snap.avg_ms, 42.0);
    }

    #[test]
    fn extraction_failure_records_and_falls_back() {
        let clock = FixedClock::new(0);
        let handle = clock.clone();
        let mut governor = governor(clock);

        let result = governor.process_optimized(&[0.1], |_, _, _| {
            handle.advance(30);
            Err(ProcessError::ExtractionFailed { reason: "window underrun" })
        });

        assert!(result.fallback);
        assert_eq!(result.confidence, crate::features::FALLBACK_CONFIDENCE);
        // The failed call's latency still lands in the window.
        assert_eq!(governor.latency().avg_ms, 30.0);
    }

    #[test]
    fn pool_cycles_one_buffer_per_call() {
        let clock = FixedClock::new(0);
        let mut governor = governor(clock);

        for _ in 0..10 {
            governor.process_optimized(&[0.0], |_, _, _| {
                Ok(FeatureResult::fallback_neutral())
            });
        }

        let stats = governor.pool_stats();
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.reused, 9);
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn status_reflects_state() {
        let clock = FixedClock::new(0);
        let mut governor = governor(clock);

        let status = governor.status();
        assert_eq!(status.level, ComplexityLevel::High);
        assert!(!status.emergency_mode);
        assert_eq!(status.target_latency_ms, 80.0);
        assert_eq!(status.hardware.device_class, DeviceClass::Desktop);

        assert!(governor.set_level(ComplexityLevel::Low));
        assert_eq!(governor.status().level, ComplexityLevel::Low);
    }

    #[test]
    fn invalid_config_rejected_at_build() {
        let config = GovernorConfig::default().with_target_latency_ms(500.0);
        let built = GovernorBuilder::<FixedClock>::new(FixedClock::new(0))
            .with_config(config)
            .build();

        assert!(built.is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn status_serializes() {
        let clock = FixedClock::new(0);
        let governor = governor(clock);

        let json = serde_json::to_string(&governor.status()).unwrap();
        assert!(json.contains("\"level\""));
        assert!(json.contains("\"processing_load\""));
    }
}
