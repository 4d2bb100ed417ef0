//! One-Time Hardware Capability Assessment
//!
//! ## Overview
//!
//! The governor needs a ceiling: the highest complexity tier this device can
//! sustain without blowing the latency budget. That ceiling is derived once
//! at startup from two inputs:
//!
//! 1. **Device class**: a coarse guess from compile-time platform hints
//!    (`android`/`ios` targets count as mobile), overridable by the caller,
//!    defaulting to desktop when nothing is known.
//! 2. **Benchmark score**: a short synthetic workload (fixed-iteration
//!    arithmetic over a fixed-size buffer) timed against the monotonic
//!    clock and normalized to `max(0, 1 - elapsed/reference)`.
//!
//! The class provides a base ceiling (mobile 0.6, tablet 0.8, desktop 1.0),
//! scaled down ×0.7 when the benchmark lands below 0.3 and up ×1.2 (capped
//! at 1.0) when it lands above 0.8. These constants are empirical and are
//! kept as [`ProfilerConfig`] defaults rather than re-derived.
//!
//! Profiling has no error path: missing platform hints fall back to
//! conservative defaults and a valid profile is always produced.

use crate::time::TimeSource;

/// Coarse device category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceClass {
    /// Phone-class hardware; thermally constrained
    Mobile,
    /// Tablet-class hardware
    Tablet,
    /// Desktop or laptop
    Desktop,
}

impl DeviceClass {
    /// Guess the class from compile-time target hints
    ///
    /// Only mobile targets are distinguishable at compile time; tablets must
    /// be declared via [`HardwareProfiler::with_device_class`]. Unknown
    /// platforms default to `Desktop`.
    pub const fn detect() -> Self {
        #[cfg(any(target_os = "android", target_os = "ios"))]
        {
            Self::Mobile
        }
        #[cfg(not(any(target_os = "android", target_os = "ios")))]
        {
            Self::Desktop
        }
    }

    /// Human-readable class name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

/// Capability assessment, created once and immutable thereafter
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardwareProfile {
    /// Coarse device category
    pub device_class: DeviceClass,
    /// Logical CPU cores (≥1)
    pub cpu_core_count: usize,
    /// Best-effort memory estimate; per-class default, not probed
    pub memory_estimate_gb: f32,
    /// Ceiling on ladder position, in [0, 1]
    pub max_complexity: f32,
    /// Synthetic benchmark score, in [0, 1]
    pub benchmark_score: f32,
}

/// Tunables for the capability assessment
///
/// The score thresholds, scale factors, and per-class ceilings are
/// empirically chosen; they are configuration, not derived values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilerConfig {
    /// Iterations of the synthetic workload
    pub benchmark_iterations: usize,
    /// Length of the numeric buffer the workload runs over
    pub benchmark_buffer_len: usize,
    /// Elapsed time that maps to a score of 0.0 (ms)
    pub reference_duration_ms: f32,
    /// Scores below this scale the ceiling down
    pub weak_score_threshold: f32,
    /// Scores above this scale the ceiling up
    pub strong_score_threshold: f32,
    /// Down-scale factor for weak hardware
    pub weak_scale: f32,
    /// Up-scale factor for strong hardware (result capped at 1.0)
    pub strong_scale: f32,
    /// Base ceiling for mobile devices
    pub mobile_ceiling: f32,
    /// Base ceiling for tablets
    pub tablet_ceiling: f32,
    /// Base ceiling for desktops
    pub desktop_ceiling: f32,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            benchmark_iterations: 50_000,
            benchmark_buffer_len: 1_024,
            reference_duration_ms: 40.0,
            weak_score_threshold: 0.3,
            strong_score_threshold: 0.8,
            weak_scale: 0.7,
            strong_scale: 1.2,
            mobile_ceiling: 0.6,
            tablet_ceiling: 0.8,
            desktop_ceiling: 1.0,
        }
    }
}

/// One-shot profiler; call [`profile`](Self::profile) exactly once at
/// governor construction
#[derive(Debug, Clone, Default)]
pub struct HardwareProfiler {
    config: ProfilerConfig,
    device_class: Option<DeviceClass>,
}

impl HardwareProfiler {
    /// Create a profiler with default tunables
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the assessment tunables
    pub fn with_config(mut self, config: ProfilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Declare the device class instead of guessing from target hints
    pub fn with_device_class(mut self, class: DeviceClass) -> Self {
        self.device_class = Some(class);
        self
    }

    /// Run the assessment and produce the profile
    pub fn profile<C: TimeSource>(&self, clock: &C) -> HardwareProfile {
        let device_class = self.device_class.unwrap_or_else(DeviceClass::detect);
        let benchmark_score = self.run_benchmark(clock);

        let base = match device_class {
            DeviceClass::Mobile => self.config.mobile_ceiling,
            DeviceClass::Tablet => self.config.tablet_ceiling,
            DeviceClass::Desktop => self.config.desktop_ceiling,
        };

        let max_complexity = if benchmark_score < self.config.weak_score_threshold {
            base * self.config.weak_scale
        } else if benchmark_score > self.config.strong_score_threshold {
            (base * self.config.strong_scale).min(1.0)
        } else {
            base
        }
        .clamp(0.0, 1.0);

        let profile = HardwareProfile {
            device_class,
            cpu_core_count: core_count(),
            memory_estimate_gb: memory_estimate(device_class),
            max_complexity,
            benchmark_score,
        };

        log_debug!(
            "hardware profile: class={} cores={} score={:.2} max_complexity={:.2}",
            profile.device_class.name(),
            profile.cpu_core_count,
            profile.benchmark_score,
            profile.max_complexity
        );

        profile
    }

    /// Fixed-iteration arithmetic workload, timed with the monotonic clock
    ///
    /// The accumulator is routed through `black_box` so the loop cannot be
    /// folded away, which would report an impossibly strong device.
    fn run_benchmark<C: TimeSource>(&self, clock: &C) -> f32 {
        let len = self.config.benchmark_buffer_len.max(1);
        let mut buffer = alloc::vec![0.0f32; len];
        for (i, slot) in buffer.iter_mut().enumerate() {
            // libm keeps the workload identical on std and no_std builds
            *slot = libm::sinf(i as f32 * 0.37);
        }

        let started = clock.now();
        let mut acc = 0.0f32;
        for i in 0..self.config.benchmark_iterations {
            let x = buffer[i % len];
            acc += libm::sqrtf(x * x + 1.0) * 0.5 - x;
        }
        core::hint::black_box(acc);
        let elapsed_ms = clock.now().saturating_sub(started) as f32;

        (1.0 - elapsed_ms / self.config.reference_duration_ms).max(0.0)
    }
}

fn core_count() -> usize {
    #[cfg(feature = "std")]
    {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
    #[cfg(not(feature = "std"))]
    {
        1
    }
}

/// Per-class memory estimate in GB; best-effort, not probed
const fn memory_estimate(class: DeviceClass) -> f32 {
    match class {
        DeviceClass::Mobile => 4.0,
        DeviceClass::Tablet => 6.0,
        DeviceClass::Desktop => 8.0,
    }
}
