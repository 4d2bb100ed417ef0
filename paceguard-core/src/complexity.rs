//! Complexity Ladder: Discrete Processing-Cost Presets
//!
//! ## Overview
//!
//! Feature extraction cost is not continuous: it is governed by a handful of
//! knobs (how many features, how many spectral bands, the transform size,
//! whether auxiliary features run at all). Rather than tune each knob
//! independently, the governor walks an ordered ladder of four presets:
//!
//! ```text
//! Minimal < Low < Medium < High
//!    ↑                       ↑
//! cheapest, lowest       full pipeline,
//! fidelity               highest fidelity
//! ```
//!
//! Every field of [`ComplexityConfig`] is monotone in processing cost from
//! `Minimal` to `High`: feature and band counts rise, the analysis interval
//! shrinks (more frequent work), auxiliary features switch on, and the
//! transform grows. The adaptive controller moves exactly one rung at a time
//! and never above the ceiling implied by the hardware profile.
//!
//! Lookups are pure: the preset table is `const` and stepping is arithmetic
//! on the discriminant. Nothing here reads a clock or mutates state.

/// Discrete processing tier, totally ordered by cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ComplexityLevel {
    /// Bare statistics, smallest transform; the emergency floor
    Minimal = 0,
    /// Reduced feature set for constrained hardware
    Low = 1,
    /// Standard feature set
    Medium = 2,
    /// Full pipeline including all auxiliary features
    High = 3,
}

/// Processing-cost knobs for one complexity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComplexityConfig {
    /// Number of features the extraction computes
    pub feature_count: usize,
    /// Number of spectral bands analyzed
    pub band_count: usize,
    /// Minimum interval between analyses (ms); smaller means more work
    pub analysis_interval_ms: u32,
    /// Skip auxiliary features (prosody contour, spectral flux)
    pub skip_auxiliary_features: bool,
    /// FFT window size; always a power of two
    pub transform_size: usize,
}

/// Preset table, indexed by level discriminant
///
/// Cost is monotonically non-decreasing on every field from Minimal to High.
const CONFIGS: [ComplexityConfig; 4] = [
    // Minimal
    ComplexityConfig {
        feature_count: 4,
        band_count: 4,
        analysis_interval_ms: 200,
        skip_auxiliary_features: true,
        transform_size: 256,
    },
    // Low
    ComplexityConfig {
        feature_count: 6,
        band_count: 8,
        analysis_interval_ms: 150,
        skip_auxiliary_features: true,
        transform_size: 512,
    },
    // Medium
    ComplexityConfig {
        feature_count: 9,
        band_count: 12,
        analysis_interval_ms: 100,
        skip_auxiliary_features: false,
        transform_size: 1024,
    },
    // High
    ComplexityConfig {
        feature_count: 13,
        band_count: 16,
        analysis_interval_ms: 50,
        skip_auxiliary_features: false,
        transform_size: 2048,
    },
];

/// Largest transform any tier uses; sizes pooled scratch buffers
pub const MAX_TRANSFORM_SIZE: usize = 2048;

/// Largest band count any tier uses; sizes band accumulators
pub const MAX_BAND_COUNT: usize = 16;

impl ComplexityLevel {
    /// All levels in ascending cost order
    pub const ALL: [Self; 4] = [Self::Minimal, Self::Low, Self::Medium, Self::High];

    /// Get the preset for this tier (pure lookup)
    pub const fn config(self) -> ComplexityConfig {
        CONFIGS[self as usize]
    }

    /// Human-readable tier name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Move one rung down, clamped at `Minimal`
    pub const fn step_down(self) -> Self {
        match self {
            Self::Minimal | Self::Low => Self::Minimal,
            Self::Medium => Self::Low,
            Self::High => Self::Medium,
        }
    }

    /// Move one rung up, clamped at `ceiling`
    ///
    /// The ceiling comes from the hardware profile via [`ceiling_for`]; a
    /// level never rises above what the device was assessed to sustain.
    pub fn step_up(self, ceiling: Self) -> Self {
        let raised = match self {
            Self::Minimal => Self::Low,
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        };
        if raised > ceiling {
            ceiling
        } else {
            raised
        }
    }
}

/// Map a hardware `max_complexity` score in [0, 1] to the highest
/// permitted tier
///
/// Thresholds: ≥0.9 → High, ≥0.7 → Medium, ≥0.4 → Low, else Minimal.
pub fn ceiling_for(max_complexity: f32) -> ComplexityLevel {
    if max_complexity >= 0.9 {
        ComplexityLevel::High
    } else if max_complexity >= 0.7 {
        ComplexityLevel::Medium
    } else if max_complexity >= 0.4 {
        ComplexityLevel::Low
    } else {
        ComplexityLevel::Minimal
    }
}
