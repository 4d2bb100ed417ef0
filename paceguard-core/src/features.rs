//! Feature Extraction Results and the Reduced-Statistics Path
//!
//! ## Overview
//!
//! [`FeatureResult`] is the one shape flowing out of the governor, whatever
//! route a call took:
//!
//! - **Direct path**: the wrapped extraction fills all fields at the active
//!   complexity tier.
//! - **Offload path**: the background worker runs [`reduced_features`],
//!   cheap time-domain statistics only, no spectral analysis. Real data at
//!   lower fidelity, flagged by its reduced confidence.
//! - **Fallback**: [`FeatureResult::fallback_neutral`], a fixed,
//!   deterministic, side-effect-free placeholder returned on suspension,
//!   timeout, or extraction failure. Consumers check the `fallback` marker
//!   and the fixed 0.3 confidence to decide whether to trust or discard it.
//!
//! The `confidence` field deliberately separates the three routes:
//! full-pipeline results carry whatever the extraction computed, reduced
//! results report [`REDUCED_CONFIDENCE`], and synthetic fallbacks report
//! [`FALLBACK_CONFIDENCE`]. "Cheap but measured" is distinguishable from
//! "made up".

use heapless::Vec;

use crate::complexity::MAX_BAND_COUNT;

/// Fixed confidence of the synthetic fallback result
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Confidence reported by the reduced-statistics offload path
pub const REDUCED_CONFIDENCE: f32 = 0.6;

/// Output of one governed feature-extraction call
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureResult {
    /// Total signal energy over the analysis window
    pub energy: f32,
    /// Root-mean-square amplitude
    pub rms: f32,
    /// Peak absolute amplitude
    pub peak: f32,
    /// Per-band spectral energy; empty on reduced and fallback paths
    pub band_energy: Vec<f32, MAX_BAND_COUNT>,
    /// Classifier-facing confidence in [0, 1]
    pub confidence: f32,
    /// True when this is the synthetic placeholder, not measured data
    pub fallback: bool,
}

impl FeatureResult {
    /// The fixed, cheaply-constructed neutral result
    ///
    /// Returned uniformly whether the cause was suspension, offload timeout,
    /// or an extraction failure. Deterministic: every call produces an
    /// identical value.
    pub fn fallback_neutral() -> Self {
        Self {
            energy: 0.0,
            rms: 0.0,
            peak: 0.0,
            band_energy: Vec::new(),
            confidence: FALLBACK_CONFIDENCE,
            fallback: true,
        }
    }
}

/// Cheap time-domain statistics over a sample buffer
///
/// This is the offload worker's whole computation: energy, RMS, and peak in
/// a single pass, no transform, no band analysis. Deliberately lower
/// fidelity than the main pipeline; the point of the offload path is a
/// bounded-latency answer, not a parallel copy of the full algorithm.
pub fn reduced_features(samples: &[f32]) -> FeatureResult {
    if samples.is_empty() {
        return FeatureResult::fallback_neutral();
    }

    let mut energy = 0.0f32;
    let mut peak = 0.0f32;
    for &s in samples {
        energy += s * s;
        let magnitude = if s < 0.0 { -s } else { s };
        peak = peak.max(magnitude);
    }
    let rms = libm::sqrtf(energy / samples.len() as f32);

    FeatureResult {
        energy,
        rms,
        peak,
        band_energy: Vec::new(),
        confidence: REDUCED_CONFIDENCE,
        fallback: false,
    }
}
