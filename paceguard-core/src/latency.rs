//! Fixed-Size Sliding Window of Per-Call Latencies
//!
//! ## Overview
//!
//! Every completed call through the governor records its duration here. The
//! window is a fixed-capacity ring: the last `W` samples, oldest evicted
//! first, no heap allocation after construction. The adaptive controller
//! reads the derived statistics on its periodic ticks; it never writes.
//!
//! ## Why a Ring Buffer?
//!
//! The controller's decisions aggregate *recent* behavior: a single slow
//! call must not flip the complexity ladder, and hour-old samples must not
//! drag the average. A bounded ring gives both properties with O(1)
//! insertion and fixed memory:
//!
//! ```text
//! LatencyWindow<5> after 7 records:
//! ┌──────┬──────┬──────┬──────┬──────┐
//! │  s5  │  s6  │  s2  │  s3  │  s4  │   write_pos = 2
//! └──────┴──────┴──────┴──────┴──────┘
//! samples s0, s1 evicted (oldest first)
//! ```
//!
//! Statistics are recomputed on every record, an O(W) scan. With the
//! default `W = 50` that is a few dozen float operations, cheaper than
//! maintaining incremental min/max under eviction.
//!
//! ## Derived Load
//!
//! `processing_load = min(1, avg / reference_latency_ms)` normalizes the
//! average against the configured reference so other components (offload
//! gating, upgrade damping) can reason in [0, 1] without knowing the
//! absolute budget.

/// Derived statistics over the current window contents
///
/// A plain value snapshot: reading it never blocks and never observes a
/// half-updated window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatencySnapshot {
    /// Mean duration over the window (ms); 0 when empty
    pub avg_ms: f32,
    /// Slowest sample in the window (ms); 0 when empty
    pub max_ms: f32,
    /// Fastest sample in the window (ms); 0 when empty
    pub min_ms: f32,
    /// Normalized load in [0, 1]: `min(1, avg / reference)`
    pub processing_load: f32,
    /// Number of samples currently held (≤ W)
    pub sample_count: usize,
}

impl LatencySnapshot {
    const EMPTY: Self = Self {
        avg_ms: 0.0,
        max_ms: 0.0,
        min_ms: 0.0,
        processing_load: 0.0,
        sample_count: 0,
    };
}

/// Bounded FIFO of the last `W` call durations with cached statistics
///
/// `W` is a const generic per this crate's bounded-structure convention;
/// the governor defaults it to 50.
#[derive(Debug, Clone)]
pub struct LatencyWindow<const W: usize = 50> {
    /// Ring storage; only the first `len` logical entries are valid
    samples: [f32; W],
    /// Next write position, wraps at W
    write_pos: usize,
    /// Number of valid samples, saturates at W
    len: usize,
    /// Normalization constant for `processing_load`
    reference_latency_ms: f32,
    /// Statistics recomputed on every record
    cached: LatencySnapshot,
}

impl<const W: usize> LatencyWindow<W> {
    /// Create an empty window normalizing load against `reference_latency_ms`
    pub fn new(reference_latency_ms: f32) -> Self {
        Self {
            samples: [0.0; W],
            write_pos: 0,
            len: 0,
            reference_latency_ms,
            cached: LatencySnapshot::EMPTY,
        }
    }

    /// Record one call duration, evicting the oldest sample past capacity
    ///
    /// Non-finite or negative durations are clamped to zero rather than
    /// poisoning the average.
    pub fn record(&mut self, duration_ms: f32) {
        let duration_ms = if duration_ms.is_finite() {
            duration_ms.max(0.0)
        } else {
            0.0
        };

        self.samples[self.write_pos] = duration_ms;
        self.write_pos = (self.write_pos + 1) % W;
        if self.len < W {
            self.len += 1;
        }

        self.recompute();
    }

    /// Current statistics (pure read of the cached snapshot)
    pub fn snapshot(&self) -> LatencySnapshot {
        self.cached
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no samples have been recorded yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop all samples and reset the statistics
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
        self.cached = LatencySnapshot::EMPTY;
    }

    fn recompute(&mut self) {
        if self.len == 0 {
            self.cached = LatencySnapshot::EMPTY;
            return;
        }

        let mut sum = 0.0f32;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &sample in self.samples.iter().take(self.len) {
            sum += sample;
            min = min.min(sample);
            max = max.max(sample);
        }

        let avg = sum / self.len as f32;
        self.cached = LatencySnapshot {
            avg_ms: avg,
            max_ms: max,
            min_ms: min,
            processing_load: (avg / self.reference_latency_ms).min(1.0),
            sample_count: self.len,
        };
    }
}
