//! Adaptive Controller: the Governing State Machine
//!
//! ## Overview
//!
//! The controller owns [`OptimizationState`] and is the only component that
//! mutates it. On a cooperative tick it compares the latency window against
//! the configured targets and moves through three states:
//!
//! ```text
//!            avg > emergency (150ms)          grace elapsed, still > emergency
//! Normal(level) ────────────────▶ EmergencyDegraded ────────────▶ EmergencySuspended
//!      ▲                               │                                │
//!      └───────────────────────────────┴────────────────────────────────┘
//!                         avg < target (80ms): level recomputed
//!                         from the hardware ceiling, not resumed
//! ```
//!
//! Within `Normal`, the level walks the complexity ladder one rung at a
//! time, at most once per `optimization_interval_ms`:
//!
//! - `avg > target × 1.2` → step down
//! - `avg < target × 0.8` **and** `load < 0.7` → step up (never above the
//!   hardware ceiling)
//!
//! ## Hysteresis
//!
//! The thresholds are deliberately asymmetric, and emergency entry sits far
//! above the degrade threshold. An average oscillating narrowly around the
//! target (78 ms / 82 ms) changes nothing; entering emergency requires the
//! whole window to average past 150 ms, not one slow call. Without the dead
//! band between 0.8× and 1.2× the ladder would thrash on every noisy
//! sample.
//!
//! ## Cadence
//!
//! Both periodic duties run off [`on_tick`](AdaptiveController::on_tick):
//! the performance check self-limits to `performance_check_interval_ms` and
//! adjustments to `optimization_interval_ms`. The facade calls `on_tick` at
//! the top of every governed call, so all state mutation happens on the
//! caller's thread, with no timers and no locks.

use heapless::Vec as BoundedVec;

use crate::complexity::{ceiling_for, ComplexityConfig, ComplexityLevel};
use crate::config::GovernorConfig;
use crate::hardware::HardwareProfile;
use crate::latency::LatencySnapshot;
use crate::time::Timestamp;

/// Multiplier over target latency that triggers a step down
const DEGRADE_FACTOR: f32 = 1.2;

/// Multiplier under target latency required before a step up
const UPGRADE_FACTOR: f32 = 0.8;

/// Maximum processing load at which a step up is still considered
const UPGRADE_MAX_LOAD: f32 = 0.7;

/// Capacity of the diagnostic tag trail
pub const MAX_OPTIMIZATION_TAGS: usize = 8;

/// Mutable governor state, owned exclusively by [`AdaptiveController`]
///
/// Invariants upheld by the controller:
/// - `processing_suspended` implies `emergency_mode`
/// - `current_level` never exceeds the hardware ceiling
#[derive(Debug, Clone)]
pub struct OptimizationState {
    /// Active complexity tier
    pub current_level: ComplexityLevel,
    /// Emergency overlay active (degraded or suspended)
    pub emergency_mode: bool,
    /// Real processing bypassed entirely; fallback results only
    pub processing_suspended: bool,
    /// When the ladder last moved (or was manually set)
    pub last_adjustment: Timestamp,
    /// Diagnostic trail of what the governor last did; cleared on every
    /// level change
    pub activated_optimizations: BoundedVec<&'static str, MAX_OPTIMIZATION_TAGS>,
}

/// The governing feedback loop
pub struct AdaptiveController {
    config: GovernorConfig,
    /// Highest tier the hardware assessment permits
    ceiling: ComplexityLevel,
    state: OptimizationState,
    last_performance_check: Timestamp,
    /// Set on emergency entry; anchors the grace timer
    emergency_entered_at: Option<Timestamp>,
}

impl AdaptiveController {
    /// Create the controller with the level selected from the hardware
    /// profile (the same rule used when leaving emergency mode)
    pub fn new(profile: &HardwareProfile, config: GovernorConfig, now: Timestamp) -> Self {
        let ceiling = ceiling_for(profile.max_complexity);
        Self {
            config,
            ceiling,
            state: OptimizationState {
                current_level: ceiling,
                emergency_mode: false,
                processing_suspended: false,
                last_adjustment: now,
                activated_optimizations: BoundedVec::new(),
            },
            last_performance_check: now,
            emergency_entered_at: None,
        }
    }

    /// Current state (read-only; the controller is the sole writer)
    pub fn state(&self) -> &OptimizationState {
        &self.state
    }

    /// Highest tier this device may run
    pub fn ceiling(&self) -> ComplexityLevel {
        self.ceiling
    }

    /// Cooperative periodic tick
    ///
    /// Cheap when nothing is due: two timestamp comparisons. The
    /// performance check (emergency entry/exit) and the ladder adjustment
    /// rate-limit themselves independently.
    pub fn on_tick(&mut self, now: Timestamp, snapshot: &LatencySnapshot) {
        if snapshot.sample_count == 0 {
            return;
        }

        if now.saturating_sub(self.last_performance_check)
            >= self.config.performance_check_interval_ms
        {
            self.last_performance_check = now;
            self.performance_check(now, snapshot);
        }

        if !self.state.emergency_mode
            && now.saturating_sub(self.state.last_adjustment) >= self.config.optimization_interval_ms
        {
            self.adjust_level(now, snapshot);
        }
    }

    /// Manual override from an operator or test harness
    ///
    /// Rejected (returns `false`) when the requested tier exceeds the
    /// hardware ceiling; the ceiling invariant holds even against manual
    /// input. Resets the adjustment timer as a side effect.
    pub fn set_level(&mut self, level: ComplexityLevel, now: Timestamp) -> bool {
        if level > self.ceiling {
            return false;
        }

        self.change_level(level, now, "manual_override");
        true
    }

    /// Effective processing parameters for the next call
    ///
    /// The active tier's preset, plus the emergency overlay while it is in
    /// force: auxiliary features forced off and the analysis interval
    /// floored, even outside full suspension.
    pub fn effective_config(&self) -> ComplexityConfig {
        let mut config = self.state.current_level.config();
        if self.state.emergency_mode {
            config.skip_auxiliary_features = true;
            config.analysis_interval_ms = config
                .analysis_interval_ms
                .max(self.config.emergency_min_analysis_interval_ms);
        }
        config
    }

    fn performance_check(&mut self, now: Timestamp, snapshot: &LatencySnapshot) {
        let avg = snapshot.avg_ms;

        if self.state.emergency_mode {
            if avg < self.config.target_latency_ms {
                self.exit_emergency(now);
            } else if !self.state.processing_suspended {
                let grace_elapsed = self
                    .emergency_entered_at
                    .map(|entered| now.saturating_sub(entered) >= self.config.emergency_grace_ms)
                    .unwrap_or(false);

                if grace_elapsed && avg > self.config.emergency_latency_ms {
                    self.state.processing_suspended = true;
                    self.push_tag("processing_suspended");
                    log_warn!(
                        "emergency grace expired at avg {:.1}ms, suspending processing",
                        avg
                    );
                }
            }
        } else if avg > self.config.emergency_latency_ms {
            self.enter_emergency(now, avg);
        }
    }

    fn enter_emergency(&mut self, now: Timestamp, avg: f32) {
        self.change_level(ComplexityLevel::Minimal, now, "emergency_minimal");
        self.state.emergency_mode = true;
        self.state.processing_suspended = false;
        self.emergency_entered_at = Some(now);
        self.push_tag("skip_auxiliary_features");
        self.push_tag("analysis_interval_floor");
        log_warn!(
            "entering emergency mode: avg {:.1}ms > {:.1}ms",
            avg,
            self.config.emergency_latency_ms
        );
    }

    fn exit_emergency(&mut self, now: Timestamp) {
        self.state.emergency_mode = false;
        self.state.processing_suspended = false;
        self.emergency_entered_at = None;
        // Recomputed from the hardware ceiling, not resumed where it was.
        self.change_level(self.ceiling, now, "emergency_recovered");
        log_info!(
            "leaving emergency mode, level recomputed to {}",
            self.ceiling.name()
        );
    }

    fn adjust_level(&mut self, now: Timestamp, snapshot: &LatencySnapshot) {
        let target = self.config.target_latency_ms;
        let current = self.state.current_level;

        if snapshot.avg_ms > target * DEGRADE_FACTOR {
            let next = current.step_down();
            if next != current {
                self.change_level(next, now, "ladder_step_down");
                log_info!(
                    "latency {:.1}ms over budget, stepping down to {}",
                    snapshot.avg_ms,
                    next.name()
                );
            }
        } else if snapshot.avg_ms < target * UPGRADE_FACTOR
            && snapshot.processing_load < UPGRADE_MAX_LOAD
        {
            let next = current.step_up(self.ceiling);
            if next != current {
                self.change_level(next, now, "ladder_step_up");
                log_info!(
                    "headroom at {:.1}ms avg, stepping up to {}",
                    snapshot.avg_ms,
                    next.name()
                );
            }
        }
    }

    /// Apply a level change: the tag trail resets on every change
    fn change_level(&mut self, level: ComplexityLevel, now: Timestamp, tag: &'static str) {
        self.state.current_level = level;
        self.state.last_adjustment = now;
        self.state.activated_optimizations.clear();
        self.push_tag(tag);
    }

    fn push_tag(&mut self, tag: &'static str) {
        // Trail is diagnostic; dropping a tag past capacity is harmless.
        let _ = self.state.activated_optimizations.push(tag);
    }
}
