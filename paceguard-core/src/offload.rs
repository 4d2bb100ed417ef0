//! Bounded-Latency Offload to a Single Background Worker
//!
//! ## Overview
//!
//! When the synchronous path is under pressure, the governor can hand a call
//! to one background thread instead of running extraction inline. The
//! offload path trades fidelity for a hard latency bound:
//!
//! - The worker computes the **reduced feature set** (cheap time-domain
//!   statistics, see [`crate::features::reduced_features`]);
//!   deliberately
//!   not a parallel copy of the full pipeline.
//! - The caller races the worker against a fixed deadline
//!   (`offload_timeout_ms`, default 50 ms). The deadline always wins: on
//!   expiry the busy slot is cleared and the caller proceeds with the
//!   fallback result. A late worker answer is discarded when it eventually
//!   arrives, never applied retroactively.
//!
//! ## At Most One In Flight
//!
//! There is no queue. Requests travel over a capacity-1 `sync_channel`, and
//! the manager keeps a busy flag: a second caller finding the slot occupied
//! is rejected at [`OffloadWorker::should_offload`] and takes the direct
//! path. Coordinating more outstanding work than one call would cost more
//! than it buys at this latency scale.
//!
//! ## Stale Responses
//!
//! Every request carries an id. After a timeout the worker's answer for
//! that id may still arrive; it is drained and dropped on the next submit.
//! Responses travel over an unbounded channel so a slow drain can never
//! deadlock the worker; the request discipline already bounds how many
//! responses can be outstanding.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use std::vec::Vec;

use crate::complexity::ComplexityLevel;
use crate::errors::OffloadError;
use crate::features::{reduced_features, FeatureResult};
use crate::latency::LatencySnapshot;
use crate::time::Timestamp;

/// One offloaded call in flight
struct OffloadRequest {
    id: u64,
    samples: Vec<f32>,
    submitted_at: Timestamp,
}

struct OffloadResponse {
    id: u64,
    result: FeatureResult,
}

/// Manager for the single background execution unit
///
/// Owns the worker thread, the capacity-1 request channel, and the busy
/// slot. Dropped governors disconnect the channel and join the thread.
pub struct OffloadWorker {
    request_tx: Option<SyncSender<OffloadRequest>>,
    response_rx: Receiver<OffloadResponse>,
    handle: Option<JoinHandle<()>>,
    timeout: Duration,
    busy: bool,
    next_id: u64,
    /// Load gate below which offloading is not worth the handoff cost
    min_load: f32,
}

impl OffloadWorker {
    /// Spawn the worker running the reduced-statistics computation
    pub fn spawn(timeout_ms: u64, min_load: f32) -> Self {
        Self::spawn_with(timeout_ms, min_load, |samples| reduced_features(samples))
    }

    /// Spawn the worker with a custom computation (test harnesses)
    ///
    /// If the thread cannot be spawned the manager degrades to "no worker
    /// available": `should_offload` stays false and every call takes the
    /// direct path, per the no-fatal-errors contract.
    pub fn spawn_with<F>(timeout_ms: u64, min_load: f32, worker_fn: F) -> Self
    where
        F: Fn(&[f32]) -> FeatureResult + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::sync_channel::<OffloadRequest>(1);
        let (response_tx, response_rx) = mpsc::channel::<OffloadResponse>();

        let spawned = std::thread::Builder::new()
            .name("paceguard-offload".into())
            .spawn(move || {
                while let Ok(request) = request_rx.recv() {
                    log_debug!(
                        "offload id={} picked up (submitted at {}ms)",
                        request.id,
                        request.submitted_at
                    );
                    let result = worker_fn(&request.samples);
                    let response = OffloadResponse {
                        id: request.id,
                        result,
                    };
                    if response_tx.send(response).is_err() {
                        // Governor dropped; nothing left to answer to.
                        break;
                    }
                }
            });

        match spawned {
            Ok(handle) => Self {
                request_tx: Some(request_tx),
                response_rx,
                handle: Some(handle),
                timeout: Duration::from_millis(timeout_ms),
                busy: false,
                next_id: 0,
                min_load,
            },
            Err(err) => {
                log_warn!("offload worker spawn failed, running direct-only: {}", err);
                Self {
                    request_tx: None,
                    response_rx,
                    handle: None,
                    timeout: Duration::from_millis(timeout_ms),
                    busy: false,
                    next_id: 0,
                    min_load,
                }
            }
        }
    }

    /// Whether an offloaded call is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Decide whether the next call should take the offload path
    ///
    /// True only when the worker exists, the slot is free, the tracked load
    /// exceeds the gate, and the governor is not already at the `Minimal`
    /// tier (where the direct path is cheap enough that handoff overhead
    /// dominates).
    pub fn should_offload(&self, level: ComplexityLevel, snapshot: &LatencySnapshot) -> bool {
        self.request_tx.is_some()
            && !self.busy
            && snapshot.processing_load > self.min_load
            && level != ComplexityLevel::Minimal
    }

    /// Dispatch a call to the worker and race it against the deadline
    ///
    /// Returns the reduced result if the worker answers in time. Any error
    /// variant means the caller must substitute the fallback result; the
    /// busy slot is always cleared before returning.
    pub fn submit(&mut self, samples: &[f32], now: Timestamp) -> Result<FeatureResult, OffloadError> {
        let request_tx = self.request_tx.as_ref().ok_or(OffloadError::Unavailable)?;
        if self.busy {
            return Err(OffloadError::Busy);
        }

        // A previous timed-out request may have answered by now; drop it.
        while let Ok(stale) = self.response_rx.try_recv() {
            log_debug!("discarding stale offload response id={}", stale.id);
        }

        self.next_id += 1;
        let id = self.next_id;
        let request = OffloadRequest {
            id,
            samples: samples.to_vec(),
            submitted_at: now,
        };

        match request_tx.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return Err(OffloadError::Busy),
            Err(TrySendError::Disconnected(_)) => {
                self.request_tx = None;
                return Err(OffloadError::WorkerGone);
            }
        }

        self.busy = true;
        let deadline = Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.busy = false;
                return Err(OffloadError::Timeout {
                    waited_ms: self.timeout.as_millis() as u64,
                });
            }

            match self.response_rx.recv_timeout(remaining) {
                Ok(response) if response.id == id => {
                    self.busy = false;
                    return Ok(response.result);
                }
                Ok(stale) => {
                    log_debug!("discarding stale offload response id={}", stale.id);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    self.busy = false;
                    log_debug!("offload id={} timed out after {:?}", id, self.timeout);
                    return Err(OffloadError::Timeout {
                        waited_ms: self.timeout.as_millis() as u64,
                    });
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    self.busy = false;
                    self.request_tx = None;
                    return Err(OffloadError::WorkerGone);
                }
            }
        }
    }
}

impl Drop for OffloadWorker {
    fn drop(&mut self) {
        // Disconnect the request channel so the worker's recv() ends, then
        // join it. The worker finishes at most the one request in flight.
        self.request_tx = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_load(load: f32) -> LatencySnapshot {
        LatencySnapshot {
            avg_ms: load * 100.0,
            max_ms: load * 100.0,
            min_ms: load * 100.0,
            processing_load: load,
            sample_count: 10,
        }
    }

    #[test]
    fn round_trip_within_deadline() {
        let mut worker = OffloadWorker::spawn(250, 0.6);
        let samples = [0.5f32, -0.5, 0.5, -0.5];

        let result = worker.submit(&samples, 0).unwrap();
        assert!(!result.fallback);
        assert!((result.rms - 0.5).abs() < 1e-6);
        assert!(!worker.is_busy());
    }

    #[test]
    fn unresponsive_worker_times_out() {
        let mut worker = OffloadWorker::spawn_with(30, 0.6, |_samples| {
            std::thread::sleep(Duration::from_millis(200));
            reduced_features(&[1.0])
        });

        let started = Instant::now();
        let err = worker.submit(&[1.0, 2.0], 0).unwrap_err();
        let waited = started.elapsed();

        assert!(matches!(err, OffloadError::Timeout { .. }));
        // Must return promptly after the deadline, not wait for the worker.
        assert!(waited < Duration::from_millis(150));
        assert!(!worker.is_busy());
    }

    #[test]
    fn late_result_is_discarded_not_applied() {
        let mut worker = OffloadWorker::spawn_with(20, 0.6, |samples| {
            if samples.len() == 1 {
                std::thread::sleep(Duration::from_millis(80));
            }
            reduced_features(samples)
        });

        // First submit times out; its answer arrives later.
        assert!(worker.submit(&[9.0], 0).is_err());
        std::thread::sleep(Duration::from_millis(120));

        // Second submit must get its own answer, not the stale one.
        let result = worker.submit(&[0.5, -0.5, 0.5, -0.5], 100).unwrap();
        assert!((result.rms - 0.5).abs() < 1e-6);
    }

    #[test]
    fn gate_requires_load_and_level() {
        let worker = OffloadWorker::spawn(50, 0.6);

        // Load above the gate, level above Minimal: offload.
        assert!(worker.should_offload(ComplexityLevel::Medium, &snapshot_with_load(0.8)));
        // Load at or below the gate: direct path.
        assert!(!worker.should_offload(ComplexityLevel::Medium, &snapshot_with_load(0.6)));
        // Minimal tier: direct path regardless of load.
        assert!(!worker.should_offload(ComplexityLevel::Minimal, &snapshot_with_load(0.9)));
    }

    #[test]
    fn drop_joins_worker() {
        let worker = OffloadWorker::spawn(50, 0.6);
        drop(worker); // must not hang or panic
    }
}
