//! End-to-End Governor Scenarios
//!
//! These tests drive the full facade the way the host pipeline does: every
//! call goes through `process_optimized` with a closure that advances a
//! shared clock by the simulated extraction cost. The governor measures
//! that cost exactly as it would wall time, so the adaptive behavior under
//! test (hysteresis, emergency entry/exit, suspension, offload deadline) is
//! exercised with fully deterministic timing.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use paceguard_core::{
    ComplexityLevel, DeviceClass, FeatureResult, Governor, GovernorBuilder, HardwareProfile,
};
use paceguard_core::features::{reduced_features, FALLBACK_CONFIDENCE, REDUCED_CONFIDENCE};
use paceguard_core::time::FixedClock;

fn desktop_profile() -> HardwareProfile {
    HardwareProfile {
        device_class: DeviceClass::Desktop,
        cpu_core_count: 8,
        memory_estimate_gb: 8.0,
        max_complexity: 1.0,
        benchmark_score: 1.0,
    }
}

fn direct_governor(clock: FixedClock) -> Governor<FixedClock> {
    GovernorBuilder::new(clock)
        .with_profile(desktop_profile())
        .with_offload(false)
        .build()
        .expect("default config is valid")
}

/// Run one call whose simulated extraction cost is `cost_ms`.
fn run_call(governor: &mut Governor<FixedClock>, handle: &FixedClock, cost_ms: u64) -> FeatureResult {
    governor.process_optimized(&[0.25, -0.25], |_, _, _| {
        handle.advance(cost_ms);
        Ok(FeatureResult {
            energy: 1.0,
            rms: 0.25,
            peak: 0.25,
            band_energy: heapless::Vec::new(),
            confidence: 0.9,
            fallback: false,
        })
    })
}

/// Narrow oscillation around the target must not move the ladder.
#[test]
fn hysteresis_holds_level_through_noise() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor = direct_governor(clock);

    // 78ms / 82ms alternation straddles the 80ms target but stays inside
    // the [64, 96] dead band. Run well past several adjustment intervals.
    for i in 0..300u64 {
        let cost = if i % 2 == 0 { 78 } else { 82 };
        run_call(&mut governor, &handle, cost);
    }

    let status = governor.status();
    assert_eq!(status.level, ComplexityLevel::High);
    assert!(!status.emergency_mode);
}

/// A sustained average above target × 1.2 steps down exactly one rung
/// per optimization interval, never more.
#[test]
fn sustained_overrun_degrades_one_step_at_a_time() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor = direct_governor(clock);

    // 100ms per call: above the 96ms degrade threshold, below emergency.
    // 55 calls carry the clock past the first 5000ms adjustment tick.
    for _ in 0..55 {
        run_call(&mut governor, &handle, 100);
    }
    assert_eq!(governor.status().level, ComplexityLevel::Medium);

    // Another full interval of the same overrun: exactly one more rung.
    for _ in 0..55 {
        run_call(&mut governor, &handle, 100);
    }
    assert_eq!(governor.status().level, ComplexityLevel::Low);

    // And down to the floor, where it stays.
    for _ in 0..100 {
        run_call(&mut governor, &handle, 100);
    }
    assert_eq!(governor.status().level, ComplexityLevel::Minimal);
}

/// Ten calls at 160ms trip emergency mode on the next check tick;
/// recovered latency clears it and recomputes the level from the ceiling.
#[test]
fn emergency_entry_and_exit() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor = direct_governor(clock);

    // 10 × 160ms = 1600ms of clock: the 1000ms performance check fires
    // mid-stream with the window average at 160ms > 150ms.
    for _ in 0..10 {
        run_call(&mut governor, &handle, 160);
    }
    let status = governor.status();
    assert!(status.emergency_mode);
    assert!(!status.processing_suspended);
    assert_eq!(status.level, ComplexityLevel::Minimal);

    // Hardware recovers: 60ms calls drag the window average below the
    // 80ms target and the next check clears the overlay.
    for _ in 0..60 {
        run_call(&mut governor, &handle, 60);
    }
    let status = governor.status();
    assert!(!status.emergency_mode);
    assert!(!status.processing_suspended);
    assert_eq!(status.level, ComplexityLevel::High);
}

/// While suspended, the wrapped function is never invoked and every
/// call returns the fallback result.
#[test]
fn suspension_bypasses_processing() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor = direct_governor(clock);

    // Saturate: 200ms calls past entry (1000ms) and grace (2000ms).
    for _ in 0..25 {
        run_call(&mut governor, &handle, 200);
    }
    assert!(governor.status().processing_suspended);

    let invocations = Rc::new(Cell::new(0u32));
    for _ in 0..5 {
        let counter = Rc::clone(&invocations);
        let result = governor.process_optimized(&[1.0], move |_, _, _| {
            counter.set(counter.get() + 1);
            Ok(FeatureResult::fallback_neutral())
        });

        assert!(result.fallback);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }
    assert_eq!(invocations.get(), 0);
}

/// An unresponsive offload worker cannot stall the caller past the
/// configured deadline; the call returns the fallback in bounded time.
#[test]
fn offload_timeout_is_bounded() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor: Governor<FixedClock> = GovernorBuilder::new(clock)
        .with_profile(desktop_profile())
        .with_offload_worker(|_samples| {
            // Never answers in time.
            std::thread::sleep(Duration::from_millis(500));
            reduced_features(&[0.0])
        })
        .build()
        .expect("default config is valid");

    // Warm up at exactly the 0.6 offload gate (not over it, so these calls
    // stay on the direct path), then tip the average across with one slow
    // call.
    for _ in 0..10 {
        run_call(&mut governor, &handle, 60);
    }
    run_call(&mut governor, &handle, 90);
    assert!(governor.latency().processing_load > 0.6);

    let started = Instant::now();
    let result = governor.process_optimized(&[1.0, 2.0], |_, _, _| {
        panic!("offload path must not fall through to the direct call");
    });
    let waited = started.elapsed();

    assert!(result.fallback);
    // 50ms deadline plus scheduling slack, nowhere near the 500ms worker.
    assert!(waited < Duration::from_millis(250), "waited {waited:?}");
}

/// The happy offload path returns the reduced statistics, not a fallback
/// and not the direct pipeline's output.
#[test]
fn offload_returns_reduced_features() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor: Governor<FixedClock> = GovernorBuilder::new(clock)
        .with_profile(desktop_profile())
        .build()
        .expect("default config is valid");

    // Same warm-up discipline: direct calls up to the gate, one slow call
    // to cross it.
    for _ in 0..10 {
        run_call(&mut governor, &handle, 60);
    }
    run_call(&mut governor, &handle, 90);
    assert!(governor.latency().processing_load > 0.6);

    let result = governor.process_optimized(&[0.5, -0.5, 0.5, -0.5], |_, _, _| {
        panic!("offload path must not fall through to the direct call");
    });

    assert!(!result.fallback);
    assert_eq!(result.confidence, REDUCED_CONFIDENCE);
    assert!((result.rms - 0.5).abs() < 1e-6);
    assert!(result.band_energy.is_empty());
}

/// Full lifecycle: overload to suspension, then recovery back to the
/// hardware ceiling.
#[test]
fn overload_to_suspension_to_recovery() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor = direct_governor(clock);

    // Phase 1: 50 calls at 200ms each. Emergency entry on the first check
    // tick, suspension once the 2000ms grace expires still over 150ms.
    for _ in 0..50 {
        run_call(&mut governor, &handle, 200);
    }
    let status = governor.status();
    assert!(status.emergency_mode);
    assert!(status.processing_suspended);
    assert_eq!(status.level, ComplexityLevel::Minimal);

    // Phase 2: the host keeps calling while suspended. Each bypassed call
    // records only bookkeeping time; once the window average decays below
    // target, the next check lifts the suspension and recomputes the level
    // from the hardware ceiling (max_complexity 1.0 → High).
    for _ in 0..40 {
        handle.advance(100);
        governor.process_optimized(&[0.1], |_, _, _| Ok(FeatureResult::fallback_neutral()));
        if !governor.status().processing_suspended {
            break;
        }
    }

    let status = governor.status();
    assert!(!status.emergency_mode);
    assert!(!status.processing_suspended);
    assert_eq!(status.level, ComplexityLevel::High);
}

/// Manual override is honored, rejected above the hardware ceiling, and
/// visible in the status snapshot.
#[test]
fn manual_override_through_facade() {
    let clock = FixedClock::new(0);
    let mut governor: Governor<FixedClock> = GovernorBuilder::new(clock)
        .with_profile(HardwareProfile {
            max_complexity: 0.75, // Medium ceiling
            ..desktop_profile()
        })
        .with_offload(false)
        .build()
        .expect("default config is valid");

    assert_eq!(governor.status().level, ComplexityLevel::Medium);
    assert!(governor.set_level(ComplexityLevel::Minimal));
    assert_eq!(governor.status().level, ComplexityLevel::Minimal);
    assert!(!governor.set_level(ComplexityLevel::High));
    assert_eq!(governor.status().level, ComplexityLevel::Minimal);
}

/// The status surface carries everything the diagnostics overlay needs.
#[test]
fn status_snapshot_contents() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor = direct_governor(clock);

    for _ in 0..4 {
        run_call(&mut governor, &handle, 40);
    }

    let status = governor.status();
    assert_eq!(status.avg_latency_ms, 40.0);
    assert_eq!(status.max_latency_ms, 40.0);
    assert_eq!(status.sample_count, 4);
    assert_eq!(status.target_latency_ms, 80.0);
    assert!((status.processing_load - 0.4).abs() < 1e-6);
    assert_eq!(status.hardware.device_class, DeviceClass::Desktop);
}

/// Phase 2 of the recovery scenario must re-enter emergency if the
/// overload persists after the probe resumes real work.
#[test]
fn recovery_reenters_emergency_under_persistent_overload() {
    let clock = FixedClock::new(0);
    let handle = clock.clone();
    let mut governor = direct_governor(clock);

    for _ in 0..50 {
        run_call(&mut governor, &handle, 200);
    }
    assert!(governor.status().processing_suspended);

    // Suspension decays the window and lifts; the host is still slow, so
    // resumed calls at 200ms push the average straight back up.
    for _ in 0..80 {
        handle.advance(100);
        run_call(&mut governor, &handle, 200);
    }

    let status = governor.status();
    assert!(status.emergency_mode);
    assert_eq!(status.level, ComplexityLevel::Minimal);
}
