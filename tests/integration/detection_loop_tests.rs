//! Detection loop scenarios: gating, cooldown, faults, cancellation.

use std::time::Duration;

use feeder::app::cancel::CancelToken;
use feeder::app::events::{AppEvent, StatusReport};
use feeder::app::ports::Clock;
use feeder::app::service::FeederService;
use feeder::config::FeederConfig;
use feeder::error::{ActuatorError, CaptureError};
use feeder::fsm::StateId;
use feeder::fsm::context::CycleOutcome;
use feeder::sensors::DistanceReading;

use crate::mock_hw::*;

fn make_app(config: FeederConfig, clock: &SimClock, sink: &mut RecordingSink) -> FeederService {
    let mut svc = FeederService::new(config);
    svc.start(clock, sink);
    svc
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn near_object_with_enough_colour_is_fed() {
    let clock = SimClock::new();
    clock.set(secs(100));
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);

    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &CancelToken::new());

    let CycleOutcome::Dispensed(ev) = outcome else {
        panic!("expected Dispensed, got {outcome:?}");
    };
    assert!(ev.success);
    assert_eq!(ev.at, secs(100));
    assert!((ev.classification.unwrap().coverage_pct - 15.0).abs() < 0.01);

    assert_eq!(hw.dispenses(), 1);
    assert_eq!(cam.captures, 1);
    assert_eq!(svc.last_trigger(), Some(secs(100)));
    assert_eq!(svc.food_level_pct(), 95.0);
    assert_eq!(svc.dispense_count(), 1);
    assert_eq!(svc.state(), StateId::Idle);

    assert_eq!(
        sink.reports(),
        vec![StatusReport {
            food_level_pct: 95.0,
            fed: true,
            next_feed_in_secs: 60,
        }]
    );
}

#[test]
fn full_cycle_walks_every_state() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);

    svc.step(&mut hw, &mut cam, &clock, &mut sink, &CancelToken::new());

    let path: Vec<StateId> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        path,
        vec![
            StateId::Triggered,
            StateId::Capturing,
            StateId::Classifying,
            StateId::Deciding,
            StateId::Dispensing,
            StateId::Idle,
        ]
    );
}

// ── Gating ────────────────────────────────────────────────────

#[test]
fn low_coverage_does_not_feed_or_start_cooldown() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_5pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);

    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &CancelToken::new());

    let CycleOutcome::NoMatch(result) = outcome else {
        panic!("expected NoMatch, got {outcome:?}");
    };
    assert!((result.coverage_pct - 5.0).abs() < 0.01);
    assert_eq!(hw.dispenses(), 0);
    assert_eq!(svc.last_trigger(), None);
    assert_eq!(svc.food_level_pct(), 100.0);
    assert!(sink.reports().is_empty());
}

#[test]
fn far_object_never_reaches_the_camera() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(80.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);

    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &CancelToken::new());

    assert_eq!(outcome, CycleOutcome::Clear { distance_cm: 80.0 });
    assert_eq!(cam.captures, 0);
    assert_eq!(hw.dispenses(), 0);
}

#[test]
fn threshold_distance_itself_is_not_near() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(50.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);

    svc.step(&mut hw, &mut cam, &clock, &mut sink, &CancelToken::new());
    assert_eq!(cam.captures, 0);
}

#[test]
fn missing_reading_never_reaches_the_camera() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);

    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &CancelToken::new());

    assert_eq!(outcome, CycleOutcome::NoReading);
    assert_eq!(cam.captures, 0);
    assert!(sink.contains(|e| *e == AppEvent::Distance(DistanceReading::NoReading)));
}

// ── Cooldown ──────────────────────────────────────────────────

#[test]
fn presence_during_cooldown_skips_capture() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);
    let cancel = CancelToken::new();

    svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert_eq!(cam.captures, 1);

    clock.advance(secs(20));
    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);

    assert_eq!(
        outcome,
        CycleOutcome::CoolingDown {
            remaining: secs(40)
        }
    );
    assert_eq!(cam.captures, 1);
    assert_eq!(hw.dispenses(), 1);
    assert!(sink.contains(|e| *e == AppEvent::CoolingDown { remaining: secs(40) }));
}

#[test]
fn cooldown_ends_strictly_after_one_cycle() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);
    let cancel = CancelToken::new();

    svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);

    clock.set(secs(60));
    let at_boundary = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert!(matches!(at_boundary, CycleOutcome::CoolingDown { .. }));
    assert_eq!(hw.dispenses(), 1);

    clock.set(secs(61));
    let after = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert!(matches!(after, CycleOutcome::Dispensed(_)));
    assert_eq!(hw.dispenses(), 2);
    assert_eq!(svc.last_trigger(), Some(secs(61)));
    assert_eq!(svc.food_level_pct(), 90.0);
}

#[test]
fn configured_cycle_length_is_honoured() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let config = FeederConfig {
        cycle_secs: 10,
        ..FeederConfig::default()
    };
    let mut svc = make_app(config, &clock, &mut sink);
    let cancel = CancelToken::new();

    svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    clock.set(secs(11));
    svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);

    assert_eq!(hw.dispenses(), 2);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn failed_capture_leaves_loop_eligible() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::failing(CaptureError::Timeout);
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);
    let cancel = CancelToken::new();

    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);

    assert_eq!(outcome, CycleOutcome::CaptureFailed(CaptureError::Timeout));
    assert_eq!(svc.last_trigger(), None);
    assert_eq!(hw.dispenses(), 0);
    assert!(sink.contains(|e| *e == AppEvent::CaptureFailed(CaptureError::Timeout)));

    // Camera recovers; the next poll feeds without waiting out a cycle.
    cam.next = Ok(brown_15pct());
    clock.advance(secs(1));
    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert!(matches!(outcome, CycleOutcome::Dispensed(_)));
}

#[test]
fn actuator_fault_touches_neither_cooldown_nor_food() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    hw.dispense_fault = Some(ActuatorError::PwmWriteFailed);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);
    let cancel = CancelToken::new();

    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);

    let CycleOutcome::DispenseFailed(ev) = outcome else {
        panic!("expected DispenseFailed, got {outcome:?}");
    };
    assert!(!ev.success);
    assert_eq!(ev.fault, Some(ActuatorError::PwmWriteFailed));
    assert_eq!(svc.last_trigger(), None);
    assert_eq!(svc.food_level_pct(), 100.0);
    assert_eq!(svc.dispense_count(), 0);
    assert_eq!(svc.state(), StateId::Idle);
    assert_eq!(sink.dispensed(), vec![ev]);
    assert!(!sink.reports()[0].fed);

    // The loop keeps going once the servo recovers.
    hw.dispense_fault = None;
    clock.advance(secs(1));
    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert!(matches!(outcome, CycleOutcome::Dispensed(_)));
}

// ── Cancellation ──────────────────────────────────────────────

#[test]
fn cancel_before_capture_abandons_cycle() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);

    assert_eq!(outcome, CycleOutcome::Cancelled);
    assert_eq!(cam.captures, 0);
    assert_eq!(hw.dispenses(), 0);
    assert_eq!(svc.state(), StateId::Idle);
}

#[test]
fn run_stops_on_cancel_and_parks_dispenser() {
    let clock = SimClock::new();
    let mut recorder = RecordingSink::new();
    let mut hw = MockHardware::at_cm(80.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut recorder);
    let cancel = CancelToken::new();
    let mut sink = (
        recorder,
        CancelAfterPolls {
            token: cancel.clone(),
            polls: 3,
        },
    );

    svc.run(&mut hw, &mut cam, &clock, &mut sink, &cancel);

    assert_eq!(svc.polls(), 3);
    assert_eq!(hw.last_call(), Some(&HwCall::AllStop));
    assert_eq!(sink.0.events.last(), Some(&AppEvent::Stopped));
    // Two sleeps of the default 500 ms poll interval between three polls.
    assert_eq!(clock.now(), Duration::from_millis(1000));
}

#[test]
fn run_feeds_then_cools_down() {
    let clock = SimClock::new();
    let mut recorder = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut recorder);
    let cancel = CancelToken::new();
    let mut sink = (
        recorder,
        CancelAfterPolls {
            token: cancel.clone(),
            polls: 10,
        },
    );

    svc.run(&mut hw, &mut cam, &clock, &mut sink, &cancel);

    assert_eq!(hw.dispenses(), 1);
    assert_eq!(cam.captures, 1);
    let cooling = sink
        .0
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::CoolingDown { .. }))
        .count();
    assert_eq!(cooling, 9);
}

// ── Reporting ─────────────────────────────────────────────────

#[test]
fn heartbeat_reports_follow_interval() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(80.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let config = FeederConfig {
        report_interval_secs: 10,
        ..FeederConfig::default()
    };
    let mut svc = make_app(config, &clock, &mut sink);
    let cancel = CancelToken::new();

    clock.set(secs(5));
    svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert!(sink.reports().is_empty());

    clock.set(secs(10));
    svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert_eq!(
        sink.reports(),
        vec![StatusReport {
            food_level_pct: 100.0,
            fed: false,
            next_feed_in_secs: 0,
        }]
    );

    clock.set(secs(15));
    svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert_eq!(sink.reports().len(), 1);
}

#[test]
fn no_heartbeat_when_interval_is_zero() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(80.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);
    let cancel = CancelToken::new();

    for t in 0..5 {
        clock.set(secs(t * 100));
        svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    }
    assert!(sink.reports().is_empty());
}

#[test]
fn snapshot_keeps_recent_dispenses() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(FeederConfig::default(), &clock, &mut sink);
    let cancel = CancelToken::new();

    for i in 0..3 {
        clock.set(secs(i * 61));
        svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    }

    let snap = svc.snapshot();
    assert_eq!(snap.dispense_count, 3);
    assert_eq!(snap.recent.len(), 3);
    assert_eq!(snap.recent[0].at, secs(0));
    assert_eq!(snap.recent[2].at, secs(122));
    assert_eq!(snap.food_level_pct, 85.0);
    assert_eq!(snap.last_distance, DistanceReading::Cm(30.0));
}
