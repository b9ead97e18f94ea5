//! Operator command scenarios: manual feed, one-off reads, runtime reconfiguration,
//! servo calibration.

use std::time::Duration;

use feeder::app::cancel::CancelToken;
use feeder::app::commands::{AppCommand, CalibrationStep, CommandReply};
use feeder::app::events::AppEvent;
use feeder::app::ports::Sweep;
use feeder::app::service::FeederService;
use feeder::config::FeederConfig;
use feeder::error::{ActuatorError, CaptureError, Error};
use feeder::fsm::context::CycleOutcome;
use feeder::sensors::DistanceReading;
use feeder::vision::TargetColor;

use crate::mock_hw::*;

fn make_app(clock: &SimClock, sink: &mut RecordingSink) -> FeederService {
    let mut svc = FeederService::new(FeederConfig::default());
    svc.start(clock, sink);
    svc
}

// ── DispenseNow ───────────────────────────────────────────────

#[test]
fn manual_dispense_uses_food_but_not_cooldown() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let reply = svc
        .handle_command(AppCommand::DispenseNow, &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();

    let CommandReply::Dispensed(ev) = reply else {
        panic!("expected Dispensed, got {reply:?}");
    };
    assert!(ev.success);
    assert!(ev.is_manual());
    assert_eq!(svc.food_level_pct(), 95.0);
    assert_eq!(svc.last_trigger(), None);
    assert_eq!(cam.captures, 0);

    // An automatic trigger right after is still eligible.
    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &CancelToken::new());
    assert!(matches!(outcome, CycleOutcome::Dispensed(_)));
    assert_eq!(hw.dispenses(), 2);
    assert_eq!(svc.food_level_pct(), 90.0);
}

#[test]
fn food_level_floors_at_zero() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    for _ in 0..21 {
        svc.handle_command(AppCommand::DispenseNow, &mut hw, &mut cam, &clock, &mut sink)
            .unwrap();
    }

    assert_eq!(svc.food_level_pct(), 0.0);
    assert_eq!(svc.dispense_count(), 21);
    let last = sink.reports().pop().unwrap();
    assert_eq!(last.food_level_pct, 0.0);
    assert!(last.fed);
}

#[test]
fn failed_manual_dispense_is_reported_not_counted() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    hw.dispense_fault = Some(ActuatorError::InvalidDuty);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let reply = svc
        .handle_command(AppCommand::DispenseNow, &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();

    let CommandReply::Dispensed(ev) = reply else {
        panic!("expected Dispensed, got {reply:?}");
    };
    assert!(!ev.success);
    assert_eq!(ev.fault, Some(ActuatorError::InvalidDuty));
    assert_eq!(svc.food_level_pct(), 100.0);
    assert_eq!(svc.dispense_count(), 0);
    assert_eq!(svc.snapshot().recent, vec![ev]);
}

// ── One-off reads ─────────────────────────────────────────────

#[test]
fn measure_distance_returns_filtered_reading() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    hw.queued.push_back(DistanceReading::from_raw_cm(42.456));
    hw.queued.push_back(DistanceReading::from_raw_cm(900.0));
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let first = svc
        .handle_command(AppCommand::MeasureDistance, &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();
    let second = svc
        .handle_command(AppCommand::MeasureDistance, &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();

    assert_eq!(first, CommandReply::Distance(DistanceReading::Cm(42.46)));
    assert_eq!(second, CommandReply::Distance(DistanceReading::NoReading));
    assert_eq!(hw.dispenses(), 0);
}

#[test]
fn snapshot_classifies_without_feeding() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let reply = svc
        .handle_command(AppCommand::Snapshot, &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();

    let CommandReply::Classified(result) = reply else {
        panic!("expected Classified, got {reply:?}");
    };
    assert_eq!(result.matched_pixels, 240);
    assert_eq!(result.total_pixels, 1600);
    assert_eq!(cam.captures, 1);
    assert_eq!(hw.dispenses(), 0);
    assert_eq!(svc.last_trigger(), None);
    assert!(sink.contains(|e| matches!(e, AppEvent::Classified { .. })));
}

#[test]
fn snapshot_surfaces_capture_failure() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    let mut cam = MockCamera::failing(CaptureError::ToolNotFound);
    let mut svc = make_app(&clock, &mut sink);

    let err = svc
        .handle_command(AppCommand::Snapshot, &mut hw, &mut cam, &clock, &mut sink)
        .unwrap_err();

    assert_eq!(err, Error::Capture(CaptureError::ToolNotFound));
    assert!(sink.contains(|e| *e == AppEvent::CaptureFailed(CaptureError::ToolNotFound)));
}

// ── UpdateConfig ──────────────────────────────────────────────

#[test]
fn invalid_config_is_rejected_and_old_one_kept() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let bad = FeederConfig {
        cycle_secs: 5,
        ..FeederConfig::default()
    };
    let err = svc
        .handle_command(AppCommand::UpdateConfig(bad), &mut hw, &mut cam, &clock, &mut sink)
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(svc.config(), &FeederConfig::default());
}

#[test]
fn switching_colour_changes_what_matches() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_5pct());
    let mut svc = make_app(&clock, &mut sink);
    let cancel = CancelToken::new();

    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    assert!(matches!(outcome, CycleOutcome::NoMatch(_)));

    let blue = FeederConfig {
        target_color: "blue".into(),
        ..FeederConfig::default()
    };
    let reply = svc
        .handle_command(AppCommand::UpdateConfig(blue), &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();
    assert_eq!(reply, CommandReply::ConfigApplied);
    assert_eq!(svc.profile().color(), TargetColor::Blue);

    // The sky background is blue: 1600 - 80 px.
    clock.advance(Duration::from_secs(1));
    let outcome = svc.step(&mut hw, &mut cam, &clock, &mut sink, &cancel);
    let CycleOutcome::Dispensed(ev) = outcome else {
        panic!("expected Dispensed, got {outcome:?}");
    };
    assert!((ev.classification.unwrap().coverage_pct - 95.0).abs() < 0.01);
}

#[test]
fn unknown_colour_in_update_falls_back_with_event() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let config = FeederConfig {
        target_color: "mauve".into(),
        ..FeederConfig::default()
    };
    svc.handle_command(AppCommand::UpdateConfig(config), &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();

    assert_eq!(svc.profile().color(), TargetColor::Brown);
    assert!(sink.contains(|e| *e
        == AppEvent::ProfileFallback {
            requested: "mauve".into(),
            used: TargetColor::Brown,
        }));
}

#[test]
fn unknown_colour_at_startup_emits_fallback_before_started() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let config = FeederConfig {
        target_color: "mauve".into(),
        ..FeederConfig::default()
    };
    let mut svc = FeederService::new(config);
    svc.start(&clock, &mut sink);

    assert!(matches!(sink.events[0], AppEvent::ProfileFallback { .. }));
    assert!(matches!(
        sink.events[1],
        AppEvent::Started {
            color: TargetColor::Brown,
            ..
        }
    ));
}

#[test]
fn update_recalibrates_servo_and_camera() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    svc.handle_command(AppCommand::DispenseNow, &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();
    let tuned = FeederConfig {
        rotation_secs: 2.5,
        capture_width: 320,
        capture_height: 240,
        ..FeederConfig::default()
    };
    svc.handle_command(AppCommand::UpdateConfig(tuned), &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();
    svc.handle_command(AppCommand::DispenseNow, &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();

    assert_eq!(
        hw.holds,
        vec![Duration::from_secs(1), Duration::from_millis(2500)]
    );
    assert_eq!(cam.resolution, Some((320, 240)));
}

#[test]
fn rejected_update_leaves_hardware_alone() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let bad = FeederConfig {
        rotation_secs: 0.0,
        ..FeederConfig::default()
    };
    svc.handle_command(AppCommand::UpdateConfig(bad), &mut hw, &mut cam, &clock, &mut sink)
        .unwrap_err();

    assert!(!hw.calls.contains(&HwCall::Recalibrate));
    assert_eq!(cam.resolution, None);
}

// ── Calibrate ─────────────────────────────────────────────────

#[test]
fn calibration_steps_drive_servo_only() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::at_cm(30.0);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    for step in [
        CalibrationStep::Open,
        CalibrationStep::Close,
        CalibrationStep::Stop,
    ] {
        let reply = svc
            .handle_command(AppCommand::Calibrate(step), &mut hw, &mut cam, &clock, &mut sink)
            .unwrap();
        assert_eq!(reply, CommandReply::Calibrated(step));
    }

    assert_eq!(
        hw.calls,
        vec![
            HwCall::Sweep(Sweep::Open),
            HwCall::Sweep(Sweep::Close),
            HwCall::AllStop
        ]
    );
    assert_eq!(svc.food_level_pct(), 100.0);
    assert_eq!(svc.dispense_count(), 0);
    assert_eq!(svc.last_trigger(), None);
    assert!(sink.dispensed().is_empty());
    assert!(sink.contains(|e| *e == AppEvent::Calibrated(CalibrationStep::Close)));
}

#[test]
fn calibration_uses_tuned_hold() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let tuned = FeederConfig {
        rotation_secs: 0.75,
        ..FeederConfig::default()
    };
    svc.handle_command(AppCommand::UpdateConfig(tuned), &mut hw, &mut cam, &clock, &mut sink)
        .unwrap();
    svc.handle_command(
        AppCommand::Calibrate(CalibrationStep::Open),
        &mut hw,
        &mut cam,
        &clock,
        &mut sink,
    )
    .unwrap();

    assert_eq!(hw.holds, vec![Duration::from_millis(750)]);
}

#[test]
fn failed_calibration_sweep_is_an_actuator_error() {
    let clock = SimClock::new();
    let mut sink = RecordingSink::new();
    let mut hw = MockHardware::new();
    hw.dispense_fault = Some(ActuatorError::PwmWriteFailed);
    let mut cam = MockCamera::returning(brown_15pct());
    let mut svc = make_app(&clock, &mut sink);

    let err = svc
        .handle_command(
            AppCommand::Calibrate(CalibrationStep::Open),
            &mut hw,
            &mut cam,
            &clock,
            &mut sink,
        )
        .unwrap_err();

    assert_eq!(err, Error::Actuator(ActuatorError::PwmWriteFailed));
    assert!(!sink.contains(|e| matches!(e, AppEvent::Calibrated(_))));
}
