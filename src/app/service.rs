//! Application service: the hexagonal core.
//!
//! [`FeederService`] owns the FSM, its shared context, the classifier and
//! the active colour profile. All I/O flows through port traits injected at
//! call sites, so the whole detection loop runs against mock adapters in
//! tests.
//!
//! ```text
//!  RangeFinder ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  Camera      ──▶ │     FeederService      │
//!  Feeder      ◀── │  FSM · classifier      │
//!  Clock       ──▶ └────────────────────────┘
//! ```

use core::time::Duration;

use heapless::HistoryBuffer;
use log::{info, warn};

use crate::config::FeederConfig;
use crate::error::{ClassifyError, Error};
use crate::fsm::context::{CycleOutcome, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, Transition};
use crate::vision::{ColorClassifier, ColorProfile};

use super::cancel::CancelToken;
use super::commands::{AppCommand, CalibrationStep, CommandReply};
use super::events::{AppEvent, DispenseEvent, StatusReport, StatusSnapshot};
use super::ports::{Camera, Clock, EventSink, Feeder, RangeFinder, Sweep};

/// Dispense attempts kept for [`StatusSnapshot::recent`].
pub const HISTORY_LEN: usize = 8;

// ───────────────────────────────────────────────────────────────
// FeederService
// ───────────────────────────────────────────────────────────────

pub struct FeederService {
    fsm: Fsm,
    ctx: FsmContext,
    classifier: ColorClassifier,
    profile: ColorProfile,
    /// Set when the configured colour name was unknown.
    profile_fell_back: bool,
    history: HistoryBuffer<DispenseEvent, HISTORY_LEN>,
    /// When the last status report went out.
    last_report: Option<Duration>,
    polls: u64,
}

impl FeederService {
    /// Construct the service from validated configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: FeederConfig) -> Self {
        let (profile, profile_fell_back) = ColorProfile::resolve(&config.target_color);
        if profile_fell_back {
            warn!(
                "Unknown colour '{}', using '{}'",
                config.target_color,
                profile.color()
            );
        }
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Idle),
            ctx: FsmContext::new(config),
            classifier: ColorClassifier::new(),
            profile,
            profile_fell_back,
            history: HistoryBuffer::new(),
            last_report: None,
            polls: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, clock: &impl Clock, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.last_report = Some(clock.now());
        if self.profile_fell_back {
            sink.emit(&AppEvent::ProfileFallback {
                requested: self.ctx.config.target_color.clone(),
                used: self.profile.color(),
            });
        }
        sink.emit(&AppEvent::Started {
            state: self.fsm.current_state(),
            color: self.profile.color(),
        });
        info!(
            "FeederService started: target={} threshold={:.1}% distance<{}cm cycle={}s",
            self.profile.color(),
            self.ctx.config.color_match_threshold_pct,
            self.ctx.config.detection_distance_cm,
            self.ctx.config.cycle_secs
        );
    }

    /// Poll until `cancel` fires, then park the dispenser.
    pub fn run<H, C, K, S>(
        &mut self,
        hw: &mut H,
        camera: &mut C,
        clock: &K,
        sink: &mut S,
        cancel: &CancelToken,
    ) where
        H: RangeFinder + Feeder,
        C: Camera,
        K: Clock,
        S: EventSink,
    {
        while !cancel.is_cancelled() {
            self.step(hw, camera, clock, sink, cancel);
            if cancel.is_cancelled() {
                break;
            }
            clock.sleep(self.poll_interval());
        }
        hw.all_stop();
        sink.emit(&AppEvent::Stopped);
        info!("Detection loop stopped after {} polls", self.polls);
    }

    // ── Per-poll orchestration ────────────────────────────────

    /// One pass of the detection loop: measure, gate, and if engaged run
    /// capture → classify → decide → dispense to completion.
    ///
    /// Never fails; every fault is folded into the returned outcome.
    pub fn step<H, C, K, S>(
        &mut self,
        hw: &mut H,
        camera: &mut C,
        clock: &K,
        sink: &mut S,
        cancel: &CancelToken,
    ) -> CycleOutcome
    where
        H: RangeFinder + Feeder,
        C: Camera,
        K: Clock,
        S: EventSink,
    {
        self.polls += 1;
        self.ctx.now = clock.now();
        self.ctx.distance = hw.measure();
        sink.emit(&AppEvent::Distance(self.ctx.distance));

        self.tick(sink);

        while self.fsm.current_state() != StateId::Idle {
            match self.fsm.current_state() {
                StateId::Capturing => {
                    if cancel.is_cancelled() {
                        return self.abandon(sink);
                    }
                    match camera.capture() {
                        Ok(frame) => self.ctx.frame = Some(frame),
                        Err(e) => {
                            self.ctx.capture_error = Some(e);
                            sink.emit(&AppEvent::CaptureFailed(e));
                        }
                    }
                }
                StateId::Classifying => self.classify_pending(sink),
                StateId::Dispensing => {
                    if cancel.is_cancelled() {
                        return self.abandon(sink);
                    }
                    self.ctx.dispense_result = Some(hw.dispense());
                }
                StateId::Idle | StateId::Triggered | StateId::Deciding => {}
            }
            self.tick(sink);
        }

        let outcome = self.ctx.outcome.take().unwrap_or(CycleOutcome::NoReading);
        self.publish(&outcome, sink);
        outcome
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an operator command outside the automatic loop.
    pub fn handle_command<H, C, K, S>(
        &mut self,
        cmd: AppCommand,
        hw: &mut H,
        camera: &mut C,
        clock: &K,
        sink: &mut S,
    ) -> Result<CommandReply, Error>
    where
        H: RangeFinder + Feeder,
        C: Camera,
        K: Clock,
        S: EventSink,
    {
        match cmd {
            AppCommand::DispenseNow => {
                self.ctx.now = clock.now();
                info!("Manual dispense requested");
                let event = match hw.dispense() {
                    Ok(()) => {
                        self.ctx.food.consume(self.ctx.config.food_step_pct);
                        self.ctx.dispense_count = self.ctx.dispense_count.saturating_add(1);
                        DispenseEvent::succeeded(self.ctx.now, None, self.ctx.food.pct())
                    }
                    Err(fault) => {
                        warn!("Manual dispense failed: {}", fault);
                        DispenseEvent::failed(self.ctx.now, None, self.ctx.food.pct(), fault)
                    }
                };
                self.record_dispense(event, sink);
                Ok(CommandReply::Dispensed(event))
            }
            AppCommand::MeasureDistance => {
                let reading = hw.measure();
                self.ctx.distance = reading;
                sink.emit(&AppEvent::Distance(reading));
                Ok(CommandReply::Distance(reading))
            }
            AppCommand::Snapshot => {
                let frame = camera.capture().inspect_err(|e| {
                    sink.emit(&AppEvent::CaptureFailed(*e));
                })?;
                let result = self
                    .classifier
                    .classify(frame, &self.profile)
                    .inspect_err(|e| sink.emit(&AppEvent::ClassifyFailed(*e)))?;
                sink.emit(&AppEvent::Classified {
                    result,
                    threshold_pct: self.ctx.config.color_match_threshold_pct,
                });
                Ok(CommandReply::Classified(result))
            }
            AppCommand::UpdateConfig(config) => {
                config.validate()?;
                let (profile, fell_back) = ColorProfile::resolve(&config.target_color);
                if fell_back {
                    warn!(
                        "Unknown colour '{}', using '{}'",
                        config.target_color,
                        profile.color()
                    );
                    sink.emit(&AppEvent::ProfileFallback {
                        requested: config.target_color.clone(),
                        used: profile.color(),
                    });
                }
                hw.recalibrate(&config);
                camera.reconfigure(&config);
                self.profile = profile;
                self.profile_fell_back = fell_back;
                self.ctx.config = config;
                info!("Configuration updated at runtime");
                Ok(CommandReply::ConfigApplied)
            }
            AppCommand::Calibrate(step) => {
                let sweep = match step {
                    CalibrationStep::Open => Some(Sweep::Open),
                    CalibrationStep::Close => Some(Sweep::Close),
                    CalibrationStep::Stop => None,
                };
                match sweep {
                    Some(sweep) => hw
                        .sweep(sweep)
                        .inspect_err(|e| warn!("Calibration sweep failed: {}", e))?,
                    None => hw.all_stop(),
                }
                sink.emit(&AppEvent::Calibrated(step));
                Ok(CommandReply::Calibrated(step))
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn profile(&self) -> &ColorProfile {
        &self.profile
    }

    pub fn config(&self) -> &FeederConfig {
        &self.ctx.config
    }

    pub fn food_level_pct(&self) -> f32 {
        self.ctx.food.pct()
    }

    pub fn dispense_count(&self) -> u32 {
        self.ctx.dispense_count
    }

    pub fn last_trigger(&self) -> Option<Duration> {
        self.ctx.cooldown.last_trigger()
    }

    /// Cooldown left as of the most recent poll.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.ctx.cooldown_remaining()
    }

    /// Polls executed since construction.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.fsm.current_state(),
            color: self.profile.color(),
            last_distance: self.ctx.distance,
            cooldown_remaining: self.cooldown_remaining(),
            food_level_pct: self.ctx.food.pct(),
            dispense_count: self.ctx.dispense_count,
            recent: self.history.oldest_ordered().copied().collect(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.ctx.config.poll_interval_ms))
    }

    /// Tick the FSM once, emitting a state change if it moved.
    fn tick(&mut self, sink: &mut impl EventSink) {
        if let Some(Transition { from, to }) = self.fsm.tick(&mut self.ctx) {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
    }

    fn classify_pending(&mut self, sink: &mut impl EventSink) {
        let Some(frame) = self.ctx.frame.take() else {
            self.ctx.classify_error = Some(ClassifyError::EmptyFrame);
            return;
        };
        match self.classifier.classify(frame, &self.profile) {
            Ok(result) => {
                self.ctx.classification = Some(result);
                sink.emit(&AppEvent::Classified {
                    result,
                    threshold_pct: self.ctx.config.color_match_threshold_pct,
                });
            }
            Err(e) => {
                self.ctx.classify_error = Some(e);
                sink.emit(&AppEvent::ClassifyFailed(e));
            }
        }
    }

    /// Drop the in-flight cycle and return to Idle.
    fn abandon(&mut self, sink: &mut impl EventSink) -> CycleOutcome {
        info!(
            "Cancellation requested, abandoning cycle in {}",
            self.fsm.current_state().name()
        );
        let moved = self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        self.ctx.clear_cycle();
        if let Some(Transition { from, to }) = moved {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
        CycleOutcome::Cancelled
    }

    fn publish(&mut self, outcome: &CycleOutcome, sink: &mut impl EventSink) {
        match outcome {
            CycleOutcome::CoolingDown { remaining } => {
                sink.emit(&AppEvent::CoolingDown {
                    remaining: *remaining,
                });
            }
            CycleOutcome::Dispensed(event) | CycleOutcome::DispenseFailed(event) => {
                self.record_dispense(*event, sink);
                return;
            }
            _ => {}
        }
        self.heartbeat(sink);
    }

    fn record_dispense(&mut self, event: DispenseEvent, sink: &mut impl EventSink) {
        if event.success && self.ctx.food.is_empty() {
            warn!("Food estimate at 0%, hopper needs a refill");
        }
        self.history.write(event);
        sink.emit(&AppEvent::Dispensed(event));
        self.report(event.success, sink);
    }

    fn heartbeat(&mut self, sink: &mut impl EventSink) {
        let interval = self.ctx.config.report_interval_secs;
        if interval == 0 {
            return;
        }
        let due = self.last_report.is_none_or(|last| {
            self.ctx.now.saturating_sub(last) >= Duration::from_secs(u64::from(interval))
        });
        if due {
            self.report(false, sink);
        }
    }

    fn report(&mut self, fed: bool, sink: &mut impl EventSink) {
        let report = StatusReport::new(self.ctx.food.pct(), fed, self.cooldown_remaining());
        sink.emit(&AppEvent::Report(report));
        self.last_report = Some(self.ctx.now);
    }
}
