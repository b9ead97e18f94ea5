//! Food dispenser: one open + close sweep of the continuous-rotation servo.
//!
//! ```text
//!  open duty ── hold rotation ── neutral ─ 100ms ─ off
//!     ─ 200ms pause ─
//!  close duty ── hold rotation ── neutral ─ 100ms ─ off
//! ```
//!
//! The open and close holds are equal so the flap ends where it started.
//! That symmetry is a calibration input, not something measured here;
//! small drift between cycles is tolerated. Either half can be run on its
//! own ([`Dispenser::sweep_open`], [`Dispenser::sweep_close`]) to tune the
//! duties and the hold on a bench.
//!
//! ## Safety contract
//!
//! Every exit path, including a failed PWM write halfway through, leaves the
//! servo at neutral-then-zero. The sequence runs inside a [`ServoSession`]
//! whose `Drop` parks the servo if the sequence did not.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};

use crate::app::ports::{Feeder, Sweep};
use crate::config::FeederConfig;
use crate::error::ActuatorError;

use super::servo::ContinuousServo;

/// Timing and duty parameters for one dispense cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispenseTiming {
    /// Neutral duty; also pushed to the servo.
    pub stop_duty_pct: f32,
    pub open_duty_pct: f32,
    pub close_duty_pct: f32,
    /// Hold in each direction.
    pub rotation: Duration,
    /// Neutral hold before the signal is dropped.
    pub stop_hold: Duration,
    /// Gap between the open and close sweeps.
    pub pause: Duration,
}

impl DispenseTiming {
    pub fn from_config(config: &FeederConfig) -> Self {
        Self {
            stop_duty_pct: config.servo_stop_duty_pct,
            open_duty_pct: config.servo_open_duty_pct,
            close_duty_pct: config.servo_close_duty_pct,
            rotation: Duration::from_secs_f32(config.rotation_secs),
            stop_hold: Duration::from_millis(100),
            pause: Duration::from_millis(200),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Scoped servo session
// ───────────────────────────────────────────────────────────────

/// Exclusive hold on the servo for the duration of one sequence.
/// Parks the servo on drop unless it is already released.
struct ServoSession<'a, P: SetDutyCycle, D: DelayNs> {
    servo: &'a mut ContinuousServo<P>,
    delay: &'a mut D,
    stop_hold: Duration,
}

impl<'a, P: SetDutyCycle, D: DelayNs> ServoSession<'a, P, D> {
    fn acquire(servo: &'a mut ContinuousServo<P>, delay: &'a mut D, stop_hold: Duration) -> Self {
        Self {
            servo,
            delay,
            stop_hold,
        }
    }

    /// Turn at `duty_pct` for `hold`, then park.
    fn sweep(&mut self, duty_pct: f32, hold: Duration) -> Result<(), ActuatorError> {
        self.servo.spin(duty_pct)?;
        self.wait(hold);
        self.park()
    }

    /// Neutral briefly, then zero signal.
    fn park(&mut self) -> Result<(), ActuatorError> {
        self.servo.neutral()?;
        self.wait(self.stop_hold);
        self.servo.release()
    }

    fn wait(&mut self, d: Duration) {
        self.delay.delay_ms(d.as_millis() as u32);
    }
}

impl<P: SetDutyCycle, D: DelayNs> Drop for ServoSession<'_, P, D> {
    fn drop(&mut self) {
        if self.servo.is_released() {
            return;
        }
        warn!("dispenser: sequence interrupted, parking servo");
        if self.park().is_err() {
            // Neutral failed; still try to drop the signal.
            if let Err(e) = self.servo.release() {
                warn!("dispenser: could not release servo: {}", e);
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Dispenser
// ───────────────────────────────────────────────────────────────

pub struct Dispenser<P: SetDutyCycle, D: DelayNs> {
    servo: ContinuousServo<P>,
    delay: D,
    timing: DispenseTiming,
    cycles: u32,
}

impl<P: SetDutyCycle, D: DelayNs> Dispenser<P, D> {
    pub fn new(mut servo: ContinuousServo<P>, delay: D, timing: DispenseTiming) -> Self {
        servo.set_stop_duty(timing.stop_duty_pct);
        Self {
            servo,
            delay,
            timing,
            cycles: 0,
        }
    }

    /// Run one open + close cycle. Blocks for roughly
    /// `2 × (rotation + stop_hold) + pause`.
    pub fn dispense(&mut self) -> Result<(), ActuatorError> {
        let t = self.timing;
        info!(
            "dispenser: open {:.1}% / close {:.1}% for {:.2}s each",
            t.open_duty_pct,
            t.close_duty_pct,
            t.rotation.as_secs_f32()
        );

        let mut session = ServoSession::acquire(&mut self.servo, &mut self.delay, t.stop_hold);
        session.sweep(t.open_duty_pct, t.rotation)?;
        session.wait(t.pause);
        session.sweep(t.close_duty_pct, t.rotation)?;
        drop(session);

        self.cycles = self.cycles.saturating_add(1);
        info!("dispenser: cycle complete, returned to start");
        Ok(())
    }

    /// Open half only: turn at the open duty for one hold, then park.
    pub fn sweep_open(&mut self) -> Result<(), ActuatorError> {
        self.single_sweep(Sweep::Open)
    }

    /// Close half only: turn at the close duty for one hold, then park.
    pub fn sweep_close(&mut self) -> Result<(), ActuatorError> {
        self.single_sweep(Sweep::Close)
    }

    /// Recalibrate (e.g. after a config reload).
    pub fn set_timing(&mut self, timing: DispenseTiming) {
        if timing != self.timing {
            info!(
                "dispenser: recalibrated stop {:.1}% open {:.1}% close {:.1}% hold {:.2}s",
                timing.stop_duty_pct,
                timing.open_duty_pct,
                timing.close_duty_pct,
                timing.rotation.as_secs_f32()
            );
        }
        self.servo.set_stop_duty(timing.stop_duty_pct);
        self.timing = timing;
    }

    pub fn timing(&self) -> DispenseTiming {
        self.timing
    }

    /// Completed cycles since construction.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn servo(&self) -> &ContinuousServo<P> {
        &self.servo
    }

    fn single_sweep(&mut self, sweep: Sweep) -> Result<(), ActuatorError> {
        let t = self.timing;
        let duty = match sweep {
            Sweep::Open => t.open_duty_pct,
            Sweep::Close => t.close_duty_pct,
        };
        info!(
            "dispenser: {:?} sweep at {:.1}% for {:.2}s",
            sweep,
            duty,
            t.rotation.as_secs_f32()
        );
        ServoSession::acquire(&mut self.servo, &mut self.delay, t.stop_hold)
            .sweep(duty, t.rotation)
    }

    /// Park the servo regardless of its current state.
    pub fn all_stop(&mut self) {
        let mut session =
            ServoSession::acquire(&mut self.servo, &mut self.delay, self.timing.stop_hold);
        if let Err(e) = session.park() {
            warn!("dispenser: stop failed: {}", e);
        }
    }
}

impl<P: SetDutyCycle, D: DelayNs> Feeder for Dispenser<P, D> {
    fn dispense(&mut self) -> Result<(), ActuatorError> {
        Dispenser::dispense(self)
    }

    fn sweep(&mut self, sweep: Sweep) -> Result<(), ActuatorError> {
        self.single_sweep(sweep)
    }

    fn recalibrate(&mut self, config: &FeederConfig) {
        self.set_timing(DispenseTiming::from_config(config));
    }

    fn all_stop(&mut self) {
        Dispenser::all_stop(self);
    }
}

impl<P: SetDutyCycle, D: DelayNs> Drop for Dispenser<P, D> {
    fn drop(&mut self) {
        if !self.servo.is_released() {
            self.all_stop();
        }
    }
}
