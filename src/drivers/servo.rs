//! Continuous-rotation servo driver.
//!
//! Direction and speed are encoded in the duty cycle of a 50 Hz signal:
//! the neutral duty stops the horn, values below turn one way, values above
//! the other. Zero duty (no pulses at all) releases holding torque.
//!
//! This driver is a dumb actuator; sequencing lives in
//! [`super::dispenser`].

use embedded_hal::pwm::SetDutyCycle;

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServoState {
    /// No signal, no holding torque.
    Released,
    /// Neutral duty (commanded stop).
    Neutral,
    /// Turning at the given duty (%).
    Spinning { duty_pct: f32 },
}

pub struct ContinuousServo<P: SetDutyCycle> {
    pwm: P,
    stop_duty_pct: f32,
    state: ServoState,
}

impl<P: SetDutyCycle> ContinuousServo<P> {
    /// Wrap an exclusively-owned PWM channel. The line is assumed idle
    /// (zero duty) on entry.
    pub fn new(pwm: P, stop_duty_pct: f32) -> Self {
        Self {
            pwm,
            stop_duty_pct,
            state: ServoState::Released,
        }
    }

    /// Turn at `duty_pct` until told otherwise.
    pub fn spin(&mut self, duty_pct: f32) -> Result<(), ActuatorError> {
        self.write_pct(duty_pct)?;
        self.state = ServoState::Spinning { duty_pct };
        Ok(())
    }

    /// Command the neutral (stop) duty.
    pub fn neutral(&mut self) -> Result<(), ActuatorError> {
        self.write_pct(self.stop_duty_pct)?;
        self.state = ServoState::Neutral;
        Ok(())
    }

    /// Drop the signal entirely.
    pub fn release(&mut self) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.state = ServoState::Released;
        Ok(())
    }

    /// Change the neutral duty. Applies from the next `neutral` call.
    pub fn set_stop_duty(&mut self, pct: f32) {
        self.stop_duty_pct = pct;
    }

    pub fn stop_duty_pct(&self) -> f32 {
        self.stop_duty_pct
    }

    pub fn state(&self) -> ServoState {
        self.state
    }

    pub fn is_released(&self) -> bool {
        matches!(self.state, ServoState::Released)
    }

    fn write_pct(&mut self, pct: f32) -> Result<(), ActuatorError> {
        if !(0.0..=100.0).contains(&pct) {
            return Err(ActuatorError::InvalidDuty);
        }
        let max = self.pwm.max_duty_cycle() as f32;
        let duty = (pct / 100.0 * max).round() as u16;
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)
    }
}
