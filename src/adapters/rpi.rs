//! Raspberry Pi line adapters.
//!
//! Thin newtypes over `rppal` GPIO pins that implement the `embedded-hal`
//! traits the drivers are written against. Pins come from [`crate::pins`].
//!
//! | Line      | rppal mode          | embedded-hal trait |
//! |-----------|---------------------|--------------------|
//! | trigger   | output, initial LOW | `OutputPin`        |
//! | echo      | input, pull-down    | `InputPin`         |
//! | servo     | output, soft PWM    | `SetDutyCycle`     |
//!
//! Line acquisition failure is a setup fault: the caller aborts.

use core::convert::Infallible;

use embedded_hal::digital;
use embedded_hal::pwm;
use log::{error, info};
use rppal::gpio::Gpio;

use crate::error::Error;
use crate::pins::{ECHO_GPIO, SERVO_GPIO, SERVO_PWM_HZ, TRIGGER_GPIO};

/// Duty resolution exposed through [`pwm::SetDutyCycle`] (0.01 % steps).
pub const SERVO_MAX_DUTY: u16 = 10_000;

// ---------------------------------------------------------------------------
// Digital lines
// ---------------------------------------------------------------------------

pub struct TriggerLine(rppal::gpio::OutputPin);

impl digital::ErrorType for TriggerLine {
    type Error = Infallible;
}

impl digital::OutputPin for TriggerLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set_high();
        Ok(())
    }
}

pub struct EchoLine(rppal::gpio::InputPin);

impl digital::ErrorType for EchoLine {
    type Error = Infallible;
}

impl digital::InputPin for EchoLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_low())
    }
}

// ---------------------------------------------------------------------------
// Servo line (software PWM)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmLineError;

impl pwm::Error for PwmLineError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

pub struct ServoLine {
    pin: rppal::gpio::OutputPin,
    frequency_hz: f64,
}

impl pwm::ErrorType for ServoLine {
    type Error = PwmLineError;
}

impl pwm::SetDutyCycle for ServoLine {
    fn max_duty_cycle(&self) -> u16 {
        SERVO_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), PwmLineError> {
        if duty == 0 {
            self.pin.clear_pwm().map_err(|e| {
                error!("servo: clear_pwm failed: {}", e);
                PwmLineError
            })?;
            self.pin.set_low();
            return Ok(());
        }
        let fraction = f64::from(duty.min(SERVO_MAX_DUTY)) / f64::from(SERVO_MAX_DUTY);
        self.pin
            .set_pwm_frequency(self.frequency_hz, fraction)
            .map_err(|e| {
                error!("servo: set_pwm_frequency failed: {}", e);
                PwmLineError
            })
    }
}

// ---------------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------------

/// Every line the feeder owns.
pub struct RpiLines {
    pub trigger: TriggerLine,
    pub echo: EchoLine,
    pub servo: ServoLine,
}

impl RpiLines {
    /// Claim the trigger, echo and servo lines.
    pub fn acquire() -> Result<Self, Error> {
        let gpio = Gpio::new().map_err(|e| {
            error!("GPIO controller unavailable: {}", e);
            Error::Init("GPIO controller unavailable")
        })?;

        let claim = |pin: u8, what: &'static str| {
            gpio.get(pin).map_err(|e| {
                error!("{} (GPIO {}): {}", what, pin, e);
                Error::Init(what)
            })
        };

        let trigger = TriggerLine(claim(TRIGGER_GPIO, "trigger line unavailable")?.into_output_low());
        let echo = EchoLine(claim(ECHO_GPIO, "echo line unavailable")?.into_input_pulldown());
        let servo = ServoLine {
            pin: claim(SERVO_GPIO, "servo line unavailable")?.into_output_low(),
            frequency_hz: SERVO_PWM_HZ,
        };

        info!(
            "GPIO ready: trigger={} echo={} servo={} @ {} Hz",
            TRIGGER_GPIO, ECHO_GPIO, SERVO_GPIO, SERVO_PWM_HZ
        );
        Ok(Self {
            trigger,
            echo,
            servo,
        })
    }
}
