//! HC-SR04 ultrasonic distance sensor driver.
//!
//! A 10 µs trigger pulse makes the module emit a burst; the echo line is
//! then held HIGH for the round-trip time of the sound. Distance is the
//! HIGH duration multiplied by half the speed of sound.
//!
//! Both echo edges are awaited with a hard timeout so a disconnected or
//! stuck line can never hang the control loop. Every fault collapses into
//! [`DistanceReading::NoReading`]; nothing here is fatal.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::app::ports::{Clock, RangeFinder};
use crate::error::SensorError;
use crate::sensors::DistanceReading;

/// Half the speed of sound at ~20 °C, in cm/s (343 m/s ÷ 2).
pub const HALF_SPEED_OF_SOUND_CM_PER_S: f32 = 17_150.0;

/// Trigger/echo timing parameters.
#[derive(Debug, Clone, Copy)]
pub struct UltrasonicTiming {
    /// Trigger held LOW before each pulse so the module settles.
    pub settle_ms: u32,
    /// Width of the trigger pulse.
    pub pulse_us: u32,
    /// Upper bound on each echo-edge wait.
    pub echo_timeout: Duration,
}

impl Default for UltrasonicTiming {
    fn default() -> Self {
        Self {
            settle_ms: 100,
            pulse_us: 10,
            echo_timeout: Duration::from_millis(500),
        }
    }
}

/// Ultrasonic range finder over exclusively-owned trigger/echo lines.
pub struct DistanceSensor<T, E, D, K> {
    trigger: T,
    echo: E,
    delay: D,
    clock: K,
    timing: UltrasonicTiming,
}

impl<T, E, D, K> DistanceSensor<T, E, D, K>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    K: Clock,
{
    pub fn new(trigger: T, echo: E, delay: D, clock: K) -> Self {
        Self {
            trigger,
            echo,
            delay,
            clock,
            timing: UltrasonicTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: UltrasonicTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Take one measurement.
    pub fn measure(&mut self) -> DistanceReading {
        match self.try_measure() {
            Ok(cm) => DistanceReading::Cm(cm),
            Err(SensorError::OutOfRange) => {
                debug!("distance: implausible echo discarded");
                DistanceReading::NoReading
            }
            Err(e) => {
                warn!("distance: {}", e);
                DistanceReading::NoReading
            }
        }
    }

    fn try_measure(&mut self) -> Result<f32, SensorError> {
        self.fire_trigger()?;

        // Wait for the rising edge; the last LOW sample marks pulse start.
        let deadline = self.clock.now() + self.timing.echo_timeout;
        let mut pulse_start = self.clock.now();
        while self.echo.is_low().map_err(|_| SensorError::GpioReadFailed)? {
            pulse_start = self.clock.now();
            if pulse_start > deadline {
                return Err(SensorError::EchoStartTimeout);
            }
        }

        // Wait for the falling edge; the last HIGH sample marks pulse end.
        let deadline = self.clock.now() + self.timing.echo_timeout;
        let mut pulse_end = self.clock.now();
        while self.echo.is_high().map_err(|_| SensorError::GpioReadFailed)? {
            pulse_end = self.clock.now();
            if pulse_end > deadline {
                return Err(SensorError::EchoEndTimeout);
            }
        }

        let high = pulse_end.saturating_sub(pulse_start);
        let cm = high.as_secs_f32() * HALF_SPEED_OF_SOUND_CM_PER_S;
        DistanceReading::from_raw_cm(cm)
            .cm()
            .ok_or(SensorError::OutOfRange)
    }

    fn fire_trigger(&mut self) -> Result<(), SensorError> {
        self.trigger
            .set_low()
            .map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_ms(self.timing.settle_ms);
        self.trigger
            .set_high()
            .map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_us(self.timing.pulse_us);
        self.trigger
            .set_low()
            .map_err(|_| SensorError::GpioWriteFailed)
    }
}

impl<T, E, D, K> RangeFinder for DistanceSensor<T, E, D, K>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    K: Clock,
{
    fn measure(&mut self) -> DistanceReading {
        DistanceSensor::measure(self)
    }
}
