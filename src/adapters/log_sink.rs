//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by rendering application events as status
//! lines through the `log` facade (stderr via `env_logger` in the binary).
//! Per-poll chatter goes to `debug`, feed outcomes to `info`, recovered
//! faults to `warn`.

use log::{debug, info, warn};

use crate::app::events::{AppEvent, whole_secs_ceil};
use crate::app::ports::EventSink;
use crate::sensors::DistanceReading;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { state, color } => {
                info!("START | state={:?} target={}", state, color);
            }
            AppEvent::ProfileFallback { requested, used } => {
                warn!("COLOR | '{}' unknown, using '{}'", requested, used);
            }
            AppEvent::StateChanged { from, to } => {
                debug!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::Distance(DistanceReading::Cm(cm)) => {
                debug!("RANGE | {:.2} cm", cm);
            }
            AppEvent::Distance(DistanceReading::NoReading) => {
                debug!("RANGE | no reading");
            }
            AppEvent::CoolingDown { remaining } => {
                info!(
                    "WAIT  | object present, next feed in {}s",
                    whole_secs_ceil(*remaining)
                );
            }
            AppEvent::CaptureFailed(e) => {
                warn!("CAM   | capture failed: {}", e);
            }
            AppEvent::Classified {
                result,
                threshold_pct,
            } => {
                info!(
                    "COLOR | {:.1}% match ({} / {} px), threshold {:.1}%",
                    result.coverage_pct, result.matched_pixels, result.total_pixels, threshold_pct
                );
            }
            AppEvent::ClassifyFailed(e) => {
                warn!("COLOR | classification failed: {}", e);
            }
            AppEvent::Dispensed(ev) if ev.success => {
                info!(
                    "FEED  | {} dispense ok, food ~{:.0}%",
                    if ev.is_manual() { "manual" } else { "auto" },
                    ev.food_level_pct
                );
            }
            AppEvent::Dispensed(ev) => {
                warn!(
                    "FEED  | dispense failed ({}), food ~{:.0}%",
                    ev.fault.map_or("unknown fault".into(), |f| f.to_string()),
                    ev.food_level_pct
                );
            }
            AppEvent::Calibrated(step) => {
                info!("CAL   | {:?} done", step);
            }
            AppEvent::Report(r) => {
                debug!(
                    "REPORT| food={:.0}% fed={} next_feed_in={}s",
                    r.food_level_pct, r.fed, r.next_feed_in_secs
                );
            }
            AppEvent::Stopped => {
                info!("STOP  | dispenser parked");
            }
        }
    }
}
