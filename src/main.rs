//! Feeder controller main entry point.
//!
//! Hexagonal layout: the binary only wires adapters to the service.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HardwareAdapter        RpicamCapture     JsonConfigFile     │
//! │  (RangeFinder+Feeder)   (Camera)          (ConfigPort)       │
//! │  LogEventSink           HttpStatusReporter SystemClock       │
//! │  (EventSink)            (EventSink)        (Clock)           │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          FeederService (pure logic)                    │  │
//! │  │  FSM · classifier · cooldown · food level              │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use feeder::adapters::camera::RpicamCapture;
use feeder::adapters::config_file::JsonConfigFile;
use feeder::adapters::hardware::HardwareAdapter;
use feeder::adapters::log_sink::LogEventSink;
use feeder::adapters::reporter::HttpStatusReporter;
use feeder::adapters::rpi::RpiLines;
use feeder::adapters::time::{StdDelay, SystemClock};
use feeder::app::cancel::CancelToken;
use feeder::app::commands::{AppCommand, CalibrationStep, CommandReply};
use feeder::app::ports::ConfigPort;
use feeder::app::service::FeederService;
use feeder::config::FeederConfig;
use feeder::drivers::{ContinuousServo, DispenseTiming, Dispenser};
use feeder::sensors::ultrasonic::DistanceSensor;
use feeder::vision::TargetColor;

// ── Command line ──────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "feeder", version, about = "Colour-gated feeder controller")]
struct Cli {
    /// JSON configuration file (created on --save, defaults if missing).
    #[arg(short, long, default_value = "feeder.json")]
    config: PathBuf,

    /// Target colour (see `feeder colors`).
    #[arg(long)]
    color: Option<String>,

    /// Minimum seconds between feeds (10-3600).
    #[arg(long)]
    cycle_secs: Option<u32>,

    /// Write the effective configuration back to the file.
    #[arg(long)]
    save: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Clone)]
enum Cmd {
    /// Run the detection loop until interrupted (default).
    Run,
    /// Run one dispense cycle and exit.
    Dispense,
    /// Take a single distance reading.
    Distance,
    /// Capture and classify one frame without dispensing.
    Snapshot,
    /// Drive the servo step by step to tune duties and hold time.
    Calibrate {
        /// Steps to run in order.
        #[arg(value_enum, default_values_t = [Step::Open, Step::Close])]
        steps: Vec<Step>,
        /// Open duty (%) to try.
        #[arg(long)]
        open_duty: Option<f32>,
        /// Close duty (%) to try.
        #[arg(long)]
        close_duty: Option<f32>,
        /// Hold per direction (s) to try.
        #[arg(long)]
        rotation_secs: Option<f32>,
    },
    /// List the colours the classifier knows.
    Colors,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Open,
    Close,
    Stop,
}

impl From<Step> for CalibrationStep {
    fn from(step: Step) -> Self {
        match step {
            Step::Open => Self::Open,
            Step::Close => Self::Close,
            Step::Stop => Self::Stop,
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!("Feeder v{}", env!("CARGO_PKG_VERSION"));

    let command = cli.command.clone().unwrap_or(Cmd::Run);
    if let Cmd::Colors = command {
        for color in TargetColor::ALL {
            println!("{:<8} {} range(s)", color.name(), color.ranges().len());
        }
        return Ok(());
    }

    // ── 1. Configuration ──────────────────────────────────────
    let config = load_config(&cli)?;

    // ── 2. Hardware ───────────────────────────────────────────
    // Every remaining command can drive the servo. With the handler
    // installed, Ctrl-C lets the current sweep finish and the dispenser's
    // Drop park it instead of killing the process mid-rotation.
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context("installing signal handler")?;

    let lines = RpiLines::acquire().context("acquiring GPIO lines")?;
    let clock = SystemClock::new();
    let sensor = DistanceSensor::new(lines.trigger, lines.echo, StdDelay, clock);
    let servo = ContinuousServo::new(lines.servo, config.servo_stop_duty_pct);
    let dispenser = Dispenser::new(servo, StdDelay, DispenseTiming::from_config(&config));
    let mut hw = HardwareAdapter::new(sensor, dispenser);
    let mut camera = RpicamCapture::from_config(&config);

    // ── 3. Event sinks ────────────────────────────────────────
    let reporter = config.report_url.as_deref().and_then(|url| {
        HttpStatusReporter::spawn(url)
            .inspect_err(|e| warn!("Status reporting disabled: {}", e))
            .ok()
    });
    let mut sink = (LogEventSink::new(), reporter);

    // ── 4. Service ────────────────────────────────────────────
    let mut service = FeederService::new(config);
    service.start(&clock, &mut sink);

    let one_shot = match command {
        Cmd::Run => {
            info!("Entering detection loop (Ctrl-C to stop)");
            service.run(&mut hw, &mut camera, &clock, &mut sink, &cancel);
            return Ok(());
        }
        Cmd::Dispense => AppCommand::DispenseNow,
        Cmd::Distance => AppCommand::MeasureDistance,
        Cmd::Snapshot => AppCommand::Snapshot,
        Cmd::Calibrate {
            steps,
            open_duty,
            close_duty,
            rotation_secs,
        } => {
            let mut tuned = service.config().clone();
            if let Some(duty) = open_duty {
                tuned.servo_open_duty_pct = duty;
            }
            if let Some(duty) = close_duty {
                tuned.servo_close_duty_pct = duty;
            }
            if let Some(secs) = rotation_secs {
                tuned.rotation_secs = secs;
            }
            service
                .handle_command(
                    AppCommand::UpdateConfig(tuned.clone()),
                    &mut hw,
                    &mut camera,
                    &clock,
                    &mut sink,
                )
                .context("invalid calibration values")?;

            for step in steps {
                if cancel.is_cancelled() {
                    info!("Calibration interrupted");
                    break;
                }
                service.handle_command(
                    AppCommand::Calibrate(step.into()),
                    &mut hw,
                    &mut camera,
                    &clock,
                    &mut sink,
                )?;
                println!("{step:?} done");
            }
            println!(
                "open {:.2}% close {:.2}% stop {:.2}% hold {:.2}s",
                tuned.servo_open_duty_pct,
                tuned.servo_close_duty_pct,
                tuned.servo_stop_duty_pct,
                tuned.rotation_secs
            );
            if cli.save {
                let store = JsonConfigFile::new(&cli.config);
                store.save(&tuned).context("saving calibration")?;
                info!("Calibration saved to {}", store.path().display());
            }
            return Ok(());
        }
        Cmd::Colors => return Ok(()),
    };

    match service.handle_command(one_shot, &mut hw, &mut camera, &clock, &mut sink)? {
        CommandReply::Dispensed(ev) if ev.success => {
            println!("dispensed, food ~{:.0}%", ev.food_level_pct);
        }
        CommandReply::Dispensed(ev) => {
            let fault = ev.fault.map(|f| f.to_string()).unwrap_or_default();
            anyhow::bail!("dispense failed: {fault}");
        }
        CommandReply::Distance(reading) => println!("{reading}"),
        CommandReply::Classified(result) => println!(
            "{:.1}% {} ({} / {} px)",
            result.coverage_pct,
            service.profile().color(),
            result.matched_pixels,
            result.total_pixels
        ),
        CommandReply::ConfigApplied | CommandReply::Calibrated(_) => {}
    }
    Ok(())
}

/// Load the file, apply command-line overrides, validate, optionally save.
fn load_config(cli: &Cli) -> Result<FeederConfig> {
    let store = JsonConfigFile::new(&cli.config);
    let mut config = store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))?;

    if let Some(color) = &cli.color {
        config.target_color.clone_from(color);
    }
    if let Some(cycle) = cli.cycle_secs {
        config.cycle_secs = cycle;
    }
    config.validate().context("invalid configuration")?;

    // Calibration saves the tuned values itself.
    let calibrating = matches!(cli.command, Some(Cmd::Calibrate { .. }));
    if cli.save && !calibrating {
        store.save(&config).context("saving configuration")?;
    }
    Ok(config)
}
