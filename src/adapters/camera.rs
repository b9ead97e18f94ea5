//! Still-capture adapter.
//!
//! Implements the [`Camera`] port by running the Raspberry Pi still-capture
//! utility as a child process and decoding the file it writes:
//!
//! ```text
//! rpicam-still -o capture.jpg -t 1 --width 640 --height 480 --immediate -n
//! ```
//!
//! The child is bounded by a hard deadline and killed if it overruns. The
//! output file is a fixed scratch path inside the capture directory; it is
//! removed before each run so a stale frame can never be classified twice.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::app::ports::Camera;
use crate::config::FeederConfig;
use crate::error::CaptureError;
use crate::vision::CapturedFrame;

/// Scratch file name inside the capture directory.
pub const CAPTURE_FILE: &str = "capture.jpg";

/// How often the child is polled while waiting for it to exit.
const WAIT_POLL: Duration = Duration::from_millis(20);

pub struct RpicamCapture {
    program: String,
    dir: PathBuf,
    width: u32,
    height: u32,
    timeout: Duration,
}

impl RpicamCapture {
    pub fn new(program: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            dir: dir.into(),
            width: 640,
            height: 480,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &FeederConfig) -> Self {
        Self {
            program: config.capture_program.clone(),
            dir: PathBuf::from(&config.capture_dir),
            width: config.capture_width,
            height: config.capture_height,
            timeout: Duration::from_secs(u64::from(config.capture_timeout_secs)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where the most recent frame is written.
    pub fn output_path(&self) -> PathBuf {
        self.dir.join(CAPTURE_FILE)
    }

    /// Arguments passed to the utility. The output path is relative to the
    /// capture directory, which is the child's working directory.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-o".into(),
            CAPTURE_FILE.into(),
            "-t".into(),
            "1".into(),
            "--width".into(),
            self.width.to_string(),
            "--height".into(),
            self.height.to_string(),
            "--immediate".into(),
            "-n".into(),
        ]
    }

    fn run_tool(&self) -> Result<(), CaptureError> {
        let child = Command::new(&self.program)
            .args(self.args())
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                warn!("capture: cannot start '{}': {}", self.program, e);
                if e.kind() == io::ErrorKind::NotFound {
                    CaptureError::ToolNotFound
                } else {
                    CaptureError::SpawnFailed
                }
            })?;
        wait_with_deadline(child, self.timeout)
    }
}

impl Camera for RpicamCapture {
    fn capture(&mut self) -> Result<CapturedFrame, CaptureError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            warn!("capture: cannot create {}: {}", self.dir.display(), e);
            CaptureError::SpawnFailed
        })?;
        let out = self.output_path();
        remove_stale(&out);

        let started = Instant::now();
        self.run_tool()?;
        debug!("capture: {} written in {:?}", out.display(), started.elapsed());

        decode(&out)
    }

    fn reconfigure(&mut self, config: &FeederConfig) {
        *self = Self::from_config(config);
        debug!(
            "capture: now {}x{} via '{}', {:?} limit",
            self.width, self.height, self.program, self.timeout
        );
    }
}

/// Wait for `child` to exit, killing it once `timeout` elapses.
pub fn wait_with_deadline(mut child: Child, timeout: Duration) -> Result<(), CaptureError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => return Err(CaptureError::ExitStatus(status.code())),
            Ok(None) => {}
            Err(e) => {
                warn!("capture: wait failed: {}", e);
                kill(&mut child);
                return Err(CaptureError::SpawnFailed);
            }
        }
        if Instant::now() >= deadline {
            warn!("capture: no result after {:?}, killing", timeout);
            kill(&mut child);
            return Err(CaptureError::Timeout);
        }
        thread::sleep(WAIT_POLL);
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    // Reap so no zombie is left behind.
    let _ = child.wait();
}

fn remove_stale(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("capture: cannot remove stale {}: {}", path.display(), e);
        }
    }
}

fn decode(path: &Path) -> Result<CapturedFrame, CaptureError> {
    let img = image::open(path).map_err(|e| {
        warn!("capture: cannot decode {}: {}", path.display(), e);
        CaptureError::DecodeFailed
    })?;
    Ok(CapturedFrame::new(img.to_rgb8()))
}
