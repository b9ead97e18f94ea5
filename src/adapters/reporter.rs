//! HTTP status reporter.
//!
//! Implements [`EventSink`] for [`AppEvent::Report`]: each report is queued
//! on a bounded channel and POSTed as JSON by a dedicated worker thread.
//! The control loop never waits on the network. A full queue drops the
//! report with a warning; transport errors and non-2xx replies are logged
//! and not retried. Shutdown waits at most [`SHUTDOWN_GRACE`] for the
//! worker; reports still queued at that point are discarded unsent.
//!
//! ```text
//!  control loop ──try_send──▶ [queue: 4] ──▶ worker ──POST──▶ status URL
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::app::events::{AppEvent, StatusReport};
use crate::app::ports::EventSink;
use crate::error::ReportError;

/// Reports buffered while the worker is busy.
pub const QUEUE_DEPTH: usize = 4;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest `drop` waits for an in-flight request.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

const JOIN_POLL: Duration = Duration::from_millis(10);

pub struct HttpStatusReporter {
    tx: Option<SyncSender<StatusReport>>,
    worker: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    dropped: u32,
}

impl HttpStatusReporter {
    /// Build the HTTP client and start the worker thread.
    pub fn spawn(url: impl Into<String>) -> Result<Self, ReportError> {
        Self::spawn_with_timeout(url, REQUEST_TIMEOUT)
    }

    pub fn spawn_with_timeout(
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReportError> {
        let url = url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                warn!("report: cannot build HTTP client: {}", e);
                ReportError::Transport
            })?;

        let (tx, rx) = sync_channel(QUEUE_DEPTH);
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = shutdown.clone();
        info!("report: posting status to {}", url);
        let worker = thread::Builder::new()
            .name("status-report".into())
            .spawn(move || worker_loop(&client, &url, &rx, &stop))
            .map_err(|_| ReportError::WorkerGone)?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            shutdown,
            dropped: 0,
        })
    }

    /// Queue a report without blocking.
    pub fn submit(&mut self, report: StatusReport) -> Result<(), ReportError> {
        let tx = self.tx.as_ref().ok_or(ReportError::WorkerGone)?;
        tx.try_send(report).map_err(|e| {
            self.dropped = self.dropped.saturating_add(1);
            match e {
                TrySendError::Full(_) => ReportError::QueueFull,
                TrySendError::Disconnected(_) => ReportError::WorkerGone,
            }
        })
    }

    /// Reports dropped because the queue was full or the worker had exited.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl EventSink for HttpStatusReporter {
    fn emit(&mut self, event: &AppEvent) {
        if let AppEvent::Report(report) = event {
            if let Err(e) = self.submit(*report) {
                warn!("report: dropped ({})", e);
            }
        }
    }
}

impl Drop for HttpStatusReporter {
    fn drop(&mut self) {
        // The worker discards what is left once the flag is up and exits
        // when the channel closes.
        self.shutdown.store(true, Ordering::SeqCst);
        self.tx.take();
        let Some(worker) = self.worker.take() else {
            return;
        };

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while !worker.is_finished() {
            if Instant::now() >= deadline {
                warn!("report: worker still busy after {:?}, detaching", SHUTDOWN_GRACE);
                return;
            }
            thread::sleep(JOIN_POLL);
        }
        if worker.join().is_err() {
            warn!("report: worker panicked");
        }
    }
}

fn worker_loop(
    client: &reqwest::blocking::Client,
    url: &str,
    rx: &Receiver<StatusReport>,
    shutdown: &AtomicBool,
) {
    let mut discarded = 0u32;
    for report in rx {
        if shutdown.load(Ordering::SeqCst) {
            discarded += 1;
            continue;
        }
        match post(client, url, &report) {
            Ok(()) => debug!("report: delivered {:?}", report),
            Err(e) => warn!("report: {}", e),
        }
    }
    if discarded > 0 {
        debug!("report: {} queued report(s) discarded at shutdown", discarded);
    }
    debug!("report: worker exiting");
}

fn post(
    client: &reqwest::blocking::Client,
    url: &str,
    report: &StatusReport,
) -> Result<(), ReportError> {
    let resp = client.post(url).json(report).send().map_err(|e| {
        debug!("report: transport error: {}", e);
        ReportError::Transport
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ReportError::Status(status.as_u16()));
    }
    Ok(())
}
