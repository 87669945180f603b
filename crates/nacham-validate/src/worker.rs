//! Background validation thread.
//!
//! The scan is synchronous; [`ValidationWorker`] moves it off the caller's
//! thread and reports back over a channel: any number of
//! [`WorkerEvent::Progress`] followed by exactly one terminal event per
//! request: [`WorkerEvent::Done`] when it ran, [`WorkerEvent::Superseded`]
//! when a newer submission made it stale before it started. There is no
//! cancellation of a running scan. [`ValidationWorker::recv_latest`] drops
//! events for stale tokens.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use nacham_error::{NachamError, Result};
use tracing::{debug, info};

use crate::engine::validate_text;
use crate::options::ValidationOptions;
use crate::profile::Profile;
use crate::report::ValidationReport;

/// Correlates events with the request that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// Input of one validation run.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// Decoded, compacted file text.
    pub text: String,
    pub options: ValidationOptions,
    pub profile: Arc<Profile>,
}

impl ValidationRequest {
    #[must_use]
    pub fn new(text: impl Into<String>, options: ValidationOptions, profile: Arc<Profile>) -> Self {
        Self {
            text: text.into(),
            options,
            profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Progress { token: RequestToken, pct: u8 },
    Done {
        token: RequestToken,
        report: Box<ValidationReport>,
    },
    /// Skipped without running; a newer request was queued.
    Superseded { token: RequestToken },
}

impl WorkerEvent {
    #[must_use]
    pub const fn token(&self) -> RequestToken {
        match self {
            Self::Progress { token, .. }
            | Self::Done { token, .. }
            | Self::Superseded { token } => *token,
        }
    }
}

struct Job {
    token: RequestToken,
    request: ValidationRequest,
}

/// Handle to the background validation thread.
pub struct ValidationWorker {
    jobs: Option<Sender<Job>>,
    events: Receiver<WorkerEvent>,
    latest: Arc<AtomicU64>,
    next_token: u64,
    handle: Option<JoinHandle<()>>,
}

impl ValidationWorker {
    /// Start the worker thread.
    pub fn spawn() -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (event_tx, event_rx) = mpsc::channel();
        let latest = Arc::new(AtomicU64::new(0));
        let thread_latest = Arc::clone(&latest);

        let handle = thread::Builder::new()
            .name("nacham-validate".to_owned())
            .spawn(move || run_jobs(&job_rx, &event_tx, &thread_latest))?;

        Ok(Self {
            jobs: Some(job_tx),
            events: event_rx,
            latest,
            next_token: 0,
            handle: Some(handle),
        })
    }

    /// Queue a request; it supersedes every earlier one.
    pub fn submit(&mut self, request: ValidationRequest) -> Result<RequestToken> {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.latest.store(token.0, Ordering::Release);
        let jobs = self.jobs.as_ref().ok_or(NachamError::WorkerGone)?;
        jobs.send(Job { token, request })
            .map_err(|_| NachamError::WorkerGone)?;
        debug!(token = token.0, "validation request queued");
        Ok(token)
    }

    /// Token of the most recent submission.
    #[must_use]
    pub fn latest(&self) -> Option<RequestToken> {
        match self.latest.load(Ordering::Acquire) {
            0 => None,
            token => Some(RequestToken(token)),
        }
    }

    /// Next event, whatever request it belongs to.
    pub fn recv(&self) -> Result<WorkerEvent> {
        self.events.recv().map_err(|_| NachamError::WorkerGone)
    }

    /// Next event of the latest request; stale events are dropped.
    pub fn recv_latest(&self) -> Result<WorkerEvent> {
        loop {
            let event = self.recv()?;
            if Some(event.token()) == self.latest() {
                return Ok(event);
            }
        }
    }

    /// Block until `token` is done, forwarding its progress.
    ///
    /// Fails with [`NachamError::Superseded`] when the worker skipped the
    /// request in favour of a newer one.
    pub fn wait<P>(&self, token: RequestToken, mut on_progress: P) -> Result<ValidationReport>
    where
        P: FnMut(u8),
    {
        loop {
            match self.recv()? {
                WorkerEvent::Progress { token: t, pct } if t == token => on_progress(pct),
                WorkerEvent::Done { token: t, report } if t == token => return Ok(*report),
                WorkerEvent::Superseded { token: t } if t == token => {
                    return Err(NachamError::Superseded { token: token.0 });
                }
                _ => {}
            }
        }
    }

    /// Submit and wait in one call.
    pub fn validate<P>(&mut self, request: ValidationRequest, on_progress: P) -> Result<ValidationReport>
    where
        P: FnMut(u8),
    {
        let token = self.submit(request)?;
        self.wait(token, on_progress)
    }
}

impl Drop for ValidationWorker {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_jobs(jobs: &Receiver<Job>, events: &Sender<WorkerEvent>, latest: &AtomicU64) {
    for Job { token, request } in jobs {
        if token.0 < latest.load(Ordering::Acquire) {
            debug!(token = token.0, "skipping superseded request");
            if events.send(WorkerEvent::Superseded { token }).is_err() {
                break;
            }
            continue;
        }
        let report = validate_text(&request.text, &request.options, &request.profile, |pct| {
            let _ = events.send(WorkerEvent::Progress { token, pct });
        });
        info!(
            token = token.0,
            records = report.record_count(),
            error_lines = report.error_line_count(),
            "validation finished"
        );
        let done = WorkerEvent::Done {
            token,
            report: Box::new(report),
        };
        if events.send(done).is_err() {
            break;
        }
    }
}
