use std::path::PathBuf;
use std::sync::mpsc::{Receiver, channel};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{ErrorKind, LyricError, LyricResult};
use crate::job::state::{ChannelObserver, JobEvent, JobFailure, JobId, JobObserver, JobStatus};

/// Final result of a job.
pub type JobOutcome = Result<PathBuf, JobFailure>;

#[derive(Default)]
struct Inner {
    status: JobStatus,
    progress: u8,
    outcome: Option<JobOutcome>,
    observers: Vec<Arc<dyn JobObserver>>,
}

/// State shared between a job's worker thread and its handles.
#[derive(Default)]
pub(crate) struct JobShared {
    inner: Mutex<Inner>,
    // Serializes observer notifications so every observer sees events in order.
    emit: Mutex<()>,
    done: Condvar,
}

impl JobShared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_emit(&self) -> MutexGuard<'_, ()> {
        self.emit.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn status(&self) -> JobStatus {
        self.lock().status
    }

    pub(crate) fn advance(&self, next: JobStatus) -> LyricResult<()> {
        let mut inner = self.lock();
        if !inner.status.can_advance_to(next) || next.is_terminal() {
            return Err(LyricError::Other(anyhow::anyhow!(
                "illegal job transition {} -> {next}",
                inner.status
            )));
        }
        tracing::debug!(from = %inner.status, to = %next, "job status");
        inner.status = next;
        Ok(())
    }

    /// Raise progress to `percent`. Lower values and updates after completion are ignored.
    pub(crate) fn report_progress(&self, percent: u8) {
        let _emit = self.lock_emit();
        let observers = {
            let mut inner = self.lock();
            let percent = percent.min(100);
            if inner.status.is_terminal() || percent <= inner.progress {
                return;
            }
            inner.progress = percent;
            inner.observers.clone()
        };
        for o in &observers {
            o.on_progress(percent);
        }
    }

    /// Move to a terminal state and notify every subscriber once.
    pub(crate) fn finish(&self, outcome: JobOutcome) {
        let _emit = self.lock_emit();
        let observers = {
            let mut inner = self.lock();
            if inner.status.is_terminal() {
                return;
            }
            if outcome.is_ok() {
                inner.status = JobStatus::Succeeded;
                inner.progress = 100;
            } else {
                inner.status = JobStatus::Failed;
            }
            inner.outcome = Some(outcome.clone());
            std::mem::take(&mut inner.observers)
        };
        self.done.notify_all();

        if outcome.is_ok() {
            for o in &observers {
                o.on_progress(100);
            }
        }
        for o in &observers {
            notify_terminal(o.as_ref(), &outcome);
        }
    }

    fn subscribe(&self, observer: Arc<dyn JobObserver>) {
        let outcome = {
            let mut inner = self.lock();
            match inner.outcome.clone() {
                Some(outcome) => outcome,
                None => {
                    inner.observers.push(observer);
                    return;
                }
            }
        };
        notify_terminal(observer.as_ref(), &outcome);
    }

    fn wait(&self, timeout: Option<Duration>) -> Option<JobOutcome> {
        let mut inner = self.lock();
        match timeout {
            None => {
                while inner.outcome.is_none() {
                    inner = self.done.wait(inner).unwrap_or_else(|e| e.into_inner());
                }
            }
            Some(t) => {
                let (guard, _) = self
                    .done
                    .wait_timeout_while(inner, t, |i| i.outcome.is_none())
                    .unwrap_or_else(|e| e.into_inner());
                inner = guard;
            }
        }
        inner.outcome.clone()
    }
}

fn notify_terminal(observer: &dyn JobObserver, outcome: &JobOutcome) {
    match outcome {
        Ok(path) => observer.on_complete(path),
        Err(failure) => observer.on_error(failure),
    }
}

/// Caller-side view of a submitted job. Cheap to clone.
#[derive(Clone)]
pub struct JobHandle {
    id: JobId,
    shared: Arc<JobShared>,
    cancel: CancelToken,
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("progress", &self.progress())
            .finish()
    }
}

impl JobHandle {
    pub(crate) fn new(id: JobId, shared: Arc<JobShared>, cancel: CancelToken) -> Self {
        Self { id, shared, cancel }
    }

    /// Job identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Current lifecycle state.
    pub fn status(&self) -> JobStatus {
        self.shared.status()
    }

    /// Current progress, `0..=100`.
    pub fn progress(&self) -> u8 {
        self.shared.lock().progress
    }

    /// Return `true` once the job reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Register `observer`. A job that already finished replays its terminal event immediately.
    pub fn subscribe(&self, observer: Arc<dyn JobObserver>) {
        self.shared.subscribe(observer);
    }

    /// Subscribe through a channel.
    pub fn events(&self) -> Receiver<JobEvent> {
        let (tx, rx) = channel();
        self.subscribe(Arc::new(ChannelObserver::new(tx)));
        rx
    }

    /// Request cancellation. The job fails with `Cancelled` at its next checkpoint.
    pub fn cancel(&self) {
        tracing::info!(job = %self.id, "cancel requested");
        self.cancel.cancel();
    }

    /// Block until the job finishes.
    pub fn wait(&self) -> JobOutcome {
        match self.shared.wait(None) {
            Some(outcome) => outcome,
            None => Err(JobFailure {
                kind: ErrorKind::Internal,
                message: "job ended without an outcome".to_owned(),
            }),
        }
    }

    /// Block until the job finishes or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<JobOutcome> {
        self.shared.wait(Some(timeout))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/handle.rs"]
mod tests;
