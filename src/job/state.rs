use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use serde::Serialize;

use crate::foundation::error::{ErrorKind, LyricError};

/// Unique identifier of a render job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// First eight hex digits, used in file and directory names.
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a render job.
///
/// Transitions are linear: `Pending -> Rasterizing -> Assembling -> Succeeded`, with `Failed`
/// reachable from every non-terminal state. Terminal states never change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, not started.
    #[default]
    Pending,
    /// Rendering verse frames.
    Rasterizing,
    /// Encoding and muxing.
    Assembling,
    /// Output published.
    Succeeded,
    /// Failed or cancelled.
    Failed,
}

impl JobStatus {
    /// Return `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Return `true` when moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Rasterizing)
                | (Rasterizing, Assembling)
                | (Assembling, Succeeded)
                | (Pending | Rasterizing | Assembling, Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Rasterizing => "rasterizing",
            Self::Assembling => "assembling",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Recorded cause of a failed job.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("{message}")]
pub struct JobFailure {
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable cause.
    pub message: String,
}

impl From<&LyricError> for JobFailure {
    fn from(e: &LyricError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Event delivered to channel subscribers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    /// Overall progress, `0..=100`, non-decreasing.
    Progress {
        /// Percent complete.
        percent: u8,
    },
    /// The job succeeded.
    Completed {
        /// Published output file.
        output: PathBuf,
    },
    /// The job failed or was cancelled.
    Failed(JobFailure),
}

impl JobEvent {
    /// Return `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Receives job notifications on the job's worker thread.
///
/// Exactly one of `on_complete`/`on_error` is called per subscriber, even when subscribing after
/// the job finished.
pub trait JobObserver: Send + Sync {
    /// Progress changed.
    fn on_progress(&self, _percent: u8) {}

    /// The job succeeded and `output` was published.
    fn on_complete(&self, _output: &Path) {}

    /// The job failed.
    fn on_error(&self, _failure: &JobFailure) {}
}

/// Forwards notifications into an mpsc channel as [`JobEvent`]s.
#[derive(Debug)]
pub struct ChannelObserver(Sender<JobEvent>);

impl ChannelObserver {
    /// Observer sending into `tx`. Send errors (dropped receiver) are ignored.
    pub fn new(tx: Sender<JobEvent>) -> Self {
        Self(tx)
    }
}

impl JobObserver for ChannelObserver {
    fn on_progress(&self, percent: u8) {
        let _ = self.0.send(JobEvent::Progress { percent });
    }

    fn on_complete(&self, output: &Path) {
        let _ = self.0.send(JobEvent::Completed {
            output: output.to_path_buf(),
        });
    }

    fn on_error(&self, failure: &JobFailure) {
        let _ = self.0.send(JobEvent::Failed(failure.clone()));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/state.rs"]
mod tests;
