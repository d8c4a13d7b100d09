//! Events, per-file reports and aggregate outcomes of a batch.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::job::BatchId;
use crate::removal::Removal;
use dmalock_common::{Error, LockMode};

/// Why a single file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Not a recognizable container; never decrypted.
    MalformedContainer,
    /// Wrong password or tampered data.
    AuthenticationFailure,
    /// Read, write or removal failed.
    Io,
    /// Anything else the transform raised.
    Other,
}

impl From<&Error> for FailureKind {
    fn from(error: &Error) -> Self {
        match error {
            Error::MalformedContainer(_) => FailureKind::MalformedContainer,
            Error::AuthenticationFailure => FailureKind::AuthenticationFailure,
            Error::Io(_) => FailureKind::Io,
            _ => FailureKind::Other,
        }
    }
}

/// Result of transforming one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Output written and source removed.
    Done { output: PathBuf, removal: Removal },
    /// Source left as it was.
    Failed { kind: FailureKind, reason: String },
}

/// Per-file entry of a batch report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Source path relative to the batch root.
    pub relative_path: PathBuf,
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_done(&self) -> bool {
        matches!(self.status, FileStatus::Done { .. })
    }

    /// Status line shown to the user.
    pub fn status_line(&self, mode: LockMode) -> String {
        match &self.status {
            FileStatus::Done { .. } => {
                format!("{}: {}", mode.verb(), self.relative_path.display())
            }
            FileStatus::Failed { reason, .. } => {
                format!("FAIL: {} -> {}", self.relative_path.display(), reason)
            }
        }
    }
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every selected file was transformed. `processed` is zero when there
    /// was nothing to do.
    Completed { processed: usize },
    /// The run reached the end but some files failed.
    CompletedWithErrors { processed: usize, failed: usize },
    /// The run could not start (bad root, empty password).
    Failed { reason: String },
    /// Stopped between files on request.
    Cancelled { processed: usize, remaining: usize },
}

impl BatchOutcome {
    /// Only a clean completion counts as success.
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Completed { .. })
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Completed { processed: 0 } => write!(f, "Nothing to do"),
            BatchOutcome::Completed { processed } => {
                write!(f, "Done: {} file(s) processed", processed)
            }
            BatchOutcome::CompletedWithErrors { processed, failed } => write!(
                f,
                "Finished with errors: {} of {} file(s) failed",
                failed,
                processed + failed
            ),
            BatchOutcome::Failed { reason } => write!(f, "Failed: {}", reason),
            BatchOutcome::Cancelled {
                processed,
                remaining,
            } => write!(
                f,
                "Cancelled after {} file(s), {} left untouched",
                processed, remaining
            ),
        }
    }
}

/// Lifecycle state of a batch.
///
/// `Idle -> Running -> {Completed | Failed | Cancelled}`; a run that
/// finishes with per-file errors still ends in `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchState::Idle | BatchState::Running)
    }
}

impl From<&BatchOutcome> for BatchState {
    fn from(outcome: &BatchOutcome) -> Self {
        match outcome {
            BatchOutcome::Completed { .. } | BatchOutcome::CompletedWithErrors { .. } => {
                BatchState::Completed
            }
            BatchOutcome::Failed { .. } => BatchState::Failed,
            BatchOutcome::Cancelled { .. } => BatchState::Cancelled,
        }
    }
}

/// Notification emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// The worker picked the job up.
    Started { id: BatchId, mode: LockMode },
    /// One file was handled, successfully or not.
    Progress {
        done: usize,
        total: usize,
        /// `done * 100 / total`, truncated.
        percent: u8,
        /// Status line for the file just handled.
        message: String,
        file: FileReport,
    },
    /// Always the last event of a batch, emitted exactly once.
    Finished {
        success: bool,
        message: String,
        outcome: BatchOutcome,
    },
}

/// Everything a finished batch produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub id: BatchId,
    pub mode: LockMode,
    pub root: PathBuf,
    pub files: Vec<FileReport>,
    pub outcome: BatchOutcome,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_done()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    /// Originals moved to the OS trash rather than deleted.
    pub fn trashed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| {
                matches!(
                    f.status,
                    FileStatus::Done {
                        removal: Removal::Trashed,
                        ..
                    }
                )
            })
            .count()
    }
}

/// Integer percentage of `done` over `total`; an empty batch reads as complete.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
