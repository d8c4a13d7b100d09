//! Synchronous batch execution.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::events::{
    percent, BatchEvent, BatchOutcome, BatchReport, FileReport, FileStatus,
};
use crate::job::BatchJob;
use crate::removal::{remove_original, Removal, RemovalPolicy};
use crate::walk::{collect_targets, WalkEntry};
use dmalock_common::types::{container_path_for, original_path_for};
use dmalock_common::{Error, LockMode, Password, Result};

/// Encrypt one file into a sibling container and remove the original.
///
/// Returns the container path and how the original was removed.
///
/// # Postconditions
/// - On success `<path>.dma` holds a container and `path` is gone
/// - On failure before the container is written, nothing changes
///
/// # Errors
/// - `Io` if the file cannot be read, the container cannot be written, or
///   the original cannot be removed
pub fn lock_file(
    path: &Path,
    password: &Password,
    policy: RemovalPolicy,
) -> Result<(PathBuf, Removal)> {
    let plaintext = Zeroizing::new(fs::read(path)?);
    let sealed = dmalock_crypto::encrypt(&plaintext, password.as_bytes())?;

    let output = container_path_for(path);
    fs::write(&output, sealed)?;
    let removal = remove_original(path, policy)?;

    Ok((output, removal))
}

/// Decrypt one container back to its original name and delete it.
///
/// Missing parent directories of the output are created. The container
/// is always deleted permanently.
///
/// # Errors
/// - `MalformedContainer` for short input or a foreign magic
/// - `AuthenticationFailure` for a wrong password or tampered data
/// - `Io` on read, write or delete failure
///
/// In every error case the container is left in place.
pub fn unlock_file(path: &Path, password: &Password) -> Result<(PathBuf, Removal)> {
    let output = original_path_for(path).ok_or_else(|| {
        Error::InvalidInput(format!("{} is not a container name", path.display()))
    })?;

    let sealed = fs::read(path)?;
    let plaintext = Zeroizing::new(dmalock_crypto::decrypt(&sealed, password.as_bytes())?);

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, &*plaintext)?;
    fs::remove_file(path)?;

    Ok((output, Removal::Deleted))
}

fn transform(job: &BatchJob, path: &Path) -> Result<(PathBuf, Removal)> {
    match job.mode() {
        LockMode::Lock => lock_file(path, job.password(), job.removal()),
        LockMode::Unlock => unlock_file(path, job.password()),
    }
}

fn prepare(job: &BatchJob) -> Result<Vec<WalkEntry>> {
    if job.password().is_empty() {
        return Err(Error::InvalidInput("password must not be empty".to_string()));
    }
    collect_targets(job.target_directory(), job.mode())
}

fn finish_message(mode: LockMode, outcome: &BatchOutcome) -> String {
    match (mode, outcome) {
        (LockMode::Lock, BatchOutcome::Completed { processed: 0 }) => {
            "Nothing to do: no files to lock".to_string()
        }
        (LockMode::Unlock, BatchOutcome::Completed { processed: 0 }) => {
            "Nothing to do: no locked files found".to_string()
        }
        _ => outcome.to_string(),
    }
}

/// Run a whole batch on the calling thread.
///
/// Files are handled one at a time in walk order. A failing file is
/// reported and skipped; it never stops the batch. `cancel` is checked
/// before each file, so a file already in progress always finishes.
///
/// `emit` receives one `Started`, one `Progress` per handled file, and
/// exactly one `Finished`, in that order.
pub fn run_blocking<F>(job: &BatchJob, cancel: &CancellationToken, mut emit: F) -> BatchReport
where
    F: FnMut(BatchEvent),
{
    let started = Instant::now();
    let mode = job.mode();
    let root = job.target_directory().to_path_buf();

    info!(batch = %job.id(), "Starting {} of {}", mode, root.display());
    emit(BatchEvent::Started {
        id: job.id().clone(),
        mode,
    });

    let mut files = Vec::new();
    let outcome = match prepare(job) {
        Ok(targets) => process(job, targets, cancel, &mut emit, &mut files),
        Err(e) => {
            warn!(batch = %job.id(), "Batch could not start: {}", e);
            BatchOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };

    let message = finish_message(mode, &outcome);
    info!(batch = %job.id(), "{}", message);
    emit(BatchEvent::Finished {
        success: outcome.is_success(),
        message,
        outcome: outcome.clone(),
    });

    BatchReport {
        id: job.id().clone(),
        mode,
        root,
        files,
        outcome,
        elapsed: started.elapsed(),
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) if relative.as_os_str().is_empty() => PathBuf::from("."),
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

fn process<F>(
    job: &BatchJob,
    targets: Vec<WalkEntry>,
    cancel: &CancellationToken,
    emit: &mut F,
    files: &mut Vec<FileReport>,
) -> BatchOutcome
where
    F: FnMut(BatchEvent),
{
    let total = targets.len();
    let root = job.target_directory();
    let mode = job.mode();
    let mut failed = 0;

    for (index, entry) in targets.into_iter().enumerate() {
        if cancel.is_cancelled() {
            info!(batch = %job.id(), "Cancelled with {} file(s) left", total - index);
            return BatchOutcome::Cancelled {
                processed: index,
                remaining: total - index,
            };
        }

        let relative_path = relative_to(root, entry.path());
        let result = match entry {
            WalkEntry::File(path) => transform(job, &path).map_err(|e| {
                warn!("{} failed for {}: {}", mode.verb(), path.display(), e);
                e
            }),
            WalkEntry::Unreadable { error, .. } => Err(error),
        };
        let status = match result {
            Ok((output, removal)) => {
                debug!("{} {} -> {}", mode.verb(), relative_path.display(), output.display());
                FileStatus::Done { output, removal }
            }
            Err(e) => {
                failed += 1;
                FileStatus::Failed {
                    kind: (&e).into(),
                    reason: e.to_string(),
                }
            }
        };

        let report = FileReport {
            relative_path,
            status,
        };
        let done = index + 1;
        emit(BatchEvent::Progress {
            done,
            total,
            percent: percent(done, total),
            message: report.status_line(mode),
            file: report.clone(),
        });
        files.push(report);
    }

    if failed == 0 {
        BatchOutcome::Completed { processed: total }
    } else {
        BatchOutcome::CompletedWithErrors {
            processed: total - failed,
            failed,
        }
    }
}
