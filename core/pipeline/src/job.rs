//! Batch job description.

use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::removal::RemovalPolicy;
use dmalock_common::{LockMode, Password};

/// Identifier of one batch run, used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchId(String);

impl BatchId {
    /// Generate a new unique batch id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One lock or unlock invocation over a directory.
///
/// The password is never checked up front; each container either
/// decrypts with it or fails on its own.
#[derive(Debug, Clone)]
pub struct BatchJob {
    id: BatchId,
    target_directory: PathBuf,
    password: Password,
    mode: LockMode,
    removal: RemovalPolicy,
}

impl BatchJob {
    /// Create a job with the default removal policy.
    pub fn new(target_directory: impl Into<PathBuf>, password: Password, mode: LockMode) -> Self {
        Self {
            id: BatchId::new(),
            target_directory: target_directory.into(),
            password,
            mode,
            removal: RemovalPolicy::default(),
        }
    }

    /// Set how originals are removed after locking.
    pub fn with_removal(mut self, removal: RemovalPolicy) -> Self {
        self.removal = removal;
        self
    }

    pub fn id(&self) -> &BatchId {
        &self.id
    }

    pub fn target_directory(&self) -> &Path {
        &self.target_directory
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn removal(&self) -> RemovalPolicy {
        self.removal
    }
}
