//! Common error types for DMA Locker.

use thiserror::Error;

/// Top-level error type for DMA Locker operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Container is too short or carries an unknown magic. Never decrypted.
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// Authentication tag did not verify.
    ///
    /// A wrong password and a tampered ciphertext are indistinguishable here.
    #[error("Authentication failed: wrong password or corrupted container")]
    AuthenticationFailure,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No valid credential record could be loaded.
    #[error("Credential store unavailable: {0}")]
    CredentialStoreUnavailable(String),

    /// Submitted one-time code did not match.
    #[error("Second factor rejected")]
    SecondFactorRejected,

    /// Cryptographic primitive misuse (bad key length and the like).
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Background worker failed outside the per-file error path.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error only concerns a single file of a batch.
    ///
    /// Per-file errors are recorded by the pipeline and never abort a run.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Error::MalformedContainer(_) | Error::AuthenticationFailure | Error::Io(_)
        )
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
