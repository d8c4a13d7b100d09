//! Encrypted credential file.
//!
//! File layout: `nonce(12) || AES-256-GCM(JSON record)`. The key is
//! PBKDF2 over the account identity plus a discriminator, salted with an
//! application-wide constant, so the same account always re-derives it.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::identity::{IdentityProvider, OsAccountIdentity};
use crate::record::CredentialRecord;
use dmalock_common::{Error, Result};
use dmalock_crypto::{aead, derive_key, ContainerKey, Salt};

/// File name of the encrypted credential record.
pub const CREDENTIAL_FILENAME: &str = "config.enc";

/// Application-wide salt for the machine-bound key.
const STORE_SALT: Salt = Salt::from_bytes(*b"DMALockerV2Salt!");

/// Appended to the account identity before derivation.
const IDENTITY_DISCRIMINATOR: &str = "DMAv2";

/// Credential store bound to one file and one identity source.
pub struct CredentialStore<I: IdentityProvider = OsAccountIdentity> {
    path: PathBuf,
    identity: I,
}

impl CredentialStore<OsAccountIdentity> {
    /// Store at `path` keyed to the executing OS account.
    pub fn for_current_account(path: impl Into<PathBuf>) -> Self {
        Self::new(path, OsAccountIdentity)
    }
}

impl<I: IdentityProvider> CredentialStore<I> {
    /// Create a store at `path` using `identity` for key derivation.
    pub fn new(path: impl Into<PathBuf>, identity: I) -> Self {
        Self {
            path: path.into(),
            identity,
        }
    }

    /// Location of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a credential file exists, readable or not.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn machine_key(&self) -> Result<ContainerKey> {
        let identity = self.identity.identity()?;
        let material = Zeroizing::new(format!("{}{}", identity, IDENTITY_DISCRIMINATOR));
        derive_key(material.as_bytes(), &STORE_SALT)
    }

    /// Persist `record`, replacing any previous one.
    ///
    /// The blob is written to an owner-only temporary file in the same
    /// directory and renamed over the old record, so an interrupted save
    /// leaves the previous record intact.
    ///
    /// # Postconditions
    /// - Parent directories exist
    /// - The file holds a fresh nonce and the encrypted record
    ///
    /// # Errors
    /// - Identity lookup failure
    /// - I/O failure creating directories or writing the file
    pub fn save(&self, record: &CredentialRecord) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let key = self.machine_key()?;
        let json = Zeroizing::new(
            serde_json::to_vec(record).map_err(|e| Error::Serialization(e.to_string()))?,
        );
        let blob = aead::encrypt(key.as_bytes(), &json)?;

        // NamedTempFile is created with mode 0600 on unix.
        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(&blob)?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|e| Error::Io(e.error))?;

        info!("Credential record saved to {}", self.path.display());
        Ok(())
    }

    /// Load the record, or `None` when no usable record exists.
    ///
    /// Missing file, foreign identity, corruption and an empty password all
    /// mean "not configured".
    pub fn load(&self) -> Option<CredentialRecord> {
        match self.try_load() {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("No usable credential record at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Load the record or fail with `CredentialStoreUnavailable`.
    pub fn require(&self) -> Result<CredentialRecord> {
        self.try_load().map_err(|e| match e {
            Error::CredentialStoreUnavailable(_) => e,
            other => Error::CredentialStoreUnavailable(other.to_string()),
        })
    }

    fn try_load(&self) -> Result<CredentialRecord> {
        let blob = match fs::read(&self.path) {
            Ok(blob) => blob,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::CredentialStoreUnavailable(
                    "Setup has not been run".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let key = self.machine_key()?;
        let json = Zeroizing::new(aead::decrypt(key.as_bytes(), &blob)?);
        let record: CredentialRecord =
            serde_json::from_slice(&json).map_err(|e| Error::Serialization(e.to_string()))?;

        if record.password().is_empty() {
            return Err(Error::CredentialStoreUnavailable(
                "Stored password is empty".to_string(),
            ));
        }

        Ok(record)
    }

    /// Delete the credential file. Succeeds when it is already absent.
    pub fn reset(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Credential record removed from {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
