//! Orchestration of setup, lock, unlock and status.

use std::path::Path;
use tracing::{info, warn};

use crate::paths::{base_dir, credential_path, settings_path};
use crate::settings::Settings;
use dmalock_common::{Error, LockMode, Result};
use dmalock_credentials::{CredentialRecord, CredentialStore, IdentityProvider, OsAccountIdentity};
use dmalock_otp::{provision, Provisioning, SecondFactorGate};
use dmalock_pipeline::{inventory, spawn, BatchHandle, BatchJob, Inventory};

/// What `status` reports for a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStatus {
    pub inventory: Inventory,
    /// A usable credential record exists.
    pub configured: bool,
    /// Unlock will ask for a one-time code.
    pub second_factor: bool,
}

/// Entry point for every user-facing operation.
///
/// Lock and unlock use the password on record; the user never types it
/// per batch. Unlock is additionally guarded by the one-time code when a
/// second-factor secret is enrolled.
pub struct Locker<I: IdentityProvider = OsAccountIdentity> {
    store: CredentialStore<I>,
    settings: Settings,
}

impl Locker<OsAccountIdentity> {
    /// Open the locker for the current OS account at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if no base directory can be resolved or the
    /// settings file is unreadable.
    pub fn open() -> Result<Self> {
        let base = base_dir()?;
        let settings = Settings::load(&settings_path(&base))?;
        let store = CredentialStore::for_current_account(credential_path(&base));
        Ok(Self::new(store, settings))
    }
}

impl<I: IdentityProvider> Locker<I> {
    pub fn new(store: CredentialStore<I>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &CredentialStore<I> {
        &self.store
    }

    /// Whether a usable credential record exists.
    pub fn is_configured(&self) -> bool {
        self.store.load().is_some()
    }

    /// Enroll a password and a fresh second-factor secret.
    ///
    /// Replaces any existing record. The returned provisioning carries the
    /// enrollment URI to show the user once.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the password is empty or the confirmation differs
    /// - `Io` / `Crypto` if the record cannot be written
    pub fn setup(&self, password: &str, confirm: &str) -> Result<Provisioning> {
        if password.is_empty() {
            return Err(Error::InvalidInput("password cannot be empty".to_string()));
        }
        if password != confirm {
            return Err(Error::InvalidInput("passwords do not match".to_string()));
        }

        let provisioning = provision(&self.settings.totp_issuer, &self.settings.totp_account);
        let record = CredentialRecord::new(password, provisioning.secret_base32());
        self.store.save(&record)?;

        info!(
            "Second factor provisioned for {}:{}",
            self.settings.totp_issuer, self.settings.totp_account
        );
        Ok(provisioning)
    }

    /// Start locking every plaintext file under `directory`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialStoreUnavailable` before anything is touched if
    /// setup has not run.
    pub fn lock(&self, directory: &Path) -> Result<BatchHandle> {
        let record = self.store.require()?;
        Ok(self.start(&record, directory, LockMode::Lock))
    }

    /// Start unlocking every container under `directory`.
    ///
    /// `code` is required when a second factor is enrolled and ignored
    /// otherwise.
    ///
    /// # Errors
    ///
    /// - `CredentialStoreUnavailable` if setup has not run
    /// - `SecondFactorRejected` for a missing, wrong or expired code
    pub fn unlock(&self, directory: &Path, code: Option<&str>) -> Result<BatchHandle> {
        let record = self.store.require()?;

        if record.has_second_factor() {
            let gate = SecondFactorGate::new(record.totp_secret())?
                .with_skew_steps(self.settings.totp_skew_steps);
            let code = code.ok_or(Error::SecondFactorRejected)?;
            if let Err(e) = gate.check(code) {
                warn!("Unlock of {} refused: {}", directory.display(), e);
                return Err(e);
            }
        }

        Ok(self.start(&record, directory, LockMode::Unlock))
    }

    /// Whether unlock will ask for a code.
    pub fn requires_second_factor(&self) -> bool {
        self.store
            .load()
            .map(|record| record.has_second_factor())
            .unwrap_or(false)
    }

    /// Count what `directory` holds without changing anything.
    pub fn status(&self, directory: &Path) -> Result<FolderStatus> {
        let record = self.store.load();
        Ok(FolderStatus {
            inventory: inventory(directory)?,
            configured: record.is_some(),
            second_factor: record.map(|r| r.has_second_factor()).unwrap_or(false),
        })
    }

    /// Forget the enrolled credentials.
    pub fn reset(&self) -> Result<()> {
        self.store.reset()
    }

    fn start(&self, record: &CredentialRecord, directory: &Path, mode: LockMode) -> BatchHandle {
        let job = BatchJob::new(directory, record.password(), mode)
            .with_removal(self.settings.removal);
        spawn(job)
    }
}
