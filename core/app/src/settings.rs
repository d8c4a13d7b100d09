//! User settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use dmalock_common::{Error, Result};
use dmalock_otp::{DEFAULT_SKEW_STEPS, MAX_SKEW_STEPS};
use dmalock_pipeline::RemovalPolicy;

/// Tunables read from `settings.json`. Every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How originals are removed after locking.
    pub removal: RemovalPolicy,
    /// Issuer shown by authenticator apps.
    pub totp_issuer: String,
    /// Account label shown by authenticator apps.
    pub totp_account: String,
    /// Steps of clock skew accepted on either side, at most
    /// [`MAX_SKEW_STEPS`].
    pub totp_skew_steps: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            removal: RemovalPolicy::default(),
            totp_issuer: "DMA".to_string(),
            totp_account: "FolderLocker".to_string(),
            totp_skew_steps: DEFAULT_SKEW_STEPS,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the file exists but is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&contents).map_err(|e| {
            Error::Serialization(format!("{}: {}", path.display(), e))
        })?;
        Ok(settings.normalized())
    }

    fn normalized(mut self) -> Self {
        if self.totp_skew_steps > MAX_SKEW_STEPS {
            warn!(
                "totp_skew_steps {} exceeds {}, capping",
                self.totp_skew_steps, MAX_SKEW_STEPS
            );
            self.totp_skew_steps = MAX_SKEW_STEPS;
        }
        self
    }

    /// Write settings as pretty JSON, creating the parent directory.
    ///
    /// Out-of-range values are capped before writing.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.clone().normalized())
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}
