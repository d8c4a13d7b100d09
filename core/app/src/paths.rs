//! On-disk locations.

use std::env;
use std::path::{Path, PathBuf};

use dmalock_common::{Error, Result};
use dmalock_credentials::CREDENTIAL_FILENAME;

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "DMALOCK_HOME";

const APP_DIR: &str = "DMALocker";
const SETTINGS_FILENAME: &str = "settings.json";

/// Directory holding the credential file and settings.
///
/// `$DMALOCK_HOME` if set and non-empty, else `<config_dir>/DMALocker`.
pub fn base_dir() -> Result<PathBuf> {
    if let Some(home) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| Error::NotFound("no per-user configuration directory".to_string()))
}

pub fn credential_path(base: &Path) -> PathBuf {
    base.join(CREDENTIAL_FILENAME)
}

pub fn settings_path(base: &Path) -> PathBuf {
    base.join(SETTINGS_FILENAME)
}
