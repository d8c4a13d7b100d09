//! Common types used throughout DMA Locker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// File-name suffix appended to every container (`photo.jpg` -> `photo.jpg.dma`).
pub const CONTAINER_EXTENSION: &str = ".dma";

/// Direction of a batch transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Encrypt plaintext files into containers.
    Lock,
    /// Decrypt containers back into plaintext files.
    Unlock,
}

impl LockMode {
    /// Status-line verb for a successful file.
    pub fn verb(&self) -> &'static str {
        match self {
            LockMode::Lock => "LOCK",
            LockMode::Unlock => "UNLOCK",
        }
    }

    /// Check whether `path` belongs to the set this mode operates on.
    ///
    /// Lock takes everything not yet carrying the container marker, Unlock
    /// takes only marked files. The marker match ignores ASCII case.
    pub fn selects(&self, path: &Path) -> bool {
        let locked = has_container_extension(path);
        match self {
            LockMode::Lock => !locked,
            LockMode::Unlock => locked,
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Lock => write!(f, "lock"),
            LockMode::Unlock => write!(f, "unlock"),
        }
    }
}

/// Check whether the file name ends with [`CONTAINER_EXTENSION`].
///
/// Works on the raw file name, so names that are not valid UTF-8 still
/// match. A bare `.dma` is a hidden file, not a container.
pub fn has_container_extension(path: &Path) -> bool {
    let marker = &CONTAINER_EXTENSION[1..];
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(marker))
}

/// Path of the container written for `original`.
pub fn container_path_for(original: &Path) -> PathBuf {
    let mut name = original.as_os_str().to_os_string();
    name.push(CONTAINER_EXTENSION);
    PathBuf::from(name)
}

/// Path recovered from a container by stripping exactly the marker.
///
/// The remaining bytes of the file name are kept as they are. Returns
/// `None` when the path does not carry the marker.
pub fn original_path_for(container: &Path) -> Option<PathBuf> {
    if !has_container_extension(container) {
        return None;
    }
    Some(container.with_extension(""))
}

/// Locking password held in memory for the duration of a run.
///
/// Zeroized on drop and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    /// Wrap a password string.
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Get the password as UTF-8 bytes for key derivation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Get the password as a string slice.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_path_appends_marker() {
        let path = Path::new("/photos/shoot/photo.jpg");
        assert_eq!(
            container_path_for(path),
            PathBuf::from("/photos/shoot/photo.jpg.dma")
        );
    }

    #[test]
    fn test_original_path_strips_exactly_marker() {
        let path = Path::new("/photos/archive.tar.gz.dma");
        assert_eq!(
            original_path_for(path),
            Some(PathBuf::from("/photos/archive.tar.gz"))
        );
        assert_eq!(original_path_for(Path::new("/photos/a.jpg")), None);
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        assert!(has_container_extension(Path::new("a.jpg.DMA")));
        assert!(has_container_extension(Path::new("a.jpg.dma")));
        assert!(!has_container_extension(Path::new("a.dmax")));
        assert!(!has_container_extension(Path::new(".dma")));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_kept_byte_for_byte() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let original = Path::new("/photos").join(OsStr::from_bytes(b"caf\xe9.jpg"));
        let container = container_path_for(&original);

        assert!(has_container_extension(&container));
        assert_eq!(original_path_for(&container), Some(original));
    }

    #[test]
    fn test_mode_selection() {
        let plain = Path::new("notes.txt");
        let locked = Path::new("notes.txt.dma");

        assert!(LockMode::Lock.selects(plain));
        assert!(!LockMode::Lock.selects(locked));
        assert!(LockMode::Unlock.selects(locked));
        assert!(!LockMode::Unlock.selects(plain));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("hunter2");
        assert_eq!(format!("{:?}", password), "Password([REDACTED])");
        assert_eq!(password.as_bytes(), b"hunter2");
    }
}
