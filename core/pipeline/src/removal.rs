//! Removal of originals after a successful lock.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

use dmalock_common::Result;

/// How an original file is removed once its container is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Move to the OS trash, deleting permanently if no trash is available.
    #[default]
    Trash,
    /// Delete permanently.
    Delete,
}

/// What actually happened to the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Trashed,
    Deleted,
}

/// Remove `path` according to `policy`.
pub fn remove_original(path: &Path, policy: RemovalPolicy) -> Result<Removal> {
    remove_with(path, policy, |p| trash::delete(p))
}

fn remove_with<F, E>(path: &Path, policy: RemovalPolicy, move_to_trash: F) -> Result<Removal>
where
    F: FnOnce(&Path) -> std::result::Result<(), E>,
    E: fmt::Display,
{
    match policy {
        RemovalPolicy::Trash => match move_to_trash(path) {
            Ok(()) => Ok(Removal::Trashed),
            Err(e) => {
                warn!(
                    "Trash unavailable for {}, deleting permanently: {}",
                    path.display(),
                    e
                );
                fs::remove_file(path)?;
                Ok(Removal::Deleted)
            }
        },
        RemovalPolicy::Delete => {
            fs::remove_file(path)?;
            Ok(Removal::Deleted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete_policy_removes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photo.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let removal = remove_original(&path, RemovalPolicy::Delete).unwrap();

        assert_eq!(removal, Removal::Deleted);
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let result = remove_original(&temp.path().join("gone.jpg"), RemovalPolicy::Delete);

        assert!(matches!(result, Err(dmalock_common::Error::Io(_))));
    }

    #[test]
    fn test_trash_policy_removes_original() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photo.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let removal = remove_original(&path, RemovalPolicy::Trash).unwrap();

        assert!(matches!(removal, Removal::Trashed | Removal::Deleted));
        assert!(!path.exists());
    }

    #[test]
    fn test_trash_success_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photo.jpg");
        let bin = temp.path().join("bin.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let removal = remove_with(&path, RemovalPolicy::Trash, |p| fs::rename(p, &bin)).unwrap();

        assert_eq!(removal, Removal::Trashed);
        assert!(!path.exists());
        assert!(bin.exists());
    }

    #[test]
    fn test_trash_failure_falls_back_to_delete() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photo.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let removal =
            remove_with(&path, RemovalPolicy::Trash, |_| Err("no trash can")).unwrap();

        assert_eq!(removal, Removal::Deleted);
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_policy_never_touches_trash() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photo.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let never = |_: &Path| -> std::result::Result<(), &'static str> {
            panic!("trash used under Delete policy")
        };

        let removal = remove_with(&path, RemovalPolicy::Delete, never).unwrap();

        assert_eq!(removal, Removal::Deleted);
    }

    #[test]
    fn test_policy_serde_names() {
        assert_eq!(
            serde_json::to_string(&RemovalPolicy::Trash).unwrap(),
            "\"trash\""
        );
        let parsed: RemovalPolicy = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(parsed, RemovalPolicy::Delete);
        assert_eq!(RemovalPolicy::default(), RemovalPolicy::Trash);
    }
}
