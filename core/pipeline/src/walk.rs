//! Directory enumeration.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use dmalock_common::types::has_container_extension;
use dmalock_common::{Error, LockMode, Result};
use dmalock_crypto::{is_container, MIN_CONTAINER_SIZE};

/// Maximum number of entries in [`Inventory::preview`].
pub const PREVIEW_LIMIT: usize = 10;

/// Snapshot of what a directory holds, for display before a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Files a lock run would take.
    pub plain: usize,
    /// Marked files whose header looks like a container.
    pub locked: usize,
    /// Marked files that would fail as malformed on unlock.
    pub unrecognized: usize,
    /// Entries the walk could not read; their contents are not counted.
    pub unreadable: usize,
    /// First few relative paths in walk order.
    pub preview: Vec<PathBuf>,
}

impl Inventory {
    pub fn total(&self) -> usize {
        self.plain + self.locked + self.unrecognized
    }
}

/// One item produced by walking a batch root.
#[derive(Debug)]
pub enum WalkEntry {
    /// A regular file.
    File(PathBuf),
    /// An entry the walk could not read. Nothing beneath it was seen.
    Unreadable { path: PathBuf, error: Error },
}

impl WalkEntry {
    pub fn path(&self) -> &Path {
        match self {
            WalkEntry::File(path) => path,
            WalkEntry::Unreadable { path, .. } => path,
        }
    }
}

fn ensure_directory(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    Ok(())
}

/// Walk `root` depth-first in file-name order.
///
/// Yields regular files and every entry the walk failed to read. Symbolic
/// links are not followed and not returned.
fn walk(root: &Path) -> Result<impl Iterator<Item = WalkEntry>> {
    ensure_directory(root)?;
    let fallback = root.to_path_buf();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(WalkEntry::File(entry.into_path())),
            Ok(_) => None,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| fallback.clone());
                warn!("Cannot read {}: {}", path.display(), e);
                Some(WalkEntry::Unreadable {
                    path,
                    error: Error::Io(e.into()),
                })
            }
        });
    Ok(walker)
}

/// Collect the entries `mode` operates on under `root`.
///
/// Files are filtered by the mode; unreadable entries are always kept so
/// the batch can report them.
///
/// # Errors
///
/// Returns `NotFound` if `root` is missing or not a directory.
pub fn collect_targets(root: &Path, mode: LockMode) -> Result<Vec<WalkEntry>> {
    Ok(walk(root)?
        .filter(|entry| match entry {
            WalkEntry::File(path) => mode.selects(path),
            WalkEntry::Unreadable { .. } => true,
        })
        .collect())
}

/// Count plain and locked files under `root` without transforming anything.
///
/// Only the first bytes of each marked file are read.
pub fn inventory(root: &Path) -> Result<Inventory> {
    let mut inventory = Inventory::default();

    for entry in walk(root)? {
        let path = match entry {
            WalkEntry::File(path) => path,
            WalkEntry::Unreadable { .. } => {
                inventory.unreadable += 1;
                continue;
            }
        };

        if has_container_extension(&path) {
            if header_looks_valid(&path) {
                inventory.locked += 1;
            } else {
                inventory.unrecognized += 1;
            }
        } else {
            inventory.plain += 1;
        }

        if inventory.preview.len() < PREVIEW_LIMIT {
            let relative = path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf();
            inventory.preview.push(relative);
        }
    }

    Ok(inventory)
}

fn header_looks_valid(path: &Path) -> bool {
    let mut header = Vec::with_capacity(MIN_CONTAINER_SIZE);
    match File::open(path) {
        Ok(file) => match file.take(MIN_CONTAINER_SIZE as u64).read_to_end(&mut header) {
            Ok(_) => is_container(&header),
            Err(_) => false,
        },
        Err(_) => false,
    }
}
