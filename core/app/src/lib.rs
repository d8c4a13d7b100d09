//! Application layer for DMA Locker.
//!
//! Ties the credential store, the second-factor gate and the batch
//! pipeline together behind [`Locker`], and resolves where state lives
//! on disk.

pub mod locker;
pub mod paths;
pub mod settings;

pub use locker::{FolderStatus, Locker};
pub use paths::{base_dir, credential_path, settings_path, HOME_ENV};
pub use settings::Settings;
