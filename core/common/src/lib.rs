//! Common utilities and types shared across the DMA Locker crates.
//!
//! Every crate in the workspace reports failures through the single
//! [`Error`] taxonomy defined here, so the pipeline can classify per-file
//! failures without knowing which layer produced them.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{LockMode, Password, CONTAINER_EXTENSION};
