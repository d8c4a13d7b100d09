//! Bulk lock/unlock pipeline.
//!
//! This module provides:
//! - Recursive enumeration of the files a batch operates on
//! - The per-file lock and unlock transforms with failure isolation
//! - Progress, status and terminal events for a presentation layer
//! - A background task wrapper with cooperative cancellation
//!
//! # Architecture
//! [`run_blocking`] is the synchronous core: one file at a time, in walk
//! order, emitting events through a callback. [`spawn`] moves it onto a
//! blocking worker and exposes the events as a channel.

pub mod events;
pub mod handle;
pub mod job;
pub mod removal;
pub mod runner;
pub mod walk;

pub use events::{
    BatchEvent, BatchOutcome, BatchReport, BatchState, FailureKind, FileReport, FileStatus,
};
pub use handle::{run, spawn, BatchHandle};
pub use job::{BatchId, BatchJob};
pub use removal::{remove_original, Removal, RemovalPolicy};
pub use runner::run_blocking;
pub use walk::{collect_targets, inventory, Inventory, WalkEntry, PREVIEW_LIMIT};
