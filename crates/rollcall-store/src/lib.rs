//! Persistence and coordination for Rollcall events.
//!
//! This crate provides:
//! - The [`EventStore`] persistence trait with in-memory and JSON-directory backends
//! - [`EventDesk`], which serializes operations per event and persists each change
//! - Audit sinks, including one backed by the `rollcall-journal` hash chain
//! - Winner filters and flat export rows

#![deny(missing_docs)]

/// Audit sinks.
pub mod audit;
/// Per-event serialized operations.
pub mod desk;
/// Error types for store operations.
pub mod error;
/// Winner export rows.
pub mod export;
/// Winner filtering API.
pub mod filter;
/// JSON-directory store.
pub mod json_dir;
/// In-memory store.
pub mod memory;
/// Storage backend trait.
pub mod traits;

pub use audit::{AuditSink, JournalAudit, MemoryAudit, NullAudit};
pub use desk::{DeskError, EventDesk};
pub use error::StoreError;
pub use export::{winner_rows, WinnerExportRow, WINNER_COLUMNS};
pub use filter::{
    AllWinners, AndFilter, ClaimStatusFilter, OrFilter, PrizeFilter, PrizeTypeFilter, UserFilter,
    WinnerFilter,
};
pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
pub use rollcall_journal::{ReadMode, WriteOptions};
pub use traits::EventStore;
