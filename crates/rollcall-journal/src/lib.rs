//! Append-only, hash-chained audit journal for Rollcall.
//!
//! This crate provides:
//! - Framed, append-only storage for audit records (`RCJ1` files)
//! - Reader/writer APIs with strict and permissive truncation handling
//! - Chain verification: each record's digest covers the previous digest
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use rollcall_canonical::{Canonicalizer, EventId};
//! use rollcall_journal::{
//!     verify_journal, AuditEntry, AuditKind, JournalReader, JournalWriter, ReadMode,
//!     WriteOptions,
//! };
//! use serde_json::json;
//!
//! let mut writer = JournalWriter::open("audit.rcj", WriteOptions::default())?;
//! let event_id = EventId::generate();
//! writer.append(AuditEntry::new(
//!     AuditKind::DrawConducted,
//!     event_id,
//!     Utc::now(),
//!     &json!({"winners": 3}),
//! )?)?;
//! writer.finish()?;
//!
//! let mut reader = JournalReader::open("audit.rcj", ReadMode::Strict)?;
//! while let Some(record) = reader.read_record()? {
//!     println!("{} {}", record.seq, record.kind);
//! }
//!
//! let report = verify_journal("audit.rcj", &Canonicalizer::default())?;
//! assert!(report.is_intact());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## File layout
//!
//! A 16-byte header (`RCJ1`, version, flags, reserved) followed by frames of
//! `kind (1) | reserved (3) | len u32 LE | payload`. Payloads are the JSON of
//! one [`AuditRecord`] and are capped at 16 MiB.

#![deny(missing_docs)]

/// Error types for journal operations.
pub mod errors;
/// Frame structure and serialization.
pub mod frame;
/// Journal reader implementation.
pub mod reader;
/// Audit records and their digests.
pub mod record;
/// Chain verification.
pub mod verification;
/// Journal writer implementation.
pub mod writer;

pub use errors::JournalError;
pub use frame::{FrameKind, JournalHeader, RecordFrame};
pub use reader::{JournalReader, ReadMode};
pub use record::{AuditEntry, AuditKind, AuditRecord, AUDIT_DOMAIN_SEPARATOR};
pub use verification::{
    verify_chain, verify_journal, verify_record, BreakReason, ChainBreak, ChainReport,
};
pub use writer::{JournalWriter, WriteOptions};
