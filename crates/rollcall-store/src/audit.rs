//! Where desk operations send their audit entries.

use crate::error::StoreError;
use rollcall_journal::{AuditEntry, AuditRecord, JournalWriter, WriteOptions};
use std::path::Path;
use std::sync::Mutex;

/// Receives one entry per desk decision.
pub trait AuditSink: Send + Sync {
    /// Records `entry`.
    fn record(&self, entry: AuditEntry) -> Result<(), StoreError>;
}

/// Discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _entry: AuditEntry) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Appends entries to a hash-chained journal file.
pub struct JournalAudit {
    writer: Mutex<JournalWriter>,
}

impl JournalAudit {
    /// Opens (or creates) the journal at `path`.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, StoreError> {
        Ok(Self {
            writer: Mutex::new(JournalWriter::open(path, options)?),
        })
    }

    /// Appends `entry` and returns the sealed record.
    pub fn append(&self, entry: AuditEntry) -> Result<AuditRecord, StoreError> {
        let mut writer = self.writer.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(writer.append(entry)?)
    }
}

impl AuditSink for JournalAudit {
    fn record(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.append(entry).map(|_| ())
    }
}

/// Keeps entries in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAudit {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone())
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(entry);
        Ok(())
    }
}
