//! Journal writer implementation.

use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, HEADER_SIZE};
use crate::reader::{JournalReader, ReadMode};
use crate::record::{AuditEntry, AuditRecord};
use rollcall_canonical::{Canonicalizer, Digest};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// Options for journal writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync after each append (default: false).
    pub sync: bool,
    /// Whether to create the file if it doesn't exist (default: true).
    pub create: bool,
    /// Whether to keep existing records (default: true). `false` truncates.
    pub append: bool,
    /// Canonicalizer used for record digests.
    pub canonicalizer: Canonicalizer,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
            append: true,
            canonicalizer: Canonicalizer::default(),
        }
    }
}

/// Append-only writer that links every record to the one before it.
///
/// On open the existing records are scanned to recover the chain tip, so a
/// journal can be reopened across process restarts. A partial trailing frame
/// left by a crash is cut off before the next append.
///
/// # Example
///
/// ```rust,no_run
/// use chrono::Utc;
/// use rollcall_canonical::EventId;
/// use rollcall_journal::{AuditEntry, AuditKind, JournalWriter, WriteOptions};
/// use serde_json::json;
///
/// let mut writer = JournalWriter::open("audit.rcj", WriteOptions::default())?;
/// let entry = AuditEntry::new(
///     AuditKind::EventCreated,
///     EventId::generate(),
///     Utc::now(),
///     &json!({"title": "Launch night"}),
/// )?;
/// let record = writer.append(entry)?;
/// println!("sealed #{} as {}", record.seq, record.digest.b64);
/// writer.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalWriter {
    file: File,
    sync: bool,
    canonicalizer: Canonicalizer,
    next_seq: u64,
    tip: Option<Digest>,
}

impl JournalWriter {
    /// Opens or creates a journal for appending.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(options.create)
            .write(true)
            .read(true)
            .open(path)?;

        let mut writer = Self {
            file,
            sync: options.sync,
            canonicalizer: options.canonicalizer,
            next_seq: 0,
            tip: None,
        };

        let len = writer.file.metadata()?.len();
        if len == 0 {
            writer.write_header()?;
        } else if len < HEADER_SIZE as u64 {
            return Err(JournalError::FileNotEmpty);
        } else {
            let mut header_bytes = [0u8; HEADER_SIZE];
            writer.file.seek(io::SeekFrom::Start(0))?;
            writer.file.read_exact(&mut header_bytes)?;
            JournalHeader::decode(&header_bytes)?;

            if options.append {
                writer.recover_tip(path)?;
            } else {
                writer.file.set_len(HEADER_SIZE as u64)?;
            }
        }
        writer.file.seek(io::SeekFrom::End(0))?;

        Ok(writer)
    }

    fn write_header(&mut self) -> Result<(), JournalError> {
        self.file.write_all(&JournalHeader::default().encode())?;
        self.flush()
    }

    fn recover_tip(&mut self, path: &Path) -> Result<(), JournalError> {
        let mut reader = JournalReader::open(path, ReadMode::Permissive)?;
        while let Some(record) = reader.read_record()? {
            self.next_seq = record.seq + 1;
            self.tip = Some(record.digest);
        }
        let end = reader.position();
        if end < self.file.metadata()?.len() {
            self.file.set_len(end)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Digest of the last record, if any.
    pub fn tip(&self) -> Option<&Digest> {
        self.tip.as_ref()
    }

    /// Sequence number the next record will get.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Seals `entry` onto the chain and writes it.
    pub fn append(&mut self, entry: AuditEntry) -> Result<AuditRecord, JournalError> {
        let record = AuditRecord::seal(entry, self.next_seq, self.tip.clone(), &self.canonicalizer)?;
        let bytes = serde_json::to_vec(&record)?;
        self.append_raw(FrameKind::AuditRecord, &bytes)?;
        self.next_seq += 1;
        self.tip = Some(record.digest.clone());
        Ok(record)
    }

    /// Writes a frame without touching the chain state.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        let frame = RecordFrame::new(kind, payload.len())?;
        self.file.write_all(&frame.encode())?;
        self.file.write_all(payload)?;
        self.flush()
    }

    /// Flushes and closes the journal.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.flush()
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.sync {
            let _ = self.file.sync_all();
        }
    }
}
