//! Journal reader implementation.

use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, FRAME_HEADER_SIZE, HEADER_SIZE};
use crate::record::AuditRecord;
use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

/// Read mode for handling truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Truncated frames are errors.
    Strict,
    /// Truncation is treated as end-of-file.
    Permissive,
}

/// Sequential reader over a journal file.
///
/// A crash mid-append leaves a partial trailing frame. [`ReadMode::Permissive`]
/// stops cleanly before it; [`ReadMode::Strict`] reports it.
///
/// # Example
///
/// ```rust,no_run
/// use rollcall_journal::{JournalReader, ReadMode};
///
/// let mut reader = JournalReader::open("audit.rcj", ReadMode::Strict)?;
/// while let Some(record) = reader.read_record()? {
///     println!("{} {} {}", record.seq, record.kind, record.event_id);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalReader {
    file: File,
    mode: ReadMode,
    position: u64,
}

impl JournalReader {
    /// Opens a journal and validates its header.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let mut file = File::open(path)?;
        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                JournalError::InvalidHeader("file shorter than header".to_string())
            } else {
                e.into()
            }
        })?;
        JournalHeader::decode(&header_bytes)?;

        Ok(Self {
            file,
            mode,
            position: HEADER_SIZE as u64,
        })
    }

    /// Byte offset of the next frame.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn truncated(&self, offset: u64) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        match self.mode {
            ReadMode::Permissive => Ok(None),
            ReadMode::Strict => Err(JournalError::TruncatedFrame { offset }),
        }
    }

    /// Reads the next frame. Returns `Ok(None)` at end-of-file.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        self.file.seek(io::SeekFrom::Start(self.position))?;

        let file_size = self.file.metadata()?.len();
        if self.position >= file_size {
            return Ok(None);
        }

        let frame_start = self.position;
        let mut frame_header_bytes = [0u8; FRAME_HEADER_SIZE];
        match self.file.read_exact(&mut frame_header_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return self.truncated(frame_start)
            }
            Err(e) => return Err(e.into()),
        }
        let frame = RecordFrame::decode(&frame_header_bytes, frame_start)?;

        let mut payload = vec![0u8; frame.len as usize];
        match self.file.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return self.truncated(frame_start)
            }
            Err(e) => return Err(e.into()),
        }

        self.position = frame.next_offset(frame_start);
        Ok(Some((frame.kind, payload)))
    }

    /// Reads the next audit record, skipping frames of unknown kinds.
    pub fn read_record(&mut self) -> Result<Option<AuditRecord>, JournalError> {
        loop {
            match self.read_frame()? {
                None => return Ok(None),
                Some((FrameKind::AuditRecord, payload)) => {
                    let text = std::str::from_utf8(&payload)?;
                    return Ok(Some(serde_json::from_str(text)?));
                }
                Some((FrameKind::Unknown(_), _)) => continue,
            }
        }
    }

    /// Reads every remaining record.
    pub fn read_all(&mut self) -> Result<Vec<AuditRecord>, JournalError> {
        let mut records = Vec::new();
        while let Some(record) = self.read_record()? {
            records.push(record);
        }
        Ok(records)
    }
}
