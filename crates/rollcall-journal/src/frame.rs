use crate::errors::JournalError;

/// Journal file magic bytes: `b"RCJ1"`.
pub const MAGIC: &[u8; 4] = b"RCJ1";

/// Current journal format version.
pub const VERSION: u16 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Largest accepted payload: 16 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Record frame kind byte for audit records.
pub const FRAME_KIND_AUDIT_RECORD: u8 = 0x01;

/// Journal file header.
///
/// Layout: `RCJ1` | version u16 LE | 10 zero bytes (flags and reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    /// Format version.
    pub version: u16,
}

impl Default for JournalHeader {
    fn default() -> Self {
        Self { version: VERSION }
    }
}

impl JournalHeader {
    /// Header bytes as written at offset 0.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(MAGIC);
        out[4..6].copy_from_slice(&self.version.to_le_bytes());
        out
    }

    /// Parses the first [`HEADER_SIZE`] bytes of a journal.
    pub fn decode(bytes: &[u8]) -> Result<Self, JournalError> {
        let bad = |msg: String| Err(JournalError::InvalidHeader(msg));
        let Some(head) = bytes.get(..HEADER_SIZE) else {
            return bad(format!("header too short: {} bytes", bytes.len()));
        };
        if &head[..4] != MAGIC {
            return bad(format!("not a rollcall journal (magic {:?})", &head[..4]));
        }
        let version = u16::from_le_bytes([head[4], head[5]]);
        if version != VERSION {
            return bad(format!("unsupported version {}, expected {}", version, VERSION));
        }
        if !all_zero(&head[6..]) {
            return bad("flags and reserved bytes must be zero".to_string());
        }
        Ok(Self { version })
    }
}

/// Record frame kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 JSON of one [`AuditRecord`](crate::AuditRecord).
    AuditRecord,
    /// Kind written by a newer format revision; readers skip it.
    Unknown(u8),
}

impl From<u8> for FrameKind {
    fn from(byte: u8) -> Self {
        match byte {
            FRAME_KIND_AUDIT_RECORD => FrameKind::AuditRecord,
            other => FrameKind::Unknown(other),
        }
    }
}

impl From<FrameKind> for u8 {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::AuditRecord => FRAME_KIND_AUDIT_RECORD,
            FrameKind::Unknown(byte) => byte,
        }
    }
}

/// Record frame header.
///
/// Layout: kind (1) | 3 zero bytes | payload length u32 LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFrame {
    /// Frame kind.
    pub kind: FrameKind,
    /// Payload length in bytes.
    pub len: u32,
}

impl RecordFrame {
    /// Frame header for a payload of `len` bytes.
    pub fn new(kind: FrameKind, len: usize) -> Result<Self, JournalError> {
        let len = u32::try_from(len)
            .ok()
            .filter(|&n| n <= MAX_PAYLOAD_SIZE)
            .ok_or(JournalError::PayloadTooLarge {
                size: len,
                max: MAX_PAYLOAD_SIZE,
            })?;
        Ok(Self { kind, len })
    }

    /// Bytes written before the payload.
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut out = [0u8; FRAME_HEADER_SIZE];
        out[0] = self.kind.into();
        out[4..].copy_from_slice(&self.len.to_le_bytes());
        out
    }

    /// Parses a frame header found at byte `offset` of the journal.
    pub fn decode(bytes: &[u8; FRAME_HEADER_SIZE], offset: u64) -> Result<Self, JournalError> {
        let invalid = |reason: String| JournalError::InvalidFrame { offset, reason };
        if !all_zero(&bytes[1..4]) {
            return Err(invalid("reserved bytes must be zero".to_string()));
        }
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if len > MAX_PAYLOAD_SIZE {
            return Err(invalid(format!(
                "payload size {} exceeds maximum {}",
                len, MAX_PAYLOAD_SIZE
            )));
        }
        Ok(Self {
            kind: FrameKind::from(bytes[0]),
            len,
        })
    }

    /// Offset of the frame that follows one starting at `offset`.
    pub fn next_offset(&self, offset: u64) -> u64 {
        offset + FRAME_HEADER_SIZE as u64 + u64::from(self.len)
    }
}

fn all_zero(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0)
}
