use rollcall_canonical::DigestError;
use thiserror::Error;

/// Failures while reading, writing, or verifying an audit journal.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Underlying file operation failed.
    #[error("journal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The first 16 bytes are not a valid `RCJ1` header.
    #[error("bad journal header: {0}")]
    InvalidHeader(String),
    /// A frame header is malformed.
    #[error("bad frame at byte {offset}: {reason}")]
    InvalidFrame {
        /// Start of the frame.
        offset: u64,
        /// What was wrong with it.
        reason: String,
    },
    /// Payload is larger than a frame can carry.
    #[error("payload of {size} bytes is over the {max}-byte frame limit")]
    PayloadTooLarge {
        /// Payload length.
        size: usize,
        /// Frame limit.
        max: u32,
    },
    /// An audit frame's payload is not UTF-8.
    #[error("audit payload is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// An audit frame's payload is not an audit record.
    #[error("audit payload is not a record: {0}")]
    JsonParse(#[from] serde_json::Error),
    /// Sealing or checking a record digest failed.
    #[error("record digest failed: {0}")]
    Digest(#[from] DigestError),
    /// The file has bytes but too few to hold a header.
    #[error("file is not empty; cannot initialize header")]
    FileNotEmpty,
    /// Strict read hit end-of-file inside a frame.
    #[error("frame at byte {offset} is cut short")]
    TruncatedFrame {
        /// Start of the partial frame.
        offset: u64,
    },
}
