//! Chain verification for audit journals.

use crate::errors::JournalError;
use crate::reader::{JournalReader, ReadMode};
use crate::record::AuditRecord;
use rollcall_canonical::{Canonicalizer, Digest};
use std::path::Path;

/// Why a record breaks the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakReason {
    /// Stored digest does not match the record contents.
    DigestMismatch,
    /// `prev_digest` does not point at the previous record.
    BrokenLink,
    /// `seq` is not one more than the previous record's.
    OutOfSequence,
}

/// First record that failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBreak {
    /// Sequence number stored in the offending record.
    pub seq: u64,
    /// Failure.
    pub reason: BreakReason,
}

/// Outcome of [`verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// Records examined.
    pub records: usize,
    /// Digest of the last valid record.
    pub tip: Option<Digest>,
    /// First failure, if any. Verification stops there.
    pub first_break: Option<ChainBreak>,
}

impl ChainReport {
    /// True when every record verified.
    pub fn is_intact(&self) -> bool {
        self.first_break.is_none()
    }
}

/// Verifies a single record's digest.
pub fn verify_record(
    record: &AuditRecord,
    canonicalizer: &Canonicalizer,
) -> Result<bool, JournalError> {
    Ok(record.expected_digest(canonicalizer)? == record.digest)
}

/// Verifies digests, links, and sequence numbers of records in journal order.
pub fn verify_chain<'a, I>(records: I, canonicalizer: &Canonicalizer) -> Result<ChainReport, JournalError>
where
    I: IntoIterator<Item = &'a AuditRecord>,
{
    let mut report = ChainReport {
        records: 0,
        tip: None,
        first_break: None,
    };
    let mut expected_seq = 0u64;

    for record in records {
        report.records += 1;
        let reason = if record.seq != expected_seq {
            Some(BreakReason::OutOfSequence)
        } else if record.prev_digest != report.tip {
            Some(BreakReason::BrokenLink)
        } else if !verify_record(record, canonicalizer)? {
            Some(BreakReason::DigestMismatch)
        } else {
            None
        };
        if let Some(reason) = reason {
            report.first_break = Some(ChainBreak {
                seq: record.seq,
                reason,
            });
            break;
        }
        report.tip = Some(record.digest.clone());
        expected_seq += 1;
    }
    Ok(report)
}

/// Reads a journal in strict mode and verifies its chain.
pub fn verify_journal<P: AsRef<Path>>(
    path: P,
    canonicalizer: &Canonicalizer,
) -> Result<ChainReport, JournalError> {
    let records = JournalReader::open(path, ReadMode::Strict)?.read_all()?;
    verify_chain(&records, canonicalizer)
}
