use chrono::{DateTime, Utc};
use rollcall_canonical::{compute_digest, Canonicalizer, Digest, DigestError, EventId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Domain separator for audit record digests.
pub const AUDIT_DOMAIN_SEPARATOR: &[u8] = b"rollcall:audit:v1\0";

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// Event created.
    EventCreated,
    /// Event status changed.
    StatusChanged,
    /// Credential issued or refreshed.
    CredentialIssued,
    /// Credential switched off.
    CredentialDeactivated,
    /// Prize added to an event.
    PrizeAdded,
    /// Check-in accepted.
    CheckInAccepted,
    /// Check-in refused.
    CheckInRejected,
    /// Draw ran.
    DrawConducted,
    /// Draw refused.
    DrawRejected,
    /// Draw discarded.
    DrawReset,
    /// Prize claimed.
    ClaimAccepted,
    /// Claim refused.
    ClaimRejected,
    /// Sweep expired pending winners.
    ClaimsExpired,
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditKind::EventCreated => "event_created",
            AuditKind::StatusChanged => "status_changed",
            AuditKind::CredentialIssued => "credential_issued",
            AuditKind::CredentialDeactivated => "credential_deactivated",
            AuditKind::PrizeAdded => "prize_added",
            AuditKind::CheckInAccepted => "check_in_accepted",
            AuditKind::CheckInRejected => "check_in_rejected",
            AuditKind::DrawConducted => "draw_conducted",
            AuditKind::DrawRejected => "draw_rejected",
            AuditKind::DrawReset => "draw_reset",
            AuditKind::ClaimAccepted => "claim_accepted",
            AuditKind::ClaimRejected => "claim_rejected",
            AuditKind::ClaimsExpired => "claims_expired",
        };
        f.write_str(s)
    }
}

/// An audit entry before it is linked into a journal.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// What happened.
    pub kind: AuditKind,
    /// Event it happened to.
    pub event_id: EventId,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
    /// Kind-specific details.
    pub payload: Value,
}

impl AuditEntry {
    /// Builds an entry, serializing `payload` to JSON.
    pub fn new<T: Serialize>(
        kind: AuditKind,
        event_id: EventId,
        occurred_at: DateTime<Utc>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind,
            event_id,
            occurred_at,
            payload: serde_json::to_value(payload)?,
        })
    }
}

/// A sealed audit record as stored in the journal.
///
/// `digest = sha256(AUDIT_DOMAIN_SEPARATOR || canonical(record without digest))`.
/// Because `prev_digest` is covered, editing any record breaks every later link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Position in the journal, starting at 0.
    pub seq: u64,
    /// What happened.
    pub kind: AuditKind,
    /// Event it happened to.
    pub event_id: EventId,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
    /// Kind-specific details.
    pub payload: Value,
    /// Digest of the previous record; `None` for the first.
    pub prev_digest: Option<Digest>,
    /// Digest of this record.
    pub digest: Digest,
}

#[derive(Serialize)]
struct RecordBody<'a> {
    seq: u64,
    kind: AuditKind,
    event_id: &'a EventId,
    occurred_at: &'a DateTime<Utc>,
    payload: &'a Value,
    prev_digest: Option<&'a Digest>,
}

impl AuditRecord {
    /// Links `entry` after `prev_digest` at position `seq` and computes its digest.
    pub fn seal(
        entry: AuditEntry,
        seq: u64,
        prev_digest: Option<Digest>,
        canonicalizer: &Canonicalizer,
    ) -> Result<Self, DigestError> {
        let body = RecordBody {
            seq,
            kind: entry.kind,
            event_id: &entry.event_id,
            occurred_at: &entry.occurred_at,
            payload: &entry.payload,
            prev_digest: prev_digest.as_ref(),
        };
        let digest = compute_digest(AUDIT_DOMAIN_SEPARATOR, &body, canonicalizer)?;
        Ok(Self {
            seq,
            kind: entry.kind,
            event_id: entry.event_id,
            occurred_at: entry.occurred_at,
            payload: entry.payload,
            prev_digest,
            digest,
        })
    }

    /// Recomputes the digest from the record's other fields.
    pub fn expected_digest(&self, canonicalizer: &Canonicalizer) -> Result<Digest, DigestError> {
        let body = RecordBody {
            seq: self.seq,
            kind: self.kind,
            event_id: &self.event_id,
            occurred_at: &self.occurred_at,
            payload: &self.payload,
            prev_digest: self.prev_digest.as_ref(),
        };
        compute_digest(AUDIT_DOMAIN_SEPARATOR, &body, canonicalizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn entry(payload: Value) -> AuditEntry {
        AuditEntry {
            kind: AuditKind::CheckInAccepted,
            event_id: EventId::parse("evt-1").unwrap(),
            occurred_at: Utc.with_ymd_and_hms(2024, 6, 1, 19, 0, 0).unwrap(),
            payload,
        }
    }

    #[test]
    fn sealed_digest_recomputes() {
        let c = Canonicalizer::default();
        let record = AuditRecord::seal(entry(json!({"distance": 12.5})), 0, None, &c).unwrap();
        assert_eq!(record.expected_digest(&c).unwrap(), record.digest);
    }

    #[test]
    fn digest_covers_prev_link_and_position() {
        let c = Canonicalizer::default();
        let first = AuditRecord::seal(entry(json!({})), 0, None, &c).unwrap();
        let linked =
            AuditRecord::seal(entry(json!({})), 1, Some(first.digest.clone()), &c).unwrap();
        let moved = AuditRecord::seal(entry(json!({})), 2, Some(first.digest.clone()), &c).unwrap();
        assert_ne!(first.digest, linked.digest);
        assert_ne!(linked.digest, moved.digest);
    }

    #[test]
    fn digest_survives_json_round_trip() {
        let c = Canonicalizer::default();
        let record =
            AuditRecord::seal(entry(json!({"d": 0.1, "n": [1, 2]})), 3, None, &c).unwrap();
        let restored: AuditRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(restored.expected_digest(&c).unwrap(), record.digest);
    }

    #[test]
    fn kind_display_matches_serde() {
        let kind = AuditKind::ClaimsExpired;
        assert_eq!(
            serde_json::to_string(&kind).unwrap(),
            format!("\"{}\"", kind)
        );
    }
}
