use chrono::{Duration, TimeZone, Utc};
use rollcall_canonical::{Canonicalizer, EventId};
use rollcall_journal::{
    verify_chain, verify_journal, verify_record, AuditEntry, AuditKind, AuditRecord, BreakReason,
    FrameKind, JournalWriter, WriteOptions,
};
use serde_json::json;
use tempfile::TempDir;

fn make_chain(len: u64) -> Vec<AuditRecord> {
    let canonicalizer = Canonicalizer::default();
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
    let mut records: Vec<AuditRecord> = Vec::new();
    for seq in 0..len {
        let entry = AuditEntry::new(
            AuditKind::ClaimAccepted,
            EventId::parse("evt-chain").unwrap(),
            start + Duration::minutes(seq as i64),
            &json!({ "winner": format!("w{seq}"), "amount": 100 * seq }),
        )
        .unwrap();
        let prev = records.last().map(|r| r.digest.clone());
        records.push(AuditRecord::seal(entry, seq, prev, &canonicalizer).unwrap());
    }
    records
}

#[test]
fn test_intact_chain_verifies() {
    let records = make_chain(5);
    let report = verify_chain(&records, &Canonicalizer::default()).unwrap();
    assert!(report.is_intact());
    assert_eq!(report.records, 5);
    assert_eq!(report.tip.as_ref(), Some(&records[4].digest));
}

#[test]
fn test_edited_payload_is_detected() {
    let mut records = make_chain(4);
    records[2].payload["amount"] = json!(1_000_000);

    let canonicalizer = Canonicalizer::default();
    assert!(!verify_record(&records[2], &canonicalizer).unwrap());
    let report = verify_chain(&records, &canonicalizer).unwrap();
    let broken = report.first_break.unwrap();
    assert_eq!(broken.seq, 2);
    assert_eq!(broken.reason, BreakReason::DigestMismatch);
    assert_eq!(report.tip.as_ref(), Some(&records[1].digest));
}

#[test]
fn test_resealed_edit_breaks_the_next_link() {
    let canonicalizer = Canonicalizer::default();
    let mut records = make_chain(4);
    let forged = AuditEntry {
        kind: records[1].kind,
        event_id: records[1].event_id.clone(),
        occurred_at: records[1].occurred_at,
        payload: json!({"winner": "mallory"}),
    };
    records[1] =
        AuditRecord::seal(forged, 1, records[1].prev_digest.clone(), &canonicalizer).unwrap();

    let report = verify_chain(&records, &canonicalizer).unwrap();
    let broken = report.first_break.unwrap();
    assert_eq!(broken.seq, 2);
    assert_eq!(broken.reason, BreakReason::BrokenLink);
}

#[test]
fn test_removed_record_is_detected() {
    let mut records = make_chain(4);
    records.remove(1);

    let report = verify_chain(&records, &Canonicalizer::default()).unwrap();
    assert_eq!(report.first_break.unwrap().reason, BreakReason::OutOfSequence);
}

#[test]
fn test_verify_journal_file() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("audit.rcj");

    {
        let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
        for record in make_chain(3) {
            let entry = AuditEntry {
                kind: record.kind,
                event_id: record.event_id,
                occurred_at: record.occurred_at,
                payload: record.payload,
            };
            writer.append(entry).unwrap();
        }
        writer.finish().unwrap();
    }
    let report = verify_journal(&journal_path, &Canonicalizer::default()).unwrap();
    assert!(report.is_intact());
    assert_eq!(report.records, 3);

    // a record spliced in from another chain
    {
        let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
        let stranger = serde_json::to_vec(&make_chain(1)[0]).unwrap();
        writer.append_raw(FrameKind::AuditRecord, &stranger).unwrap();
        writer.finish().unwrap();
    }
    let report = verify_journal(&journal_path, &Canonicalizer::default()).unwrap();
    assert!(!report.is_intact());
    assert_eq!(report.first_break.unwrap().reason, BreakReason::OutOfSequence);
}
