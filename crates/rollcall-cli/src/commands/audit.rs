//! Audit journal inspection.

use crate::commands::{event_id, CliError, CmdResult, Context};
use crate::output;
use rollcall_journal::{verify_journal, BreakReason, JournalReader, ReadMode};
use serde_json::json;

pub fn list(ctx: &Context, event: Option<String>, json: bool) -> CmdResult {
    let path = ctx.journal();
    if !path.exists() {
        return Err(CliError::NoJournal(path.to_path_buf()).into());
    }
    let only = event.as_deref().map(event_id).transpose()?;

    let mut reader = JournalReader::open(path, ReadMode::Strict)
        .map_err(|e| format!("Failed to open journal: {}", e))?;
    let mut records = Vec::new();
    while let Some(record) = reader.read_record()? {
        if only.as_ref().map_or(true, |id| &record.event_id == id) {
            records.push(record);
        }
    }

    if json {
        println!("{}", output::format_json(&records));
        return Ok(());
    }

    let widths = [6, 22, 36, 25];
    output::print_table_header(&[
        ("SEQ", widths[0]),
        ("KIND", widths[1]),
        ("EVENT_ID", widths[2]),
        ("OCCURRED_AT", widths[3]),
    ]);
    for record in &records {
        let seq = record.seq.to_string();
        let kind = record.kind.to_string();
        let at = record.occurred_at.to_rfc3339();
        println!(
            "{}",
            output::format_table_row(&[&seq, &kind, record.event_id.as_str(), &at], &widths)
        );
    }
    Ok(())
}

pub fn verify(ctx: &Context, json: bool) -> CmdResult {
    let path = ctx.journal();
    if !path.exists() {
        return Err(CliError::NoJournal(path.to_path_buf()).into());
    }
    let canonicalizer = ctx.settings()?.canonicalizer();
    let report = verify_journal(path, &canonicalizer)?;

    let failure = report.first_break.as_ref().map(|b| {
        let reason = match b.reason {
            BreakReason::DigestMismatch => "digest_mismatch",
            BreakReason::BrokenLink => "broken_link",
            BreakReason::OutOfSequence => "out_of_sequence",
        };
        (b.seq, reason)
    });

    if json {
        println!(
            "{}",
            output::format_json(&json!({
                "records": report.records,
                "intact": report.is_intact(),
                "tip": report.tip,
                "firstBreak": failure.map(|(seq, reason)| json!({ "seq": seq, "reason": reason })),
            }))
        );
    } else {
        println!("records: {}", report.records);
        if let Some(tip) = &report.tip {
            println!("tip:     {}", tip.b64);
        }
    }

    match failure {
        Some((seq, reason)) => Err(format!("chain broken at record {}: {}", seq, reason).into()),
        None => {
            if !json {
                println!("chain intact");
            }
            Ok(())
        }
    }
}
