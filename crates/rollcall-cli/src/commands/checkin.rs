//! Scan verification and admission.

use crate::commands::{event_id, user_id, CmdResult, ConsoleLedger, Context};
use crate::output;
use rollcall_canonical::ScanId;
use rollcall_core::{Coordinate, Identity, ScanLocation, ScanRequest};
use rollcall_store::DeskError;
use serde_json::json;
use std::path::PathBuf;

/// Scan arguments of `rollcall check-in`.
pub struct Scan {
    pub payload: Option<String>,
    pub payload_file: Option<PathBuf>,
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
    pub user: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn run(ctx: &Context, event: String, scan: Scan, json: bool) -> CmdResult {
    let id = event_id(&event)?;
    let raw_payload = match (scan.payload, scan.payload_file) {
        (Some(payload), _) => payload,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read payload file {}: {}", path.display(), e))?
            .trim_end()
            .to_string(),
        (None, None) => return Err("either --payload or --payload-file is required".into()),
    };
    let request = ScanRequest {
        scan_id: ScanId::generate(),
        raw_payload,
        location: ScanLocation {
            coordinate: Coordinate::new(scan.lat, scan.lng)?,
            accuracy_meters: scan.accuracy,
        },
        identity: Identity {
            user_id: user_id(&scan.user)?,
            name: scan.name,
            email: scan.email,
            phone: scan.phone,
        },
    };

    let desk = ctx.desk()?;
    match desk.check_in(&id, &request, ctx.now()) {
        Ok(receipt) => {
            if json {
                println!(
                    "{}",
                    output::format_json(&json!({ "accepted": true, "receipt": receipt }))
                );
            } else {
                println!("checked in {} as {}", receipt.attendee.user_id, receipt.attendee.id);
                println!("{}", output::format_checks(&receipt.details));
                if let Some(bonus) = &receipt.bonus {
                    bonus
                        .apply(&mut ConsoleLedger)
                        .unwrap_or_else(|never| match never {});
                }
            }
            Ok(())
        }
        Err(DeskError::CheckIn(rejection)) => {
            if json {
                println!(
                    "{}",
                    output::format_json(&json!({
                        "accepted": false,
                        "code": rejection.error.code(),
                        "details": rejection.details,
                    }))
                );
            } else {
                eprintln!("{}", output::format_checks(&rejection.details));
            }
            Err(rejection.into())
        }
        Err(e) => Err(e.into()),
    }
}
