//! QR credential issuance.

use crate::commands::{event_id, CmdResult, Context};
use crate::output;

/// Prints the QR text on stdout so it can be piped into an encoder.
pub fn issue(ctx: &Context, event: String, json: bool) -> CmdResult {
    let id = event_id(&event)?;
    let credential = ctx.desk()?.issue_credential(&id, ctx.now())?;

    if json {
        println!("{}", output::format_json(&credential));
    } else {
        println!("{}", credential.payload);
        eprintln!(
            "credential {} expires {}",
            credential.id,
            credential.expires_at.to_rfc3339()
        );
    }
    Ok(())
}

pub fn deactivate(ctx: &Context, event: String) -> CmdResult {
    let id = event_id(&event)?;
    ctx.desk()?.deactivate_credential(&id, ctx.now())?;
    println!("credential deactivated for {}", id);
    Ok(())
}
