//! Prize draw and reset.

use crate::commands::{event_id, CmdResult, Context};
use crate::output;

/// Runs the draw. Claim codes are printed here and nowhere else, so the
/// operator can hand them to winners.
pub fn run(ctx: &Context, event: String, json: bool) -> CmdResult {
    let id = event_id(&event)?;
    let winners = ctx.desk()?.draw(&id, ctx.now())?;

    if json {
        println!("{}", output::format_json(&winners));
        return Ok(());
    }

    let widths = [36, 24, 24, 32, 25];
    output::print_table_header(&[
        ("WINNER_ID", widths[0]),
        ("USER", widths[1]),
        ("PRIZE", widths[2]),
        ("CLAIM_CODE", widths[3]),
        ("DEADLINE", widths[4]),
    ]);
    for winner in &winners {
        let deadline = winner.claim_deadline.to_rfc3339();
        println!(
            "{}",
            output::format_table_row(
                &[
                    winner.id.as_str(),
                    winner.user_id.as_str(),
                    &winner.prize_title,
                    winner.claim_code.as_str(),
                    &deadline,
                ],
                &widths,
            )
        );
    }
    Ok(())
}

pub fn reset(ctx: &Context, event: String) -> CmdResult {
    let id = event_id(&event)?;
    let discarded = ctx.desk()?.reset_draw(&id, ctx.now())?;
    println!("draw reset for {}: {} winner(s) discarded", id, discarded.len());
    Ok(())
}
