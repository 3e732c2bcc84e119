//! Claims and expiry sweeps.

use crate::commands::{event_id, CmdResult, ConsoleLedger, Context};
use crate::output;
use rollcall_canonical::WinnerId;
use serde_json::json;

pub fn run(ctx: &Context, event: String, winner: String, code: String, json: bool) -> CmdResult {
    let id = event_id(&event)?;
    let winner_id = WinnerId::parse(winner).map_err(|e| format!("Invalid winner id: {}", e))?;
    let receipt = ctx.desk()?.claim(&id, &winner_id, &code, ctx.now())?;
    let credit = receipt.ledger_credit();

    if json {
        println!(
            "{}",
            output::format_json(&json!({
                "winnerId": receipt.winner.id,
                "userId": receipt.winner.user_id,
                "prizeId": receipt.winner.prize_id,
                "claimedAt": receipt.winner.claimed_at,
                "credit": credit,
            }))
        );
        return Ok(());
    }

    println!(
        "claimed {} by {}",
        receipt.winner.prize_title, receipt.winner.user_id
    );
    if let Some(credit) = credit {
        credit
            .apply(&mut ConsoleLedger)
            .unwrap_or_else(|never| match never {});
    }
    Ok(())
}

pub fn sweep(ctx: &Context, event: Option<String>) -> CmdResult {
    let desk = ctx.desk()?;
    let now = ctx.now();
    let swept = match event {
        Some(raw) => {
            let id = event_id(&raw)?;
            let expired = desk.sweep(&id, now)?;
            vec![(id, expired)]
        }
        None => desk.sweep_all(now)?,
    };

    let mut total = 0;
    for (id, expired) in &swept {
        for winner in expired {
            println!("{} {}", id, winner);
        }
        total += expired.len();
    }
    eprintln!("{} winner(s) expired", total);
    Ok(())
}
