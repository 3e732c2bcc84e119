//! Prize management.

use crate::commands::{event_id, CmdResult, Context};
use crate::PrizeTypeArg;
use rollcall_core::{Prize, PrizeType};

impl From<PrizeTypeArg> for PrizeType {
    fn from(arg: PrizeTypeArg) -> Self {
        match arg {
            PrizeTypeArg::Currency => PrizeType::Currency,
            PrizeTypeArg::Physical => PrizeType::Physical,
            PrizeTypeArg::Voucher => PrizeType::Voucher,
            PrizeTypeArg::Service => PrizeType::Service,
        }
    }
}

pub fn add(
    ctx: &Context,
    event: String,
    title: String,
    prize_type: PrizeTypeArg,
    value: u64,
    quantity: u32,
) -> CmdResult {
    let id = event_id(&event)?;
    let prize = Prize::new(title, prize_type.into(), value, quantity)?;
    let prize_id = ctx.desk()?.add_prize(&id, prize, ctx.now())?;
    println!("{}", prize_id);
    Ok(())
}
