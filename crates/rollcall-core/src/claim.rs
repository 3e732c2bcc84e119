//! Claim lifecycle.
//!
//! `pending -> claimed` happens through [`claim_prize`] with the right code
//! before the deadline. `pending -> expired` happens only through
//! [`sweep_expired`], which the host runs periodically; claim attempts never
//! write the expired state themselves. Both target states are terminal.

use chrono::{DateTime, Utc};
use rollcall_canonical::WinnerId;
use serde::{Deserialize, Serialize};

use crate::errors::ClaimError;
use crate::ledger::{CreditReason, LedgerCredit};
use crate::model::{ClaimStatus, Event, PrizeType, Winner};

/// Accepted claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    /// Winner record after the transition.
    pub winner: Winner,
}

impl ClaimReceipt {
    /// Credit the caller owes the winner, for currency prizes only.
    pub fn ledger_credit(&self) -> Option<LedgerCredit> {
        (self.winner.prize_type == PrizeType::Currency).then(|| LedgerCredit {
            user_id: self.winner.user_id.clone(),
            amount: self.winner.prize_value,
            reason: CreditReason::PrizeClaim {
                prize_id: self.winner.prize_id.clone(),
            },
        })
    }
}

/// Validates a claim attempt and returns the claimed record.
///
/// Checks run in this order: already claimed, expired (by status or by
/// deadline, whatever the code), code mismatch. The input is not modified.
pub fn claim_prize(
    winner: &Winner,
    submitted_code: &str,
    now: DateTime<Utc>,
) -> Result<Winner, ClaimError> {
    match winner.claim_status {
        ClaimStatus::Claimed => return Err(ClaimError::AlreadyClaimed),
        ClaimStatus::Expired => return Err(ClaimError::Expired),
        ClaimStatus::Pending => {}
    }
    if now > winner.claim_deadline {
        return Err(ClaimError::Expired);
    }
    if !winner.claim_code.matches(submitted_code) {
        return Err(ClaimError::CodeMismatch);
    }
    let mut claimed = winner.clone();
    claimed.claim_status = ClaimStatus::Claimed;
    claimed.claimed_at = Some(now);
    Ok(claimed)
}

/// Claims a winner of `event` in place.
pub fn claim_in_event(
    event: &mut Event,
    winner_id: &WinnerId,
    submitted_code: &str,
    now: DateTime<Utc>,
) -> Result<ClaimReceipt, ClaimError> {
    let slot = event
        .winner_mut(winner_id)
        .ok_or(ClaimError::WinnerNotFound)?;
    let claimed = claim_prize(slot, submitted_code, now)?;
    *slot = claimed.clone();
    Ok(ClaimReceipt { winner: claimed })
}

/// Moves every pending winner whose deadline passed to `expired`.
///
/// Returns the ids that changed. Running it again is a no-op.
pub fn sweep_expired(event: &mut Event, now: DateTime<Utc>) -> Vec<WinnerId> {
    event
        .winners
        .iter_mut()
        .filter(|w| w.claim_status == ClaimStatus::Pending && now > w.claim_deadline)
        .map(|w| {
            w.claim_status = ClaimStatus::Expired;
            w.id.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClaimCode;
    use chrono::{Duration, TimeZone};
    use rollcall_canonical::{AttendeeId, PrizeId, UserId};

    fn winner(prize_type: PrizeType) -> Winner {
        let selected = Utc.with_ymd_and_hms(2024, 6, 1, 22, 0, 0).unwrap();
        Winner {
            id: WinnerId::generate(),
            attendee_id: AttendeeId::generate(),
            user_id: UserId::parse("user:alice").unwrap(),
            prize_id: PrizeId::generate(),
            prize_title: "500 coins".into(),
            prize_type,
            prize_value: 500,
            selected_at: selected,
            claim_status: ClaimStatus::Pending,
            claim_code: ClaimCode::new("QW12ER34".into()),
            claim_deadline: selected + Duration::days(7),
            claimed_at: None,
        }
    }

    #[test]
    fn pending_to_claimed() {
        let w = winner(PrizeType::Physical);
        let now = w.selected_at + Duration::hours(1);
        let claimed = claim_prize(&w, "QW12ER34", now).unwrap();
        assert_eq!(claimed.claim_status, ClaimStatus::Claimed);
        assert_eq!(claimed.claimed_at, Some(now));
        assert_eq!(w.claim_status, ClaimStatus::Pending);
        assert_eq!(
            claim_prize(&claimed, "QW12ER34", now),
            Err(ClaimError::AlreadyClaimed)
        );
    }

    #[test]
    fn deadline_is_inclusive() {
        let w = winner(PrizeType::Voucher);
        assert!(claim_prize(&w, "QW12ER34", w.claim_deadline).is_ok());
        assert_eq!(
            claim_prize(&w, "QW12ER34", w.claim_deadline + Duration::seconds(1)),
            Err(ClaimError::Expired)
        );
        assert_eq!(
            claim_prize(&w, "WRONG000", w.claim_deadline + Duration::seconds(1)),
            Err(ClaimError::Expired)
        );
    }

    #[test]
    fn wrong_code() {
        let w = winner(PrizeType::Service);
        assert_eq!(
            claim_prize(&w, "QW12ER35", w.selected_at),
            Err(ClaimError::CodeMismatch)
        );
    }

    #[test]
    fn currency_claims_owe_a_credit() {
        let receipt = ClaimReceipt {
            winner: winner(PrizeType::Currency),
        };
        let credit = receipt.ledger_credit().unwrap();
        assert_eq!(credit.amount, 500);
        let receipt = ClaimReceipt {
            winner: winner(PrizeType::Physical),
        };
        assert!(receipt.ledger_credit().is_none());
    }
}
