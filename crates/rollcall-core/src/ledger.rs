//! Currency credits computed by the core and applied by the caller.

use rollcall_canonical::{PrizeId, UserId};
use serde::{Deserialize, Serialize};

/// Why a credit is owed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreditReason {
    /// Bonus for a successful check-in.
    CheckInBonus,
    /// Claimed currency-type prize.
    PrizeClaim {
        /// Prize that was claimed.
        prize_id: PrizeId,
    },
}

/// Amount owed to a user's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCredit {
    /// Recipient.
    pub user_id: UserId,
    /// Whole currency units.
    pub amount: u64,
    /// Origin of the credit.
    pub reason: CreditReason,
}

/// External wallet ledger. Rollcall never calls this itself.
pub trait Ledger {
    /// Error type of the ledger backend.
    type Error;

    /// Credits `amount` to `user_id`.
    fn credit(&mut self, user_id: &UserId, amount: u64) -> Result<(), Self::Error>;
}

impl LedgerCredit {
    /// Applies this credit to `ledger`.
    pub fn apply<L: Ledger>(&self, ledger: &mut L) -> Result<(), L::Error> {
        ledger.credit(&self.user_id, self.amount)
    }
}
