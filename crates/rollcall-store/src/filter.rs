//! Winner filtering for exports and listings.

use rollcall_canonical::{PrizeId, UserId};
use rollcall_core::{ClaimStatus, PrizeType, Winner};

/// Selects winner records.
pub trait WinnerFilter {
    /// Returns true if the winner matches.
    fn matches(&self, winner: &Winner) -> bool;
}

/// Matches every winner.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllWinners;

impl WinnerFilter for AllWinners {
    fn matches(&self, _winner: &Winner) -> bool {
        true
    }
}

/// Filter by claim status.
#[derive(Debug, Clone)]
pub struct ClaimStatusFilter {
    /// Status to match.
    pub status: ClaimStatus,
}

impl WinnerFilter for ClaimStatusFilter {
    fn matches(&self, winner: &Winner) -> bool {
        winner.claim_status == self.status
    }
}

/// Filter by prize.
#[derive(Debug, Clone)]
pub struct PrizeFilter {
    /// Prize id to match.
    pub prize_id: PrizeId,
}

impl WinnerFilter for PrizeFilter {
    fn matches(&self, winner: &Winner) -> bool {
        winner.prize_id == self.prize_id
    }
}

/// Filter by prize category.
#[derive(Debug, Clone)]
pub struct PrizeTypeFilter {
    /// Category to match.
    pub prize_type: PrizeType,
}

impl WinnerFilter for PrizeTypeFilter {
    fn matches(&self, winner: &Winner) -> bool {
        winner.prize_type == self.prize_type
    }
}

/// Filter by winning user.
#[derive(Debug, Clone)]
pub struct UserFilter {
    /// User id to match.
    pub user_id: UserId,
}

impl WinnerFilter for UserFilter {
    fn matches(&self, winner: &Winner) -> bool {
        winner.user_id == self.user_id
    }
}

/// Composite filter: all filters must match (AND).
pub struct AndFilter {
    /// Filters to combine with AND logic.
    pub filters: Vec<Box<dyn WinnerFilter>>,
}

impl WinnerFilter for AndFilter {
    fn matches(&self, winner: &Winner) -> bool {
        self.filters.iter().all(|f| f.matches(winner))
    }
}

/// Composite filter: any filter must match (OR).
pub struct OrFilter {
    /// Filters to combine with OR logic.
    pub filters: Vec<Box<dyn WinnerFilter>>,
}

impl WinnerFilter for OrFilter {
    fn matches(&self, winner: &Winner) -> bool {
        self.filters.iter().any(|f| f.matches(winner))
    }
}
