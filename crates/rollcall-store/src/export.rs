//! Flat winner rows for CSV/JSON export.

use chrono::{DateTime, Utc};
use rollcall_canonical::{EventId, PrizeId, UserId, WinnerId};
use rollcall_core::{ClaimStatus, Event, PrizeType};
use serde::{Deserialize, Serialize};

use crate::filter::WinnerFilter;

/// Column order of [`WinnerExportRow`] as rendered by tabular writers.
pub const WINNER_COLUMNS: [&str; 12] = [
    "event_id",
    "winner_id",
    "user_id",
    "attendee_name",
    "prize_id",
    "prize_title",
    "prize_type",
    "prize_value",
    "claim_status",
    "selected_at",
    "claim_deadline",
    "claimed_at",
];

/// One winner, denormalized with attendee and prize details. Claim codes are
/// never exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerExportRow {
    /// Event id.
    pub event_id: EventId,
    /// Winner id.
    pub winner_id: WinnerId,
    /// Winning user.
    pub user_id: UserId,
    /// Attendee display name, empty if the attendee record is gone.
    pub attendee_name: String,
    /// Prize id.
    pub prize_id: PrizeId,
    /// Prize title at draw time.
    pub prize_title: String,
    /// Prize category.
    pub prize_type: PrizeType,
    /// Prize value.
    pub prize_value: u64,
    /// Claim status.
    pub claim_status: ClaimStatus,
    /// Draw time.
    pub selected_at: DateTime<Utc>,
    /// Claim deadline.
    pub claim_deadline: DateTime<Utc>,
    /// Claim time, if claimed.
    pub claimed_at: Option<DateTime<Utc>>,
}

impl WinnerExportRow {
    /// Cell values in [`WINNER_COLUMNS`] order.
    pub fn cells(&self) -> [String; 12] {
        [
            self.event_id.to_string(),
            self.winner_id.to_string(),
            self.user_id.to_string(),
            self.attendee_name.clone(),
            self.prize_id.to_string(),
            self.prize_title.clone(),
            prize_type_label(self.prize_type).to_string(),
            self.prize_value.to_string(),
            self.claim_status.to_string(),
            self.selected_at.to_rfc3339(),
            self.claim_deadline.to_rfc3339(),
            self.claimed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        ]
    }
}

fn prize_type_label(prize_type: PrizeType) -> &'static str {
    match prize_type {
        PrizeType::Currency => "currency",
        PrizeType::Physical => "physical",
        PrizeType::Voucher => "voucher",
        PrizeType::Service => "service",
    }
}

/// Winners of `event` matching `filter`, in draw order.
pub fn winner_rows(event: &Event, filter: &dyn WinnerFilter) -> Vec<WinnerExportRow> {
    event
        .winners
        .iter()
        .filter(|w| filter.matches(w))
        .map(|w| WinnerExportRow {
            event_id: event.id.clone(),
            winner_id: w.id.clone(),
            user_id: w.user_id.clone(),
            attendee_name: event
                .attendees
                .iter()
                .find(|a| a.id == w.attendee_id)
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            prize_id: w.prize_id.clone(),
            prize_title: w.prize_title.clone(),
            prize_type: w.prize_type,
            prize_value: w.prize_value,
            claim_status: w.claim_status,
            selected_at: w.selected_at,
            claim_deadline: w.claim_deadline,
            claimed_at: w.claimed_at,
        })
        .collect()
}
