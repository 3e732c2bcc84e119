use rollcall_canonical::{DigestError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::EventStatus;

/// Reasons a QR credential payload is refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialError {
    /// Payload did not parse, had the wrong type, or failed its digest.
    #[error("credential payload is malformed")]
    Malformed,
    /// Payload was issued for a different event.
    #[error("credential was issued for a different event")]
    WrongEvent,
    /// Event has no credential, or it was replaced or switched off.
    #[error("credential is not active")]
    Inactive,
    /// Credential passed its expiry time.
    #[error("credential has expired")]
    Expired,
    /// Credential reached its configured scan limit.
    #[error("credential scan limit reached")]
    ScanLimitReached,
}

impl CredentialError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            CredentialError::Malformed => "CREDENTIAL_MALFORMED",
            CredentialError::WrongEvent => "CREDENTIAL_WRONG_EVENT",
            CredentialError::Inactive => "CREDENTIAL_INACTIVE",
            CredentialError::Expired => "CREDENTIAL_EXPIRED",
            CredentialError::ScanLimitReached => "CREDENTIAL_SCAN_LIMIT",
        }
    }
}

/// Reasons a check-in is refused.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckInError {
    /// Credential validation failed.
    #[error("credential check failed: {reason}")]
    Credential {
        /// Underlying credential failure.
        reason: CredentialError,
    },
    /// Scanner was outside the verification radius.
    #[error("scanner is {distance_meters:.1} m from the venue")]
    TooFar {
        /// Great-circle distance between scanner and venue.
        distance_meters: f64,
    },
    /// User already holds an attendee record for this event.
    #[error("user already checked in")]
    AlreadyCheckedIn,
    /// Event reached `max_attendees`.
    #[error("event is full")]
    EventFull,
    /// Scan happened before the start or after the end of the event.
    #[error("outside the event window")]
    OutsideEventWindow,
}

impl CheckInError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            CheckInError::Credential { reason } => reason.code(),
            CheckInError::TooFar { .. } => "TOO_FAR",
            CheckInError::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            CheckInError::EventFull => "EVENT_FULL",
            CheckInError::OutsideEventWindow => "OUTSIDE_EVENT_WINDOW",
        }
    }
}

impl From<CredentialError> for CheckInError {
    fn from(reason: CredentialError) -> Self {
        CheckInError::Credential { reason }
    }
}

/// Reasons a draw (or draw reset) is refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawError {
    /// No verified, eligible attendee.
    #[error("no eligible attendees")]
    NoEligibleAttendees,
    /// No active prize.
    #[error("no active prizes")]
    NoActivePrizes,
    /// The event already ran its draw.
    #[error("draw already conducted")]
    AlreadyDrawn,
    /// A reset was requested after a winner claimed a prize.
    #[error("cannot reset a draw with claimed prizes")]
    ClaimsRecorded,
    /// The claim deadline falls outside the representable date range.
    #[error("claim deadline is out of range")]
    DeadlineOutOfRange,
}

impl DrawError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            DrawError::NoEligibleAttendees => "NO_ELIGIBLE_ATTENDEES",
            DrawError::NoActivePrizes => "NO_ACTIVE_PRIZES",
            DrawError::AlreadyDrawn => "ALREADY_DRAWN",
            DrawError::ClaimsRecorded => "CLAIMS_RECORDED",
            DrawError::DeadlineOutOfRange => "DEADLINE_OUT_OF_RANGE",
        }
    }
}

/// Reasons a claim is refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimError {
    /// Submitted code differs from the winner's claim code.
    #[error("claim code does not match")]
    CodeMismatch,
    /// Claim deadline has passed.
    #[error("claim deadline has passed")]
    Expired,
    /// Prize was already claimed.
    #[error("prize already claimed")]
    AlreadyClaimed,
    /// No winner with the requested id exists on the event.
    #[error("winner not found")]
    WinnerNotFound,
}

impl ClaimError {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::CodeMismatch => "CODE_MISMATCH",
            ClaimError::Expired => "CLAIM_EXPIRED",
            ClaimError::AlreadyClaimed => "ALREADY_CLAIMED",
            ClaimError::WinnerNotFound => "WINNER_NOT_FOUND",
        }
    }
}

/// Event status lifecycle violations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusError {
    /// Transition is not part of `draft -> active -> ended` or `* -> cancelled`.
    #[error("cannot move event from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: EventStatus,
        /// Requested status.
        to: EventStatus,
    },
    /// Operation requires a non-terminal event.
    #[error("event is {0}")]
    Closed(EventStatus),
    /// Operation requires an active event.
    #[error("event is {0}, not active")]
    NotActive(EventStatus),
}

/// Core error types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Digest computation failed.
    #[error("digest computation failed: {0}")]
    Digest(#[from] DigestError),
    /// JSON encoding failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Input failed validation.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    /// Status lifecycle violation.
    #[error(transparent)]
    Status(#[from] StatusError),
    /// Draw refused.
    #[error(transparent)]
    Draw(#[from] DrawError),
    /// Claim refused.
    #[error(transparent)]
    Claim(#[from] ClaimError),
}
