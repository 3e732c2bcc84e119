//! Event check-in and prize draw core for Rollcall.
//!
//! This crate provides:
//! - QR credential issuance and validation bound to a single event
//! - Geofenced, capacity-checked check-in producing verified attendees
//! - A CSPRNG prize draw with optional win-once semantics
//! - The winner claim lifecycle and deadline sweep
//!
//! Core invariants:
//! - `current_attendees()` always equals the number of attendee records
//! - At most one attendee record per user per event
//! - A draw runs at most once per event unless explicitly reset
//! - Claimed and expired winners never change again
//! - Wallet credits are computed here but applied by the caller
//!
#![deny(missing_docs)]

/// Claim validation and expiry sweep.
pub mod claim;
/// Check-in verification pipeline.
pub mod checkin;
/// QR credential issuance and validation.
pub mod credential;
/// Prize draw engine.
pub mod draw;
/// Error types for core operations.
pub mod errors;
/// Great-circle distance.
pub mod geo;
/// Wallet credits and the ledger seam.
pub mod ledger;
/// Event aggregate and its records.
pub mod model;
/// Host configuration.
pub mod settings;

pub use claim::{claim_in_event, claim_prize, sweep_expired, ClaimReceipt};
pub use checkin::{
    CheckInReceipt, CheckInRejection, CheckInVerifier, CheckKind, CheckResult, CheckStatus,
    Identity, Prechecked, ScanRequest, VerificationDetails, CHECK_ORDER,
};
pub use credential::{CredentialAuthority, CredentialPayload, CREDENTIAL_TYPE, PAYLOAD_VERSION};
pub use draw::DrawEngine;
pub use errors::{CheckInError, ClaimError, CoreError, CredentialError, DrawError, StatusError};
pub use geo::{distance_meters, Coordinate, EARTH_RADIUS_METERS};
pub use ledger::{CreditReason, Ledger, LedgerCredit};
pub use model::{
    Attendee, ClaimCode, ClaimStatus, DrawSettings, Event, EventSchedule, EventSite, EventStatus,
    Prize, PrizeType, QrCredential, ScanLocation, ScanProvenance, VerificationStatus, Winner,
};
pub use settings::{
    Settings, SettingsError, MAX_CLAIM_CODE_LENGTH, MAX_CLAIM_WINDOW_HOURS,
    MAX_CREDENTIAL_TTL_MINUTES, MIN_CLAIM_CODE_LENGTH,
};
