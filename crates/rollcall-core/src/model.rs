use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rollcall_canonical::{
    AttendeeId, CredentialId, Digest, EventId, PrizeId, ScanId, UserId, ValidationError, WinnerId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::credential::constant_time_eq;
use crate::errors::StatusError;
use crate::geo::Coordinate;

/// Event lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Created, not yet open for check-in.
    Draft,
    /// Open for check-in.
    Active,
    /// Finished (terminal).
    Ended,
    /// Called off (terminal).
    Cancelled,
}

impl EventStatus {
    /// `ended` and `cancelled` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Ended | EventStatus::Cancelled)
    }

    /// Returns true if `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        match (self, next) {
            (EventStatus::Draft, EventStatus::Active) => true,
            (EventStatus::Active, EventStatus::Ended) => true,
            (from, EventStatus::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Draft => "draft",
            EventStatus::Active => "active",
            EventStatus::Ended => "ended",
            EventStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Start and end of an event as calendar date plus time of day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSchedule {
    /// Start date.
    pub start_date: NaiveDate,
    /// Start time of day.
    pub start_time: NaiveTime,
    /// End date.
    pub end_date: NaiveDate,
    /// End time of day.
    pub end_time: NaiveTime,
}

impl EventSchedule {
    /// Builds a schedule from two instants.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_date: start.date_naive(),
            start_time: start.time(),
            end_date: end.date_naive(),
            end_time: end.time(),
        }
    }

    /// Composite start instant.
    pub fn starts_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start_date.and_time(self.start_time))
    }

    /// Composite end instant.
    pub fn ends_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.end_date.and_time(self.end_time))
    }

    /// Inclusive on both ends.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.starts_at() <= now && now <= self.ends_at()
    }
}

/// QR credential bound to one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCredential {
    /// Credential id, embedded in the payload.
    pub id: CredentialId,
    /// Opaque text encoded into the QR image.
    pub payload: String,
    /// Server-held random reference; a payload must echo it to validate.
    pub nonce: String,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Scans after this instant fail with `Expired`.
    pub expires_at: DateTime<Utc>,
    /// Inactive credentials fail with `Inactive`.
    pub is_active: bool,
    /// Optional cap on successful check-ins through this credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_limit: Option<u32>,
    /// Successful check-ins so far.
    #[serde(default)]
    pub scans_used: u32,
}

/// Prize category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrizeType {
    /// In-app currency credited to the winner's wallet.
    #[serde(alias = "flixbits")]
    Currency,
    /// Physical goods.
    Physical,
    /// Voucher or coupon.
    Voucher,
    /// Service delivered by the organizer.
    Service,
}

/// A prize with one or more independent winner slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    /// Prize id.
    pub id: PrizeId,
    /// Display title.
    pub title: String,
    /// Category.
    #[serde(rename = "type")]
    pub prize_type: PrizeType,
    /// Value in whole currency units.
    pub value: u64,
    /// Number of winner slots, at least one.
    pub quantity: u32,
    /// Inactive prizes are skipped by the draw.
    pub is_active: bool,
}

impl Prize {
    /// Creates an active prize, rejecting a zero quantity.
    pub fn new(
        title: impl Into<String>,
        prize_type: PrizeType,
        value: u64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::OutOfBounds {
                field: "quantity",
                value: quantity.to_string(),
            });
        }
        Ok(Self {
            id: PrizeId::generate(),
            title: title.into(),
            prize_type,
            value,
            quantity,
            is_active: true,
        })
    }
}

/// Location reported by the scanning device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLocation {
    /// Reported position.
    pub coordinate: Coordinate,
    /// Reported horizontal accuracy in meters, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
}

/// Attendee verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Passed every check-in check.
    Verified,
    /// Awaiting review.
    Pending,
    /// Failed review.
    Failed,
}

/// Where an attendee record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProvenance {
    /// Credential that was scanned.
    pub credential_id: CredentialId,
    /// Scan attempt id.
    pub scan_id: ScanId,
    /// Digest over event, user, credential, scan and time.
    pub verification_hash: Digest,
}

/// A verified attendee of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    /// Attendee id.
    pub id: AttendeeId,
    /// User id, unique per event.
    pub user_id: UserId,
    /// Display name from the identity provider.
    pub name: String,
    /// Time of the successful scan.
    pub scanned_at: DateTime<Utc>,
    /// Reported scan location.
    pub scan_location: ScanLocation,
    /// Verification status.
    pub verification_status: VerificationStatus,
    /// Whether the attendee takes part in the draw.
    pub is_eligible_for_draw: bool,
    /// Audit provenance.
    pub provenance: ScanProvenance,
}

impl Attendee {
    /// Verified and eligible.
    pub fn in_draw_pool(&self) -> bool {
        self.is_eligible_for_draw && self.verification_status == VerificationStatus::Verified
    }
}

/// Winner claim status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Awaiting a claim.
    Pending,
    /// Claimed (terminal).
    Claimed,
    /// Deadline passed without a claim (terminal).
    Expired,
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Claimed => "claimed",
            ClaimStatus::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Opaque uppercase alphanumeric claim code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimCode(String);

impl ClaimCode {
    /// Wraps an already generated code.
    pub fn new(code: String) -> Self {
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against user input, ignoring surrounding whitespace and case.
    pub fn matches(&self, submitted: &str) -> bool {
        let submitted = submitted.trim().to_ascii_uppercase();
        constant_time_eq(self.0.as_bytes(), submitted.as_bytes())
    }
}

impl fmt::Display for ClaimCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A drawn winner of one prize slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    /// Winner id.
    pub id: WinnerId,
    /// Winning attendee record.
    pub attendee_id: AttendeeId,
    /// Winning user.
    pub user_id: UserId,
    /// Prize won.
    pub prize_id: PrizeId,
    /// Prize title at draw time.
    pub prize_title: String,
    /// Prize category at draw time.
    pub prize_type: PrizeType,
    /// Prize value at draw time.
    pub prize_value: u64,
    /// Draw time.
    pub selected_at: DateTime<Utc>,
    /// Claim status.
    pub claim_status: ClaimStatus,
    /// Code the winner must present.
    pub claim_code: ClaimCode,
    /// Claims after this instant fail with `Expired`.
    pub claim_deadline: DateTime<Utc>,
    /// Set once claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Draw configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawSettings {
    /// Scheduled draw time, informational for hosts that automate draws.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_time: Option<DateTime<Utc>>,
    /// Host should run the draw at `draw_time`.
    #[serde(default)]
    pub automatic: bool,
    /// One user may win several distinct prizes.
    #[serde(default)]
    pub allow_multiple_wins: bool,
}

/// Read-only snapshot of the parts of an event the pure check-in stages need.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSite {
    /// Event id.
    pub event_id: EventId,
    /// Venue.
    pub location: Coordinate,
    /// Geofence radius.
    pub verification_radius_meters: f64,
    /// Lifecycle status; only active events admit scans.
    pub status: EventStatus,
    /// Current credential, if any.
    pub credential: Option<QrCredential>,
}

/// The event aggregate. Owns its prizes, attendees and winners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id.
    pub id: EventId,
    /// Title.
    pub title: String,
    /// Organizer.
    pub creator: UserId,
    /// Venue.
    pub location: Coordinate,
    /// Geofence radius in meters.
    pub verification_radius_meters: f64,
    /// Check-in window.
    pub schedule: EventSchedule,
    /// Current QR credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_credential: Option<QrCredential>,
    /// Capacity.
    pub max_attendees: u32,
    /// Prizes in draw order.
    #[serde(default)]
    pub prizes: Vec<Prize>,
    /// Verified attendees.
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    /// Draw results.
    #[serde(default)]
    pub winners: Vec<Winner>,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Draw configuration.
    #[serde(default)]
    pub draw_settings: DrawSettings,
    /// Set once the draw ran; guards against a second draw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Creates a draft event with no prizes, attendees or credential.
    pub fn new(
        title: impl Into<String>,
        creator: UserId,
        location: Coordinate,
        verification_radius_meters: f64,
        schedule: EventSchedule,
        max_attendees: u32,
    ) -> Result<Self, ValidationError> {
        if !verification_radius_meters.is_finite() || verification_radius_meters < 0.0 {
            return Err(ValidationError::OutOfBounds {
                field: "verification_radius_meters",
                value: verification_radius_meters.to_string(),
            });
        }
        if schedule.ends_at() < schedule.starts_at() {
            return Err(ValidationError::OutOfBounds {
                field: "schedule",
                value: format!("{} > {}", schedule.starts_at(), schedule.ends_at()),
            });
        }
        Ok(Self {
            id: EventId::generate(),
            title: title.into(),
            creator,
            location,
            verification_radius_meters,
            schedule,
            qr_credential: None,
            max_attendees,
            prizes: Vec::new(),
            attendees: Vec::new(),
            winners: Vec::new(),
            status: EventStatus::Draft,
            draw_settings: DrawSettings::default(),
            drawn_at: None,
        })
    }

    /// Always equal to `attendees.len()`.
    pub fn current_attendees(&self) -> usize {
        self.attendees.len()
    }

    /// Returns true once `max_attendees` is reached.
    pub fn is_full(&self) -> bool {
        self.attendees.len() >= self.max_attendees as usize
    }

    /// Returns the attendee record of `user_id`, if any.
    pub fn attendee_for(&self, user_id: &UserId) -> Option<&Attendee> {
        self.attendees.iter().find(|a| &a.user_id == user_id)
    }

    /// Attendees in the draw pool, in check-in order.
    pub fn eligible_attendees(&self) -> impl Iterator<Item = &Attendee> {
        self.attendees.iter().filter(|a| a.in_draw_pool())
    }

    /// Active prizes in declaration order.
    pub fn active_prizes(&self) -> impl Iterator<Item = &Prize> {
        self.prizes.iter().filter(|p| p.is_active)
    }

    /// Looks up a winner record.
    pub fn winner(&self, id: &WinnerId) -> Option<&Winner> {
        self.winners.iter().find(|w| &w.id == id)
    }

    /// Looks up a winner record for mutation.
    pub fn winner_mut(&mut self, id: &WinnerId) -> Option<&mut Winner> {
        self.winners.iter_mut().find(|w| &w.id == id)
    }

    /// Snapshot for the lock-free check-in stages.
    pub fn site(&self) -> EventSite {
        EventSite {
            event_id: self.id.clone(),
            location: self.location,
            verification_radius_meters: self.verification_radius_meters,
            status: self.status,
            credential: self.qr_credential.clone(),
        }
    }

    /// Moves the event to `next`. Ending or cancelling switches the credential off.
    pub fn transition(&mut self, next: EventStatus) -> Result<(), StatusError> {
        if !self.status.can_transition_to(next) {
            return Err(StatusError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next.is_terminal() {
            if let Some(credential) = self.qr_credential.as_mut() {
                credential.is_active = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event() -> Event {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
        Event::new(
            "Launch night",
            UserId::parse("org:host").unwrap(),
            Coordinate::new(25.2, 55.27).unwrap(),
            100.0,
            EventSchedule::between(start, start + Duration::hours(4)),
            10,
        )
        .unwrap()
    }

    #[test]
    fn status_lifecycle() {
        let mut e = event();
        assert!(e.transition(EventStatus::Ended).is_err());
        e.transition(EventStatus::Active).unwrap();
        e.transition(EventStatus::Ended).unwrap();
        assert_eq!(
            e.transition(EventStatus::Cancelled),
            Err(StatusError::InvalidTransition {
                from: EventStatus::Ended,
                to: EventStatus::Cancelled
            })
        );
    }

    #[test]
    fn draft_can_be_cancelled() {
        let mut e = event();
        e.transition(EventStatus::Cancelled).unwrap();
        assert!(e.status.is_terminal());
        assert!(e.transition(EventStatus::Active).is_err());
    }

    #[test]
    fn schedule_is_inclusive() {
        let e = event();
        assert!(e.schedule.contains(e.schedule.starts_at()));
        assert!(e.schedule.contains(e.schedule.ends_at()));
        assert!(!e.schedule.contains(e.schedule.ends_at() + Duration::seconds(1)));
    }

    #[test]
    fn prize_quantity_must_be_positive() {
        assert!(Prize::new("Mug", PrizeType::Physical, 10, 0).is_err());
        assert!(Prize::new("Mug", PrizeType::Physical, 10, 1).is_ok());
    }

    #[test]
    fn claim_code_matching_is_case_insensitive() {
        let code = ClaimCode::new("AB12CD34".into());
        assert!(code.matches(" ab12cd34 "));
        assert!(!code.matches("AB12CD35"));
        assert!(!code.matches("AB12CD3"));
    }

    #[test]
    fn legacy_prize_type_alias() {
        let t: PrizeType = serde_json::from_str("\"flixbits\"").unwrap();
        assert_eq!(t, PrizeType::Currency);
    }
}
