//! Check-in verification pipeline.
//!
//! Stages run in a fixed order and the first failure stops the pipeline:
//! credential, location, duplicate user, capacity, time window. Every outcome,
//! accepted or rejected, carries [`VerificationDetails`] describing which
//! stages passed, failed, or never ran.
//!
//! The first two stages only need an [`EventSite`] snapshot and can run without
//! holding the event lock ([`CheckInVerifier::precheck`]). The rest mutate or
//! depend on the attendee list and must run under it ([`CheckInVerifier::admit`]).

use chrono::{DateTime, Utc};
use rollcall_canonical::{AttendeeId, Digest, EventId, ScanId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::CredentialAuthority;
use crate::errors::{CheckInError, CredentialError};
use crate::geo::distance_meters;
use crate::ledger::{CreditReason, LedgerCredit};
use crate::model::{
    Attendee, Event, EventSite, ScanLocation, ScanProvenance, VerificationStatus,
};
use crate::settings::Settings;

/// Domain separator for attendee verification hashes.
const ATTENDEE_DOMAIN_SEPARATOR: &[u8] = b"rollcall:attendee:v1\0";

/// Pre-authenticated identity supplied by the host's identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// User id.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// One scan attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Scan attempt id.
    pub scan_id: ScanId,
    /// Raw text decoded from the QR image.
    pub raw_payload: String,
    /// Where the scanning device was.
    pub location: ScanLocation,
    /// Who scanned.
    pub identity: Identity,
}

/// Check-in pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// QR credential validation.
    Credential,
    /// Geofence.
    Location,
    /// One record per user.
    Duplicate,
    /// `max_attendees`.
    Capacity,
    /// Event start/end.
    TimeWindow,
}

/// Stages in evaluation order.
pub const CHECK_ORDER: [CheckKind; 5] = [
    CheckKind::Credential,
    CheckKind::Location,
    CheckKind::Duplicate,
    CheckKind::Capacity,
    CheckKind::TimeWindow,
];

/// Status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Stage passed.
    Pass,
    /// Stage failed.
    Fail,
    /// Stage never ran because an earlier one failed.
    Skipped,
}

/// Result of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Stage.
    pub check: CheckKind,
    /// Outcome.
    pub status: CheckStatus,
    /// Stable reason code on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Per-stage verification state, reported on success and on rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDetails {
    /// One entry per stage in [`CHECK_ORDER`].
    pub checks: Vec<CheckResult>,
    /// Measured distance, once the location stage ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}

impl Default for VerificationDetails {
    fn default() -> Self {
        Self {
            checks: CHECK_ORDER
                .iter()
                .map(|&check| CheckResult {
                    check,
                    status: CheckStatus::Skipped,
                    code: None,
                })
                .collect(),
            distance_meters: None,
        }
    }
}

impl VerificationDetails {
    /// Status of `check`.
    pub fn status(&self, check: CheckKind) -> CheckStatus {
        self.checks
            .iter()
            .find(|r| r.check == check)
            .map(|r| r.status)
            .unwrap_or(CheckStatus::Skipped)
    }

    /// True once every stage passed.
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|r| r.status == CheckStatus::Pass)
    }

    fn set(&mut self, check: CheckKind, status: CheckStatus, code: Option<&str>) {
        if let Some(entry) = self.checks.iter_mut().find(|r| r.check == check) {
            entry.status = status;
            entry.code = code.map(str::to_string);
        }
    }

    fn pass(&mut self, check: CheckKind) {
        self.set(check, CheckStatus::Pass, None);
    }

    fn fail(mut self, check: CheckKind, error: CheckInError) -> CheckInRejection {
        self.set(check, CheckStatus::Fail, Some(error.code()));
        CheckInRejection {
            error,
            details: self,
        }
    }
}

/// Refused check-in with the partial verification state.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("check-in rejected: {error}")]
pub struct CheckInRejection {
    /// First failing stage's error.
    pub error: CheckInError,
    /// Stage-by-stage state.
    pub details: VerificationDetails,
}

/// Accepted check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInReceipt {
    /// New attendee record.
    pub attendee: Attendee,
    /// Stage-by-stage state (all passed).
    pub details: VerificationDetails,
    /// Bonus the caller should credit, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<LedgerCredit>,
}

/// Proof that the lock-free stages passed; consumed by [`CheckInVerifier::admit`].
#[derive(Debug, Clone)]
pub struct Prechecked {
    details: VerificationDetails,
}

impl Prechecked {
    /// State after the credential and location stages.
    pub fn details(&self) -> &VerificationDetails {
        &self.details
    }
}

/// Runs the check-in pipeline.
#[derive(Debug, Clone)]
pub struct CheckInVerifier {
    authority: CredentialAuthority,
    check_in_bonus: u64,
}

impl CheckInVerifier {
    /// Creates a verifier around an explicit credential authority.
    pub fn new(authority: CredentialAuthority, check_in_bonus: u64) -> Self {
        Self {
            authority,
            check_in_bonus,
        }
    }

    /// Creates a verifier from host settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            CredentialAuthority::from_settings(settings),
            settings.check_in_bonus,
        )
    }

    /// Credential authority used by the credential stage.
    pub fn authority(&self) -> &CredentialAuthority {
        &self.authority
    }

    /// Runs the whole pipeline and appends the attendee on success.
    pub fn check_in(
        &self,
        event: &mut Event,
        scan: &ScanRequest,
        now: DateTime<Utc>,
    ) -> Result<CheckInReceipt, CheckInRejection> {
        let prechecked = self.precheck(&event.site(), scan, now)?;
        self.admit(event, scan, prechecked, now)
    }

    /// Credential and location stages. Pure; needs no lock.
    pub fn precheck(
        &self,
        site: &EventSite,
        scan: &ScanRequest,
        now: DateTime<Utc>,
    ) -> Result<Prechecked, CheckInRejection> {
        let mut details = VerificationDetails::default();

        if let Err(reason) = self.authority.validate(&scan.raw_payload, site, now) {
            return Err(details.fail(CheckKind::Credential, reason.into()));
        }
        details.pass(CheckKind::Credential);

        let distance = distance_meters(scan.location.coordinate, site.location);
        details.distance_meters = Some(distance);
        if distance > site.verification_radius_meters {
            return Err(details.fail(
                CheckKind::Location,
                CheckInError::TooFar {
                    distance_meters: distance,
                },
            ));
        }
        details.pass(CheckKind::Location);

        Ok(Prechecked { details })
    }

    /// Remaining stages plus the append. Must run under the event's lock.
    ///
    /// The credential is re-validated first because it may have been refreshed,
    /// switched off, or exhausted since the precheck.
    pub fn admit(
        &self,
        event: &mut Event,
        scan: &ScanRequest,
        prechecked: Prechecked,
        now: DateTime<Utc>,
    ) -> Result<CheckInReceipt, CheckInRejection> {
        let mut details = prechecked.details;

        if let Err(reason) = self.authority.validate(&scan.raw_payload, &event.site(), now) {
            return Err(details.fail(CheckKind::Credential, reason.into()));
        }

        if event.attendee_for(&scan.identity.user_id).is_some() {
            return Err(details.fail(CheckKind::Duplicate, CheckInError::AlreadyCheckedIn));
        }
        details.pass(CheckKind::Duplicate);

        if event.is_full() {
            return Err(details.fail(CheckKind::Capacity, CheckInError::EventFull));
        }
        details.pass(CheckKind::Capacity);

        if !event.schedule.contains(now) {
            return Err(details.fail(CheckKind::TimeWindow, CheckInError::OutsideEventWindow));
        }
        details.pass(CheckKind::TimeWindow);

        let credential_id = match event.qr_credential.as_mut() {
            Some(credential) => {
                credential.scans_used = credential.scans_used.saturating_add(1);
                credential.id.clone()
            }
            None => {
                return Err(details.fail(CheckKind::Credential, CredentialError::Inactive.into()))
            }
        };

        let attendee = Attendee {
            id: AttendeeId::generate(),
            user_id: scan.identity.user_id.clone(),
            name: scan.identity.name.clone(),
            scanned_at: now,
            scan_location: scan.location,
            verification_status: VerificationStatus::Verified,
            is_eligible_for_draw: true,
            provenance: ScanProvenance {
                verification_hash: verification_hash(
                    &event.id,
                    &scan.identity.user_id,
                    credential_id.as_str(),
                    &scan.scan_id,
                    now,
                ),
                credential_id,
                scan_id: scan.scan_id.clone(),
            },
        };
        event.attendees.push(attendee.clone());

        let bonus = (self.check_in_bonus > 0).then(|| LedgerCredit {
            user_id: attendee.user_id.clone(),
            amount: self.check_in_bonus,
            reason: CreditReason::CheckInBonus,
        });

        Ok(CheckInReceipt {
            attendee,
            details,
            bonus,
        })
    }
}

/// `sha256(domain || event \0 user \0 credential \0 scan \0 rfc3339(now))`.
fn verification_hash(
    event_id: &EventId,
    user_id: &UserId,
    credential_id: &str,
    scan_id: &ScanId,
    scanned_at: DateTime<Utc>,
) -> Digest {
    let material = [
        event_id.as_str(),
        user_id.as_str(),
        credential_id,
        scan_id.as_str(),
        &scanned_at.to_rfc3339(),
    ]
    .join("\0");
    Digest::sha256(ATTENDEE_DOMAIN_SEPARATOR, material.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_details_skip_everything() {
        let d = VerificationDetails::default();
        assert_eq!(d.checks.len(), 5);
        assert!(CHECK_ORDER
            .iter()
            .all(|&k| d.status(k) == CheckStatus::Skipped));
        assert!(!d.all_passed());
    }

    #[test]
    fn failing_records_the_code() {
        let mut d = VerificationDetails::default();
        d.pass(CheckKind::Credential);
        let rejection = d.fail(CheckKind::Location, CheckInError::TooFar { distance_meters: 12.0 });
        assert_eq!(rejection.details.status(CheckKind::Credential), CheckStatus::Pass);
        assert_eq!(rejection.details.status(CheckKind::Location), CheckStatus::Fail);
        assert_eq!(rejection.details.checks[1].code.as_deref(), Some("TOO_FAR"));
        assert_eq!(rejection.details.status(CheckKind::Duplicate), CheckStatus::Skipped);
    }
}
