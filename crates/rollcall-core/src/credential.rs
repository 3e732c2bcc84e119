//! QR credential issuance and validation.
//!
//! A payload is a JSON token carrying the event id, the credential id, the
//! issue time, a random nonce, and a digest over those fields. The nonce never
//! leaves the server except inside the payload, so a verifier holding the
//! event's current credential can tell a genuine payload from one written by
//! hand for the same event id.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::{CryptoRng, RngCore};
use rollcall_canonical::{
    compute_digest, Canonicalizer, CredentialId, Digest, EventId, ValidationError,
};
use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, CredentialError, StatusError};
use crate::model::{Event, EventSite, EventStatus, QrCredential};
use crate::settings::Settings;

/// Domain separator for credential digests: `b"rollcall:credential:v1\0"`.
const CREDENTIAL_DOMAIN_SEPARATOR: &[u8] = b"rollcall:credential:v1\0";

/// Type discriminator carried by every check-in payload.
pub const CREDENTIAL_TYPE: &str = "event_checkin";

/// Current payload schema version.
pub const PAYLOAD_VERSION: u32 = 1;

/// Nonce length in bytes before encoding.
const NONCE_BYTES: usize = 16;

/// Fields covered by the payload digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadBody<'a> {
    v: u32,
    #[serde(rename = "type")]
    kind: &'a str,
    event_id: &'a EventId,
    credential_id: &'a CredentialId,
    timestamp: i64,
    nonce: &'a str,
}

/// Decoded QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    /// Schema version.
    pub v: u32,
    /// Type discriminator, always [`CREDENTIAL_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Event the payload claims to belong to.
    pub event_id: EventId,
    /// Credential the payload claims to belong to.
    pub credential_id: CredentialId,
    /// Issue time in Unix milliseconds.
    pub timestamp: i64,
    /// Echo of the server-held nonce.
    pub nonce: String,
    /// Digest over every other field.
    pub digest: Digest,
}

impl CredentialPayload {
    fn body(&self) -> PayloadBody<'_> {
        PayloadBody {
            v: self.v,
            kind: &self.kind,
            event_id: &self.event_id,
            credential_id: &self.credential_id,
            timestamp: self.timestamp,
            nonce: &self.nonce,
        }
    }
}

/// Issues and validates QR credentials.
///
/// Constructed once by the host and handed to the check-in verifier.
#[derive(Debug, Clone)]
pub struct CredentialAuthority {
    canonicalizer: Canonicalizer,
    ttl: Duration,
    default_scan_limit: Option<u32>,
}

impl CredentialAuthority {
    /// Creates an authority with explicit parameters.
    pub fn new(canonicalizer: Canonicalizer, ttl: Duration, default_scan_limit: Option<u32>) -> Self {
        Self {
            canonicalizer,
            ttl,
            default_scan_limit,
        }
    }

    /// Creates an authority from host settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.canonicalizer(),
            settings.credential_ttl(),
            settings.default_scan_limit,
        )
    }

    /// Issues a new credential for `event_id`, expiring at `expires_at`.
    pub fn issue(
        &self,
        event_id: &EventId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<QrCredential, CoreError> {
        self.issue_with_rng(event_id, issued_at, expires_at, &mut rand::thread_rng())
    }

    /// Issues a credential drawing the nonce from `rng`.
    pub fn issue_with_rng<R: RngCore + CryptoRng>(
        &self,
        event_id: &EventId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<QrCredential, CoreError> {
        let mut nonce_bytes = [0u8; NONCE_BYTES];
        rng.fill_bytes(&mut nonce_bytes);
        let nonce = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(nonce_bytes);

        let id = CredentialId::generate();
        let timestamp = issued_at.timestamp_millis();
        let body = PayloadBody {
            v: PAYLOAD_VERSION,
            kind: CREDENTIAL_TYPE,
            event_id,
            credential_id: &id,
            timestamp,
            nonce: &nonce,
        };
        let digest = compute_digest(CREDENTIAL_DOMAIN_SEPARATOR, &body, &self.canonicalizer)?;
        let payload = serde_json::to_string(&CredentialPayload {
            v: PAYLOAD_VERSION,
            kind: CREDENTIAL_TYPE.to_string(),
            event_id: event_id.clone(),
            credential_id: id.clone(),
            timestamp,
            nonce: nonce.clone(),
            digest,
        })?;

        Ok(QrCredential {
            id,
            payload,
            nonce,
            issued_at,
            expires_at,
            is_active: true,
            scan_limit: self.default_scan_limit,
            scans_used: 0,
        })
    }

    /// Replaces the event's credential with a fresh one valid for the configured TTL.
    ///
    /// Only active events get credentials. Payloads of the previous credential
    /// stop validating immediately.
    pub fn refresh<'a>(
        &self,
        event: &'a mut Event,
        now: DateTime<Utc>,
    ) -> Result<&'a QrCredential, CoreError> {
        if event.status != EventStatus::Active {
            return Err(StatusError::NotActive(event.status).into());
        }
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ValidationError::OutOfBounds {
                field: "credential_ttl_minutes",
                value: self.ttl.num_minutes().to_string(),
            })?;
        let credential = self.issue(&event.id, now, expires_at)?;
        Ok(event.qr_credential.insert(credential))
    }

    /// Switches the event's credential off, if it has one.
    pub fn deactivate(&self, event: &mut Event) {
        if let Some(credential) = event.qr_credential.as_mut() {
            credential.is_active = false;
        }
    }

    /// Parses a payload and checks its digest. Does not consult any event.
    pub fn decode(&self, raw: &str) -> Result<CredentialPayload, CredentialError> {
        let payload: CredentialPayload =
            serde_json::from_str(raw.trim()).map_err(|_| CredentialError::Malformed)?;
        if payload.v != PAYLOAD_VERSION || payload.kind != CREDENTIAL_TYPE {
            return Err(CredentialError::Malformed);
        }
        let expected =
            compute_digest(CREDENTIAL_DOMAIN_SEPARATOR, &payload.body(), &self.canonicalizer)
                .map_err(|_| CredentialError::Malformed)?;
        if expected != payload.digest {
            return Err(CredentialError::Malformed);
        }
        Ok(payload)
    }

    /// Validates a scanned payload against the event's current credential.
    pub fn validate(
        &self,
        raw: &str,
        site: &EventSite,
        now: DateTime<Utc>,
    ) -> Result<(), CredentialError> {
        let payload = self.decode(raw)?;
        if payload.event_id != site.event_id {
            return Err(CredentialError::WrongEvent);
        }
        if site.status != EventStatus::Active {
            return Err(CredentialError::Inactive);
        }
        let credential = site.credential.as_ref().ok_or(CredentialError::Inactive)?;
        if credential.id != payload.credential_id
            || !constant_time_eq(credential.nonce.as_bytes(), payload.nonce.as_bytes())
            || !credential.is_active
        {
            return Err(CredentialError::Inactive);
        }
        if now > credential.expires_at {
            return Err(CredentialError::Expired);
        }
        if let Some(limit) = credential.scan_limit {
            if credential.scans_used >= limit {
                return Err(CredentialError::ScanLimitReached);
            }
        }
        Ok(())
    }
}

pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
