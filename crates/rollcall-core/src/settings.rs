//! Host-supplied configuration.

use chrono::Duration;
use rollcall_canonical::{Canonicalizer, ProfileId, ValidationError, DEFAULT_PROFILE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Shortest claim code the draw engine will issue.
pub const MIN_CLAIM_CODE_LENGTH: usize = 8;
/// Longest claim code the draw engine will issue.
pub const MAX_CLAIM_CODE_LENGTH: usize = 32;
/// Longest accepted claim window: ten years.
pub const MAX_CLAIM_WINDOW_HOURS: i64 = 10 * 365 * 24;
/// Longest accepted credential lifetime: ten years.
pub const MAX_CREDENTIAL_TTL_MINUTES: i64 = MAX_CLAIM_WINDOW_HOURS * 60;

/// Errors raised while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid settings JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid setting: {0}")]
    Invalid(#[from] ValidationError),
}

/// Tunables for credential issuance, check-in, and the draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Time winners have to claim, in hours (default 168 = 7 days).
    pub claim_window_hours: i64,
    /// Length of generated claim codes (8..=32).
    pub claim_code_length: usize,
    /// Lifetime of a freshly issued credential, in minutes.
    pub credential_ttl_minutes: i64,
    /// Scan limit applied to newly issued credentials.
    pub default_scan_limit: Option<u32>,
    /// Currency amount the caller should credit after a successful check-in.
    pub check_in_bonus: u64,
    /// Canonicalization profile used for credential digests.
    pub canonical_profile: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            claim_window_hours: 7 * 24,
            claim_code_length: MIN_CLAIM_CODE_LENGTH,
            credential_ttl_minutes: 24 * 60,
            default_scan_limit: None,
            check_in_bonus: 0,
            canonical_profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl Settings {
    /// Parses and validates settings from JSON; missing keys take defaults.
    pub fn from_json_str(input: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_CLAIM_WINDOW_HOURS).contains(&self.claim_window_hours) {
            return Err(ValidationError::OutOfBounds {
                field: "claim_window_hours",
                value: self.claim_window_hours.to_string(),
            });
        }
        if !(MIN_CLAIM_CODE_LENGTH..=MAX_CLAIM_CODE_LENGTH).contains(&self.claim_code_length) {
            return Err(ValidationError::OutOfBounds {
                field: "claim_code_length",
                value: self.claim_code_length.to_string(),
            });
        }
        if !(1..=MAX_CREDENTIAL_TTL_MINUTES).contains(&self.credential_ttl_minutes) {
            return Err(ValidationError::OutOfBounds {
                field: "credential_ttl_minutes",
                value: self.credential_ttl_minutes.to_string(),
            });
        }
        if self.default_scan_limit == Some(0) {
            return Err(ValidationError::OutOfBounds {
                field: "default_scan_limit",
                value: "0".to_string(),
            });
        }
        ProfileId::parse(self.canonical_profile.clone())?;
        Ok(())
    }

    /// Claim window as a duration, clamped to the accepted range.
    pub fn claim_window(&self) -> Duration {
        Duration::hours(self.claim_window_hours.clamp(1, MAX_CLAIM_WINDOW_HOURS))
    }

    /// Credential lifetime as a duration, clamped to the accepted range.
    pub fn credential_ttl(&self) -> Duration {
        Duration::minutes(
            self.credential_ttl_minutes
                .clamp(1, MAX_CREDENTIAL_TTL_MINUTES),
        )
    }

    /// Canonicalizer for the configured profile.
    pub fn canonicalizer(&self) -> Canonicalizer {
        Canonicalizer::new(ProfileId::new(self.canonical_profile.clone()))
    }
}
