use canonical_json::to_string;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::ProfileId;
use std::fmt;

/// Profile identifier used when no explicit profile is configured.
pub const DEFAULT_PROFILE: &str = "rollcall-canonical-v1";

/// Maximum nesting depth accepted by the canonicalizer.
const MAX_DEPTH: usize = 32;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Value could not be converted to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Non-finite number (NaN/Infinity) detected.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
    /// Nesting exceeds the supported depth.
    #[error("nesting too deep at {0}")]
    TooDeep(String),
    /// Generic failure from the RFC 8785 encoder.
    #[error("other error: {0}")]
    Other(String),
}

/// JSON path used in error messages.
#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push_field(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(field.to_string());
        Self { segments }
    }

    fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("[{}]", index));
        Self { segments }
    }

    fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

/// Canonicalizer that emits deterministic RFC 8785 bytes.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    profile: ProfileId,
}

impl Canonicalizer {
    /// Creates a new canonicalizer for the provided profile.
    pub fn new(profile: ProfileId) -> Self {
        Self { profile }
    }

    /// Returns the profile this canonicalizer was built for.
    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    /// Produces canonical bytes for an already-built JSON value.
    pub fn canonicalize(&self, value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
        self.validate(value, Path::root())?;
        let canonical =
            to_string(value).map_err(|err| CanonicalizationError::Other(err.to_string()))?;
        Ok(canonical.into_bytes())
    }

    /// Serializes `value`, stringifies every number, and canonicalizes the result.
    ///
    /// Numbers are hashed in their decimal string form so that float formatting
    /// differences between encoders cannot change a digest.
    pub fn canonicalize_serializable<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, CanonicalizationError> {
        let mut json = serde_json::to_value(value)
            .map_err(|e| CanonicalizationError::Serialization(e.to_string()))?;
        stringify_numbers(&mut json);
        self.canonicalize(&json)
    }

    fn validate(&self, value: &Value, path: Path) -> Result<(), CanonicalizationError> {
        if path.depth() > MAX_DEPTH {
            return Err(CanonicalizationError::TooDeep(path.to_string()));
        }
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.validate(child, path.push_field(key))?;
                }
                Ok(())
            }
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.validate(item, path.push_index(idx))?;
                }
                Ok(())
            }
            Value::Number(num) => match num.as_f64() {
                Some(f) if !f.is_finite() => {
                    Err(CanonicalizationError::NonFiniteNumber(path.to_string()))
                }
                _ => Ok(()),
            },
            Value::String(_) | Value::Bool(_) | Value::Null => Ok(()),
        }
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(ProfileId::new(DEFAULT_PROFILE.to_string()))
    }
}

/// Recursively converts all JSON numbers into strings.
fn stringify_numbers(value: &mut Value) {
    match value {
        Value::Number(n) => {
            let s = n.to_string();
            *value = Value::String(s);
        }
        Value::Array(arr) => {
            for v in arr {
                stringify_numbers(v);
            }
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                stringify_numbers(v);
            }
        }
        _ => {}
    }
}
