use crate::validation::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pattern shared by all opaque record identifiers.
const ID_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.:-]{0,127}$";

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new instance without validation; callers are responsible for conformity.
            pub fn new(value: String) -> Self {
                Self(value)
            }

            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let s = value.into();
                if !Regex::new($pattern).expect("invalid regex").is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
    ($name:ident, $doc:expr, $pattern:expr, generated) => {
        newtype!($name, $doc, $pattern);

        impl $name {
            /// Generates a fresh random (UUID v4) identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }
    };
}

newtype!(
    ProfileId,
    "Identifier for canonicalization profiles (pattern: `[A-Za-z0-9_-]{16,128}`)",
    r"^[A-Za-z0-9_-]{16,128}$"
);
newtype!(EventId, "Identifier of an event.", ID_PATTERN, generated);
newtype!(
    UserId,
    "Identifier of a pre-authenticated user supplied by the identity provider.",
    ID_PATTERN
);
newtype!(PrizeId, "Identifier of a prize within an event.", ID_PATTERN, generated);
newtype!(AttendeeId, "Identifier of a verified attendee record.", ID_PATTERN, generated);
newtype!(WinnerId, "Identifier of a winner record.", ID_PATTERN, generated);
newtype!(CredentialId, "Identifier of an issued QR credential.", ID_PATTERN, generated);
newtype!(ScanId, "Identifier of a single scan attempt.", ID_PATTERN, generated);
