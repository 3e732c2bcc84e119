//! Canonical data primitives for Rollcall events, credentials, and audit records.
//!
//! Everything that participates in hashing lives in this crate: the RFC 8785
//! canonicalizer, domain-separated SHA-256 digests, and the validated
//! identifier newtypes used by the other crates.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic hashing.
pub mod canonicalizer;
/// Digest primitives and domain-separated hashing.
pub mod digest;
/// Identifier newtypes.
pub mod identifiers;
/// Validation errors used by canonical types.
pub mod validation;

pub use canonicalizer::{CanonicalizationError, Canonicalizer, DEFAULT_PROFILE};
pub use digest::{compute_digest, Digest, DigestAlg, DigestError};
pub use identifiers::{
    AttendeeId, CredentialId, EventId, PrizeId, ProfileId, ScanId, UserId, WinnerId,
};
pub use validation::ValidationError;
