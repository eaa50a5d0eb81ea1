//! Type-safe claim and activity identifiers.
//!
//! [`ClaimKey`] and [`ActivityId`] are newtype wrappers around the business
//! identifiers assigned by payers and providers. They are plain strings on
//! the wire (claims arrive keyed by external ids, not by row ids), but the
//! newtypes keep the two id spaces from being confused in signatures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier grouping all activities and adjudication cycles that
/// belong to one claim, independent of any store-internal row identifiers.
///
/// Used as the dictionary key in the per-claim lock map, the dispatch
/// queue discriminator, and the merge-write key for claim payments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimKey(String);

impl ClaimKey {
    /// Creates a `ClaimKey` from any string-like id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying business id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClaimKey {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClaimKey {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<ClaimKey> for String {
    fn from(key: ClaimKey) -> Self {
        key.0
    }
}

/// Identifier of one billed service line ("activity"), unique within its
/// claim. The merge-write key for activity summaries is the pair
/// (`ClaimKey`, `ActivityId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    /// Creates an `ActivityId` from any string-like id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying business id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActivityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<ActivityId> for String {
    fn from(id: ActivityId) -> Self {
        id.0
    }
}
