//! Ledger-changed notifications.
//!
//! Ingestion collaborators append to the ledger and then tell the engine
//! which claim moved by sending a [`LedgerChange`]. The message carries no
//! payload beyond the claim key and a coarse kind: the engine always
//! re-derives summaries from the ledger itself, so a change notification
//! can never be wrong, only redundant.

use serde::{Deserialize, Serialize};

use super::claim_key::ClaimKey;

/// Coarse classification of what was appended to the ledger.
///
/// The kind is carried for logs and diagnostics; the refresh pipeline runs
/// in full for every kind, since recomputation is idempotent and the
/// timeline append skips duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// New adjudication cycles were appended.
    CyclesAppended,
    /// New activities were linked to the claim.
    ActivitiesAppended,
    /// New lifecycle events were recorded.
    LifecycleRecorded,
}

impl ChangeKind {
    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CyclesAppended => "cycles_appended",
            Self::ActivitiesAppended => "activities_appended",
            Self::LifecycleRecorded => "lifecycle_recorded",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = crate::error::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cycles_appended" => Ok(Self::CyclesAppended),
            "activities_appended" => Ok(Self::ActivitiesAppended),
            "lifecycle_recorded" => Ok(Self::LifecycleRecorded),
            other => Err(crate::error::EngineError::Validation(format!(
                "unknown change kind '{other}'"
            ))),
        }
    }
}

/// One "this claim's ledger changed" message, the unit of work queued to
/// the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerChange {
    /// Claim whose ledger records changed.
    pub claim_key: ClaimKey,
    /// What kind of records were appended.
    pub kind: ChangeKind,
}

impl LedgerChange {
    /// Creates a change notification for one claim.
    #[must_use]
    pub const fn new(claim_key: ClaimKey, kind: ChangeKind) -> Self {
        Self { claim_key, kind }
    }
}
