//! Append-only ledger records.
//!
//! These are the engine's read-only inputs: service lines, adjudication
//! cycles, submission metadata, and lifecycle events. They are written by
//! ingestion collaborators and never mutated here. Every record carries the
//! claim key it belongs to; cycles and lifecycle events additionally carry a
//! ledger sequence number that is monotone over all appends for the claim
//! and serves as the deterministic ordering tiebreak.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::claim_key::{ActivityId, ClaimKey};

/// One billed service line of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Claim this line belongs to.
    pub claim_key: ClaimKey,
    /// Line identifier, unique within the claim.
    pub activity_id: ActivityId,
    /// Submitted (billed) net amount for the line.
    pub net: Decimal,
}

impl Activity {
    /// Creates a new activity record.
    #[must_use]
    pub fn new(claim_key: ClaimKey, activity_id: ActivityId, net: Decimal) -> Self {
        Self {
            claim_key,
            activity_id,
            net,
        }
    }
}

/// One adjudication of one activity, as reported by a remittance.
///
/// A claim accumulates an unbounded number of cycles over its life: partial
/// payments, denials, takebacks (negative paid amounts), and corrections all
/// arrive as further cycles, never as edits to earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjudicationCycle {
    /// Claim the adjudicated activity belongs to.
    pub claim_key: ClaimKey,
    /// Activity this cycle adjudicates.
    pub activity_id: ActivityId,
    /// Ledger sequence, monotone over all appends for the claim.
    pub seq: u64,
    /// Paid amount for this cycle. Zero or negative values are valid.
    pub paid: Decimal,
    /// Denial code when the payer denied the line in this cycle.
    pub denial_code: Option<String>,
    /// Settlement timestamp reported by the payer, when known.
    pub settlement_at: Option<DateTime<Utc>>,
    /// Reference of the remittance batch that carried this cycle.
    pub payment_reference: Option<String>,
    /// Transaction timestamp of the remittance batch, when known.
    pub batch_at: Option<DateTime<Utc>>,
}

impl AdjudicationCycle {
    /// True when the payer attached a denial code to this cycle.
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        self.denial_code.is_some()
    }

    /// Ordering key for "latest cycle" determination: settlement time first
    /// (absent times order before any present one), ledger sequence as the
    /// deterministic tiebreak.
    #[must_use]
    pub const fn recency_key(&self) -> (Option<DateTime<Utc>>, u64) {
        (self.settlement_at, self.seq)
    }
}

/// Submission metadata for a claim, when the ingestion side has recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSubmission {
    /// Claim this submission belongs to.
    pub claim_key: ClaimKey,
    /// When the claim was first submitted to the payer.
    pub submitted_at: DateTime<Utc>,
    /// Payer the claim was submitted to.
    pub payer_id: Option<String>,
    /// Provider that rendered the services.
    pub provider_id: Option<String>,
}

/// Kind of a claim lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleKind {
    /// Initial submission of the claim.
    Submission,
    /// Corrected or appealed resubmission after an adverse adjudication.
    Resubmission,
    /// A remittance recognized payment activity on the claim.
    PaymentRecognized,
}

impl LifecycleKind {
    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "SUBMISSION",
            Self::Resubmission => "RESUBMISSION",
            Self::PaymentRecognized => "PAYMENT_RECOGNIZED",
        }
    }
}

impl std::fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LifecycleKind {
    type Err = crate::error::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMISSION" => Ok(Self::Submission),
            "RESUBMISSION" => Ok(Self::Resubmission),
            "PAYMENT_RECOGNIZED" => Ok(Self::PaymentRecognized),
            other => Err(crate::error::EngineError::Validation(format!(
                "unknown lifecycle kind '{other}'"
            ))),
        }
    }
}

/// One event in a claim's lifecycle, in ledger order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Claim the event belongs to.
    pub claim_key: ClaimKey,
    /// Ledger sequence, shared with cycle sequences for the claim; a cycle
    /// with `seq` ≤ this event's `seq` was in the ledger when the event
    /// occurred.
    pub seq: u64,
    /// What happened.
    pub kind: LifecycleKind,
    /// When it happened, per the source document.
    pub event_time: DateTime<Utc>,
}
