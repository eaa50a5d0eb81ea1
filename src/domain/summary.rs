//! Derived summary records owned by the engine.
//!
//! [`ActivitySummary`] and [`ClaimPayment`] are merge-written snapshots that
//! reporting reads instead of replaying adjudication cycles.
//! [`TimelineEntry`] rows are append-only. None of these carry wall-clock
//! audit fields: recomputing over an unchanged ledger must produce values
//! byte-identical to the stored ones.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::claim_key::{ActivityId, ClaimKey};
use super::ledger::LifecycleKind;

/// Payment status of an activity or a whole claim.
///
/// Exactly one state holds at a time. `Rejected` is reserved for value
/// actually lost: a denial on the latest cycle with nothing paid. A denial
/// that was later reversed by a paying cycle does not reject the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Nothing paid and not denied; also the state of unknown claims.
    #[default]
    Pending,
    /// Something paid, but less than the submitted amount.
    PartiallyPaid,
    /// The full submitted amount has been paid.
    FullyPaid,
    /// Denied on the latest cycle with nothing paid.
    Rejected,
}

impl PaymentStatus {
    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PartiallyPaid => "PARTIALLY_PAID",
            Self::FullyPaid => "FULLY_PAID",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = crate::error::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PARTIALLY_PAID" => Ok(Self::PartiallyPaid),
            "FULLY_PAID" => Ok(Self::FullyPaid),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(crate::error::EngineError::Validation(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

/// Current financial position of one activity, derived from all of its
/// adjudication cycles. Merge-write key: (claim key, activity id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Claim the activity belongs to.
    pub claim_key: ClaimKey,
    /// Activity this summary describes.
    pub activity_id: ActivityId,
    /// Submitted net amount of the activity.
    pub net: Decimal,
    /// Cumulative paid amount, clamped to `[0, net]`.
    pub paid: Decimal,
    /// Four-state payment status.
    pub status: PaymentStatus,
    /// Denial code of the latest cycle, when that cycle carried one.
    pub denial_code: Option<String>,
    /// Denied amount: the full net when `Rejected`, zero otherwise.
    pub denied: Decimal,
    /// Number of adjudication cycles folded into this summary.
    pub cycle_count: u32,
    /// Earliest settlement time among cycles that paid a positive amount.
    pub first_paid_at: Option<DateTime<Utc>>,
    /// Latest settlement time among cycles that paid a positive amount.
    pub last_paid_at: Option<DateTime<Utc>>,
}

impl ActivitySummary {
    /// Amount still unresolved: submitted net minus paid minus denied.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        self.net - self.paid - self.denied
    }
}

/// Claim-level financial rollup across all of the claim's activities,
/// submission metadata, and lifecycle events. Merge-write key: claim key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPayment {
    /// Claim this rollup describes.
    pub claim_key: ClaimKey,
    /// Sum of submitted net amounts over all activities.
    pub total_submitted: Decimal,
    /// Sum of capped paid amounts over all activities.
    pub total_paid: Decimal,
    /// Sum of denied amounts over all activities.
    pub total_rejected: Decimal,
    /// Number of activities on the claim.
    pub activity_count: u32,
    /// Activities currently `FullyPaid`.
    pub fully_paid_count: u32,
    /// Activities currently `PartiallyPaid`.
    pub partially_paid_count: u32,
    /// Activities currently `Rejected`.
    pub rejected_count: u32,
    /// Activities currently `Pending`.
    pub pending_count: u32,
    /// Distinct remittance batches that have adjudicated this claim.
    pub remittance_count: u32,
    /// Number of resubmission lifecycle events.
    pub resubmission_count: u32,
    /// Claim-level payment status, the four-state rule applied to totals.
    pub status: PaymentStatus,
    /// Earliest submission or resubmission time.
    pub first_submission_at: Option<DateTime<Utc>>,
    /// Latest submission or resubmission time.
    pub last_submission_at: Option<DateTime<Utc>>,
    /// Earliest settlement time among paying cycles.
    pub first_paid_at: Option<DateTime<Utc>>,
    /// Latest settlement time among paying cycles.
    pub last_paid_at: Option<DateTime<Utc>>,
    /// Latest settlement time over all cycles, paying or not.
    pub latest_settlement_at: Option<DateTime<Utc>>,
    /// Whole days from first submission to first payment.
    pub days_to_first_payment: Option<i64>,
    /// Whole days from first submission to the latest settlement.
    pub days_to_settlement: Option<i64>,
    /// Payment reference of the most recent cycle that carried one.
    pub latest_payment_reference: Option<String>,
    /// All distinct payment references, sorted ascending.
    pub payment_references: Vec<String>,
    /// Transaction time of the claim: submission time when known, else the
    /// latest remittance batch time, else the latest settlement time.
    pub tx_at: Option<DateTime<Utc>>,
}

impl ClaimPayment {
    /// Amount neither paid nor denied yet.
    #[must_use]
    pub fn outstanding_amount(&self) -> Decimal {
        self.total_submitted - self.total_paid - self.total_rejected
    }

    /// Paid share of the submitted total, in percent rounded to two
    /// decimals. Zero when nothing was submitted.
    #[must_use]
    pub fn payment_completion_percent(&self) -> Decimal {
        if self.total_submitted.is_zero() {
            return Decimal::ZERO;
        }
        (self.total_paid / self.total_submitted * Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Denied share of the submitted total, in percent rounded to two
    /// decimals. Zero when nothing was submitted.
    #[must_use]
    pub fn rejection_rate_percent(&self) -> Decimal {
        if self.total_submitted.is_zero() {
            return Decimal::ZERO;
        }
        (self.total_rejected / self.total_submitted * Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// True when at least one resubmission has been recorded.
    #[must_use]
    pub const fn has_been_resubmitted(&self) -> bool {
        self.resubmission_count > 0
    }

    /// True when more than one distinct remittance batch adjudicated the
    /// claim.
    #[must_use]
    pub const fn has_multiple_remittances(&self) -> bool {
        self.remittance_count > 1
    }

    /// True when the claim is fully paid.
    #[must_use]
    pub fn is_fully_paid(&self) -> bool {
        self.status == PaymentStatus::FullyPaid
    }
}

/// One immutable point on a claim's financial timeline, recorded per
/// qualifying lifecycle event. Append key: (claim key, event sequence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Claim the entry belongs to.
    pub claim_key: ClaimKey,
    /// Ledger sequence of the lifecycle event this entry records.
    pub seq: u64,
    /// Kind of the recorded event.
    pub kind: LifecycleKind,
    /// When the event occurred.
    pub event_time: DateTime<Utc>,
    /// Amount attributed to the event: the cumulative paid total as of the
    /// event for payment events, zero for submissions and resubmissions.
    pub amount: Decimal,
    /// Cumulative capped paid total over cycles visible at the event.
    pub cumulative_paid: Decimal,
    /// Cumulative denied total over cycles visible at the event.
    pub cumulative_rejected: Decimal,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn payment(submitted: Decimal, paid: Decimal, rejected: Decimal) -> ClaimPayment {
        ClaimPayment {
            claim_key: ClaimKey::new("CLM-1"),
            total_submitted: submitted,
            total_paid: paid,
            total_rejected: rejected,
            activity_count: 1,
            fully_paid_count: 0,
            partially_paid_count: 0,
            rejected_count: 0,
            pending_count: 1,
            remittance_count: 0,
            resubmission_count: 0,
            status: PaymentStatus::Pending,
            first_submission_at: None,
            last_submission_at: None,
            first_paid_at: None,
            last_paid_at: None,
            latest_settlement_at: None,
            days_to_first_payment: None,
            days_to_settlement: None,
            latest_payment_reference: None,
            payment_references: Vec::new(),
            tx_at: None,
        }
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&PaymentStatus::PartiallyPaid).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"PARTIALLY_PAID\"");
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn status_parses_its_own_string_form() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::PartiallyPaid,
            PaymentStatus::FullyPaid,
            PaymentStatus::Rejected,
        ] {
            let parsed: Result<PaymentStatus, _> = status.as_str().parse();
            let Ok(parsed) = parsed else {
                panic!("parse failed for {status}");
            };
            assert_eq!(parsed, status);
        }
        assert!("PAID_IN_FULL".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn completion_percent_rounds_to_two_decimals() {
        let p = payment(dec!(300.00), dec!(100.00), Decimal::ZERO);
        assert_eq!(p.payment_completion_percent(), dec!(33.33));
    }

    #[test]
    fn percentages_are_zero_for_zero_submitted() {
        let p = payment(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(p.payment_completion_percent(), Decimal::ZERO);
        assert_eq!(p.rejection_rate_percent(), Decimal::ZERO);
    }

    #[test]
    fn outstanding_excludes_paid_and_denied_value() {
        let p = payment(dec!(500.00), dec!(200.00), dec!(100.00));
        assert_eq!(p.outstanding_amount(), dec!(200.00));
    }

    #[test]
    fn remittance_helpers_follow_counts() {
        let mut p = payment(dec!(100), dec!(0), dec!(0));
        assert!(!p.has_multiple_remittances());
        assert!(!p.has_been_resubmitted());
        p.remittance_count = 2;
        p.resubmission_count = 1;
        assert!(p.has_multiple_remittances());
        assert!(p.has_been_resubmitted());
    }

    #[test]
    fn activity_outstanding_subtracts_both_buckets() {
        let s = ActivitySummary {
            claim_key: ClaimKey::new("CLM-1"),
            activity_id: ActivityId::new("A-1"),
            net: dec!(100.00),
            paid: dec!(40.00),
            status: PaymentStatus::PartiallyPaid,
            denial_code: None,
            denied: Decimal::ZERO,
            cycle_count: 1,
            first_paid_at: None,
            last_paid_at: None,
        };
        assert_eq!(s.outstanding(), dec!(60.00));
    }
}
