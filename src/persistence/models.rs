//! Database row models for the claims schema.
//!
//! Row structs mirror column types exactly (`BIGINT` sequences come back as
//! `i64`, statuses as `TEXT`); the `TryFrom` conversions translate them
//! into domain records and surface corrupt rows as
//! [`EngineError::Internal`] rather than letting them masquerade as
//! retryable storage failures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Activity, ActivityId, ActivitySummary, AdjudicationCycle, ClaimKey, ClaimPayment,
    ClaimSubmission, LifecycleEvent, LifecycleKind, PaymentStatus, TimelineEntry,
};
use crate::error::EngineError;

fn seq_from_db(seq: i64) -> Result<u64, EngineError> {
    u64::try_from(seq).map_err(|_| EngineError::Internal(format!("negative ledger sequence {seq}")))
}

fn count_from_db(count: i32, what: &str) -> Result<u32, EngineError> {
    u32::try_from(count).map_err(|_| EngineError::Internal(format!("negative {what} {count}")))
}

fn status_from_db(status: &str) -> Result<PaymentStatus, EngineError> {
    status
        .parse()
        .map_err(|_| EngineError::Internal(format!("unknown payment status '{status}' in store")))
}

fn kind_from_db(kind: &str) -> Result<LifecycleKind, EngineError> {
    kind.parse()
        .map_err(|_| EngineError::Internal(format!("unknown lifecycle kind '{kind}' in store")))
}

/// Row of the `claim_activities` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityRow {
    /// Claim business key.
    pub claim_key: String,
    /// Activity business id.
    pub activity_id: String,
    /// Submitted net amount.
    pub net: Decimal,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Self::new(
            ClaimKey::new(row.claim_key),
            ActivityId::new(row.activity_id),
            row.net,
        )
    }
}

/// Row of the `adjudication_cycles` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CycleRow {
    /// Claim business key.
    pub claim_key: String,
    /// Activity business id.
    pub activity_id: String,
    /// Ledger sequence.
    pub seq: i64,
    /// Paid amount.
    pub paid: Decimal,
    /// Denial code, when present.
    pub denial_code: Option<String>,
    /// Settlement timestamp, when known.
    pub settlement_at: Option<DateTime<Utc>>,
    /// Remittance batch reference, when known.
    pub payment_reference: Option<String>,
    /// Remittance batch timestamp, when known.
    pub batch_at: Option<DateTime<Utc>>,
}

impl TryFrom<CycleRow> for AdjudicationCycle {
    type Error = EngineError;

    fn try_from(row: CycleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            claim_key: ClaimKey::new(row.claim_key),
            activity_id: ActivityId::new(row.activity_id),
            seq: seq_from_db(row.seq)?,
            paid: row.paid,
            denial_code: row.denial_code,
            settlement_at: row.settlement_at,
            payment_reference: row.payment_reference,
            batch_at: row.batch_at,
        })
    }
}

/// Row of the `claim_submissions` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubmissionRow {
    /// Claim business key.
    pub claim_key: String,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Payer id, when recorded.
    pub payer_id: Option<String>,
    /// Provider id, when recorded.
    pub provider_id: Option<String>,
}

impl From<SubmissionRow> for ClaimSubmission {
    fn from(row: SubmissionRow) -> Self {
        Self {
            claim_key: ClaimKey::new(row.claim_key),
            submitted_at: row.submitted_at,
            payer_id: row.payer_id,
            provider_id: row.provider_id,
        }
    }
}

/// Row of the `claim_lifecycle_events` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LifecycleEventRow {
    /// Claim business key.
    pub claim_key: String,
    /// Ledger sequence.
    pub seq: i64,
    /// Event kind discriminator.
    pub kind: String,
    /// Event timestamp.
    pub event_time: DateTime<Utc>,
}

impl TryFrom<LifecycleEventRow> for LifecycleEvent {
    type Error = EngineError;

    fn try_from(row: LifecycleEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            claim_key: ClaimKey::new(row.claim_key),
            seq: seq_from_db(row.seq)?,
            kind: kind_from_db(&row.kind)?,
            event_time: row.event_time,
        })
    }
}

/// Row of the `activity_summaries` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivitySummaryRow {
    /// Claim business key.
    pub claim_key: String,
    /// Activity business id.
    pub activity_id: String,
    /// Submitted net amount.
    pub net: Decimal,
    /// Capped cumulative paid amount.
    pub paid: Decimal,
    /// Payment status discriminator.
    pub status: String,
    /// Latest denial code, when present.
    pub denial_code: Option<String>,
    /// Denied amount.
    pub denied: Decimal,
    /// Number of cycles folded in.
    pub cycle_count: i32,
    /// Earliest paying settlement time.
    pub first_paid_at: Option<DateTime<Utc>>,
    /// Latest paying settlement time.
    pub last_paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<ActivitySummaryRow> for ActivitySummary {
    type Error = EngineError;

    fn try_from(row: ActivitySummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            claim_key: ClaimKey::new(row.claim_key),
            activity_id: ActivityId::new(row.activity_id),
            net: row.net,
            paid: row.paid,
            status: status_from_db(&row.status)?,
            denial_code: row.denial_code,
            denied: row.denied,
            cycle_count: count_from_db(row.cycle_count, "cycle count")?,
            first_paid_at: row.first_paid_at,
            last_paid_at: row.last_paid_at,
        })
    }
}

/// Row of the `claim_payments` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClaimPaymentRow {
    /// Claim business key.
    pub claim_key: String,
    /// Sum of submitted nets.
    pub total_submitted: Decimal,
    /// Sum of capped paid amounts.
    pub total_paid: Decimal,
    /// Sum of denied amounts.
    pub total_rejected: Decimal,
    /// Number of activities.
    pub activity_count: i32,
    /// Fully paid activities.
    pub fully_paid_count: i32,
    /// Partially paid activities.
    pub partially_paid_count: i32,
    /// Rejected activities.
    pub rejected_count: i32,
    /// Pending activities.
    pub pending_count: i32,
    /// Distinct remittance batches.
    pub remittance_count: i32,
    /// Resubmission events.
    pub resubmission_count: i32,
    /// Claim status discriminator.
    pub status: String,
    /// Earliest submission time.
    pub first_submission_at: Option<DateTime<Utc>>,
    /// Latest submission time.
    pub last_submission_at: Option<DateTime<Utc>>,
    /// Earliest paying settlement time.
    pub first_paid_at: Option<DateTime<Utc>>,
    /// Latest paying settlement time.
    pub last_paid_at: Option<DateTime<Utc>>,
    /// Latest settlement time over all cycles.
    pub latest_settlement_at: Option<DateTime<Utc>>,
    /// Days from first submission to first payment.
    pub days_to_first_payment: Option<i64>,
    /// Days from first submission to latest settlement.
    pub days_to_settlement: Option<i64>,
    /// Most recent payment reference.
    pub latest_payment_reference: Option<String>,
    /// Sorted distinct payment references.
    pub payment_references: Vec<String>,
    /// Claim transaction time.
    pub tx_at: Option<DateTime<Utc>>,
}

impl TryFrom<ClaimPaymentRow> for ClaimPayment {
    type Error = EngineError;

    fn try_from(row: ClaimPaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            claim_key: ClaimKey::new(row.claim_key),
            total_submitted: row.total_submitted,
            total_paid: row.total_paid,
            total_rejected: row.total_rejected,
            activity_count: count_from_db(row.activity_count, "activity count")?,
            fully_paid_count: count_from_db(row.fully_paid_count, "fully paid count")?,
            partially_paid_count: count_from_db(row.partially_paid_count, "partially paid count")?,
            rejected_count: count_from_db(row.rejected_count, "rejected count")?,
            pending_count: count_from_db(row.pending_count, "pending count")?,
            remittance_count: count_from_db(row.remittance_count, "remittance count")?,
            resubmission_count: count_from_db(row.resubmission_count, "resubmission count")?,
            status: status_from_db(&row.status)?,
            first_submission_at: row.first_submission_at,
            last_submission_at: row.last_submission_at,
            first_paid_at: row.first_paid_at,
            last_paid_at: row.last_paid_at,
            latest_settlement_at: row.latest_settlement_at,
            days_to_first_payment: row.days_to_first_payment,
            days_to_settlement: row.days_to_settlement,
            latest_payment_reference: row.latest_payment_reference,
            payment_references: row.payment_references,
            tx_at: row.tx_at,
        })
    }
}

/// Row of the `claim_timeline` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimelineRow {
    /// Claim business key.
    pub claim_key: String,
    /// Event ledger sequence.
    pub seq: i64,
    /// Event kind discriminator.
    pub kind: String,
    /// Event timestamp.
    pub event_time: DateTime<Utc>,
    /// Amount attributed to the event.
    pub amount: Decimal,
    /// Running capped paid total.
    pub cumulative_paid: Decimal,
    /// Running denied total.
    pub cumulative_rejected: Decimal,
}

impl TryFrom<TimelineRow> for TimelineEntry {
    type Error = EngineError;

    fn try_from(row: TimelineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            claim_key: ClaimKey::new(row.claim_key),
            seq: seq_from_db(row.seq)?,
            kind: kind_from_db(&row.kind)?,
            event_time: row.event_time,
            amount: row.amount,
            cumulative_paid: row.cumulative_paid,
            cumulative_rejected: row.cumulative_rejected,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn cycle_row_converts() {
        let row = CycleRow {
            claim_key: "CLM-1".to_string(),
            activity_id: "A-1".to_string(),
            seq: 7,
            paid: Decimal::new(2500, 2),
            denial_code: Some("D1".to_string()),
            settlement_at: None,
            payment_reference: Some("RA-1".to_string()),
            batch_at: None,
        };
        let Ok(cycle) = AdjudicationCycle::try_from(row) else {
            panic!("conversion failed");
        };
        assert_eq!(cycle.seq, 7);
        assert!(cycle.is_denial());
    }

    #[test]
    fn negative_sequence_is_rejected() {
        let row = LifecycleEventRow {
            claim_key: "CLM-1".to_string(),
            seq: -1,
            kind: "SUBMISSION".to_string(),
            event_time: Utc::now(),
        };
        let Err(EngineError::Internal(msg)) = LifecycleEvent::try_from(row) else {
            panic!("expected internal error");
        };
        assert!(msg.contains("sequence"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let row = ActivitySummaryRow {
            claim_key: "CLM-1".to_string(),
            activity_id: "A-1".to_string(),
            net: Decimal::new(100, 0),
            paid: Decimal::ZERO,
            status: "SETTLED".to_string(),
            denial_code: None,
            denied: Decimal::ZERO,
            cycle_count: 0,
            first_paid_at: None,
            last_paid_at: None,
        };
        assert!(ActivitySummary::try_from(row).is_err());
    }
}
