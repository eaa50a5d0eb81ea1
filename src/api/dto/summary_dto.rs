//! Claim payment and activity summary DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{ActivitySummary, ClaimPayment, TimelineEntry};

/// Query parameters for `GET /claims`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ClaimListParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Optional payment status filter (`PENDING`, `PARTIALLY_PAID`,
    /// `FULLY_PAID`, `REJECTED`).
    #[serde(default)]
    pub status: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl ClaimListParams {
    /// Clamps `page` to at least 1 and `per_page` to 1..=100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
            status: self.status.clone(),
        }
    }
}

/// One activity summary as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivitySummaryDto {
    /// Claim the activity belongs to.
    pub claim_key: String,
    /// Activity identifier, unique within the claim.
    pub activity_id: String,
    /// Submitted net amount.
    #[serde(with = "rust_decimal::serde::str")]
    pub net: Decimal,
    /// Capped cumulative paid amount.
    #[serde(with = "rust_decimal::serde::str")]
    pub paid: Decimal,
    /// Net minus paid.
    #[serde(with = "rust_decimal::serde::str")]
    pub outstanding: Decimal,
    /// Payment status (`PENDING`, `PARTIALLY_PAID`, `FULLY_PAID`,
    /// `REJECTED`).
    pub status: String,
    /// Denial code of the latest cycle, when present.
    pub denial_code: Option<String>,
    /// Denied amount; equals `net` for rejected activities, zero
    /// otherwise.
    #[serde(with = "rust_decimal::serde::str")]
    pub denied: Decimal,
    /// Number of adjudication cycles observed.
    pub cycle_count: u32,
    /// Earliest settlement time among paying cycles.
    pub first_paid_at: Option<DateTime<Utc>>,
    /// Latest settlement time among paying cycles.
    pub last_paid_at: Option<DateTime<Utc>>,
}

impl From<ActivitySummary> for ActivitySummaryDto {
    fn from(summary: ActivitySummary) -> Self {
        let outstanding = summary.outstanding();
        Self {
            claim_key: summary.claim_key.to_string(),
            activity_id: summary.activity_id.to_string(),
            net: summary.net,
            paid: summary.paid,
            outstanding,
            status: summary.status.to_string(),
            denial_code: summary.denial_code,
            denied: summary.denied,
            cycle_count: summary.cycle_count,
            first_paid_at: summary.first_paid_at,
            last_paid_at: summary.last_paid_at,
        }
    }
}

/// Full claim payment detail as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimPaymentDto {
    /// Claim key.
    pub claim_key: String,
    /// Claim-level payment status.
    pub status: String,
    /// Sum of submitted net across activities.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_submitted: Decimal,
    /// Sum of capped paid across activities.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_paid: Decimal,
    /// Sum of denied across activities.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_rejected: Decimal,
    /// Submitted minus paid.
    #[serde(with = "rust_decimal::serde::str")]
    pub outstanding: Decimal,
    /// Paid as a percentage of submitted, two decimal places.
    #[serde(with = "rust_decimal::serde::str")]
    pub payment_completion_percent: Decimal,
    /// Rejected as a percentage of submitted, two decimal places.
    #[serde(with = "rust_decimal::serde::str")]
    pub rejection_rate_percent: Decimal,
    /// Number of activities on the claim.
    pub activity_count: u32,
    /// Activities fully paid.
    pub fully_paid_count: u32,
    /// Activities partially paid.
    pub partially_paid_count: u32,
    /// Activities rejected.
    pub rejected_count: u32,
    /// Activities still pending.
    pub pending_count: u32,
    /// Distinct payment references across cycles.
    pub remittance_count: u32,
    /// Resubmission lifecycle events recorded.
    pub resubmission_count: u32,
    /// Earliest submission time.
    pub first_submission_at: Option<DateTime<Utc>>,
    /// Latest submission time.
    pub last_submission_at: Option<DateTime<Utc>>,
    /// Earliest paying settlement time.
    pub first_paid_at: Option<DateTime<Utc>>,
    /// Latest paying settlement time.
    pub last_paid_at: Option<DateTime<Utc>>,
    /// Latest settlement time across all cycles.
    pub latest_settlement_at: Option<DateTime<Utc>>,
    /// Days from first submission to first payment.
    pub days_to_first_payment: Option<i64>,
    /// Days from first submission to latest settlement.
    pub days_to_settlement: Option<i64>,
    /// Payment reference of the most recent referencing cycle.
    pub latest_payment_reference: Option<String>,
    /// Sorted distinct payment references.
    pub payment_references: Vec<String>,
    /// Transaction time: submission time, else latest batch time, else
    /// latest settlement time.
    pub tx_at: Option<DateTime<Utc>>,
}

impl From<ClaimPayment> for ClaimPaymentDto {
    fn from(payment: ClaimPayment) -> Self {
        let outstanding = payment.outstanding_amount();
        let payment_completion_percent = payment.payment_completion_percent();
        let rejection_rate_percent = payment.rejection_rate_percent();
        Self {
            claim_key: payment.claim_key.to_string(),
            status: payment.status.to_string(),
            total_submitted: payment.total_submitted,
            total_paid: payment.total_paid,
            total_rejected: payment.total_rejected,
            outstanding,
            payment_completion_percent,
            rejection_rate_percent,
            activity_count: payment.activity_count,
            fully_paid_count: payment.fully_paid_count,
            partially_paid_count: payment.partially_paid_count,
            rejected_count: payment.rejected_count,
            pending_count: payment.pending_count,
            remittance_count: payment.remittance_count,
            resubmission_count: payment.resubmission_count,
            first_submission_at: payment.first_submission_at,
            last_submission_at: payment.last_submission_at,
            first_paid_at: payment.first_paid_at,
            last_paid_at: payment.last_paid_at,
            latest_settlement_at: payment.latest_settlement_at,
            days_to_first_payment: payment.days_to_first_payment,
            days_to_settlement: payment.days_to_settlement,
            latest_payment_reference: payment.latest_payment_reference,
            payment_references: payment.payment_references,
            tx_at: payment.tx_at,
        }
    }
}

/// Paginated list response for `GET /claims`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimListResponse {
    /// Claim payments on this page.
    pub data: Vec<ClaimPaymentDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// One financial timeline entry as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimelineEntryDto {
    /// Claim key.
    pub claim_key: String,
    /// Ledger sequence of the underlying lifecycle event.
    pub seq: u64,
    /// Lifecycle kind (`SUBMISSION`, `RESUBMISSION`,
    /// `PAYMENT_RECOGNIZED`).
    pub kind: String,
    /// Event time per the source document.
    pub event_time: DateTime<Utc>,
    /// Event amount: cumulative paid for payment events, zero otherwise.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Cumulative paid over cycles visible at the event.
    #[serde(with = "rust_decimal::serde::str")]
    pub cumulative_paid: Decimal,
    /// Cumulative rejected over cycles visible at the event.
    #[serde(with = "rust_decimal::serde::str")]
    pub cumulative_rejected: Decimal,
}

impl From<TimelineEntry> for TimelineEntryDto {
    fn from(entry: TimelineEntry) -> Self {
        Self {
            claim_key: entry.claim_key.to_string(),
            seq: entry.seq,
            kind: entry.kind.to_string(),
            event_time: entry.event_time,
            amount: entry.amount,
            cumulative_paid: entry.cumulative_paid,
            cumulative_rejected: entry.cumulative_rejected,
        }
    }
}

/// Response body for `GET /claims/{key}/status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Claim key.
    pub claim_key: String,
    /// Payment status; `PENDING` when no summary exists yet.
    pub status: String,
}

/// Response body for `GET /claims/{key}/total-paid`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TotalPaidResponse {
    /// Claim key.
    pub claim_key: String,
    /// Total paid; zero when no summary exists yet.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_paid: Decimal,
}

/// Response body for `GET /claims/{key}/fully-paid`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FullyPaidResponse {
    /// Claim key.
    pub claim_key: String,
    /// Whether the claim is fully paid; false when no summary exists.
    pub fully_paid: bool,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{ActivityId, ClaimKey, PaymentStatus};

    #[test]
    fn params_clamp_to_allowed_ranges() {
        let params = ClaimListParams {
            page: 0,
            per_page: 500,
            status: None,
        };
        let clamped = params.clamped();
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.per_page, 100);
    }

    #[test]
    fn pagination_meta_counts_pages() {
        let meta = PaginationMeta::new(2, 20, 41);
        assert_eq!(meta.total_pages, 3);
        let empty = PaginationMeta::new(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn activity_dto_carries_outstanding() {
        let summary = ActivitySummary {
            claim_key: ClaimKey::new("CLM-1"),
            activity_id: ActivityId::new("A-1"),
            net: dec!(100),
            paid: dec!(40),
            status: PaymentStatus::PartiallyPaid,
            denial_code: None,
            denied: Decimal::ZERO,
            cycle_count: 1,
            first_paid_at: None,
            last_paid_at: None,
        };
        let dto = ActivitySummaryDto::from(summary);
        assert_eq!(dto.outstanding, dec!(60));
        assert_eq!(dto.status, "PARTIALLY_PAID");
    }

    #[test]
    fn amounts_serialize_as_strings() {
        let dto = TotalPaidResponse {
            claim_key: "CLM-1".to_string(),
            total_paid: dec!(99.5),
        };
        let json = serde_json::to_string(&dto).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"99.5\""));
    }
}
