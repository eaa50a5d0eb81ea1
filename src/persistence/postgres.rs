//! PostgreSQL implementation of the ledger and summary stores.
//!
//! Reads the collaborator-owned ledger tables (`claim_activities`,
//! `adjudication_cycles`, `claim_submissions`, `claim_lifecycle_events`)
//! and owns the derived tables (`activity_summaries`, `claim_payments`,
//! `claim_timeline`). Both ledger tables draw their `seq` values from one
//! shared database sequence, so cycle and event sequences are comparable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{
    ActivityRow, ActivitySummaryRow, ClaimPaymentRow, CycleRow, LifecycleEventRow, SubmissionRow,
    TimelineRow,
};
use super::{LedgerStore, SummaryStore};
use crate::domain::{
    Activity, ActivitySummary, AdjudicationCycle, ClaimKey, ClaimPayment, ClaimSubmission,
    LifecycleEvent, PaymentStatus, TimelineEntry,
};
use crate::error::EngineError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(e: sqlx::Error) -> EngineError {
    EngineError::Storage(e.to_string())
}

#[async_trait]
impl LedgerStore for PostgresStore {
    async fn activities_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<Activity>, EngineError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT claim_key, activity_id, net FROM claim_activities \
             WHERE claim_key = $1 ORDER BY activity_id",
        )
        .bind(claim_key.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }

    async fn cycles_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<AdjudicationCycle>, EngineError> {
        let rows = sqlx::query_as::<_, CycleRow>(
            "SELECT claim_key, activity_id, seq, paid, denial_code, settlement_at, \
             payment_reference, batch_at FROM adjudication_cycles \
             WHERE claim_key = $1 ORDER BY seq",
        )
        .bind(claim_key.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(AdjudicationCycle::try_from).collect()
    }

    async fn submission_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Option<ClaimSubmission>, EngineError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            "SELECT claim_key, submitted_at, payer_id, provider_id \
             FROM claim_submissions WHERE claim_key = $1",
        )
        .bind(claim_key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(ClaimSubmission::from))
    }

    async fn lifecycle_events_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<LifecycleEvent>, EngineError> {
        let rows = sqlx::query_as::<_, LifecycleEventRow>(
            "SELECT claim_key, seq, kind, event_time FROM claim_lifecycle_events \
             WHERE claim_key = $1 ORDER BY seq",
        )
        .bind(claim_key.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(LifecycleEvent::try_from).collect()
    }

    async fn claim_keys(&self) -> Result<Vec<ClaimKey>, EngineError> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT claim_key FROM ( \
               SELECT claim_key FROM claim_activities \
               UNION SELECT claim_key FROM adjudication_cycles \
               UNION SELECT claim_key FROM claim_submissions \
               UNION SELECT claim_key FROM claim_lifecycle_events \
             ) keys ORDER BY claim_key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(keys.into_iter().map(ClaimKey::new).collect())
    }

    async fn claim_keys_touched_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ClaimKey>, EngineError> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT claim_key FROM ( \
               SELECT claim_key FROM claim_lifecycle_events \
                 WHERE event_time BETWEEN $1 AND $2 \
               UNION SELECT claim_key FROM adjudication_cycles \
                 WHERE settlement_at BETWEEN $1 AND $2 OR batch_at BETWEEN $1 AND $2 \
             ) touched ORDER BY claim_key",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(keys.into_iter().map(ClaimKey::new).collect())
    }
}

#[async_trait]
impl SummaryStore for PostgresStore {
    async fn activity_summaries(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<ActivitySummary>, EngineError> {
        let rows = sqlx::query_as::<_, ActivitySummaryRow>(
            "SELECT claim_key, activity_id, net, paid, status, denial_code, denied, \
             cycle_count, first_paid_at, last_paid_at FROM activity_summaries \
             WHERE claim_key = $1 ORDER BY activity_id",
        )
        .bind(claim_key.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(ActivitySummary::try_from).collect()
    }

    async fn upsert_activity_summaries(
        &self,
        claim_key: &ClaimKey,
        summaries: &[ActivitySummary],
    ) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        for summary in summaries {
            sqlx::query(
                "INSERT INTO activity_summaries \
                 (claim_key, activity_id, net, paid, status, denial_code, denied, \
                  cycle_count, first_paid_at, last_paid_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (claim_key, activity_id) DO UPDATE SET \
                 net = EXCLUDED.net, paid = EXCLUDED.paid, status = EXCLUDED.status, \
                 denial_code = EXCLUDED.denial_code, denied = EXCLUDED.denied, \
                 cycle_count = EXCLUDED.cycle_count, \
                 first_paid_at = EXCLUDED.first_paid_at, last_paid_at = EXCLUDED.last_paid_at",
            )
            .bind(claim_key.as_str())
            .bind(summary.activity_id.as_str())
            .bind(summary.net)
            .bind(summary.paid)
            .bind(summary.status.as_str())
            .bind(summary.denial_code.as_deref())
            .bind(summary.denied)
            .bind(i32::try_from(summary.cycle_count).unwrap_or(i32::MAX))
            .bind(summary.first_paid_at)
            .bind(summary.last_paid_at)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }
        tx.commit().await.map_err(storage)
    }

    async fn claim_payment(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Option<ClaimPayment>, EngineError> {
        let row = sqlx::query_as::<_, ClaimPaymentRow>(
            "SELECT claim_key, total_submitted, total_paid, total_rejected, activity_count, \
             fully_paid_count, partially_paid_count, rejected_count, pending_count, \
             remittance_count, resubmission_count, status, first_submission_at, \
             last_submission_at, first_paid_at, last_paid_at, latest_settlement_at, \
             days_to_first_payment, days_to_settlement, latest_payment_reference, \
             payment_references, tx_at FROM claim_payments WHERE claim_key = $1",
        )
        .bind(claim_key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        row.map(ClaimPayment::try_from).transpose()
    }

    async fn upsert_claim_payment(&self, payment: &ClaimPayment) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT INTO claim_payments \
             (claim_key, total_submitted, total_paid, total_rejected, activity_count, \
              fully_paid_count, partially_paid_count, rejected_count, pending_count, \
              remittance_count, resubmission_count, status, first_submission_at, \
              last_submission_at, first_paid_at, last_paid_at, latest_settlement_at, \
              days_to_first_payment, days_to_settlement, latest_payment_reference, \
              payment_references, tx_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16, $17, $18, $19, $20, $21, $22) \
             ON CONFLICT (claim_key) DO UPDATE SET \
             total_submitted = EXCLUDED.total_submitted, total_paid = EXCLUDED.total_paid, \
             total_rejected = EXCLUDED.total_rejected, activity_count = EXCLUDED.activity_count, \
             fully_paid_count = EXCLUDED.fully_paid_count, \
             partially_paid_count = EXCLUDED.partially_paid_count, \
             rejected_count = EXCLUDED.rejected_count, pending_count = EXCLUDED.pending_count, \
             remittance_count = EXCLUDED.remittance_count, \
             resubmission_count = EXCLUDED.resubmission_count, status = EXCLUDED.status, \
             first_submission_at = EXCLUDED.first_submission_at, \
             last_submission_at = EXCLUDED.last_submission_at, \
             first_paid_at = EXCLUDED.first_paid_at, last_paid_at = EXCLUDED.last_paid_at, \
             latest_settlement_at = EXCLUDED.latest_settlement_at, \
             days_to_first_payment = EXCLUDED.days_to_first_payment, \
             days_to_settlement = EXCLUDED.days_to_settlement, \
             latest_payment_reference = EXCLUDED.latest_payment_reference, \
             payment_references = EXCLUDED.payment_references, tx_at = EXCLUDED.tx_at",
        )
        .bind(payment.claim_key.as_str())
        .bind(payment.total_submitted)
        .bind(payment.total_paid)
        .bind(payment.total_rejected)
        .bind(i32::try_from(payment.activity_count).unwrap_or(i32::MAX))
        .bind(i32::try_from(payment.fully_paid_count).unwrap_or(i32::MAX))
        .bind(i32::try_from(payment.partially_paid_count).unwrap_or(i32::MAX))
        .bind(i32::try_from(payment.rejected_count).unwrap_or(i32::MAX))
        .bind(i32::try_from(payment.pending_count).unwrap_or(i32::MAX))
        .bind(i32::try_from(payment.remittance_count).unwrap_or(i32::MAX))
        .bind(i32::try_from(payment.resubmission_count).unwrap_or(i32::MAX))
        .bind(payment.status.as_str())
        .bind(payment.first_submission_at)
        .bind(payment.last_submission_at)
        .bind(payment.first_paid_at)
        .bind(payment.last_paid_at)
        .bind(payment.latest_settlement_at)
        .bind(payment.days_to_first_payment)
        .bind(payment.days_to_settlement)
        .bind(payment.latest_payment_reference.as_deref())
        .bind(&payment.payment_references)
        .bind(payment.tx_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn list_claim_payments(
        &self,
        status: Option<PaymentStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<ClaimPayment>, u64), EngineError> {
        const COLUMNS: &str = "claim_key, total_submitted, total_paid, total_rejected, \
             activity_count, fully_paid_count, partially_paid_count, rejected_count, \
             pending_count, remittance_count, resubmission_count, status, \
             first_submission_at, last_submission_at, first_paid_at, last_paid_at, \
             latest_settlement_at, days_to_first_payment, days_to_settlement, \
             latest_payment_reference, payment_references, tx_at";

        let (total, rows) = if let Some(status) = status {
            let total = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM claim_payments WHERE status = $1",
            )
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;

            let rows = sqlx::query_as::<_, ClaimPaymentRow>(&format!(
                "SELECT {COLUMNS} FROM claim_payments WHERE status = $1 \
                 ORDER BY claim_key LIMIT $2 OFFSET $3"
            ))
            .bind(status.as_str())
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
            (total, rows)
        } else {
            let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM claim_payments")
                .fetch_one(&self.pool)
                .await
                .map_err(storage)?;

            let rows = sqlx::query_as::<_, ClaimPaymentRow>(&format!(
                "SELECT {COLUMNS} FROM claim_payments ORDER BY claim_key LIMIT $1 OFFSET $2"
            ))
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
            (total, rows)
        };

        let payments = rows
            .into_iter()
            .map(ClaimPayment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((payments, u64::try_from(total).unwrap_or(0)))
    }

    async fn timeline(&self, claim_key: &ClaimKey) -> Result<Vec<TimelineEntry>, EngineError> {
        let rows = sqlx::query_as::<_, TimelineRow>(
            "SELECT claim_key, seq, kind, event_time, amount, cumulative_paid, \
             cumulative_rejected FROM claim_timeline WHERE claim_key = $1 ORDER BY seq",
        )
        .bind(claim_key.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(TimelineEntry::try_from).collect()
    }

    async fn append_timeline(&self, entry: &TimelineEntry) -> Result<bool, EngineError> {
        let result = sqlx::query(
            "INSERT INTO claim_timeline \
             (claim_key, seq, kind, event_time, amount, cumulative_paid, cumulative_rejected) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (claim_key, seq) DO NOTHING",
        )
        .bind(entry.claim_key.as_str())
        .bind(i64::try_from(entry.seq).unwrap_or(i64::MAX))
        .bind(entry.kind.as_str())
        .bind(entry.event_time)
        .bind(entry.amount)
        .bind(entry.cumulative_paid)
        .bind(entry.cumulative_rejected)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(result.rows_affected() == 1)
    }
}
