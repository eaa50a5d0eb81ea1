//! Claim summary refresh and lookup service.
//!
//! [`SummaryService`] is the write path of the engine: it re-derives a
//! claim's activity summaries, claim payment, and financial timeline from
//! the ledger and merge-writes them into the summary store. Refreshes for
//! one claim serialize on a per-claim lock; distinct claims run in
//! parallel. Readers never take the lock and always see the
//! last-committed snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    ActivitySummary, ClaimKey, ClaimLocks, ClaimPayment, EventBus, PaymentStatus, SummaryEvent,
    TimelineEntry, rollup,
};
use crate::error::EngineError;
use crate::persistence::{LedgerStore, SummaryStore};
use crate::service::timeline::TimelineRecorder;

/// Outcome of a maintenance recompute over many claims.
#[derive(Debug, Clone, Serialize)]
pub struct RecomputeReport {
    /// Correlates the pass's log lines and report.
    pub run_id: Uuid,
    /// Number of claims selected for recompute.
    pub total: u32,
    /// Claims whose full pipeline committed.
    pub succeeded: u32,
    /// Claims whose pipeline failed; their stored summaries are untouched.
    pub failed: u32,
    /// One entry per failed claim.
    pub failures: Vec<RecomputeFailure>,
}

/// A single claim that failed during a recompute pass.
#[derive(Debug, Clone, Serialize)]
pub struct RecomputeFailure {
    /// The claim whose refresh failed.
    pub claim_key: ClaimKey,
    /// Rendered error message.
    pub error: String,
}

/// Derives and serves claim payment summaries.
#[derive(Debug, Clone)]
pub struct SummaryService {
    ledger: Arc<dyn LedgerStore>,
    summaries: Arc<dyn SummaryStore>,
    timeline: TimelineRecorder,
    event_bus: EventBus,
    locks: Arc<ClaimLocks>,
}

impl SummaryService {
    /// Creates the service over the given stores and event bus.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        summaries: Arc<dyn SummaryStore>,
        event_bus: EventBus,
    ) -> Self {
        let timeline = TimelineRecorder::new(Arc::clone(&ledger), Arc::clone(&summaries));
        Self {
            ledger,
            summaries,
            timeline,
            event_bus,
            locks: Arc::new(ClaimLocks::new()),
        }
    }

    /// Runs the full refresh pipeline for one claim under its lock:
    /// activity summaries, then the claim payment, then the timeline.
    /// Returns the refreshed claim payment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for a negative submitted net,
    /// [`EngineError::Consistency`] when a derived summary violates its
    /// invariants (nothing is written), and [`EngineError::Storage`] on
    /// store failure.
    pub async fn refresh(&self, claim_key: &ClaimKey) -> Result<ClaimPayment, EngineError> {
        let lock = self.locks.lock_for(claim_key).await;
        let _guard = lock.lock().await;
        self.refresh_activities(claim_key).await?;
        let payment = self.refresh_claim(claim_key).await?;
        self.record_timeline(claim_key).await?;
        Ok(payment)
    }

    /// Re-derives every activity summary of the claim from the ledger and
    /// merge-writes them as one batch. Returns the summaries sorted by
    /// activity id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for a negative submitted net,
    /// [`EngineError::Consistency`] when a derived summary violates its
    /// invariants (the batch is not written), and [`EngineError::Storage`]
    /// on store failure.
    pub async fn refresh_activities(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<ActivitySummary>, EngineError> {
        let mut activities = self.ledger.activities_for_claim(claim_key).await?;
        activities.sort_by(|a, b| a.activity_id.cmp(&b.activity_id));
        let cycles = self.ledger.cycles_for_claim(claim_key).await?;

        let mut summaries = Vec::with_capacity(activities.len());
        for activity in &activities {
            let summary = rollup::rollup_activity(activity, &cycles)?;
            rollup::validate_activity_summary(&summary)?;
            summaries.push(summary);
        }

        self.summaries
            .upsert_activity_summaries(claim_key, &summaries)
            .await?;

        let total_paid: Decimal = summaries.iter().map(|s| s.paid).sum();
        let _ = self.event_bus.publish(SummaryEvent::ActivitiesRefreshed {
            claim_key: claim_key.clone(),
            activity_count: u32::try_from(summaries.len()).unwrap_or(u32::MAX),
            total_paid,
            timestamp: Utc::now(),
        });
        tracing::debug!(%claim_key, count = summaries.len(), "activity summaries refreshed");
        Ok(summaries)
    }

    /// Re-derives the claim-level payment from the stored activity
    /// summaries plus submission metadata, lifecycle events, and cycles,
    /// then merge-writes it keyed by claim key.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Consistency`] when the rollup violates its
    /// invariants (nothing is written) and [`EngineError::Storage`] on
    /// store failure.
    pub async fn refresh_claim(&self, claim_key: &ClaimKey) -> Result<ClaimPayment, EngineError> {
        let summaries = self.summaries.activity_summaries(claim_key).await?;
        let submission = self.ledger.submission_for_claim(claim_key).await?;
        let events = self.ledger.lifecycle_events_for_claim(claim_key).await?;
        let cycles = self.ledger.cycles_for_claim(claim_key).await?;

        let payment = rollup::rollup_claim(
            claim_key,
            &summaries,
            submission.as_ref(),
            &events,
            &cycles,
        );
        rollup::validate_claim_payment(&payment, &summaries)?;

        self.summaries.upsert_claim_payment(&payment).await?;

        let _ = self.event_bus.publish(SummaryEvent::ClaimRefreshed {
            claim_key: claim_key.clone(),
            status: payment.status,
            total_paid: payment.total_paid,
            total_submitted: payment.total_submitted,
            timestamp: Utc::now(),
        });
        tracing::info!(%claim_key, status = %payment.status, "claim payment refreshed");
        Ok(payment)
    }

    /// Appends timeline entries for lifecycle events that have none yet.
    /// Returns the number of entries appended.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on store failure and
    /// [`EngineError::Validation`] when the ledger holds a negative
    /// submitted net.
    pub async fn record_timeline(&self, claim_key: &ClaimKey) -> Result<u32, EngineError> {
        let appended = self.timeline.record(claim_key).await?;
        if appended > 0 {
            let _ = self.event_bus.publish(SummaryEvent::TimelineAppended {
                claim_key: claim_key.clone(),
                appended,
                timestamp: Utc::now(),
            });
        }
        Ok(appended)
    }

    /// Payment status of the claim; [`PaymentStatus::Pending`] when no
    /// summary exists.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on store failure.
    pub async fn payment_status(&self, claim_key: &ClaimKey) -> Result<PaymentStatus, EngineError> {
        Ok(self
            .summaries
            .claim_payment(claim_key)
            .await?
            .map(|p| p.status)
            .unwrap_or_default())
    }

    /// Total paid across the claim's activities; zero when no summary
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on store failure.
    pub async fn total_paid(&self, claim_key: &ClaimKey) -> Result<Decimal, EngineError> {
        Ok(self
            .summaries
            .claim_payment(claim_key)
            .await?
            .map_or(Decimal::ZERO, |p| p.total_paid))
    }

    /// Whether the claim is fully paid; false when no summary exists.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on store failure.
    pub async fn is_fully_paid(&self, claim_key: &ClaimKey) -> Result<bool, EngineError> {
        Ok(self
            .summaries
            .claim_payment(claim_key)
            .await?
            .is_some_and(|p| p.is_fully_paid()))
    }

    /// The stored claim payment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ClaimNotFound`] when the claim has no stored
    /// payment and [`EngineError::Storage`] on store failure.
    pub async fn claim_detail(&self, claim_key: &ClaimKey) -> Result<ClaimPayment, EngineError> {
        self.summaries
            .claim_payment(claim_key)
            .await?
            .ok_or_else(|| EngineError::ClaimNotFound(claim_key.to_string()))
    }

    /// Stored activity summaries of the claim, sorted by activity id.
    /// Empty when none exist.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on store failure.
    pub async fn activity_summaries(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<ActivitySummary>, EngineError> {
        self.summaries.activity_summaries(claim_key).await
    }

    /// Stored timeline of the claim, ordered by event sequence. Empty when
    /// none exists.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on store failure.
    pub async fn timeline(&self, claim_key: &ClaimKey) -> Result<Vec<TimelineEntry>, EngineError> {
        self.summaries.timeline(claim_key).await
    }

    /// A page of stored claim payments, optionally filtered by status,
    /// together with the total match count.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on store failure.
    pub async fn list_claims(
        &self,
        status: Option<PaymentStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<ClaimPayment>, u64), EngineError> {
        self.summaries.list_claim_payments(status, limit, offset).await
    }

    /// Recomputes every claim known to the ledger. Failures are isolated
    /// per claim and collected in the report.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] when the claim key listing itself
    /// fails.
    pub async fn recompute_all(&self) -> Result<RecomputeReport, EngineError> {
        let keys = self.ledger.claim_keys().await?;
        Ok(self.recompute_keys(keys).await)
    }

    /// Recomputes every claim with ledger rows stamped inside the window.
    /// Failures are isolated per claim and collected in the report.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when the window start is after
    /// its end and [`EngineError::Storage`] when the claim key listing
    /// fails.
    pub async fn recompute_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<RecomputeReport, EngineError> {
        if from > to {
            return Err(EngineError::Validation(format!(
                "recompute window start {from} is after end {to}"
            )));
        }
        let keys = self.ledger.claim_keys_touched_between(from, to).await?;
        Ok(self.recompute_keys(keys).await)
    }

    async fn recompute_keys(&self, keys: Vec<ClaimKey>) -> RecomputeReport {
        let run_id = Uuid::new_v4();
        let mut report = RecomputeReport {
            run_id,
            total: u32::try_from(keys.len()).unwrap_or(u32::MAX),
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        };
        tracing::info!(%run_id, total = report.total, "recompute pass started");
        for key in keys {
            match self.refresh(&key).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    tracing::error!(%run_id, claim_key = %key, error = %e, "recompute failed for claim");
                    report.failed += 1;
                    report.failures.push(RecomputeFailure {
                        claim_key: key,
                        error: e.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            %run_id,
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            "recompute pass finished"
        );
        report
    }
}
