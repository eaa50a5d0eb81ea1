//! Financial timeline recorder.
//!
//! Turns a claim's lifecycle events into immutable [`TimelineEntry`] rows
//! carrying running cumulative totals. Each entry's totals are computed
//! from the cycles visible at the event, meaning those whose ledger
//! sequence does not exceed the event's. Appends are keyed by (claim key,
//! event sequence) and skip duplicates, so recording is idempotent and
//! entries are never rewritten after later cycles arrive.

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::{ClaimKey, LifecycleKind, TimelineEntry, rollup};
use crate::error::EngineError;
use crate::persistence::{LedgerStore, SummaryStore};

/// Appends timeline entries for lifecycle events that lack one.
#[derive(Debug, Clone)]
pub struct TimelineRecorder {
    ledger: Arc<dyn LedgerStore>,
    summaries: Arc<dyn SummaryStore>,
}

impl TimelineRecorder {
    /// Creates a recorder over the given stores.
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerStore>, summaries: Arc<dyn SummaryStore>) -> Self {
        Self { ledger, summaries }
    }

    /// Records timeline entries for every lifecycle event of the claim
    /// that has none yet, in ledger-sequence order. Returns the number of
    /// entries actually appended.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on store failure and
    /// [`EngineError::Validation`] when the ledger holds a negative
    /// submitted net. Entries appended before the failure remain; a retry
    /// picks up where it left off.
    pub async fn record(&self, claim_key: &ClaimKey) -> Result<u32, EngineError> {
        let mut events = self.ledger.lifecycle_events_for_claim(claim_key).await?;
        if events.is_empty() {
            return Ok(0);
        }
        events.sort_by_key(|e| e.seq);

        let recorded: BTreeSet<u64> = self
            .summaries
            .timeline(claim_key)
            .await?
            .iter()
            .map(|e| e.seq)
            .collect();

        let activities = self.ledger.activities_for_claim(claim_key).await?;
        let cycles = self.ledger.cycles_for_claim(claim_key).await?;

        let mut appended = 0u32;
        for event in &events {
            if recorded.contains(&event.seq) {
                continue;
            }
            let (cumulative_paid, cumulative_rejected) =
                rollup::running_totals_at(&activities, &cycles, event.seq)?;
            let amount = if event.kind == LifecycleKind::PaymentRecognized {
                cumulative_paid
            } else {
                Decimal::ZERO
            };
            let entry = TimelineEntry {
                claim_key: claim_key.clone(),
                seq: event.seq,
                kind: event.kind,
                event_time: event.event_time,
                amount,
                cumulative_paid,
                cumulative_rejected,
            };
            if self.summaries.append_timeline(&entry).await? {
                appended += 1;
            }
        }

        if appended > 0 {
            tracing::debug!(%claim_key, appended, "timeline entries recorded");
        }
        Ok(appended)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{Activity, ActivityId, AdjudicationCycle, LifecycleEvent};
    use crate::persistence::MemoryStore;

    fn ts(day: u32) -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).single() {
            Some(t) => t,
            None => panic!("bad test timestamp"),
        }
    }

    fn cycle(claim: &str, paid: Decimal, denial: Option<&str>, day: u32) -> AdjudicationCycle {
        AdjudicationCycle {
            claim_key: ClaimKey::new(claim),
            activity_id: ActivityId::new("A-1"),
            seq: 0,
            paid,
            denial_code: denial.map(ToString::to_string),
            settlement_at: Some(ts(day)),
            payment_reference: None,
            batch_at: None,
        }
    }

    fn event(claim: &str, kind: LifecycleKind, day: u32) -> LifecycleEvent {
        LifecycleEvent {
            claim_key: ClaimKey::new(claim),
            seq: 0,
            kind,
            event_time: ts(day),
        }
    }

    fn recorder_over(store: &Arc<MemoryStore>) -> TimelineRecorder {
        TimelineRecorder::new(
            Arc::clone(store) as Arc<dyn LedgerStore>,
            Arc::clone(store) as Arc<dyn SummaryStore>,
        )
    }

    #[tokio::test]
    async fn entries_carry_running_totals() {
        let store = Arc::new(MemoryStore::new());
        let key = ClaimKey::new("CLM-1");
        store
            .append_activity(Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100)))
            .await;

        // Submission, then a partial payment, then the remainder.
        store
            .append_lifecycle_event(event("CLM-1", LifecycleKind::Submission, 1))
            .await;
        store.append_cycle(cycle("CLM-1", dec!(40), None, 3)).await;
        store
            .append_lifecycle_event(event("CLM-1", LifecycleKind::PaymentRecognized, 3))
            .await;
        store.append_cycle(cycle("CLM-1", dec!(60), None, 8)).await;
        store
            .append_lifecycle_event(event("CLM-1", LifecycleKind::PaymentRecognized, 8))
            .await;

        let recorder = recorder_over(&store);
        let Ok(appended) = recorder.record(&key).await else {
            panic!("record failed");
        };
        assert_eq!(appended, 3);

        let Ok(timeline) = store.timeline(&key).await else {
            panic!("read failed");
        };
        let [submitted, first_payment, second_payment] = timeline.as_slice() else {
            panic!("expected three entries");
        };
        assert_eq!(submitted.kind, LifecycleKind::Submission);
        assert_eq!(submitted.amount, Decimal::ZERO);
        assert_eq!(submitted.cumulative_paid, Decimal::ZERO);

        assert_eq!(first_payment.amount, dec!(40));
        assert_eq!(first_payment.cumulative_paid, dec!(40));

        assert_eq!(second_payment.amount, dec!(100));
        assert_eq!(second_payment.cumulative_paid, dec!(100));
        assert_eq!(second_payment.cumulative_rejected, Decimal::ZERO);
    }

    #[tokio::test]
    async fn recording_twice_appends_nothing_new() {
        let store = Arc::new(MemoryStore::new());
        let key = ClaimKey::new("CLM-1");
        store
            .append_activity(Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100)))
            .await;
        store
            .append_lifecycle_event(event("CLM-1", LifecycleKind::Submission, 1))
            .await;

        let recorder = recorder_over(&store);
        let Ok(first) = recorder.record(&key).await else {
            panic!("record failed");
        };
        assert_eq!(first, 1);

        let Ok(second) = recorder.record(&key).await else {
            panic!("record failed");
        };
        assert_eq!(second, 0);

        let Ok(timeline) = store.timeline(&key).await else {
            panic!("read failed");
        };
        assert_eq!(timeline.len(), 1);
    }

    #[tokio::test]
    async fn later_cycles_do_not_rewrite_history() {
        let store = Arc::new(MemoryStore::new());
        let key = ClaimKey::new("CLM-1");
        store
            .append_activity(Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100)))
            .await;
        store
            .append_lifecycle_event(event("CLM-1", LifecycleKind::Submission, 1))
            .await;

        let recorder = recorder_over(&store);
        let Ok(_) = recorder.record(&key).await else {
            panic!("record failed");
        };

        // A payment arrives after the submission entry was recorded.
        store.append_cycle(cycle("CLM-1", dec!(100), None, 5)).await;
        store
            .append_lifecycle_event(event("CLM-1", LifecycleKind::PaymentRecognized, 5))
            .await;
        let Ok(_) = recorder.record(&key).await else {
            panic!("record failed");
        };

        let Ok(timeline) = store.timeline(&key).await else {
            panic!("read failed");
        };
        let [submitted, paid] = timeline.as_slice() else {
            panic!("expected two entries");
        };
        // The submission entry still shows the totals as of submission.
        assert_eq!(submitted.cumulative_paid, Decimal::ZERO);
        assert_eq!(paid.cumulative_paid, dec!(100));
    }

    #[tokio::test]
    async fn denial_shows_in_cumulative_rejected() {
        let store = Arc::new(MemoryStore::new());
        let key = ClaimKey::new("CLM-1");
        store
            .append_activity(Activity::new(key.clone(), ActivityId::new("A-1"), dec!(100)))
            .await;
        store
            .append_cycle(cycle("CLM-1", dec!(0), Some("D1"), 2))
            .await;
        store
            .append_lifecycle_event(event("CLM-1", LifecycleKind::PaymentRecognized, 2))
            .await;

        let recorder = recorder_over(&store);
        let Ok(_) = recorder.record(&key).await else {
            panic!("record failed");
        };

        let Ok(timeline) = store.timeline(&key).await else {
            panic!("read failed");
        };
        let [denied] = timeline.as_slice() else {
            panic!("expected one entry");
        };
        assert_eq!(denied.cumulative_paid, Decimal::ZERO);
        assert_eq!(denied.cumulative_rejected, dec!(100));
    }

    #[tokio::test]
    async fn claim_without_events_records_nothing() {
        let store = Arc::new(MemoryStore::new());
        let key = ClaimKey::new("CLM-1");
        store.append_cycle(cycle("CLM-1", dec!(10), None, 1)).await;

        let recorder = recorder_over(&store);
        let Ok(appended) = recorder.record(&key).await else {
            panic!("record failed");
        };
        assert_eq!(appended, 0);
    }
}
