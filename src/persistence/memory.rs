//! In-memory store for embedded use and tests.
//!
//! [`MemoryStore`] implements both [`LedgerStore`] and [`SummaryStore`]
//! over a single `tokio::sync::RwLock`, so every batch write is trivially
//! atomic. Ledger appends are inherent methods rather than trait methods:
//! the aggregation engine only ever reads the ledger, and embedded
//! ingestion (or a test) writes it directly here.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{LedgerStore, SummaryStore};
use crate::domain::{
    Activity, ActivityId, ActivitySummary, AdjudicationCycle, ClaimKey, ClaimPayment,
    ClaimSubmission, LifecycleEvent, PaymentStatus, TimelineEntry,
};
use crate::error::EngineError;

#[derive(Debug, Default)]
struct Inner {
    activities: HashMap<ClaimKey, Vec<Activity>>,
    cycles: HashMap<ClaimKey, Vec<AdjudicationCycle>>,
    submissions: HashMap<ClaimKey, ClaimSubmission>,
    events: HashMap<ClaimKey, Vec<LifecycleEvent>>,
    activity_summaries: HashMap<ClaimKey, BTreeMap<ActivityId, ActivitySummary>>,
    claim_payments: BTreeMap<ClaimKey, ClaimPayment>,
    timelines: HashMap<ClaimKey, BTreeMap<u64, TimelineEntry>>,
}

/// In-memory ledger and summary store.
///
/// One monotone sequence covers both cycles and lifecycle events, so
/// "cycles visible at an event" is well-defined: exactly those with a
/// smaller or equal sequence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_seq: AtomicU64,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_seq: AtomicU64::new(1),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Appends an activity to the ledger.
    pub async fn append_activity(&self, activity: Activity) {
        let mut inner = self.inner.write().await;
        inner
            .activities
            .entry(activity.claim_key.clone())
            .or_default()
            .push(activity);
    }

    /// Appends an adjudication cycle, assigning the next ledger sequence.
    /// The `seq` on the input is ignored. Returns the assigned sequence.
    pub async fn append_cycle(&self, mut cycle: AdjudicationCycle) -> u64 {
        let mut inner = self.inner.write().await;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        cycle.seq = seq;
        inner
            .cycles
            .entry(cycle.claim_key.clone())
            .or_default()
            .push(cycle);
        seq
    }

    /// Records (or replaces) a claim's submission metadata.
    pub async fn record_submission(&self, submission: ClaimSubmission) {
        let mut inner = self.inner.write().await;
        inner
            .submissions
            .insert(submission.claim_key.clone(), submission);
    }

    /// Appends a lifecycle event, assigning the next ledger sequence.
    /// The `seq` on the input is ignored. Returns the assigned sequence.
    pub async fn append_lifecycle_event(&self, mut event: LifecycleEvent) -> u64 {
        let mut inner = self.inner.write().await;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        event.seq = seq;
        inner
            .events
            .entry(event.claim_key.clone())
            .or_default()
            .push(event);
        seq
    }

    /// Highest ledger sequence assigned so far, zero when nothing was
    /// appended yet.
    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed).saturating_sub(1)
    }
}

fn in_range(at: Option<DateTime<Utc>>, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    at.is_some_and(|t| t >= from && t <= to)
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn activities_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<Activity>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.activities.get(claim_key).cloned().unwrap_or_default())
    }

    async fn cycles_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<AdjudicationCycle>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.cycles.get(claim_key).cloned().unwrap_or_default())
    }

    async fn submission_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Option<ClaimSubmission>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.submissions.get(claim_key).cloned())
    }

    async fn lifecycle_events_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<LifecycleEvent>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.events.get(claim_key).cloned().unwrap_or_default())
    }

    async fn claim_keys(&self) -> Result<Vec<ClaimKey>, EngineError> {
        let inner = self.inner.read().await;
        let keys: BTreeSet<ClaimKey> = inner
            .activities
            .keys()
            .chain(inner.cycles.keys())
            .chain(inner.submissions.keys())
            .chain(inner.events.keys())
            .cloned()
            .collect();
        Ok(keys.into_iter().collect())
    }

    async fn claim_keys_touched_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ClaimKey>, EngineError> {
        let inner = self.inner.read().await;
        let mut keys = BTreeSet::new();
        for (key, events) in &inner.events {
            if events.iter().any(|e| in_range(Some(e.event_time), from, to)) {
                keys.insert(key.clone());
            }
        }
        for (key, cycles) in &inner.cycles {
            if cycles
                .iter()
                .any(|c| in_range(c.settlement_at, from, to) || in_range(c.batch_at, from, to))
            {
                keys.insert(key.clone());
            }
        }
        Ok(keys.into_iter().collect())
    }
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn activity_summaries(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<ActivitySummary>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .activity_summaries
            .get(claim_key)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_activity_summaries(
        &self,
        claim_key: &ClaimKey,
        summaries: &[ActivitySummary],
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        let map = inner
            .activity_summaries
            .entry(claim_key.clone())
            .or_default();
        for summary in summaries {
            map.insert(summary.activity_id.clone(), summary.clone());
        }
        Ok(())
    }

    async fn claim_payment(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Option<ClaimPayment>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.claim_payments.get(claim_key).cloned())
    }

    async fn upsert_claim_payment(&self, payment: &ClaimPayment) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        inner
            .claim_payments
            .insert(payment.claim_key.clone(), payment.clone());
        Ok(())
    }

    async fn list_claim_payments(
        &self,
        status: Option<PaymentStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<ClaimPayment>, u64), EngineError> {
        let inner = self.inner.read().await;
        let matching = inner
            .claim_payments
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s));
        let total = matching.clone().count() as u64;
        let page = matching
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn timeline(&self, claim_key: &ClaimKey) -> Result<Vec<TimelineEntry>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .timelines
            .get(claim_key)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn append_timeline(&self, entry: &TimelineEntry) -> Result<bool, EngineError> {
        let mut inner = self.inner.write().await;
        let timeline = inner.timelines.entry(entry.claim_key.clone()).or_default();
        if timeline.contains_key(&entry.seq) {
            return Ok(false);
        }
        timeline.insert(entry.seq, entry.clone());
        Ok(true)
    }
}
