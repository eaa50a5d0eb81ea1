//! Persistence layer: ledger reads and summary merge-writes.
//!
//! Two traits split the storage surface. [`LedgerStore`] is the engine's
//! read-only view over the append-only records owned by ingestion
//! collaborators. [`SummaryStore`] holds the derived records this engine
//! exclusively owns and merge-writes. Both come in two implementations:
//! [`MemoryStore`] for embedded use and tests, and [`PostgresStore`] over
//! `sqlx::PgPool` for the shared claims database.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::{
    Activity, ActivitySummary, AdjudicationCycle, ClaimKey, ClaimPayment, ClaimSubmission,
    LifecycleEvent, PaymentStatus, TimelineEntry,
};
use crate::error::EngineError;

/// Read-only view over the append-only ledger.
///
/// The engine never writes through this trait; ledger appends happen in
/// ingestion collaborators, which then notify the dispatcher.
#[async_trait]
pub trait LedgerStore: Send + Sync + std::fmt::Debug {
    /// Returns all activities of a claim. Empty for unknown claims.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn activities_for_claim(&self, claim_key: &ClaimKey)
    -> Result<Vec<Activity>, EngineError>;

    /// Returns all adjudication cycles of a claim, in ledger-sequence
    /// order. Empty for unknown claims.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn cycles_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<AdjudicationCycle>, EngineError>;

    /// Returns the claim's submission metadata, when recorded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn submission_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Option<ClaimSubmission>, EngineError>;

    /// Returns the claim's lifecycle events, in ledger-sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn lifecycle_events_for_claim(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<LifecycleEvent>, EngineError>;

    /// Returns every claim key present in the ledger, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn claim_keys(&self) -> Result<Vec<ClaimKey>, EngineError>;

    /// Returns the keys of claims touched within the inclusive range:
    /// any lifecycle event time, cycle settlement time, or cycle batch
    /// time falling inside it. Sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn claim_keys_touched_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ClaimKey>, EngineError>;
}

/// Store for the derived records this engine owns.
///
/// Upserts are merge-writes: the row key determines insert-or-replace, and
/// a batch commits atomically or not at all. Timeline appends never
/// replace an existing entry.
#[async_trait]
pub trait SummaryStore: Send + Sync + std::fmt::Debug {
    /// Returns the claim's activity summaries, sorted by activity id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn activity_summaries(
        &self,
        claim_key: &ClaimKey,
    ) -> Result<Vec<ActivitySummary>, EngineError>;

    /// Merge-writes all activity summaries of one claim as a single
    /// atomic batch, keyed by (claim key, activity id).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure; no partial batch
    /// is ever visible.
    async fn upsert_activity_summaries(
        &self,
        claim_key: &ClaimKey,
        summaries: &[ActivitySummary],
    ) -> Result<(), EngineError>;

    /// Returns the claim's payment record, when one has been computed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn claim_payment(&self, claim_key: &ClaimKey)
    -> Result<Option<ClaimPayment>, EngineError>;

    /// Merge-writes the claim payment record, keyed by claim key.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn upsert_claim_payment(&self, payment: &ClaimPayment) -> Result<(), EngineError>;

    /// Returns one page of claim payments ordered by claim key, plus the
    /// total number of records matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn list_claim_payments(
        &self,
        status: Option<PaymentStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<ClaimPayment>, u64), EngineError>;

    /// Returns the claim's timeline entries, in event-sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn timeline(&self, claim_key: &ClaimKey) -> Result<Vec<TimelineEntry>, EngineError>;

    /// Appends a timeline entry unless one already exists for the entry's
    /// (claim key, event sequence). Returns `true` when the entry was
    /// appended, `false` when a duplicate was skipped. Existing entries
    /// are never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] on I/O failure.
    async fn append_timeline(&self, entry: &TimelineEntry) -> Result<bool, EngineError>;
}
