//! Domain events reflecting summary refreshes.
//!
//! Every successful merge-write emits a [`SummaryEvent`] through the
//! [`super::EventBus`] so embedded reporting consumers can react without
//! polling the summary store. Delivery is best-effort; correctness never
//! depends on an event being observed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::claim_key::ClaimKey;
use super::summary::PaymentStatus;

/// Domain event emitted after a summary refresh commits.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SummaryEvent {
    /// Emitted after a claim's activity summaries are merge-written.
    ActivitiesRefreshed {
        /// Claim whose activity summaries were refreshed.
        claim_key: ClaimKey,
        /// Number of summaries in the written batch.
        activity_count: u32,
        /// Sum of capped paid amounts across the batch.
        total_paid: Decimal,
        /// Refresh timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after the claim payment record is merge-written.
    ClaimRefreshed {
        /// Claim whose payment record was refreshed.
        claim_key: ClaimKey,
        /// Claim-level payment status after the refresh.
        status: PaymentStatus,
        /// Claim-level paid total after the refresh.
        total_paid: Decimal,
        /// Claim-level submitted total after the refresh.
        total_submitted: Decimal,
        /// Refresh timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after new timeline entries are appended.
    TimelineAppended {
        /// Claim whose timeline grew.
        claim_key: ClaimKey,
        /// Number of entries actually appended (duplicates are skipped).
        appended: u32,
        /// Append timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl SummaryEvent {
    /// Returns the claim key associated with this event.
    #[must_use]
    pub const fn claim_key(&self) -> &ClaimKey {
        match self {
            Self::ActivitiesRefreshed { claim_key, .. }
            | Self::ClaimRefreshed { claim_key, .. }
            | Self::TimelineAppended { claim_key, .. } => claim_key,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::ActivitiesRefreshed { .. } => "activities_refreshed",
            Self::ClaimRefreshed { .. } => "claim_refreshed",
            Self::TimelineAppended { .. } => "timeline_appended",
        }
    }
}
