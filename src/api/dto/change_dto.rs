//! Change notification and maintenance DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::service::{RecomputeFailure, RecomputeReport};

/// Request body for `POST /changes`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangeRequest {
    /// Claim whose ledger records changed.
    pub claim_key: String,
    /// What was appended (`cycles_appended`, `activities_appended`,
    /// `lifecycle_recorded`).
    pub kind: String,
}

/// Response body for `POST /changes` (202 Accepted).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChangeAccepted {
    /// Claim key echoed from the request.
    pub claim_key: String,
    /// Change kind echoed from the request.
    pub kind: String,
    /// Queue acceptance timestamp.
    pub accepted_at: DateTime<Utc>,
}

/// Request body for `POST /admin/recompute-range`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecomputeRangeRequest {
    /// Inclusive window start.
    pub from: DateTime<Utc>,
    /// Inclusive window end.
    pub to: DateTime<Utc>,
}

/// Response body for the admin recompute endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecomputeResponse {
    /// Correlates the pass's log lines and report.
    pub run_id: Uuid,
    /// Number of claims selected.
    pub total: u32,
    /// Claims whose refresh committed.
    pub succeeded: u32,
    /// Claims whose refresh failed.
    pub failed: u32,
    /// One entry per failed claim.
    pub failures: Vec<RecomputeFailureDto>,
}

/// One failed claim within a recompute pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecomputeFailureDto {
    /// The claim whose refresh failed.
    pub claim_key: String,
    /// Rendered error message.
    pub error: String,
}

impl From<RecomputeFailure> for RecomputeFailureDto {
    fn from(failure: RecomputeFailure) -> Self {
        Self {
            claim_key: failure.claim_key.to_string(),
            error: failure.error,
        }
    }
}

impl From<RecomputeReport> for RecomputeResponse {
    fn from(report: RecomputeReport) -> Self {
        Self {
            run_id: report.run_id,
            total: report.total,
            succeeded: report.succeeded,
            failed: report.failed,
            failures: report
                .failures
                .into_iter()
                .map(RecomputeFailureDto::from)
                .collect(),
        }
    }
}
