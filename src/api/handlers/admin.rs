//! Maintenance handlers: full and windowed recompute.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{RecomputeRangeRequest, RecomputeResponse};
use crate::app_state::AppState;
use crate::error::{EngineError, ErrorResponse};

/// `POST /admin/recompute` — Recompute every claim known to the ledger.
///
/// # Errors
///
/// Returns [`EngineError::Storage`] when the claim key listing fails.
/// Per-claim failures do not fail the request; they are reported in the
/// response body.
#[utoipa::path(
    post,
    path = "/api/v1/admin/recompute",
    tag = "Admin",
    summary = "Recompute all claims",
    description = "Re-derives every claim's summaries from the ledger. Failures are isolated per claim and listed in the report.",
    responses(
        (status = 200, description = "Recompute report", body = RecomputeResponse),
        (status = 503, description = "Claim key listing failed", body = ErrorResponse),
    )
)]
pub async fn recompute_all(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, EngineError> {
    let report = state.summary_service.recompute_all().await?;
    Ok(Json(RecomputeResponse::from(report)))
}

/// `POST /admin/recompute-range` — Recompute claims touched in a window.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] when the window start is after
/// its end and [`EngineError::Storage`] when the claim key listing
/// fails.
#[utoipa::path(
    post,
    path = "/api/v1/admin/recompute-range",
    tag = "Admin",
    summary = "Recompute claims touched in a time window",
    description = "Re-derives summaries for every claim with ledger rows stamped inside the inclusive window.",
    request_body = RecomputeRangeRequest,
    responses(
        (status = 200, description = "Recompute report", body = RecomputeResponse),
        (status = 400, description = "Window start after end", body = ErrorResponse),
        (status = 503, description = "Claim key listing failed", body = ErrorResponse),
    )
)]
pub async fn recompute_range(
    State(state): State<AppState>,
    Json(req): Json<RecomputeRangeRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let report = state
        .summary_service
        .recompute_between(req.from, req.to)
        .await?;
    Ok(Json(RecomputeResponse::from(report)))
}

/// Maintenance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/recompute", post(recompute_all))
        .route("/admin/recompute-range", post(recompute_range))
}
