//! Change notification handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{ChangeAccepted, ChangeRequest};
use crate::app_state::AppState;
use crate::domain::{ChangeKind, ClaimKey, LedgerChange};
use crate::error::{EngineError, ErrorResponse};

/// `POST /changes` — Notify the engine that a claim's ledger changed.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] on an unknown change kind and
/// [`EngineError::QueueFull`] when the dispatch queue is saturated.
#[utoipa::path(
    post,
    path = "/api/v1/changes",
    tag = "Changes",
    summary = "Submit a ledger change notification",
    description = "Queues a claim for background refresh. The engine re-derives all summaries from the ledger, so duplicate notifications are harmless.",
    request_body = ChangeRequest,
    responses(
        (status = 202, description = "Notification queued", body = ChangeAccepted),
        (status = 400, description = "Unknown change kind", body = ErrorResponse),
        (status = 503, description = "Dispatch queue full", body = ErrorResponse),
    )
)]
pub async fn submit_change(
    State(state): State<AppState>,
    Json(req): Json<ChangeRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let kind: ChangeKind = req.kind.parse()?;
    let claim_key = ClaimKey::new(req.claim_key);

    state
        .dispatcher
        .notify(LedgerChange::new(claim_key.clone(), kind))?;

    let response = ChangeAccepted {
        claim_key: claim_key.to_string(),
        kind: kind.to_string(),
        accepted_at: Utc::now(),
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Change notification routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/changes", post(submit_change))
}
