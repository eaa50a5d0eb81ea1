//! Claim read handlers: list, detail, activities, timeline, lookups.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    ActivitySummaryDto, ClaimListParams, ClaimListResponse, ClaimPaymentDto, FullyPaidResponse,
    PaginationMeta, StatusResponse, TimelineEntryDto, TotalPaidResponse,
};
use crate::app_state::AppState;
use crate::domain::{ClaimKey, PaymentStatus};
use crate::error::{EngineError, ErrorResponse};

/// `GET /claims` — List claim payments with pagination and optional
/// status filter.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] on an unknown status filter.
#[utoipa::path(
    get,
    path = "/api/v1/claims",
    tag = "Claims",
    summary = "List claim payments",
    description = "Returns a paginated list of claim payment summaries, optionally filtered by payment status.",
    params(ClaimListParams),
    responses(
        (status = 200, description = "Paginated claim payment list", body = ClaimListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
    )
)]
pub async fn list_claims(
    State(state): State<AppState>,
    Query(params): Query<ClaimListParams>,
) -> Result<impl IntoResponse, EngineError> {
    let params = params.clamped();
    let status = match params.status.as_deref() {
        Some(raw) => Some(raw.parse::<PaymentStatus>()?),
        None => None,
    };
    let offset = params.page.saturating_sub(1).saturating_mul(params.per_page);

    let (payments, total) = state
        .summary_service
        .list_claims(status, params.per_page, offset)
        .await?;

    let data: Vec<ClaimPaymentDto> = payments.into_iter().map(ClaimPaymentDto::from).collect();
    Ok(Json(ClaimListResponse {
        data,
        pagination: PaginationMeta::new(params.page, params.per_page, total),
    }))
}

/// `GET /claims/{key}` — Full claim payment detail.
///
/// # Errors
///
/// Returns [`EngineError::ClaimNotFound`] when no summary exists.
#[utoipa::path(
    get,
    path = "/api/v1/claims/{key}",
    tag = "Claims",
    summary = "Get claim payment detail",
    description = "Returns the stored claim payment summary with totals, counts, dates, and payment references.",
    params(
        ("key" = String, Path, description = "Claim key"),
    ),
    responses(
        (status = 200, description = "Claim payment detail", body = ClaimPaymentDto),
        (status = 404, description = "Claim not found", body = ErrorResponse),
    )
)]
pub async fn get_claim(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let claim_key = ClaimKey::new(key);
    let payment = state.summary_service.claim_detail(&claim_key).await?;
    Ok(Json(ClaimPaymentDto::from(payment)))
}

/// `GET /claims/{key}/activities` — Activity summaries of a claim.
///
/// # Errors
///
/// Returns [`EngineError::Storage`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/claims/{key}/activities",
    tag = "Claims",
    summary = "List activity summaries",
    description = "Returns the claim's activity summaries sorted by activity id. Empty for unknown claims.",
    params(
        ("key" = String, Path, description = "Claim key"),
    ),
    responses(
        (status = 200, description = "Activity summaries", body = Vec<ActivitySummaryDto>),
    )
)]
pub async fn get_claim_activities(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let claim_key = ClaimKey::new(key);
    let summaries = state.summary_service.activity_summaries(&claim_key).await?;
    let data: Vec<ActivitySummaryDto> = summaries
        .into_iter()
        .map(ActivitySummaryDto::from)
        .collect();
    Ok(Json(data))
}

/// `GET /claims/{key}/timeline` — Financial timeline of a claim.
///
/// # Errors
///
/// Returns [`EngineError::Storage`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/claims/{key}/timeline",
    tag = "Claims",
    summary = "Get financial timeline",
    description = "Returns the claim's timeline entries ordered by ledger sequence, each carrying running cumulative totals. Empty for unknown claims.",
    params(
        ("key" = String, Path, description = "Claim key"),
    ),
    responses(
        (status = 200, description = "Timeline entries", body = Vec<TimelineEntryDto>),
    )
)]
pub async fn get_claim_timeline(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let claim_key = ClaimKey::new(key);
    let entries = state.summary_service.timeline(&claim_key).await?;
    let data: Vec<TimelineEntryDto> = entries.into_iter().map(TimelineEntryDto::from).collect();
    Ok(Json(data))
}

/// `GET /claims/{key}/status` — Payment status lookup.
///
/// # Errors
///
/// Returns [`EngineError::Storage`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/claims/{key}/status",
    tag = "Claims",
    summary = "Get payment status",
    description = "Returns the claim's payment status. Unknown claims report PENDING.",
    params(
        ("key" = String, Path, description = "Claim key"),
    ),
    responses(
        (status = 200, description = "Payment status", body = StatusResponse),
    )
)]
pub async fn get_claim_status(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let claim_key = ClaimKey::new(key);
    let status = state.summary_service.payment_status(&claim_key).await?;
    Ok(Json(StatusResponse {
        claim_key: claim_key.to_string(),
        status: status.to_string(),
    }))
}

/// `GET /claims/{key}/total-paid` — Total paid lookup.
///
/// # Errors
///
/// Returns [`EngineError::Storage`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/claims/{key}/total-paid",
    tag = "Claims",
    summary = "Get total paid",
    description = "Returns the claim's total paid amount. Unknown claims report zero.",
    params(
        ("key" = String, Path, description = "Claim key"),
    ),
    responses(
        (status = 200, description = "Total paid", body = TotalPaidResponse),
    )
)]
pub async fn get_claim_total_paid(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let claim_key = ClaimKey::new(key);
    let total_paid = state.summary_service.total_paid(&claim_key).await?;
    Ok(Json(TotalPaidResponse {
        claim_key: claim_key.to_string(),
        total_paid,
    }))
}

/// `GET /claims/{key}/fully-paid` — Fully-paid flag lookup.
///
/// # Errors
///
/// Returns [`EngineError::Storage`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/claims/{key}/fully-paid",
    tag = "Claims",
    summary = "Check whether a claim is fully paid",
    description = "Returns whether the claim is fully paid. Unknown claims report false.",
    params(
        ("key" = String, Path, description = "Claim key"),
    ),
    responses(
        (status = 200, description = "Fully-paid flag", body = FullyPaidResponse),
    )
)]
pub async fn get_claim_fully_paid(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let claim_key = ClaimKey::new(key);
    let fully_paid = state.summary_service.is_fully_paid(&claim_key).await?;
    Ok(Json(FullyPaidResponse {
        claim_key: claim_key.to_string(),
        fully_paid,
    }))
}

/// Claim read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/claims", get(list_claims))
        .route("/claims/{key}", get(get_claim))
        .route("/claims/{key}/activities", get(get_claim_activities))
        .route("/claims/{key}/timeline", get(get_claim_timeline))
        .route("/claims/{key}/status", get(get_claim_status))
        .route("/claims/{key}/total-paid", get(get_claim_total_paid))
        .route("/claims/{key}/fully-paid", get(get_claim_fully_paid))
}
