//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1` except `/health`. With the
//! `swagger-ui` feature enabled, interactive docs are served at
//! `/swagger-ui` from the OpenAPI document below.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::system::health_handler,
        handlers::claims::list_claims,
        handlers::claims::get_claim,
        handlers::claims::get_claim_activities,
        handlers::claims::get_claim_timeline,
        handlers::claims::get_claim_status,
        handlers::claims::get_claim_total_paid,
        handlers::claims::get_claim_fully_paid,
        handlers::changes::submit_change,
        handlers::admin::recompute_all,
        handlers::admin::recompute_range,
    ),
    components(schemas(
        handlers::system::HealthResponse,
        dto::ActivitySummaryDto,
        dto::ChangeAccepted,
        dto::ChangeRequest,
        dto::ClaimListResponse,
        dto::ClaimPaymentDto,
        dto::FullyPaidResponse,
        dto::PaginationMeta,
        dto::RecomputeFailureDto,
        dto::RecomputeRangeRequest,
        dto::RecomputeResponse,
        dto::StatusResponse,
        dto::TimelineEntryDto,
        dto::TotalPaidResponse,
        crate::error::ErrorBody,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "System", description = "Health and diagnostics"),
        (name = "Claims", description = "Claim payment summaries and lookups"),
        (name = "Changes", description = "Ledger change notifications"),
        (name = "Admin", description = "Maintenance recomputation"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
