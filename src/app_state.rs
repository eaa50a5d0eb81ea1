//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{ChangeDispatcher, SummaryService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Summary service for refreshes, lookups, and maintenance.
    pub summary_service: Arc<SummaryService>,
    /// Dispatcher accepting ledger change notifications.
    pub dispatcher: ChangeDispatcher,
}
