//! Service layer: refresh orchestration.
//!
//! [`SummaryService`] derives summaries from the ledger and serves
//! lookups, [`TimelineRecorder`] appends the financial timeline, and
//! [`ChangeDispatcher`] feeds change notifications into background
//! refreshes. Events go out through the [`super::domain::EventBus`].

pub mod dispatcher;
pub mod summary_service;
pub mod timeline;

pub use dispatcher::{ChangeDispatcher, DispatchSettings};
pub use summary_service::{RecomputeFailure, RecomputeReport, SummaryService};
pub use timeline::TimelineRecorder;
