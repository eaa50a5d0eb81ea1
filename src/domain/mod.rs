//! Domain layer: ledger records, aggregation rules, and the event system.
//!
//! This module contains the claim identity newtypes, the read-only ledger
//! record types, the pure cycle-aggregation functions, the derived summary
//! records, the per-claim lock map, and the event bus for broadcasting
//! summary refreshes.

pub mod change;
pub mod claim_key;
pub mod claim_locks;
pub mod event_bus;
pub mod ledger;
pub mod rollup;
pub mod summary;
pub mod summary_event;

pub use change::{ChangeKind, LedgerChange};
pub use claim_key::{ActivityId, ClaimKey};
pub use claim_locks::ClaimLocks;
pub use event_bus::EventBus;
pub use ledger::{Activity, AdjudicationCycle, ClaimSubmission, LifecycleEvent, LifecycleKind};
pub use summary::{ActivitySummary, ClaimPayment, PaymentStatus, TimelineEntry};
pub use summary_event::SummaryEvent;
