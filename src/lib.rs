//! # remitsum
//!
//! Incremental payment summary engine for healthcare claims.
//!
//! Ingestion pipelines append remittance cycles, activities, and lifecycle
//! events to a shared ledger and notify this service. The engine re-derives
//! per-activity and per-claim payment summaries plus an append-only
//! financial timeline from the ledger, and serves them over REST. All
//! derivations are idempotent: replaying a notification, or recomputing
//! everything from scratch, lands on byte-identical summaries.
//!
//! ## Architecture
//!
//! ```text
//! Ingestion collaborators (HTTP)          Readers (HTTP)
//!     │                                       │
//!     ├── POST /changes ──► ChangeDispatcher  ├── REST Handlers (api/)
//!     │                        │              │
//!     │                        ▼              │
//!     │                  SummaryService (service/)
//!     │                        │  cycle aggregation (domain/rollup)
//!     │                        │  events (domain/EventBus)
//!     │                        ▼
//!     └──────────► Ledger & summary stores (persistence/)
//!                  in-memory or PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
