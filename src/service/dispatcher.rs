//! Change intake and background refresh dispatch.
//!
//! Ingestion collaborators append to the ledger and then call
//! [`ChangeDispatcher::notify`]. Notifications land on a bounded queue; a
//! worker loop fans them out to per-claim refresh tasks, bounded by a
//! semaphore across claims while the service's per-claim lock keeps work
//! on one claim serialized. Each attempt runs under a timeout and
//! transient failures retry with exponential backoff. A claim that keeps
//! failing is logged and dropped; its stored summaries and the triggering
//! ledger write are untouched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc};

use crate::domain::LedgerChange;
use crate::error::EngineError;
use crate::service::summary_service::SummaryService;

/// Tuning for the dispatch queue and refresh attempts.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Bounded queue capacity; a full queue rejects with
    /// [`EngineError::QueueFull`].
    pub queue_capacity: usize,
    /// Maximum refresh tasks in flight across distinct claims.
    pub max_concurrent: usize,
    /// Budget for a single refresh attempt.
    pub refresh_timeout: Duration,
    /// Retries after the first attempt, for transient failures only.
    pub retry_max: u32,
    /// Backoff before the first retry; doubles per subsequent retry.
    pub retry_base_delay: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_concurrent: 8,
            refresh_timeout: Duration::from_secs(30),
            retry_max: 3,
            retry_base_delay: Duration::from_millis(100),
        }
    }
}

/// Accepts ledger change notifications and refreshes claims in the
/// background.
#[derive(Debug, Clone)]
pub struct ChangeDispatcher {
    tx: mpsc::Sender<LedgerChange>,
}

impl ChangeDispatcher {
    /// Creates the dispatcher and spawns its worker loop on the current
    /// runtime. The loop ends once every handle is dropped and the queue
    /// drains.
    #[must_use]
    pub fn new(service: Arc<SummaryService>, settings: DispatchSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.queue_capacity);
        let permits = Arc::new(Semaphore::new(settings.max_concurrent));
        tokio::spawn(run_worker(service, settings, permits, rx));
        Self { tx }
    }

    /// Enqueues a change notification without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::QueueFull`] when the queue is at capacity
    /// and [`EngineError::Internal`] when the worker loop is gone.
    pub fn notify(&self, change: LedgerChange) -> Result<(), EngineError> {
        self.tx.try_send(change).map_err(|e| match e {
            TrySendError::Full(rejected) => {
                tracing::warn!(claim_key = %rejected.claim_key, "change queue full, notification rejected");
                EngineError::QueueFull
            }
            TrySendError::Closed(_) => {
                EngineError::Internal("change dispatch worker is not running".to_string())
            }
        })
    }
}

async fn run_worker(
    service: Arc<SummaryService>,
    settings: DispatchSettings,
    permits: Arc<Semaphore>,
    mut rx: mpsc::Receiver<LedgerChange>,
) {
    while let Some(change) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let _permit = permit;
            process_change(&service, &change, settings).await;
        });
    }
    tracing::debug!("change dispatch worker stopped");
}

/// Refreshes one claim, retrying transient failures with exponential
/// backoff. An attempt that exceeds the timeout counts as transient.
async fn process_change(service: &SummaryService, change: &LedgerChange, settings: DispatchSettings) {
    let claim_key = &change.claim_key;
    let mut attempt = 0u32;
    loop {
        let detail = match tokio::time::timeout(settings.refresh_timeout, service.refresh(claim_key))
            .await
        {
            Ok(Ok(payment)) => {
                tracing::debug!(
                    %claim_key,
                    kind = %change.kind,
                    status = %payment.status,
                    attempt,
                    "change applied"
                );
                return;
            }
            Ok(Err(e)) if e.is_transient() => e.to_string(),
            Ok(Err(e)) => {
                tracing::error!(%claim_key, kind = %change.kind, error = %e, "refresh failed");
                return;
            }
            Err(_) => format!(
                "refresh attempt exceeded {}ms",
                settings.refresh_timeout.as_millis()
            ),
        };

        if attempt >= settings.retry_max {
            tracing::error!(
                %claim_key,
                kind = %change.kind,
                error = %detail,
                attempts = attempt + 1,
                "refresh gave up after transient failures"
            );
            return;
        }
        let delay = settings
            .retry_base_delay
            .saturating_mul(1u32 << attempt.min(16));
        let retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::warn!(%claim_key, error = %detail, retry_in_ms, "transient refresh failure, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
