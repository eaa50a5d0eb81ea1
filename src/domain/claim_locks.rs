//! Per-claim serialization locks.
//!
//! [`ClaimLocks`] hands out one async mutex per claim key so that
//! recomputations of the same claim run strictly one at a time while
//! different claims proceed in parallel. Readers never touch these locks;
//! they see the last committed summary.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::ClaimKey;

/// Lazily populated map from claim key to its serialization mutex.
///
/// # Concurrency
///
/// - Refreshes of different claims run concurrently.
/// - Refreshes of the same claim are serialized on its mutex.
/// - Lock handles are `Arc`s, so holding one never blocks lookups of
///   other claims.
#[derive(Debug, Default)]
pub struct ClaimLocks {
    locks: RwLock<HashMap<ClaimKey, Arc<Mutex<()>>>>,
}

impl ClaimLocks {
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the mutex for a claim, creating it on first use.
    pub async fn lock_for(&self, claim_key: &ClaimKey) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(claim_key).cloned() {
            return lock;
        }
        let mut map = self.locks.write().await;
        Arc::clone(map.entry(claim_key.clone()).or_default())
    }

    /// Returns the number of claims that have ever been locked.
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Returns `true` if no claim has been locked yet.
    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_key_yields_same_mutex() {
        let locks = ClaimLocks::new();
        let a = locks.lock_for(&ClaimKey::new("CLM-1")).await;
        let b = locks.lock_for(&ClaimKey::new("CLM-1")).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(locks.len().await, 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = ClaimLocks::new();
        let a = locks.lock_for(&ClaimKey::new("CLM-1")).await;
        let b = locks.lock_for(&ClaimKey::new("CLM-2")).await;

        let _held = a.lock().await;
        // The other claim's mutex is still free.
        assert!(b.try_lock().is_ok());
    }

    #[tokio::test]
    async fn same_key_serializes() {
        let locks = ClaimLocks::new();
        let key = ClaimKey::new("CLM-1");
        let a = locks.lock_for(&key).await;
        let b = locks.lock_for(&key).await;

        let _held = a.lock().await;
        assert!(b.try_lock().is_err());
    }

    #[tokio::test]
    async fn starts_empty() {
        let locks = ClaimLocks::new();
        assert!(locks.is_empty().await);
        let _ = locks.lock_for(&ClaimKey::new("CLM-1")).await;
        assert!(!locks.is_empty().await);
    }
}
