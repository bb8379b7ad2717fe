//! Per-document mutual exclusion for read-modify-write cycles
//!
//! Config entries are replaced whole, so two concurrent writers of the same
//! entry would drop each other's edits. Every cycle runs while holding the
//! lock registered for its document key. Locks for different keys are
//! independent and a task never holds two of them at once.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

use crate::store::DocumentKey;

/// Registry of lazily created per-key locks.
///
/// Cloning yields another handle to the same registry. Locks are never
/// removed; the key space is bounded by the configuration being applied.
pub struct LockRegistry<K = DocumentKey> {
    locks: Arc<Mutex<HashMap<K, Arc<AsyncMutex<()>>>>>,
}

impl<K> Clone for LockRegistry<K> {
    fn clone(&self) -> Self {
        Self {
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<K: Hash + Eq> Default for LockRegistry<K> {
    fn default() -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K> LockRegistry<K>
where
    K: Hash + Eq + Clone + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry lock is held only while looking up or inserting the handle
    fn handle(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Wait for exclusive access to `key`; released when the guard drops
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let guard = self.handle(key).lock_owned().await;
        trace!(?key, "Acquired document lock");
        guard
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// The lock is released on every exit path, including errors returned by
    /// `f` and cancellation of the returned future.
    pub async fn with_exclusive_access<F, Fut, T>(&self, key: &K, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.lock(key).await;
        f().await
    }

    /// Number of keys that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_never_interleaves() {
        let registry: LockRegistry<String> = LockRegistry::new();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let active = Arc::clone(&active);
                let max_active = Arc::clone(&max_active);
                tokio::spawn(async move {
                    registry
                        .with_exclusive_access(&"exported-services/default".to_string(), || async {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            max_active.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(2)).await;
                            active.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let registry: LockRegistry<String> = LockRegistry::new();
        let _held = registry.lock(&"service-intentions/a".to_string()).await;

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            registry.with_exclusive_access(&"service-intentions/b".to_string(), || async { 42 }),
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_same_key_blocks_while_held() {
        let registry: LockRegistry<String> = LockRegistry::new();
        let key = "service-intentions/a".to_string();
        let held = registry.lock(&key).await;

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            registry.with_exclusive_access(&key, || async {}),
        )
        .await;
        assert!(blocked.is_err());

        drop(held);
        registry.with_exclusive_access(&key, || async {}).await;
    }

    #[tokio::test]
    async fn test_lock_released_after_error() {
        let registry: LockRegistry<String> = LockRegistry::new();
        let key = "exported-services/default".to_string();

        let result: Result<(), &str> = registry
            .with_exclusive_access(&key, || async { Err("write failed") })
            .await;
        assert!(result.is_err());

        let reacquired =
            tokio::time::timeout(Duration::from_secs(1), registry.lock(&key)).await;
        assert!(reacquired.is_ok());
    }

    #[test]
    fn test_clones_share_locks() {
        let registry: LockRegistry<String> = LockRegistry::new();
        let other = registry.clone();
        registry.handle(&"k".to_string());

        assert_eq!(other.len(), 1);
        assert!(LockRegistry::<String>::new().is_empty());
    }
}
