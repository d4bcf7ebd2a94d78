//! Per-task key material cache
//!
//! Submission records the per-task keypair and content key here under the
//! server-assigned task identifier; retrieval reads them back, possibly more
//! than once if a result is polled repeatedly. The cache is owned by the
//! [`Client`](crate::Client) instance rather than living process-wide, and
//! both maps sit behind a single mutex so they are always updated together.
//!
//! Nothing is evicted automatically; callers that track task lifecycles can
//! drop entries with [`KeyCache::forget`].

use std::collections::HashMap;

use parking_lot::Mutex;
use uuid::Uuid;

use common::crypto::{SecretKey, TaskKey};

/// Key material the client holds for tasks it submitted
#[derive(Default)]
pub struct KeyCache {
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    task_keypairs: HashMap<Uuid, SecretKey>,
    task_keys: HashMap<Uuid, TaskKey>,
}

impl KeyCache {
    /// Record the key material for a freshly submitted task
    pub(crate) fn record(&self, task: Uuid, keypair: SecretKey, key: TaskKey) {
        // TODO: persist to real/shared storage so another process can pick
        // up retrieval for this task
        let mut inner = self.inner.lock();
        inner.task_keypairs.insert(task, keypair);
        inner.task_keys.insert(task, key);
    }

    /// Write back a task key recovered from the server-held share
    pub(crate) fn store_task_key(&self, task: Uuid, key: TaskKey) {
        self.inner.lock().task_keys.insert(task, key);
    }

    /// The content key for a task, if cached
    pub fn task_key(&self, task: &Uuid) -> Option<TaskKey> {
        self.inner.lock().task_keys.get(task).cloned()
    }

    /// The per-task keypair for a task, if cached
    pub fn task_keypair(&self, task: &Uuid) -> Option<SecretKey> {
        self.inner.lock().task_keypairs.get(task).cloned()
    }

    /// Drop only the content key, keeping the keypair
    ///
    /// Retrieval will fall back to recovering the key from the server-held
    /// wrapped copy.
    pub fn forget_task_key(&self, task: &Uuid) -> Option<TaskKey> {
        self.inner.lock().task_keys.remove(task)
    }

    /// Drop all key material for a task
    ///
    /// After this the task's result can no longer be decrypted by this
    /// client.
    pub fn forget(&self, task: &Uuid) {
        let mut inner = self.inner.lock();
        inner.task_keypairs.remove(task);
        inner.task_keys.remove(task);
    }

    /// Number of tasks with a cached keypair
    pub fn len(&self) -> usize {
        self.inner.lock().task_keypairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let cache = KeyCache::default();
        let task = Uuid::new_v4();
        let keypair = SecretKey::generate();
        let key = TaskKey::generate();

        cache.record(task, keypair.clone(), key.clone());

        assert_eq!(cache.task_key(&task), Some(key));
        assert_eq!(
            cache.task_keypair(&task).map(|k| k.to_bytes()),
            Some(keypair.to_bytes())
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_forget_task_key_keeps_keypair() {
        let cache = KeyCache::default();
        let task = Uuid::new_v4();
        cache.record(task, SecretKey::generate(), TaskKey::generate());

        assert!(cache.forget_task_key(&task).is_some());
        assert!(cache.task_key(&task).is_none());
        assert!(cache.task_keypair(&task).is_some());
    }

    #[test]
    fn test_forget_drops_everything() {
        let cache = KeyCache::default();
        let task = Uuid::new_v4();
        cache.record(task, SecretKey::generate(), TaskKey::generate());

        cache.forget(&task);
        assert!(cache.task_key(&task).is_none());
        assert!(cache.task_keypair(&task).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entries_are_independent() {
        let cache = KeyCache::default();
        let mut keys = Vec::new();

        for _ in 0..1000 {
            let task = Uuid::new_v4();
            let key = TaskKey::generate();
            cache.record(task, SecretKey::generate(), key.clone());
            keys.push((task, key));
        }

        assert_eq!(cache.len(), 1000);
        for (task, key) in keys {
            assert_eq!(cache.task_key(&task), Some(key));
        }
    }
}
