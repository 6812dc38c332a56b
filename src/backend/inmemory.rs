//! In-memory storage backend (default, thread-safe, async).
//!
//! Uses DashMap for sharded concurrent storage. A commit gate serializes batch
//! commits against each other and against readers, so a batch becomes visible
//! all at once.

use super::{Precondition, StoreBackend, VersionedValue, WriteBatch, WriteOp};
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory stored entry.
struct StoredEntry {
    data: Vec<u8>,
    version: u64,
}

/// Thread-safe async in-memory document backend.
///
/// Versions come from a single store-wide commit counter, so a key that is
/// deleted and re-created never reuses a version a concurrent transaction may
/// have observed.
///
/// # Example
///
/// ```no_run
/// use order_kit::backend::{InMemoryBackend, StoreBackend, WriteBatch};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.commit(WriteBatch::new().put("users:1", b"doc".to_vec())).await?;
///
///     let value = backend.get("users:1").await?;
///     assert!(value.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, StoredEntry>>,
    // Holds the last assigned commit version.
    gate: Arc<RwLock<u64>>,
}

impl InMemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            gate: Arc::new(RwLock::new(0)),
        }
    }

    /// Get the current number of stored documents.
    pub async fn len(&self) -> usize {
        let _gate = self.gate.read().await;
        self.store.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        let _gate = self.gate.read().await;
        self.store.is_empty()
    }

    /// Get storage statistics.
    pub async fn stats(&self) -> StoreStats {
        let gate = self.gate.read().await;
        let total_bytes: usize = self.store.iter().map(|entry| entry.data.len()).sum();

        StoreStats {
            total_documents: self.store.len(),
            total_bytes,
            last_commit_version: *gate,
        }
    }

    /// Print storage statistics to debug log.
    pub async fn log_stats(&self) {
        let stats = self.stats().await;
        debug!(
            "Store Stats: {} documents, {} bytes, last commit v{}",
            stats.total_documents, stats.total_bytes, stats.last_commit_version
        );
    }

    fn check_precondition(&self, key: &str, precondition: Precondition) -> Result<()> {
        let current = self.store.get(key).map(|entry| entry.version);
        let holds = match (precondition, current) {
            (Precondition::Absent, None) => true,
            (Precondition::Version(expected), Some(found)) => expected == found,
            _ => false,
        };

        if holds {
            Ok(())
        } else {
            Err(Error::TransactionConflict(format!(
                "{} changed since read (expected {:?}, found {:?})",
                key, precondition, current
            )))
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<VersionedValue>> {
        let _gate = self.gate.read().await;

        let value = self.store.get(key).map(|entry| VersionedValue {
            data: entry.data.clone(),
            version: entry.version,
        });

        match &value {
            Some(v) => debug!("✓ InMemory GET {} -> v{}", key, v.version),
            None => debug!("✓ InMemory GET {} -> MISS", key),
        }

        Ok(value)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<u64> {
        let mut last_version = self.gate.write().await;

        for (key, precondition) in &batch.preconditions {
            if let Err(e) = self.check_precondition(key, *precondition) {
                warn!("✗ InMemory COMMIT rejected: {}", e);
                return Err(e);
            }
        }

        if batch.writes.is_empty() {
            debug!("✓ InMemory COMMIT (read-only)");
            return Ok(*last_version);
        }

        let version = *last_version + 1;
        let write_count = batch.writes.len();

        for (key, op) in batch.writes {
            match op {
                WriteOp::Put(data) => {
                    self.store.insert(key, StoredEntry { data, version });
                }
                WriteOp::Delete => {
                    self.store.remove(&key);
                }
            }
        }

        *last_version = version;
        debug!("✓ InMemory COMMIT v{} ({} writes)", version, write_count);

        Ok(version)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let _gate = self.gate.read().await;
        Ok(self.store.contains_key(key))
    }

    async fn health_check(&self) -> Result<bool> {
        // In-memory backend is always healthy
        Ok(true)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut last_version = self.gate.write().await;
        self.store.clear();
        // Keep counting so versions stay unique across the wipe.
        *last_version += 1;
        warn!("⚠ InMemory CLEAR_ALL executed - all documents removed!");
        Ok(())
    }
}

/// Storage statistics.
#[derive(Clone, Debug)]
pub struct StoreStats {
    pub total_documents: usize,
    pub total_bytes: usize,
    pub last_commit_version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_backend_put_get() {
        let backend = InMemoryBackend::new();

        let version = backend
            .commit(WriteBatch::new().put("key1", b"value1".to_vec()))
            .await
            .expect("Failed to commit");

        let result = backend.get("key1").await.expect("Failed to get");
        assert_eq!(
            result,
            Some(VersionedValue {
                data: b"value1".to_vec(),
                version,
            })
        );
    }

    #[tokio::test]
    async fn test_inmemory_backend_miss() {
        let backend = InMemoryBackend::new();

        let result = backend.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_inmemory_backend_delete() {
        let backend = InMemoryBackend::new();

        backend
            .commit(WriteBatch::new().put("key1", b"value1".to_vec()))
            .await
            .expect("Failed to commit");
        assert!(backend.exists("key1").await.expect("Failed to check exists"));

        backend
            .commit(WriteBatch::new().delete("key1"))
            .await
            .expect("Failed to delete");
        assert!(!backend.exists("key1").await.expect("Failed to check exists"));
    }

    #[tokio::test]
    async fn test_versions_increase_per_commit() {
        let backend = InMemoryBackend::new();

        let v1 = backend
            .commit(WriteBatch::new().put("a", vec![1]).put("b", vec![2]))
            .await
            .unwrap();
        let v2 = backend
            .commit(WriteBatch::new().put("a", vec![3]))
            .await
            .unwrap();

        assert!(v2 > v1);
        assert_eq!(backend.get("a").await.unwrap().unwrap().version, v2);
        assert_eq!(backend.get("b").await.unwrap().unwrap().version, v1);
    }

    #[tokio::test]
    async fn test_stale_version_rejects_whole_batch() {
        let backend = InMemoryBackend::new();
        let v1 = backend
            .commit(WriteBatch::new().put("stock", vec![10]))
            .await
            .unwrap();
        backend
            .commit(WriteBatch::new().put("stock", vec![9]))
            .await
            .unwrap();

        let stale = WriteBatch::new()
            .guard("stock", Precondition::Version(v1))
            .put("stock", vec![7])
            .put("other", vec![1]);

        let result = backend.commit(stale).await;
        assert!(matches!(result, Err(Error::TransactionConflict(_))));

        // Nothing from the rejected batch is visible
        assert_eq!(backend.get("stock").await.unwrap().unwrap().data, vec![9]);
        assert!(backend.get("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_absent_precondition() {
        let backend = InMemoryBackend::new();
        let insert = || {
            WriteBatch::new()
                .guard("orders:1", Precondition::Absent)
                .put("orders:1", vec![1])
        };

        backend.commit(insert()).await.expect("first insert");
        let second = backend.commit(insert()).await;
        assert!(matches!(second, Err(Error::TransactionConflict(_))));
    }

    #[tokio::test]
    async fn test_recreated_key_gets_fresh_version() {
        let backend = InMemoryBackend::new();
        let v1 = backend
            .commit(WriteBatch::new().put("k", vec![1]))
            .await
            .unwrap();
        backend.commit(WriteBatch::new().delete("k")).await.unwrap();
        backend
            .commit(WriteBatch::new().put("k", vec![1]))
            .await
            .unwrap();

        let stale = WriteBatch::new()
            .guard("k", Precondition::Version(v1))
            .put("k", vec![2]);
        assert!(backend.commit(stale).await.is_err());
    }

    #[tokio::test]
    async fn test_inmemory_backend_clear_all() {
        let backend = InMemoryBackend::new();

        backend
            .commit(
                WriteBatch::new()
                    .put("key1", b"value1".to_vec())
                    .put("key2", b"value2".to_vec()),
            )
            .await
            .unwrap();

        assert_eq!(backend.len().await, 2);

        backend.clear_all().await.expect("Failed to clear");

        assert_eq!(backend.len().await, 0);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_inmemory_backend_stats() {
        let backend = InMemoryBackend::new();

        backend
            .commit(
                WriteBatch::new()
                    .put("key1", b"value_with_data".to_vec())
                    .put("key2", b"data".to_vec()),
            )
            .await
            .unwrap();

        let stats = backend.stats().await;
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_bytes, 19);
        assert_eq!(stats.last_commit_version, 1);
    }

    #[tokio::test]
    async fn test_inmemory_backend_clone_shares_store() {
        let backend1 = InMemoryBackend::new();
        backend1
            .commit(WriteBatch::new().put("key", b"value".to_vec()))
            .await
            .unwrap();

        let backend2 = backend1.clone();

        let value = backend2.get("key").await.unwrap().map(|v| v.data);
        assert_eq!(value, Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_concurrent_commits() {
        let backend = InMemoryBackend::new();
        let mut handles = vec![];

        for i in 0..10 {
            let b = backend.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key_{}", i);
                b.commit(WriteBatch::new().put(key, vec![i as u8]))
                    .await
                    .expect("Failed to commit")
            }));
        }

        let mut versions = vec![];
        for handle in handles {
            versions.push(handle.await.expect("Task failed"));
        }
        versions.sort_unstable();
        versions.dedup();

        assert_eq!(versions.len(), 10);
        assert_eq!(backend.len().await, 10);
    }
}
