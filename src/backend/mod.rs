//! Storage backend implementations.

use crate::error::Result;
use std::future::Future;

pub mod inmemory;

pub use inmemory::InMemoryBackend;

/// A stored value together with the commit version that last wrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedValue {
    pub data: Vec<u8>,
    pub version: u64,
}

/// State a key must still be in for a batch to commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// The key must not exist.
    Absent,
    /// The key must exist and still carry this version.
    Version(u64),
}

/// A single buffered write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    Put(Vec<u8>),
    Delete,
}

/// An atomic unit of writes guarded by preconditions.
///
/// Backends apply every write or none: if any precondition no longer holds at
/// commit time the whole batch is rejected with `Error::TransactionConflict`.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    pub(crate) preconditions: Vec<(String, Precondition)>,
    pub(crate) writes: Vec<(String, WriteOp)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to be in the given state at commit.
    pub fn guard(mut self, key: impl Into<String>, precondition: Precondition) -> Self {
        self.preconditions.push((key.into(), precondition));
        self
    }

    /// Store `data` under `key`.
    pub fn put(mut self, key: impl Into<String>, data: Vec<u8>) -> Self {
        self.writes.push((key.into(), WriteOp::Put(data)));
        self
    }

    /// Remove `key`.
    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.writes.push((key.into(), WriteOp::Delete));
        self
    }

    pub fn preconditions(&self) -> &[(String, Precondition)] {
        &self.preconditions
    }

    pub fn writes(&self) -> &[(String, WriteOp)] {
        &self.writes
    }

    /// True when the batch carries no writes.
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Trait for document storage backends.
///
/// Abstracts versioned key/value storage with an atomic, precondition-checked
/// batch commit, which is all the transaction layer needs to provide
/// serializable optimistic transactions.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability or external storage.
///
/// **ASYNC:** All methods return `Send` futures so that handlers generic over
/// the backend can run on a multi-threaded runtime.
pub trait StoreBackend: Send + Sync + Clone + 'static {
    /// Retrieve a value and its version by key.
    ///
    /// # Returns
    /// - `Ok(Some(value))` - Key present
    /// - `Ok(None)` - Key absent
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<VersionedValue>>> + Send;

    /// Atomically validate preconditions and apply writes.
    ///
    /// Readers must never observe a partially applied batch.
    ///
    /// # Returns
    /// The commit version assigned to every key written by this batch.
    ///
    /// # Errors
    /// - `Error::TransactionConflict` if any precondition fails (nothing is written)
    /// - `Error::StoreUnavailable` on transport failure
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<u64>> + Send;

    /// Check if key exists.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { self.get(key).await.map(|value| value.is_some()) }
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }

    /// Optional: Remove every stored document (use with caution).
    ///
    /// # Errors
    /// Returns `Err` if operation is not implemented or fails
    fn clear_all(&self) -> impl Future<Output = Result<()>> + Send {
        async {
            Err(crate::error::Error::NotImplemented(
                "clear_all not implemented for this backend".to_string(),
            ))
        }
    }
}
