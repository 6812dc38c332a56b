//! Optimistic transactions over a [`StoreBackend`].
//!
//! A [`Transaction`] buffers every write and remembers the version of every
//! key it read. Nothing reaches the backend until the store commits the
//! transaction as one [`WriteBatch`], whose preconditions re-check all of
//! those versions. If the unit of work returns `Err`, or its future is
//! dropped, the buffered writes simply disappear.
//!
//! Reads inside a transaction see the transaction's own pending writes
//! (read-your-writes), so two lines of an order that name the same product
//! observe the stock already reserved by the earlier line.

use crate::backend::{Precondition, StoreBackend, VersionedValue, WriteBatch, WriteOp};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::key::DocumentKeyBuilder;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;

/// A unit of work executed inside a transaction.
///
/// Returning `Ok` asks the store to commit; returning `Err` aborts with no
/// effects. The store may call `execute` more than once when a commit hits a
/// conflict, each time with a fresh transaction, so implementations must not
/// carry state from a failed attempt into the next one.
///
/// # Example
///
/// ```ignore
/// struct Rename { id: u64, name: String }
///
/// impl<B: StoreBackend> UnitOfWork<B> for Rename {
///     type Output = User;
///
///     async fn execute(&mut self, tx: &mut Transaction<B>) -> Result<User> {
///         let mut user: User = tx.require(&self.id).await?;
///         user.name = self.name.clone();
///         tx.update(&user).await?;
///         Ok(user)
///     }
/// }
/// ```
pub trait UnitOfWork<B: StoreBackend>: Send {
    type Output: Send;

    /// Run the unit of work against `tx`.
    fn execute(
        &mut self,
        tx: &mut Transaction<B>,
    ) -> impl Future<Output = Result<Self::Output>> + Send;

    /// Name used in logs and metrics.
    fn name(&self) -> &'static str {
        "unit_of_work"
    }
}

/// Buffered transaction handle.
pub struct Transaction<B: StoreBackend> {
    backend: B,
    attempt: u32,
    // Keyed by storage key; `None` records an observed absence.
    reads: HashMap<String, Option<VersionedValue>>,
    writes: BTreeMap<String, WriteOp>,
}

impl<B: StoreBackend> Transaction<B> {
    pub(crate) fn new(backend: B, attempt: u32) -> Self {
        Transaction {
            backend,
            attempt,
            reads: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// 1-based attempt number of this transaction within its retry loop.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Read a document, seeing this transaction's own pending writes.
    ///
    /// # Errors
    /// Backend failures and stored-data validation errors.
    pub async fn get<T: Document>(&mut self, key: &T::Key) -> Result<Option<T>> {
        let storage_key = DocumentKeyBuilder::build::<T>(key);
        match self.read_raw(&storage_key).await? {
            Some(bytes) => T::from_bytes(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Read a document that must exist.
    ///
    /// # Errors
    /// `Error::NotFound` naming the collection and key when absent.
    pub async fn require<T: Document>(&mut self, key: &T::Key) -> Result<T> {
        self.get::<T>(key)
            .await?
            .ok_or_else(|| Error::not_found(T::collection(), key))
    }

    /// Check whether a document exists in this transaction's view.
    pub async fn exists<T: Document>(&mut self, key: &T::Key) -> Result<bool> {
        let storage_key = DocumentKeyBuilder::build::<T>(key);
        Ok(self.read_raw(&storage_key).await?.is_some())
    }

    /// Replace an existing document.
    ///
    /// # Errors
    /// `Error::NotFound` if the key does not exist in this transaction's view.
    pub async fn update<T: Document>(&mut self, document: &T) -> Result<()> {
        document.validate()?;
        let key = document.key();
        let storage_key = DocumentKeyBuilder::build::<T>(&key);

        if self.read_raw(&storage_key).await?.is_none() {
            return Err(Error::not_found(T::collection(), &key));
        }

        self.writes
            .insert(storage_key, WriteOp::Put(document.to_bytes()?));
        Ok(())
    }

    /// Insert a new document.
    ///
    /// # Errors
    /// `Error::AlreadyExists` if the key is taken.
    pub async fn insert<T: Document>(&mut self, document: &T) -> Result<()> {
        document.validate()?;
        let key = document.key();
        let storage_key = DocumentKeyBuilder::build::<T>(&key);

        if self.read_raw(&storage_key).await?.is_some() {
            return Err(Error::AlreadyExists {
                collection: T::collection(),
                key: key.to_string(),
            });
        }

        self.writes
            .insert(storage_key, WriteOp::Put(document.to_bytes()?));
        Ok(())
    }

    /// Delete a document. Returns whether it existed.
    pub async fn delete<T: Document>(&mut self, key: &T::Key) -> Result<bool> {
        let storage_key = DocumentKeyBuilder::build::<T>(key);
        let existed = self.read_raw(&storage_key).await?.is_some();

        if existed {
            self.writes.insert(storage_key, WriteOp::Delete);
        }
        Ok(existed)
    }

    /// True when nothing has been written.
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }

    /// Number of distinct keys read so far.
    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    /// Number of distinct keys with a pending write.
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Turn the transaction into a batch guarded by every observed version.
    pub(crate) fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();

        for (key, observed) in self.reads {
            let precondition = match observed {
                Some(value) => Precondition::Version(value.version),
                None => Precondition::Absent,
            };
            batch = batch.guard(key, precondition);
        }

        for (key, op) in self.writes {
            batch = match op {
                WriteOp::Put(data) => batch.put(key, data),
                WriteOp::Delete => batch.delete(key),
            };
        }

        batch
    }

    async fn read_raw(&mut self, storage_key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(pending) = self.writes.get(storage_key) {
            return Ok(match pending {
                WriteOp::Put(data) => Some(data.clone()),
                WriteOp::Delete => None,
            });
        }

        if let Some(observed) = self.reads.get(storage_key) {
            return Ok(observed.as_ref().map(|value| value.data.clone()));
        }

        let observed = self.backend.get(storage_key).await?;
        let data = observed.as_ref().map(|value| value.data.clone());
        self.reads.insert(storage_key.to_string(), observed);
        Ok(data)
    }
}
