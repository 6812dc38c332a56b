//! Document store - main entry point for typed reads, writes and transactions.

use crate::backend::StoreBackend;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::key::DocumentKeyBuilder;
use crate::observability::{NoOpMetrics, StoreMetrics};
use crate::transaction::{Transaction, UnitOfWork};
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Retry and timeout settings for transactions.
///
/// Only commit conflicts are retried. Business-rule failures, missing
/// documents and backend outages return on the first attempt.
///
/// # Example
///
/// ```
/// use order_kit::TransactionConfig;
/// use std::time::Duration;
///
/// let config = TransactionConfig::default()
///     .with_retry(10)
///     .with_backoff(Duration::from_millis(2))
///     .with_timeout(Duration::from_secs(1));
///
/// assert_eq!(config.max_retries, 10);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionConfig {
    /// Re-runs allowed after a commit conflict (0 = fail on first conflict).
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry.
    pub base_backoff: Duration,

    /// Ceiling for any single backoff delay.
    pub max_backoff: Duration,

    /// Upper bound for a single attempt, including its commit.
    ///
    /// An attempt that runs past it is dropped with its buffered writes and
    /// reported as `Error::Timeout`. `None` disables the bound.
    pub timeout: Option<Duration>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        TransactionConfig {
            max_retries: 5,
            base_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_secs(1),
            timeout: None,
        }
    }
}

impl TransactionConfig {
    /// Set the number of conflict retries.
    pub fn with_retry(mut self, count: u32) -> Self {
        self.max_retries = count;
        self
    }

    /// Set the base backoff delay.
    pub fn with_backoff(mut self, delay: Duration) -> Self {
        self.base_backoff = delay;
        self
    }

    /// Cap the delay between retries.
    pub fn with_max_backoff(mut self, ceiling: Duration) -> Self {
        self.max_backoff = ceiling;
        self
    }

    /// Bound each attempt by `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

/// Typed document store over a [`StoreBackend`].
///
/// Point operations (`get`, `insert`, `update`, `delete`) each run as their
/// own small transaction. Multi-document changes go through
/// [`run_in_transaction`](Self::run_in_transaction).
///
/// # Example
///
/// ```ignore
/// use order_kit::{DocumentStore, backend::InMemoryBackend};
///
/// let store = DocumentStore::new(InMemoryBackend::new());
/// store.insert(User::new(1, "Alice", Money::from(100))).await?;
/// let alice: Option<User> = store.get(&1).await?;
/// ```
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
    metrics: Box<dyn StoreMetrics>,
    config: TransactionConfig,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Create new store with given backend.
    pub fn new(backend: B) -> Self {
        DocumentStore {
            backend,
            metrics: Box::new(NoOpMetrics),
            config: TransactionConfig::default(),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn StoreMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the default transaction configuration.
    pub fn with_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    /// Default transaction configuration.
    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read a single document.
    ///
    /// # Errors
    /// - `Error::StoreUnavailable`: backend failure
    /// - `Error::InvalidDocument` / `Error::VersionMismatch` /
    ///   `Error::DeserializationError`: the stored bytes are unusable
    pub async fn get<T: Document>(&self, key: &T::Key) -> Result<Option<T>> {
        let timer = Instant::now();
        let storage_key = DocumentKeyBuilder::build::<T>(key);

        let result = match self.backend.get(&storage_key).await {
            Ok(Some(value)) => T::from_bytes(&value.data).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        match &result {
            Ok(found) => {
                self.metrics
                    .record_read(&storage_key, found.is_some(), timer.elapsed());
            }
            Err(e) => self.metrics.record_error(&storage_key, &e.to_string()),
        }

        result
    }

    /// Insert a new document.
    ///
    /// # Errors
    /// `Error::AlreadyExists` if the key is taken.
    pub async fn insert<T: Document>(&self, document: T) -> Result<T> {
        self.run_in_transaction(InsertDocument { document }).await
    }

    /// Replace an existing document.
    ///
    /// # Errors
    /// `Error::NotFound` if the key does not exist.
    pub async fn update<T: Document>(&self, document: T) -> Result<T> {
        self.run_in_transaction(UpdateDocument { document }).await
    }

    /// Delete a document. Returns whether it existed; a missing key is not an error.
    pub async fn delete<T: Document>(&self, key: T::Key) -> Result<bool> {
        self.run_in_transaction(DeleteDocument::<T> {
            key,
            _marker: PhantomData,
        })
        .await
    }

    /// Check backend health.
    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }

    /// Run a unit of work with the store's default configuration.
    ///
    /// The unit of work's writes are committed atomically if it returns `Ok`
    /// and discarded if it returns `Err`. Commit conflicts re-run it from
    /// scratch against a fresh transaction.
    ///
    /// # Errors
    ///
    /// - Any error returned by the unit of work, unchanged
    /// - `Error::TransactionConflict`: still conflicting after all retries
    /// - `Error::Timeout`: an attempt exceeded `TransactionConfig::timeout`
    /// - `Error::StoreUnavailable`: backend failure during a read or the commit
    pub async fn run_in_transaction<W>(&self, work: W) -> Result<W::Output>
    where
        W: UnitOfWork<B>,
    {
        let config = self.config.clone();
        self.run_in_transaction_with_config(work, config).await
    }

    /// Run a unit of work with per-call retry and timeout settings.
    pub async fn run_in_transaction_with_config<W>(
        &self,
        mut work: W,
        config: TransactionConfig,
    ) -> Result<W::Output>
    where
        W: UnitOfWork<B>,
    {
        let timer = Instant::now();
        let name = work.name();
        let max_attempts = config.max_retries + 1; // +1 for initial attempt
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.attempt(&mut work, attempt, &config).await {
                Ok(output) => {
                    self.metrics.record_commit(name, attempt, timer.elapsed());
                    debug!(
                        "✓ Transaction {} committed in {:?} (attempt {}/{})",
                        name,
                        timer.elapsed(),
                        attempt,
                        max_attempts
                    );
                    return Ok(output);
                }
                Err(e) if e.is_conflict() && attempt < max_attempts => {
                    self.metrics.record_conflict(name, attempt);
                    let delay = config.backoff_for(attempt);
                    debug!(
                        "Transaction {} conflicted (attempt {}/{}), retrying in {:?}",
                        name, attempt, max_attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_conflict() {
                        warn!(
                            "✗ Transaction {} gave up after {} attempts: {}",
                            name, attempt, e
                        );
                    } else {
                        debug!("✗ Transaction {} aborted: {}", name, e);
                    }
                    self.metrics.record_abort(name, &e.to_string());
                    return Err(e);
                }
            }
        }
    }

    /// Execute and commit a single attempt (without retry).
    async fn attempt<W>(
        &self,
        work: &mut W,
        attempt: u32,
        config: &TransactionConfig,
    ) -> Result<W::Output>
    where
        W: UnitOfWork<B>,
    {
        let name = work.name();
        let backend = &self.backend;

        let run = async move {
            let mut tx = Transaction::new(backend.clone(), attempt);
            let output = work.execute(&mut tx).await?;

            let writes = tx.write_count();
            let version = backend.commit(tx.into_batch()).await?;
            debug!(
                "» Transaction {} applied {} write(s) at v{}",
                name, writes, version
            );
            Ok::<_, Error>(output)
        };

        match config.timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
                Error::Timeout(format!("transaction {} exceeded {:?}", name, limit))
            })?,
            None => run.await,
        }
    }
}

// ============================================================================
// Point operations as units of work
// ============================================================================

struct InsertDocument<T> {
    document: T,
}

impl<B: StoreBackend, T: Document> UnitOfWork<B> for InsertDocument<T> {
    type Output = T;

    async fn execute(&mut self, tx: &mut Transaction<B>) -> Result<T> {
        tx.insert(&self.document).await?;
        Ok(self.document.clone())
    }

    fn name(&self) -> &'static str {
        "insert"
    }
}

struct UpdateDocument<T> {
    document: T,
}

impl<B: StoreBackend, T: Document> UnitOfWork<B> for UpdateDocument<T> {
    type Output = T;

    async fn execute(&mut self, tx: &mut Transaction<B>) -> Result<T> {
        tx.update(&self.document).await?;
        Ok(self.document.clone())
    }

    fn name(&self) -> &'static str {
        "update"
    }
}

struct DeleteDocument<T: Document> {
    key: T::Key,
    _marker: PhantomData<fn() -> T>,
}

impl<B: StoreBackend, T: Document> UnitOfWork<B> for DeleteDocument<T> {
    type Output = bool;

    async fn execute(&mut self, tx: &mut Transaction<B>) -> Result<bool> {
        tx.delete::<T>(&self.key).await
    }

    fn name(&self) -> &'static str {
        "delete"
    }
}
