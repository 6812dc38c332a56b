//! High-level shop service for web applications.
//!
//! Provides a convenient wrapper around DocumentStore with Arc for easy sharing.

use crate::backend::StoreBackend;
use crate::document::Document;
use crate::error::Result;
use crate::models::{Order, OrderRequest};
use crate::observability::StoreMetrics;
use crate::store::{DocumentStore, TransactionConfig};
use crate::workflow::CreateOrder;
use std::sync::Arc;

/// High-level shop service for web applications.
///
/// Wraps `DocumentStore` in `Arc` for easy sharing across handlers without
/// requiring external `Arc<Mutex<>>` wrappers.
///
/// # Example
///
/// ```ignore
/// use order_kit::{ShopService, backend::InMemoryBackend, models::OrderRequest};
///
/// let shop = ShopService::new(InMemoryBackend::new());
///
/// let order = shop
///     .create_order(OrderRequest::new(1).item(1, 3))
///     .await?;
/// ```
#[derive(Clone)]
pub struct ShopService<B: StoreBackend> {
    store: Arc<DocumentStore<B>>,
}

impl<B: StoreBackend> ShopService<B> {
    /// Create a new shop service with the given backend.
    pub fn new(backend: B) -> Self {
        ShopService {
            store: Arc::new(DocumentStore::new(backend)),
        }
    }

    /// Create a new shop service with custom transaction settings.
    pub fn with_config(backend: B, config: TransactionConfig) -> Self {
        ShopService {
            store: Arc::new(DocumentStore::new(backend).with_config(config)),
        }
    }

    /// Create a new shop service with custom metrics.
    pub fn with_metrics(backend: B, metrics: Box<dyn StoreMetrics>) -> Self {
        ShopService {
            store: Arc::new(DocumentStore::new(backend).with_metrics(metrics)),
        }
    }

    /// Wrap an already configured store.
    pub fn from_store(store: DocumentStore<B>) -> Self {
        ShopService {
            store: Arc::new(store),
        }
    }

    /// Read a document of any collection.
    pub async fn get<T: Document>(&self, key: &T::Key) -> Result<Option<T>> {
        self.store.get::<T>(key).await
    }

    /// Create a document; fails if the key is taken.
    pub async fn create<T: Document>(&self, document: T) -> Result<T> {
        self.store.insert(document).await
    }

    /// Replace an existing document.
    pub async fn update<T: Document>(&self, document: T) -> Result<T> {
        self.store.update(document).await
    }

    /// Delete a document. Returns whether it existed.
    pub async fn delete<T: Document>(&self, key: T::Key) -> Result<bool> {
        self.store.delete::<T>(key).await
    }

    /// Validate and atomically place an order.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput`: empty order or zero quantity (no store access)
    /// - `Error::NotFound`: unknown user or product
    /// - `Error::InsufficientStock` / `Error::InsufficientBalance`
    /// - `Error::AlreadyExists`: the requested order id is taken
    /// - `Error::TransactionConflict`: contention outlasted every retry
    /// - `Error::StoreUnavailable` / `Error::Timeout`
    pub async fn create_order(&self, request: OrderRequest) -> Result<Order> {
        let work = CreateOrder::new(request)?;
        let order = self.store.run_in_transaction(work).await?;
        info!(
            "✓ Order {} placed by user {} (total {})",
            order.id, order.user_id, order.total
        );
        Ok(order)
    }

    /// Check backend health.
    pub async fn health_check(&self) -> Result<bool> {
        self.store.health_check().await
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &DocumentStore<B> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::error::Error;
    use crate::models::{Money, Product, User};

    #[test]
    fn test_shop_service_clone() {
        let service1 = ShopService::new(InMemoryBackend::new());
        let service2 = service1.clone();

        // Both services share the same store
        assert!(Arc::ptr_eq(&service1.store, &service2.store));
    }

    #[tokio::test]
    async fn test_create_order_rejects_empty_without_reads() {
        let service = ShopService::new(InMemoryBackend::new());

        let result = service.create_order(OrderRequest::new(1)).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_and_read_order() {
        let service = ShopService::new(InMemoryBackend::new());
        service
            .create(User::new(1, "Alice", Money::from(100)))
            .await
            .unwrap();
        service
            .create(Product::new(1, "Widget", 10, Money::from(5)))
            .await
            .unwrap();

        let order = service
            .create_order(OrderRequest::new(1).item(1, 3))
            .await
            .expect("order placed");

        assert_eq!(service.get::<Order>(&order.id).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn test_shop_service_thread_safety() {
        let service = ShopService::new(InMemoryBackend::new());
        let mut handles = vec![];

        for i in 0..5u64 {
            let service_clone = service.clone();
            handles.push(tokio::spawn(async move {
                service_clone
                    .create(User::new(i, format!("user_{}", i), Money::from(10)))
                    .await
                    .expect("Failed to create");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(service.store().backend().len().await, 5);
    }
}
