//! # order-kit
//!
//! A small e-commerce backend: users, products and orders stored as typed
//! documents, with one transactional workflow that places an order while
//! reserving stock and debiting the buyer's balance.
//!
//! ## Features
//!
//! - **Typed documents:** any `T: Document` gets storage, transactions and CRUD routes
//! - **Optimistic transactions:** versioned reads, atomic batch commits, bounded conflict retry
//! - **Exact money:** decimal amounts, never floats
//! - **Backend agnostic:** ships an in-memory backend; implement `StoreBackend` for others
//! - **HTTP ready:** axum router with JSON errors
//!
//! ## Quick Start
//!
//! ```ignore
//! use order_kit::{
//!     ShopService,
//!     backend::InMemoryBackend,
//!     models::{Money, OrderRequest, Product, User},
//! };
//!
//! let shop = ShopService::new(InMemoryBackend::new());
//!
//! shop.create(User::new(1, "Alice", Money::from(100))).await?;
//! shop.create(Product::new(1, "Widget", 10, Money::from(5))).await?;
//!
//! // Stock 10 -> 7, balance 100 -> 85, order total 15
//! let order = shop.create_order(OrderRequest::new(1).item(1, 3)).await?;
//!
//! // Serve it
//! let app = order_kit::http::router(shop.clone());
//! ```
//!
//! ### Custom Units of Work (Advanced)
//!
//! Use [`DocumentStore::run_in_transaction`] with your own [`UnitOfWork`]:
//!
//! ```ignore
//! use order_kit::{DocumentStore, Transaction, UnitOfWork, StoreBackend, Result};
//!
//! struct Restock { product_id: u64, units: u32 }
//!
//! impl<B: StoreBackend> UnitOfWork<B> for Restock {
//!     type Output = Product;
//!
//!     async fn execute(&mut self, tx: &mut Transaction<B>) -> Result<Product> {
//!         let mut product: Product = tx.require(&self.product_id).await?;
//!         product.quantity += self.units;
//!         tx.update(&product).await?;
//!         Ok(product)
//!     }
//! }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod key;
pub mod models;
pub mod observability;
pub mod serialization;
pub mod service;
pub mod store;
pub mod transaction;
pub mod workflow;

// Re-exports for convenience
pub use backend::StoreBackend;
pub use document::Document;
pub use error::{Error, Result};
pub use service::ShopService;
pub use store::{DocumentStore, TransactionConfig};
pub use transaction::{Transaction, UnitOfWork};
pub use workflow::CreateOrder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
