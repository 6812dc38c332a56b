//! Core document trait that every stored record type implements.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// Trait that all documents kept in a [`DocumentStore`](crate::DocumentStore) must implement.
///
/// A document names the collection it lives in and knows how to extract its
/// own key. Generic CRUD, transactions and HTTP handlers are all written
/// against this trait, so adding a record type means one impl block.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use order_kit::Document;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct Warehouse {
///     pub id: u64,
///     pub city: String,
/// }
///
/// impl Document for Warehouse {
///     type Key = u64;
///
///     fn key(&self) -> Self::Key {
///         self.id
///     }
///
///     fn collection() -> &'static str {
///         "warehouses"
///     }
/// }
/// ```
pub trait Document: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone + 'static {
    /// Type of the document's key (integer ids, names, ...)
    type Key: Display
        + FromStr
        + Clone
        + Send
        + Sync
        + Eq
        + Hash
        + Serialize
        + DeserializeOwned
        + 'static;

    /// Return the document's key.
    fn key(&self) -> Self::Key;

    /// Return the collection this document type lives in.
    ///
    /// Final storage key format: `"{collection}:{key}"`
    fn collection() -> &'static str;

    /// Serialize the document for storage.
    ///
    /// Always uses the versioned postcard envelope from [`crate::serialization`].
    fn to_bytes(&self) -> Result<Vec<u8>> {
        crate::serialization::serialize_document(self)
    }

    /// Deserialize a document from stored bytes, validating the envelope.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDocument`: Bad magic or corrupted envelope
    /// - `Error::VersionMismatch`: Schema version changed
    /// - `Error::DeserializationError`: Corrupted payload
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        crate::serialization::deserialize_document(bytes)
    }

    /// Optional: Validate the document before it is written.
    ///
    /// Called by every insert and update, transactional or not.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
