//! Postcard-based document serialization with versioned envelopes.
//!
//! Every document persisted by a [`StoreBackend`](crate::backend::StoreBackend)
//! is wrapped in an envelope so that stored bytes can be validated before they
//! are trusted:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (varint) │POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "OKDB"              u32                postcard::to_allocvec(T)
//! ```
//!
//! The header is decoded on its own first, so a foreign or truncated entry is
//! reported as [`Error::InvalidDocument`] even when its payload would not parse.
//!
//! # Example
//!
//! ```rust
//! use order_kit::serialization::{serialize_document, deserialize_document};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # fn main() -> order_kit::Result<()> {
//! let user = User { id: 1, name: "Alice".to_string() };
//! let bytes = serialize_document(&user)?;
//! let back: User = deserialize_document(&bytes)?;
//! assert_eq!(user, back);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header for stored documents: b"OKDB"
pub const DOCUMENT_MAGIC: [u8; 4] = *b"OKDB";

/// Current schema version.
///
/// Increment when a stored type changes shape (fields added, removed,
/// reordered or retyped). Documents written under another version are
/// rejected with [`Error::VersionMismatch`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope for stored documents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DocumentEnvelope<T> {
    /// Magic header: must be b"OKDB"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
    /// The stored document
    pub payload: T,
}

impl<T> DocumentEnvelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: DOCUMENT_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    magic: [u8; 4],
    version: u32,
}

/// Serialize a document with envelope for storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn serialize_document<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = DocumentEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        log::error!("Document serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a document from stored bytes with validation.
///
/// Checks, in order: header decodes, magic matches, version matches, payload decodes.
///
/// # Errors
///
/// - `Error::InvalidDocument`: Missing header or invalid magic
/// - `Error::VersionMismatch`: Schema version mismatch
/// - `Error::DeserializationError`: Corrupted Postcard payload
pub fn deserialize_document<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let (header, payload): (EnvelopeHeader, &[u8]) = postcard::take_from_bytes(bytes)
        .map_err(|e| Error::InvalidDocument(format!("Unreadable envelope header: {}", e)))?;

    if header.magic != DOCUMENT_MAGIC {
        log::warn!(
            "Invalid document: expected magic {:?}, got {:?}",
            DOCUMENT_MAGIC,
            header.magic
        );
        return Err(Error::InvalidDocument(format!(
            "Invalid magic: expected {:?}, got {:?}",
            DOCUMENT_MAGIC, header.magic
        )));
    }

    if header.version != CURRENT_SCHEMA_VERSION {
        log::warn!(
            "Document version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION,
            header.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: header.version,
        });
    }

    postcard::from_bytes(payload).map_err(|e| {
        log::error!("Document deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })
}
