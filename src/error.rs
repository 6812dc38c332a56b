//! Error types for the document store and order workflow.

use crate::models::Money;
use std::fmt;

/// Result type for store and workflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for order-kit.
///
/// Variants fall into four classes:
/// - **Missing data:** `NotFound`, `AlreadyExists`
/// - **Business rules:** `InsufficientStock`, `InsufficientBalance`, `InvalidInput`
/// - **Concurrency and infrastructure:** `TransactionConflict`, `StoreUnavailable`, `Timeout`
/// - **Stored data and setup:** serialization, envelope, config and capability errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A referenced document does not exist.
    ///
    /// Permanent for the request. Raised by `Transaction::require` and by
    /// conditional updates against a missing key.
    NotFound {
        /// Collection name, e.g. `"users"`
        collection: &'static str,
        /// Rendered document key
        key: String,
    },

    /// An insert targeted a key that is already taken.
    AlreadyExists {
        /// Collection name
        collection: &'static str,
        /// Rendered document key
        key: String,
    },

    /// A product has fewer units on hand than an order line requested.
    InsufficientStock {
        product_id: u64,
        available: u32,
        requested: u32,
    },

    /// The order total exceeds the user's balance.
    InsufficientBalance {
        user_id: u64,
        balance: Money,
        total: Money,
    },

    /// Malformed request rejected before any store access.
    ///
    /// Examples: zero quantity, empty order, arithmetic overflow on totals.
    InvalidInput(String),

    /// A document read by the transaction changed before commit.
    ///
    /// The store re-runs the unit of work on this error up to the configured
    /// retry limit; it only reaches callers once retries are exhausted.
    TransactionConflict(String),

    /// The storage backend is unreachable or failed at the transport level.
    ///
    /// **Recovery:** safe to retry the whole request, the transaction left no effects.
    StoreUnavailable(String),

    /// A transaction attempt exceeded its configured timeout.
    Timeout(String),

    /// Serialization failed when converting a document to stored bytes.
    SerializationError(String),

    /// Deserialization failed when converting stored bytes to a document.
    DeserializationError(String),

    /// Stored bytes do not carry a valid envelope (bad magic or truncated header).
    InvalidDocument(String),

    /// Stored document was written with a different schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from stored entry)
        found: u32,
    },

    /// Configuration error during startup.
    ConfigError(String),

    /// Operation not supported by the selected backend.
    NotImplemented(String),
}

impl Error {
    /// True for optimistic-concurrency failures the store may retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::TransactionConflict(_))
    }

    /// True for failures where resubmitting the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::TransactionConflict(_) | Error::StoreUnavailable(_) | Error::Timeout(_)
        )
    }

    pub(crate) fn not_found(collection: &'static str, key: impl fmt::Display) -> Self {
        Error::NotFound {
            collection,
            key: key.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { collection, key } => {
                write!(f, "Not found: {} {}", collection, key)
            }
            Error::AlreadyExists { collection, key } => {
                write!(f, "Already exists: {} {}", collection, key)
            }
            Error::InsufficientStock {
                product_id,
                available,
                requested,
            } => write!(
                f,
                "Insufficient stock on product {}: available {}, requested {}",
                product_id, available, requested
            ),
            Error::InsufficientBalance {
                user_id,
                balance,
                total,
            } => write!(
                f,
                "Insufficient balance for user {}: balance {}, order total {}",
                user_id, balance, total
            ),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::TransactionConflict(msg) => write!(f, "Transaction conflict: {}", msg),
            Error::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidDocument(msg) => write!(f, "Invalid document: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Document version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
