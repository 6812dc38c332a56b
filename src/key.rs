//! Storage key management utilities.

use crate::document::Document;

/// Builder for storage keys.
pub struct DocumentKeyBuilder;

impl DocumentKeyBuilder {
    /// Build full storage key from document type and key.
    pub fn build<T: Document>(key: &T::Key) -> String {
        format!("{}:{}", T::collection(), key)
    }
}
