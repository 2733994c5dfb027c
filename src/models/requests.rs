//! Request DTOs for the administrative API
//!
//! Defines the structure of incoming query parameters.

use serde::Deserialize;

/// Query parameters for `DELETE /_proxy/cache/entry`
///
/// `key` is the cache key to drop: the request path plus `?query` when the
/// cached request had one, e.g. `key=%2Fitems%3Fpage%3D2`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateParams {
    pub key: String,
}

impl InvalidateParams {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if !self.key.starts_with('/') {
            return Some("Key must start with '/'".to_string());
        }
        None
    }
}
