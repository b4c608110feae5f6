//! Cache store port.
//!
//! Thin string-keyed cache contract used for the cache-aside read path.
//! Values are serialized JSON; callers own serialization and the
//! invalidate-on-write discipline.

use crate::domain::foundation::DomainError;
use async_trait::async_trait;
use std::time::Duration;

/// Port for a string-keyed cache with TTLs.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a cached value.
    ///
    /// Returns `None` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Set a value with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), DomainError>;
}
