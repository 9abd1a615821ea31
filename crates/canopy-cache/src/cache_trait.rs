//! The cache abstraction

use crate::error::CacheResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A key/value cache storing serde-encoded values
#[async_trait]
pub trait Cache: Send + Sync {
	/// Get a value, `None` when absent or expired
	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: for<'de> Deserialize<'de> + Send;

	/// Store a value. `ttl` of `None` falls back to the backend default.
	async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
	where
		T: Serialize + Send + Sync;

	async fn delete(&self, key: &str) -> CacheResult<()>;

	async fn has_key(&self, key: &str) -> CacheResult<bool>;

	/// Remove every key starting with `prefix`, returning how many were removed
	async fn delete_prefix(&self, prefix: &str) -> CacheResult<usize>;

	async fn clear(&self) -> CacheResult<()>;
}
