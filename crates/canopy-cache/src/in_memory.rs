//! In-memory cache implementation

use crate::cache_trait::Cache;
use crate::entry::CacheEntry;
use crate::error::CacheResult;
use crate::statistics::CacheStatistics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory cache backend
///
/// Keys are kept ordered so that prefix invalidation walks only the
/// matching range.
#[derive(Clone)]
pub struct InMemoryCache {
	store: Arc<RwLock<BTreeMap<String, CacheEntry>>>,
	default_ttl: Option<Duration>,
	hits: Arc<AtomicU64>,
	misses: Arc<AtomicU64>,
	invalidations: Arc<AtomicU64>,
	expirations: Arc<AtomicU64>,
}

impl InMemoryCache {
	/// Create a new in-memory cache with no default TTL
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(BTreeMap::new())),
			default_ttl: None,
			hits: Arc::new(AtomicU64::new(0)),
			misses: Arc::new(AtomicU64::new(0)),
			invalidations: Arc::new(AtomicU64::new(0)),
			expirations: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Set a default TTL for all cache entries
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cache::InMemoryCache;
	/// use std::time::Duration;
	///
	/// let cache = InMemoryCache::new().with_default_ttl(Duration::from_secs(300));
	/// ```
	pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
		self.default_ttl = Some(ttl);
		self
	}

	/// Drop expired entries, returning how many were dropped
	pub async fn purge_expired(&self) -> usize {
		let mut store = self.store.write().await;
		let before = store.len();
		store.retain(|_, entry| !entry.is_expired());
		let purged = before - store.len();
		self.expirations
			.fetch_add(purged as u64, Ordering::Relaxed);
		purged
	}

	/// Get cache statistics
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cache::{Cache, InMemoryCache};
	///
	/// # async fn example() {
	/// let cache = InMemoryCache::new();
	/// cache.set("key1", &"value1", None).await.unwrap();
	///
	/// let _: Option<String> = cache.get("key1").await.unwrap(); // Hit
	/// let _: Option<String> = cache.get("key2").await.unwrap(); // Miss
	///
	/// let stats = cache.get_statistics().await;
	/// assert_eq!(stats.hits, 1);
	/// assert_eq!(stats.misses, 1);
	/// assert_eq!(stats.entries, 1);
	/// # }
	/// ```
	pub async fn get_statistics(&self) -> CacheStatistics {
		let store = self.store.read().await;
		let hits = self.hits.load(Ordering::Relaxed);
		let misses = self.misses.load(Ordering::Relaxed);

		CacheStatistics {
			hits,
			misses,
			entries: store.len() as u64,
			bytes: store.values().map(|entry| entry.value.len() as u64).sum(),
			invalidated: self.invalidations.load(Ordering::Relaxed),
			expired: self.expirations.load(Ordering::Relaxed),
		}
	}
}

impl Default for InMemoryCache {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Cache for InMemoryCache {
	async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
	where
		T: for<'de> Deserialize<'de> + Send,
	{
		let store = self.store.read().await;

		match store.get(key) {
			Some(entry) if !entry.is_expired() => {
				self.hits.fetch_add(1, Ordering::Relaxed);
				Ok(Some(serde_json::from_slice(&entry.value)?))
			}
			_ => {
				self.misses.fetch_add(1, Ordering::Relaxed);
				Ok(None)
			}
		}
	}

	async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
	where
		T: Serialize + Send + Sync,
	{
		let serialized = serde_json::to_vec(value)?;
		let entry = CacheEntry::new(serialized, ttl.or(self.default_ttl));

		let mut store = self.store.write().await;
		store.insert(key.to_string(), entry);
		Ok(())
	}

	async fn delete(&self, key: &str) -> CacheResult<()> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn has_key(&self, key: &str) -> CacheResult<bool> {
		let store = self.store.read().await;
		Ok(store.get(key).is_some_and(|entry| !entry.is_expired()))
	}

	async fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
		let mut store = self.store.write().await;
		let doomed: Vec<String> = store
			.range(prefix.to_string()..)
			.take_while(|(key, _)| key.starts_with(prefix))
			.map(|(key, _)| key.clone())
			.collect();
		for key in &doomed {
			store.remove(key);
		}
		self.invalidations
			.fetch_add(doomed.len() as u64, Ordering::Relaxed);
		if !doomed.is_empty() {
			tracing::debug!(prefix, removed = doomed.len(), "cache prefix invalidated");
		}
		Ok(doomed.len())
	}

	async fn clear(&self) -> CacheResult<()> {
		let mut store = self.store.write().await;
		self.invalidations
			.fetch_add(store.len() as u64, Ordering::Relaxed);
		store.clear();
		Ok(())
	}
}
