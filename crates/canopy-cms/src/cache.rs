//! Path and permission lookup cache
//!
//! Keys are namespaced by the configured prefix and embed the absolute path
//! of the node they describe:
//!
//! ```text
//! {prefix}:acl:{path}#{target}#{principal}#{permission}
//! {prefix}:path:{path}#{language}
//! ```
//!
//! so that invalidating a subtree is a prefix delete on its path.

use crate::NodeId;
use crate::error::CmsResult;
use canopy_cache::{Cache, CacheStatistics, InMemoryCache};
use canopy_conf::Settings;
use std::time::Duration;

/// Cached data to drop once a transaction commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
	/// Everything keyed under an absolute path, e.g. `/about/`
	Subtree(String),
	/// All permission decisions
	AllPermissions,
	/// The whole cache
	Everything,
}

/// Namespaced view over the engine's cache backend
#[derive(Clone)]
pub struct ContentCache {
	inner: InMemoryCache,
	acl_prefix: String,
	path_prefix: String,
	ttl: Option<Duration>,
}

impl ContentCache {
	pub fn new(settings: &Settings) -> Self {
		let ttl = settings.cache_ttl_secs.map(Duration::from_secs);
		let mut inner = InMemoryCache::new();
		if let Some(ttl) = ttl {
			inner = inner.with_default_ttl(ttl);
		}
		Self {
			inner,
			acl_prefix: settings.cache_key("acl:"),
			path_prefix: settings.cache_key("path:"),
			ttl,
		}
	}

	fn acl_key(&self, key: &str) -> String {
		format!("{}{}", self.acl_prefix, key)
	}

	fn path_key(&self, path: &str, language: &str) -> String {
		format!("{}{}#{}", self.path_prefix, path, language)
	}

	pub(crate) async fn get_acl(&self, key: &str) -> CmsResult<Option<bool>> {
		Ok(self.inner.get(&self.acl_key(key)).await?)
	}

	pub(crate) async fn put_acl(&self, key: &str, decision: bool) -> CmsResult<()> {
		Ok(self.inner.set(&self.acl_key(key), &decision, self.ttl).await?)
	}

	pub(crate) async fn get_path(&self, path: &str, language: &str) -> CmsResult<Option<NodeId>> {
		Ok(self.inner.get(&self.path_key(path, language)).await?)
	}

	pub(crate) async fn put_path(&self, path: &str, language: &str, node: NodeId) -> CmsResult<()> {
		Ok(self
			.inner
			.set(&self.path_key(path, language), &node, self.ttl)
			.await?)
	}

	/// Drop the cached data described by `invalidations`, then sweep
	/// expired entries when entries expire at all
	pub(crate) async fn apply(&self, invalidations: &[Invalidation]) -> CmsResult<()> {
		for invalidation in invalidations {
			let removed = match invalidation {
				Invalidation::Subtree(path) => {
					let acl = self.inner.delete_prefix(&self.acl_key(path)).await?;
					let paths = self
						.inner
						.delete_prefix(&format!("{}{}", self.path_prefix, path))
						.await?;
					acl + paths
				}
				Invalidation::AllPermissions => {
					self.inner.delete_prefix(&self.acl_prefix).await?
				}
				Invalidation::Everything => {
					self.inner.clear().await?;
					0
				}
			};
			tracing::debug!(?invalidation, removed, "cache invalidated");
		}
		if self.ttl.is_some() {
			let purged = self.inner.purge_expired().await;
			if purged > 0 {
				tracing::debug!(purged, "expired cache entries purged");
			}
		}
		Ok(())
	}

	pub async fn statistics(&self) -> CacheStatistics {
		self.inner.get_statistics().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use uuid::Uuid;

	#[tokio::test]
	async fn test_subtree_invalidation_keeps_siblings() {
		// Arrange
		let cache = ContentCache::new(&Settings::default());
		let inside = Uuid::new_v4();
		let outside = Uuid::new_v4();
		cache.put_path("/about/team/", "en", inside).await.unwrap();
		cache.put_path("/aboutus/", "en", outside).await.unwrap();
		cache.put_acl("/about/#node#anon#view", true).await.unwrap();

		// Act
		cache
			.apply(&[Invalidation::Subtree("/about/".to_string())])
			.await
			.unwrap();

		// Assert
		assert_eq!(cache.get_path("/about/team/", "en").await.unwrap(), None);
		assert_eq!(cache.get_path("/aboutus/", "en").await.unwrap(), Some(outside));
		assert_eq!(cache.get_acl("/about/#node#anon#view").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_all_permissions_keeps_paths() {
		let cache = ContentCache::new(&Settings::default());
		let id = Uuid::new_v4();
		cache.put_path("/news/", "0", id).await.unwrap();
		cache.put_acl("/#portal#portal#anon#view", false).await.unwrap();

		cache.apply(&[Invalidation::AllPermissions]).await.unwrap();

		assert_eq!(cache.get_path("/news/", "0").await.unwrap(), Some(id));
		assert_eq!(cache.get_acl("/#portal#portal#anon#view").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_commit_sweeps_expired_entries() {
		// Arrange
		let cache = ContentCache {
			ttl: Some(Duration::from_millis(10)),
			..ContentCache::new(&Settings::default())
		};
		cache.put_path("/old/", "en", Uuid::new_v4()).await.unwrap();
		tokio::time::sleep(Duration::from_millis(30)).await;

		// Act
		cache.apply(&[]).await.unwrap();

		// Assert
		let stats = cache.statistics().await;
		assert_eq!(stats.entries, 0);
		assert_eq!(stats.expired, 1);
	}
}
