//! Cache behaviour as seen by callers

use canopy_cache::{Cache, InMemoryCache};
use rstest::*;
use std::time::Duration;

#[fixture]
fn cache() -> InMemoryCache {
	InMemoryCache::new()
}

#[rstest]
#[tokio::test]
async fn test_default_ttl_applies(cache: InMemoryCache) {
	// Arrange
	let cache = cache.with_default_ttl(Duration::from_millis(10));
	cache.set("short", &"v", None).await.unwrap();
	cache
		.set("long", &"v", Some(Duration::from_secs(60)))
		.await
		.unwrap();

	// Act
	tokio::time::sleep(Duration::from_millis(30)).await;

	// Assert
	assert!(!cache.has_key("short").await.unwrap());
	assert!(cache.has_key("long").await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_statistics_track_hits_and_misses(cache: InMemoryCache) {
	cache.set("a", &"x", None).await.unwrap();

	let _: Option<String> = cache.get("a").await.unwrap();
	let _: Option<String> = cache.get("a").await.unwrap();
	let _: Option<String> = cache.get("b").await.unwrap();

	let stats = cache.get_statistics().await;
	assert_eq!(stats.hits, 2);
	assert_eq!(stats.misses, 1);
	assert_eq!(stats.requests(), 3);
	assert!(stats.bytes > 0);
}

#[rstest]
#[tokio::test]
async fn test_clear_counts_invalidations(cache: InMemoryCache) {
	cache.set("a", &1, None).await.unwrap();
	cache.set("b", &2, None).await.unwrap();

	cache.clear().await.unwrap();

	let stats = cache.get_statistics().await;
	assert_eq!(stats.entries, 0);
	assert_eq!(stats.invalidated, 2);
}

#[rstest]
#[tokio::test]
async fn test_purge_drops_only_expired(cache: InMemoryCache) {
	// Arrange
	cache
		.set("short", &1, Some(Duration::from_millis(10)))
		.await
		.unwrap();
	cache.set("long", &2, None).await.unwrap();
	tokio::time::sleep(Duration::from_millis(30)).await;

	// Act
	let purged = cache.purge_expired().await;

	// Assert
	assert_eq!(purged, 1);
	let stats = cache.get_statistics().await;
	assert_eq!(stats.entries, 1);
	assert_eq!(stats.expired, 1);
	assert_eq!(stats.invalidated, 0);
	assert!(cache.has_key("long").await.unwrap());
}
