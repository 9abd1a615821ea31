//! Caching for Canopy
//!
//! The content engine caches two kinds of derived data: path resolutions and
//! permission decisions. Both are keyed by the absolute path of the node they
//! describe, so invalidating a subtree is a prefix delete.
//!
//! ## Quick Start
//!
//! ```rust
//! use canopy_cache::{Cache, InMemoryCache};
//!
//! # async fn example() -> canopy_cache::CacheResult<()> {
//! let cache = InMemoryCache::new();
//!
//! cache.set("path:/about/#en", &"3f2c", None).await?;
//! cache.set("path:/about/team/#en", &"91ab", None).await?;
//!
//! let removed = cache.delete_prefix("path:/about/").await?;
//! assert_eq!(removed, 2);
//! # Ok(())
//! # }
//! ```

pub mod cache_trait;
mod entry;
pub mod error;
pub mod in_memory;
pub mod statistics;

pub use cache_trait::Cache;
pub use error::{CacheError, CacheResult};
pub use in_memory::InMemoryCache;
pub use statistics::CacheStatistics;
