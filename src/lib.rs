//! # Canopy
//!
//! The core of a content-management system: a tree of pages and other
//! content objects with slugs, translations and ordered positions, guarded
//! by an inherited role/permission lattice and driven through per-type
//! workflows.
//!
//! ## Feature Flags
//!
//! - `cms` - The content engine (enables the crates it builds on)
//! - `cache` - Path and permission caches
//! - `storage` - Attachment payload backends
//! - `conf` - Layered settings
//! - `minimal` - Engine only
//! - `full` (default) - Everything above
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use canopy::prelude::*;
//!
//! # async fn example() -> CmsResult<()> {
//! let cms = Cms::builder().build()?;
//! cms.bootstrap().await?;
//!
//! let admin = Principal::superuser();
//! let about = cms
//!     .create(None, NodeFields::page("About us"), &admin)
//!     .await?;
//! assert_eq!(about.slug, "about-us");
//!
//! cms.do_transition(about.id, "Make public", &admin).await?;
//! assert!(cms.has_permission(&Principal::anonymous(), about.id, "view").await);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "cache")]
pub mod cache;
#[cfg(feature = "cms")]
pub mod cms;
#[cfg(feature = "conf")]
pub mod conf;
#[cfg(feature = "storage")]
pub mod storage;

#[cfg(feature = "cms")]
pub use canopy_cms::bootstrap;
#[cfg(feature = "cms")]
pub use canopy_cms::engine::{Cms, CmsBuilder};
#[cfg(feature = "cms")]
pub use canopy_cms::error::{CmsError, CmsResult};

#[cfg(feature = "conf")]
pub use canopy_conf::{Settings, SettingsBuilder};

#[cfg(feature = "storage")]
pub use canopy_storage::{InMemoryStorage, LocalStorage, Storage};

#[cfg(feature = "cache")]
pub use canopy_cache::{Cache, InMemoryCache};

pub mod prelude {
	#[cfg(feature = "cms")]
	pub use canopy_cms::prelude::*;

	#[cfg(feature = "conf")]
	pub use canopy_conf::Settings;

	#[cfg(feature = "storage")]
	pub use canopy_storage::{InMemoryStorage, LocalStorage, Storage};
}
