//! Cache module.
//!
//! # Examples
//!
//! ```rust,no_run
//! # #[cfg(feature = "cache")]
//! use canopy::cache::{Cache, InMemoryCache};
//! ```

#[cfg(feature = "cache")]
pub use canopy_cache::*;
