//! Content engine module.
//!
//! The content tree with its permission lattice, workflows, clipboard and
//! working copies.
//!
//! # Examples
//!
//! ```rust,no_run
//! # #[cfg(feature = "cms")]
//! use canopy::cms::prelude::{Cms, NodeFields, Principal};
//! ```

#[cfg(feature = "cms")]
pub use canopy_cms::*;
