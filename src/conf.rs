//! Settings module.
//!
//! # Examples
//!
//! ```rust,no_run
//! # #[cfg(feature = "conf")]
//! use canopy::conf::{Settings, SettingsBuilder};
//! ```

#[cfg(feature = "conf")]
pub use canopy_conf::*;
