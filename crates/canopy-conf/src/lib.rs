//! Settings for Canopy
//!
//! Settings are assembled from layered sources, lowest priority first:
//!
//! 1. [`DefaultSource`](sources::DefaultSource): built-in defaults
//! 2. [`TomlFileSource`](sources::TomlFileSource): a `canopy.toml` file
//! 3. [`EnvSource`](sources::EnvSource): `CANOPY_*` environment variables
//!
//! Nested keys are written with a double underscore in the environment
//! (`CANOPY_TABS__COMMENTS=false`).
//!
//! ## Example
//!
//! ```rust
//! use canopy_conf::{Settings, SettingsBuilder};
//! use canopy_conf::sources::DefaultSource;
//! use serde_json::json;
//!
//! let settings = SettingsBuilder::new()
//!     .add_source(DefaultSource::new().with_value("position_step", json!(20)))
//!     .build()
//!     .unwrap();
//! assert_eq!(settings.position_step, 20);
//! assert_eq!(settings.language_code, "en");
//! ```

pub mod builder;
pub mod settings;
pub mod sources;

pub use builder::SettingsBuilder;
pub use settings::{LanguageSetting, Settings, SettingsError, TabSettings};
pub use sources::{ConfigSource, SourceError};

/// Re-export commonly used types
pub mod prelude {
	pub use super::builder::SettingsBuilder;
	pub use super::settings::*;
	pub use super::sources::*;
}
