//! Typed settings

use crate::sources::SourceError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Errors raised while building or validating settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Configuration source error: {0}")]
	Source(#[from] SourceError),

	#[error("Invalid settings value: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("Invalid settings: {0}")]
	Invalid(String),
}

/// A language the site is published in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSetting {
	pub code: String,
	pub name: String,
}

impl LanguageSetting {
	pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			name: name.into(),
		}
	}
}

/// Which management tabs are enabled, reported through content-type info
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabSettings {
	pub meta_data: bool,
	pub children: bool,
	pub images: bool,
	pub files: bool,
	pub portlets: bool,
	pub comments: bool,
	pub seo: bool,
	pub history: bool,
	pub permissions: bool,
}

impl Default for TabSettings {
	fn default() -> Self {
		Self {
			meta_data: true,
			children: true,
			images: true,
			files: true,
			portlets: true,
			comments: true,
			seo: true,
			history: true,
			permissions: true,
		}
	}
}

/// Runtime settings of the content engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Default (canonical) language
	pub language_code: String,
	pub languages: Vec<LanguageSetting>,
	/// Multiple used when renumbering sibling positions
	pub position_step: i64,
	pub cache_prefix: String,
	/// Lifetime of cached path and permission lookups, `None` for no expiry
	pub cache_ttl_secs: Option<u64>,
	pub anonymous_role: String,
	pub owner_role: String,
	/// When set, attachment payloads are written below this directory
	pub media_root: Option<PathBuf>,
	pub tabs: TabSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			language_code: "en".to_string(),
			languages: vec![LanguageSetting::new("en", "English")],
			position_step: 10,
			cache_prefix: "canopy".to_string(),
			cache_ttl_secs: None,
			anonymous_role: "Anonymous".to_string(),
			owner_role: "Owner".to_string(),
			media_root: None,
			tabs: TabSettings::default(),
		}
	}
}

impl Settings {
	/// Check cross-field constraints
	///
	/// # Examples
	///
	/// ```
	/// use canopy_conf::Settings;
	///
	/// let mut settings = Settings::default();
	/// assert!(settings.validate().is_ok());
	///
	/// settings.position_step = 0;
	/// assert!(settings.validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.languages.is_empty() {
			return Err(SettingsError::Invalid(
				"at least one language must be configured".to_string(),
			));
		}
		if !self.is_language_enabled(&self.language_code) {
			return Err(SettingsError::Invalid(format!(
				"default language '{}' is not in the configured languages",
				self.language_code
			)));
		}
		if self.position_step <= 0 {
			return Err(SettingsError::Invalid(
				"position_step must be positive".to_string(),
			));
		}
		if self.anonymous_role.is_empty() || self.owner_role.is_empty() {
			return Err(SettingsError::Invalid(
				"implicit role names must not be empty".to_string(),
			));
		}
		Ok(())
	}

	/// Whether `code` is one of the configured languages
	pub fn is_language_enabled(&self, code: &str) -> bool {
		self.languages.iter().any(|lang| lang.code == code)
	}

	/// Build a cache key under the configured prefix
	pub fn cache_key(&self, key: &str) -> String {
		format!("{}:{}", self.cache_prefix, key)
	}

	/// Add a language (builder style, mostly for tests and embedding)
	pub fn with_language(mut self, code: &str, name: &str) -> Self {
		if !self.is_language_enabled(code) {
			self.languages.push(LanguageSetting::new(code, name));
		}
		self
	}
}
