//! Configuration sources

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// A source of raw configuration values
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Priority of this source (higher wins)
	fn priority(&self) -> u8;

	/// Human readable description, used in logs
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Environment variable configuration source
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	/// Source reading `CANOPY_*` variables
	pub fn new() -> Self {
		Self {
			prefix: "CANOPY_".to_string(),
		}
	}

	/// Use a different variable prefix
	///
	/// # Examples
	///
	/// ```
	/// use canopy_conf::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new().with_prefix("MYSITE_");
	/// assert!(source.description().contains("MYSITE_"));
	/// ```
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

/// Parse `code:Name,code:Name` into language objects
fn parse_languages(raw: &str) -> Result<Value, SourceError> {
	let mut languages = Vec::new();
	for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
		let (code, name) = item.split_once(':').unwrap_or((item, item));
		if code.trim().is_empty() {
			return Err(SourceError::Parse(format!("empty language code in '{}'", raw)));
		}
		languages.push(serde_json::json!({
			"code": code.trim(),
			"name": name.trim(),
		}));
	}
	Ok(Value::Array(languages))
}

fn parse_scalar(raw: String) -> Value {
	match raw.trim().to_lowercase().as_str() {
		"true" | "yes" | "on" => return Value::Bool(true),
		"false" | "no" | "off" => return Value::Bool(false),
		_ => {}
	}
	if let Ok(num) = raw.parse::<i64>() {
		Value::Number(num.into())
	} else {
		Value::String(raw)
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let mut config = IndexMap::new();

		for (key, value) in std::env::vars() {
			let Some(clean_key) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			let lower_key = clean_key.to_lowercase();

			let parsed = match lower_key.as_str() {
				"languages" => parse_languages(&value)?,
				// Always textual even when numeric-looking
				"language_code" | "cache_prefix" | "anonymous_role" | "owner_role"
				| "media_root" => Value::String(value),
				_ => parse_scalar(value),
			};
			config.insert(lower_key, parsed);
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// TOML file configuration source
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	/// A missing file loads as empty
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(&toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Explicit in-code values, lowest priority
#[derive(Default)]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_languages() {
		let value = parse_languages("en:English, de:Deutsch,fr").unwrap();
		let list = value.as_array().unwrap();
		assert_eq!(list.len(), 3);
		assert_eq!(list[1]["code"], "de");
		assert_eq!(list[1]["name"], "Deutsch");
		assert_eq!(list[2]["name"], "fr");
	}

	#[test]
	fn test_parse_scalar() {
		assert_eq!(parse_scalar("20".to_string()), Value::from(20));
		assert_eq!(parse_scalar("off".to_string()), Value::Bool(false));
		assert_eq!(parse_scalar("abc".to_string()), Value::from("abc"));
	}
}
