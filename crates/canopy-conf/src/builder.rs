//! Merging configuration sources into [`Settings`]

use crate::settings::{Settings, SettingsError};
use crate::sources::ConfigSource;
use serde_json::{Map, Value};

/// Builds [`Settings`] from layered sources
///
/// Values from sources with a higher priority override lower ones. Keys not
/// provided by any source keep their [`Settings::default`] value.
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge all sources into one JSON object, nesting `a__b` keys
	pub fn merged(&self) -> Result<Map<String, Value>, SettingsError> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = Map::new();
		for source in ordered {
			let values = source.load()?;
			tracing::debug!(
				source = %source.description(),
				keys = values.len(),
				"loaded configuration source"
			);
			for (key, value) in values {
				let path: Vec<&str> = key.split("__").collect();
				insert_path(&mut merged, &path, value);
			}
		}
		Ok(merged)
	}

	/// Build and validate the settings
	pub fn build(self) -> Result<Settings, SettingsError> {
		let mut base = serde_json::to_value(Settings::default())?;
		if let Value::Object(base_map) = &mut base {
			for (key, value) in self.merged()? {
				deep_merge(base_map, key, value);
			}
		}
		let settings: Settings = serde_json::from_value(base)?;
		settings.validate()?;
		Ok(settings)
	}
}

fn insert_path(target: &mut Map<String, Value>, path: &[&str], value: Value) {
	match path {
		[] => {}
		[last] => deep_merge(target, (*last).to_string(), value),
		[head, rest @ ..] => {
			let entry = target
				.entry((*head).to_string())
				.or_insert_with(|| Value::Object(Map::new()));
			if !entry.is_object() {
				*entry = Value::Object(Map::new());
			}
			if let Value::Object(inner) = entry {
				insert_path(inner, rest, value);
			}
		}
	}
}

fn deep_merge(target: &mut Map<String, Value>, key: String, value: Value) {
	match (target.get_mut(&key), value) {
		(Some(Value::Object(existing)), Value::Object(incoming)) => {
			for (k, v) in incoming {
				deep_merge(existing, k, v);
			}
		}
		(_, value) => {
			target.insert(key, value);
		}
	}
}
