//! Layered settings resolution

use canopy_conf::prelude::*;
use rstest::*;
use serde_json::json;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[fixture]
fn temp_dir() -> TempDir {
	TempDir::new().expect("Failed to create temporary directory")
}

fn clear_canopy_env() {
	for (key, _) in env::vars() {
		if key.starts_with("CANOPY_") {
			unsafe {
				env::remove_var(key);
			}
		}
	}
}

#[rstest]
fn test_defaults_are_valid() {
	let settings = SettingsBuilder::new().build().unwrap();

	assert_eq!(settings, Settings::default());
	assert_eq!(settings.position_step, 10);
	assert_eq!(settings.anonymous_role, "Anonymous");
}

#[rstest]
fn test_toml_overrides_defaults(temp_dir: TempDir) {
	// Arrange
	let path = temp_dir.path().join("canopy.toml");
	fs::write(
		&path,
		r#"
language_code = "de"
position_step = 5

[[languages]]
code = "de"
name = "Deutsch"

[[languages]]
code = "en"
name = "English"

[tabs]
comments = false
"#,
	)
	.unwrap();

	// Act
	let settings = SettingsBuilder::new()
		.add_source(DefaultSource::new().with_value("position_step", json!(20)))
		.add_source(TomlFileSource::new(&path))
		.build()
		.unwrap();

	// Assert
	assert_eq!(settings.language_code, "de");
	assert_eq!(settings.position_step, 5);
	assert_eq!(settings.languages.len(), 2);
	assert!(!settings.tabs.comments);
	assert!(settings.tabs.seo);
}

#[rstest]
fn test_missing_toml_file_is_empty(temp_dir: TempDir) {
	let source = TomlFileSource::new(temp_dir.path().join("absent.toml"));
	assert!(source.load().unwrap().is_empty());
}

#[rstest]
fn test_malformed_toml_is_an_error(temp_dir: TempDir) {
	let path = temp_dir.path().join("broken.toml");
	fs::write(&path, "position_step = = 3").unwrap();

	let result = SettingsBuilder::new()
		.add_source(TomlFileSource::new(&path))
		.build();

	assert!(matches!(result, Err(SettingsError::Source(SourceError::Toml(_)))));
}

#[rstest]
#[serial(canopy_env)]
fn test_env_overrides_toml(temp_dir: TempDir) {
	clear_canopy_env();
	let path = temp_dir.path().join("canopy.toml");
	fs::write(&path, "position_step = 5\ncache_prefix = \"site\"\n").unwrap();
	unsafe {
		env::set_var("CANOPY_POSITION_STEP", "100");
		env::set_var("CANOPY_LANGUAGES", "en:English,fr:Français");
		env::set_var("CANOPY_TABS__HISTORY", "false");
	}

	let settings = SettingsBuilder::new()
		.add_source(TomlFileSource::new(&path))
		.add_source(EnvSource::new())
		.build();
	clear_canopy_env();
	let settings = settings.unwrap();

	assert_eq!(settings.position_step, 100);
	assert_eq!(settings.cache_prefix, "site");
	assert!(settings.is_language_enabled("fr"));
	assert!(!settings.tabs.history);
}

#[rstest]
#[serial(canopy_env)]
fn test_env_rejects_unknown_default_language() {
	clear_canopy_env();
	unsafe {
		env::set_var("CANOPY_LANGUAGE_CODE", "nl");
	}

	let result = SettingsBuilder::new().add_source(EnvSource::new()).build();
	clear_canopy_env();

	assert!(matches!(result, Err(SettingsError::Invalid(_))));
}

#[rstest]
#[case(json!([]), "at least one language")]
#[case(json!([{"code": "de", "name": "Deutsch"}]), "not in the configured languages")]
fn test_language_validation(#[case] languages: serde_json::Value, #[case] message: &str) {
	let result = SettingsBuilder::new()
		.add_source(DefaultSource::new().with_value("languages", languages))
		.build();

	let err = result.unwrap_err();
	assert!(err.to_string().contains(message), "{}", err);
}

#[rstest]
fn test_cache_key_uses_prefix() {
	let settings = Settings::default();
	assert_eq!(settings.cache_key("acl:/a/"), "canopy:acl:/a/");
}
