//! Content type registry
//!
//! Describes, per content kind, where it may be added, which templates it
//! offers and which workflow governs it. The engine only performs lookups;
//! registration happens at startup or through [`Cms::bootstrap`](crate::engine::Cms::bootstrap).

use crate::error::{CmsError, CmsResult, ValidationErrors};
use crate::nodes::ContentBody;
use canopy_conf::TabSettings;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Value type of a custom body field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
	Text,
	Integer,
	Boolean,
	Json,
}

impl FieldKind {
	fn accepts(&self, value: &JsonValue) -> bool {
		match self {
			FieldKind::Text => value.is_string(),
			FieldKind::Integer => value.is_i64() || value.is_u64(),
			FieldKind::Boolean => value.is_boolean(),
			FieldKind::Json => true,
		}
	}
}

/// A field of a custom content kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
	pub name: String,
	pub kind: FieldKind,
	pub required: bool,
}

impl FieldSchema {
	pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			kind,
			required: true,
		}
	}

	pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
		Self {
			name: name.into(),
			kind,
			required: false,
		}
	}
}

/// A template content may be displayed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
	pub name: String,
	pub path: String,
	pub children_columns: u32,
	pub images_columns: u32,
}

impl Template {
	pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			path: path.into(),
			children_columns: 1,
			images_columns: 1,
		}
	}

	pub fn with_columns(mut self, children_columns: u32, images_columns: u32) -> Self {
		self.children_columns = children_columns;
		self.images_columns = images_columns;
		self
	}
}

/// Registration of a content kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeRegistration {
	pub kind: String,
	pub name: String,
	pub display_select_standard: bool,
	pub display_position: bool,
	/// May be added directly below the portal
	pub global_addable: bool,
	/// Kinds allowed as children
	pub subtypes: Vec<String>,
	/// Names of the templates offered for this kind
	pub templates: Vec<String>,
	pub default_template: Option<String>,
	pub workflow: Option<String>,
	pub fields: Vec<FieldSchema>,
}

impl ContentTypeRegistration {
	pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			name: name.into(),
			display_select_standard: true,
			display_position: true,
			global_addable: true,
			subtypes: Vec::new(),
			templates: Vec::new(),
			default_template: None,
			workflow: None,
			fields: Vec::new(),
		}
	}

	pub fn with_subtype(mut self, kind: impl Into<String>) -> Self {
		self.subtypes.push(kind.into());
		self
	}

	pub fn with_template(mut self, template: impl Into<String>) -> Self {
		self.templates.push(template.into());
		self
	}

	pub fn with_default_template(mut self, template: impl Into<String>) -> Self {
		let template = template.into();
		if !self.templates.contains(&template) {
			self.templates.push(template.clone());
		}
		self.default_template = Some(template);
		self
	}

	pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
		self.workflow = Some(workflow.into());
		self
	}

	pub fn with_field(mut self, field: FieldSchema) -> Self {
		self.fields.push(field);
		self
	}

	pub fn not_global(mut self) -> Self {
		self.global_addable = false;
		self
	}
}

/// Registration plus the management tabs enabled for the kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeInfo {
	pub registration: ContentTypeRegistration,
	pub tabs: TabSettings,
}

/// Lookup of content type information
pub trait ContentTypeRegistry: Send + Sync {
	fn register_type(&self, registration: ContentTypeRegistration);

	fn register_template(&self, template: Template);

	fn get_info(&self, kind: &str) -> Option<ContentTypeInfo>;

	/// Kinds addable below an object of `kind`, or below the portal with `None`
	fn get_allowed_subtypes(&self, kind: Option<&str>) -> Vec<String>;

	fn template(&self, name: &str) -> Option<Template>;

	fn kinds(&self) -> Vec<String>;

	/// Check a body against the field schema of its kind
	fn validate_body(&self, body: &ContentBody) -> CmsResult<()> {
		let info = self
			.get_info(body.kind())
			.ok_or_else(|| CmsError::invalid("kind", format!("Unknown content kind '{}'.", body.kind())))?;
		let ContentBody::Custom { fields, .. } = body else {
			return Ok(());
		};

		let mut errors = ValidationErrors::new();
		for schema in &info.registration.fields {
			match fields.get(&schema.name) {
				None | Some(JsonValue::Null) if schema.required => {
					errors.add(&schema.name, "This field is required.");
				}
				Some(value) if !value.is_null() && !schema.kind.accepts(value) => {
					errors.add(&schema.name, format!("Expected a {:?} value.", schema.kind));
				}
				_ => {}
			}
		}
		for name in fields.keys() {
			if !info.registration.fields.iter().any(|f| &f.name == name) {
				errors.add(name, "Unknown field.");
			}
		}
		errors.into_result()
	}
}

/// Registry kept in memory
pub struct InMemoryRegistry {
	types: RwLock<BTreeMap<String, ContentTypeRegistration>>,
	templates: RwLock<BTreeMap<String, Template>>,
	tabs: TabSettings,
}

impl InMemoryRegistry {
	pub fn new(tabs: TabSettings) -> Self {
		Self {
			types: RwLock::new(BTreeMap::new()),
			templates: RwLock::new(BTreeMap::new()),
			tabs,
		}
	}
}

impl Default for InMemoryRegistry {
	fn default() -> Self {
		Self::new(TabSettings::default())
	}
}

impl ContentTypeRegistry for InMemoryRegistry {
	fn register_type(&self, registration: ContentTypeRegistration) {
		tracing::debug!(kind = %registration.kind, "content type registered");
		self.types
			.write()
			.insert(registration.kind.clone(), registration);
	}

	fn register_template(&self, template: Template) {
		self.templates.write().insert(template.name.clone(), template);
	}

	fn get_info(&self, kind: &str) -> Option<ContentTypeInfo> {
		self.types.read().get(kind).map(|registration| ContentTypeInfo {
			registration: registration.clone(),
			tabs: self.tabs,
		})
	}

	fn get_allowed_subtypes(&self, kind: Option<&str>) -> Vec<String> {
		let types = self.types.read();
		match kind {
			Some(kind) => types
				.get(kind)
				.map(|registration| registration.subtypes.clone())
				.unwrap_or_default(),
			None => types
				.values()
				.filter(|registration| registration.global_addable)
				.map(|registration| registration.kind.clone())
				.collect(),
		}
	}

	fn template(&self, name: &str) -> Option<Template> {
		self.templates.read().get(name).cloned()
	}

	fn kinds(&self) -> Vec<String> {
		self.types.read().keys().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::{Map, json};

	fn event_registry() -> InMemoryRegistry {
		let registry = InMemoryRegistry::default();
		registry.register_type(
			ContentTypeRegistration::new("event", "Event")
				.not_global()
				.with_field(FieldSchema::required("venue", FieldKind::Text))
				.with_field(FieldSchema::optional("seats", FieldKind::Integer)),
		);
		registry.register_type(ContentTypeRegistration::new("page", "Page").with_subtype("event"));
		registry
	}

	#[test]
	fn test_allowed_subtypes() {
		let registry = event_registry();

		assert_eq!(registry.get_allowed_subtypes(Some("page")), vec!["event"]);
		assert_eq!(registry.get_allowed_subtypes(None), vec!["page"]);
		assert!(registry.get_allowed_subtypes(Some("missing")).is_empty());
	}

	#[test]
	fn test_custom_body_validation() {
		let registry = event_registry();
		let mut fields = Map::new();
		fields.insert("seats".to_string(), json!("many"));
		fields.insert("color".to_string(), json!("red"));
		let body = ContentBody::Custom {
			kind: "event".to_string(),
			fields,
		};

		let Err(CmsError::Validation(errors)) = registry.validate_body(&body) else {
			panic!("expected validation errors");
		};

		assert!(errors.get("venue").is_some());
		assert!(errors.get("seats").is_some());
		assert!(errors.get("color").is_some());
	}

	#[test]
	fn test_default_template_is_offered() {
		let registration = ContentTypeRegistration::new("page", "Page").with_default_template("Article");
		assert_eq!(registration.templates, vec!["Article"]);
	}
}
