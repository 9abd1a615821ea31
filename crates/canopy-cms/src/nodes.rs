//! Content nodes
//!
//! Every node carries the shared tree attributes plus a [`ContentBody`]
//! holding the fields specific to its content kind.

use crate::language::Language;
use crate::workflow::StateName;
use crate::{NodeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Kind tag of the built-in page type
pub const PAGE_KIND: &str = "page";

/// Kind tag of the built-in gallery type
pub const GALLERY_KIND: &str = "gallery";

/// Kind-specific fields of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBody {
	Page {
		text: String,
	},
	Gallery {
		images_columns: u32,
	},
	/// A registered type outside the built-ins, validated against its field schema
	Custom {
		kind: String,
		fields: Map<String, JsonValue>,
	},
}

impl ContentBody {
	/// Kind tag used by the content type registry
	pub fn kind(&self) -> &str {
		match self {
			ContentBody::Page { .. } => PAGE_KIND,
			ContentBody::Gallery { .. } => GALLERY_KIND,
			ContentBody::Custom { kind, .. } => kind,
		}
	}

	/// Text contributed to the searchable text of the node
	pub fn searchable_text(&self) -> String {
		match self {
			ContentBody::Page { text } => text.clone(),
			ContentBody::Gallery { .. } => String::new(),
			ContentBody::Custom { fields, .. } => fields
				.values()
				.filter_map(JsonValue::as_str)
				.collect::<Vec<_>>()
				.join(" "),
		}
	}
}

impl Default for ContentBody {
	fn default() -> Self {
		ContentBody::Page {
			text: String::new(),
		}
	}
}

/// Whether comments are allowed on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommentPolicy {
	/// Defer to the parent, and finally to the portal
	#[default]
	Default,
	Yes,
	No,
}

/// A node of the content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
	pub id: NodeId,
	pub title: String,
	pub display_title: bool,
	pub slug: String,
	pub description: String,
	pub position: i64,
	pub language: Language,
	/// The canonical node this node translates, `None` for canonical nodes
	pub canonical: Option<NodeId>,
	pub parent: Option<NodeId>,
	/// Descendant shown as the default view of this node
	pub standard: Option<NodeId>,
	/// Object-level workflow assignment, overriding the content type's
	pub workflow: Option<String>,
	pub state: Option<StateName>,
	pub active: bool,
	pub template: Option<String>,
	pub order_by: String,
	pub exclude_from_navigation: bool,
	pub exclude_from_search: bool,
	pub creator: Option<UserId>,
	pub created_at: DateTime<Utc>,
	pub modified_at: DateTime<Utc>,
	pub publication_date: Option<DateTime<Utc>>,
	pub start_date: Option<DateTime<Utc>>,
	pub end_date: Option<DateTime<Utc>>,
	pub meta_title: String,
	pub meta_keywords: String,
	pub meta_description: String,
	pub tags: Vec<String>,
	pub allow_comments: CommentPolicy,
	pub searchable_text: String,
	/// Set on working copies, pointing at the node they were checked out from
	pub working_copy_base: Option<NodeId>,
	pub version: u32,
	pub body: ContentBody,
}

impl ContentNode {
	/// Kind tag of this node
	pub fn kind(&self) -> &str {
		self.body.kind()
	}

	pub fn is_canonical(&self) -> bool {
		self.canonical.is_none()
	}

	pub fn is_working_copy(&self) -> bool {
		self.working_copy_base.is_some()
	}

	/// Whether `now` lies within the start/end window of the node
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cms::nodes::{ContentNode, NodeFields};
	/// use chrono::{Duration, Utc};
	///
	/// let mut node = ContentNode::from_fields(uuid::Uuid::new_v4(), NodeFields::page("News"));
	/// let now = Utc::now();
	/// assert!(node.is_within_window(now));
	///
	/// node.start_date = Some(now + Duration::days(1));
	/// assert!(!node.is_within_window(now));
	/// ```
	pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
		let started = self.start_date.is_none_or(|start| start <= now);
		let ended = self.end_date.is_some_and(|end| now >= end);
		started && !ended
	}

	/// Recompute the text used by search
	pub fn reindex(&mut self) {
		let mut parts = vec![self.title.clone(), self.description.clone()];
		parts.push(self.body.searchable_text());
		parts.extend(self.tags.iter().cloned());
		self.searchable_text = parts
			.into_iter()
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" ");
	}

	/// Build an unattached node from creation fields
	///
	/// The slug is taken as given (or empty); resolving it against siblings is
	/// done by the tree manager.
	pub fn from_fields(id: NodeId, fields: NodeFields) -> Self {
		let now = Utc::now();
		let mut node = Self {
			id,
			title: fields.title,
			display_title: fields.display_title,
			slug: fields.slug.unwrap_or_default(),
			description: fields.description,
			position: 0,
			language: fields.language.unwrap_or(Language::Neutral),
			canonical: None,
			parent: None,
			standard: None,
			workflow: None,
			state: None,
			active: true,
			template: fields.template,
			order_by: fields.order_by,
			exclude_from_navigation: fields.exclude_from_navigation,
			exclude_from_search: fields.exclude_from_search,
			creator: None,
			created_at: now,
			modified_at: now,
			publication_date: None,
			start_date: fields.start_date,
			end_date: fields.end_date,
			meta_title: fields.meta_title,
			meta_keywords: fields.meta_keywords,
			meta_description: fields.meta_description,
			tags: fields.tags,
			allow_comments: fields.allow_comments,
			searchable_text: String::new(),
			working_copy_base: None,
			version: 1,
			body: fields.body,
		};
		node.reindex();
		node
	}

	/// Copy the editable fields of `other` onto this node, keeping identity,
	/// placement and translation linkage
	pub(crate) fn take_content_from(&mut self, other: &ContentNode) {
		self.title = other.title.clone();
		self.display_title = other.display_title;
		self.description = other.description.clone();
		self.template = other.template.clone();
		self.order_by = other.order_by.clone();
		self.exclude_from_navigation = other.exclude_from_navigation;
		self.exclude_from_search = other.exclude_from_search;
		self.start_date = other.start_date;
		self.end_date = other.end_date;
		self.meta_title = other.meta_title.clone();
		self.meta_keywords = other.meta_keywords.clone();
		self.meta_description = other.meta_description.clone();
		self.tags = other.tags.clone();
		self.allow_comments = other.allow_comments;
		self.body = other.body.clone();
		self.reindex();
	}
}

/// Fields supplied when creating a node
#[derive(Debug, Clone, Default)]
pub struct NodeFields {
	pub title: String,
	pub display_title: bool,
	/// Derived from the title when absent
	pub slug: Option<String>,
	pub description: String,
	/// Inherited from the parent (or the default language) when absent
	pub language: Option<Language>,
	pub template: Option<String>,
	pub order_by: String,
	pub exclude_from_navigation: bool,
	pub exclude_from_search: bool,
	pub start_date: Option<DateTime<Utc>>,
	pub end_date: Option<DateTime<Utc>>,
	pub meta_title: String,
	pub meta_keywords: String,
	pub meta_description: String,
	pub tags: Vec<String>,
	pub allow_comments: CommentPolicy,
	pub body: ContentBody,
}

impl NodeFields {
	/// Fields for a node with the given body
	pub fn new(title: impl Into<String>, body: ContentBody) -> Self {
		Self {
			title: title.into(),
			display_title: true,
			order_by: "position".to_string(),
			meta_title: "<title>".to_string(),
			meta_keywords: "<tags>".to_string(),
			meta_description: "<description>".to_string(),
			body,
			..Default::default()
		}
	}

	/// Fields for an empty page
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cms::nodes::NodeFields;
	///
	/// let fields = NodeFields::page("About us").with_slug("about");
	/// assert_eq!(fields.slug.as_deref(), Some("about"));
	/// ```
	pub fn page(title: impl Into<String>) -> Self {
		Self::new(title, ContentBody::default())
	}

	pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
		self.slug = Some(slug.into());
		self
	}

	pub fn with_language(mut self, language: Language) -> Self {
		self.language = Some(language);
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn with_template(mut self, template: impl Into<String>) -> Self {
		self.template = Some(template.into());
		self
	}

	pub fn with_tags(mut self, tags: Vec<String>) -> Self {
		self.tags = tags;
		self
	}

	pub fn with_window(
		mut self,
		start_date: Option<DateTime<Utc>>,
		end_date: Option<DateTime<Utc>>,
	) -> Self {
		self.start_date = start_date;
		self.end_date = end_date;
		self
	}

	pub fn with_comments(mut self, policy: CommentPolicy) -> Self {
		self.allow_comments = policy;
		self
	}
}

/// Changes applied by an update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
	pub title: Option<String>,
	pub display_title: Option<bool>,
	pub slug: Option<String>,
	pub description: Option<String>,
	pub template: Option<String>,
	pub order_by: Option<String>,
	pub exclude_from_navigation: Option<bool>,
	pub exclude_from_search: Option<bool>,
	pub start_date: Option<Option<DateTime<Utc>>>,
	pub end_date: Option<Option<DateTime<Utc>>>,
	pub meta_title: Option<String>,
	pub meta_keywords: Option<String>,
	pub meta_description: Option<String>,
	pub tags: Option<Vec<String>>,
	pub allow_comments: Option<CommentPolicy>,
	pub standard: Option<Option<NodeId>>,
	pub body: Option<ContentBody>,
}

impl NodeUpdate {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	pub fn slug(mut self, slug: impl Into<String>) -> Self {
		self.slug = Some(slug.into());
		self
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn body(mut self, body: ContentBody) -> Self {
		self.body = Some(body);
		self
	}

	pub fn standard(mut self, standard: Option<NodeId>) -> Self {
		self.standard = Some(standard);
		self
	}

	pub fn allow_comments(mut self, policy: CommentPolicy) -> Self {
		self.allow_comments = Some(policy);
		self
	}

	pub fn tags(mut self, tags: Vec<String>) -> Self {
		self.tags = Some(tags);
		self
	}
}

/// The singleton root context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
	pub title: String,
	pub standard: Option<NodeId>,
	pub allow_comments: bool,
}

impl Default for Portal {
	fn default() -> Self {
		Self {
			title: "Canopy".to_string(),
			standard: None,
			allow_comments: false,
		}
	}
}
