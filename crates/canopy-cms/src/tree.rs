//! Content tree manager
//!
//! Creates, edits, moves, reparents, deletes and translates nodes. Every
//! operation checks the acting principal first, stages its changes in one
//! transaction and renumbers the sibling groups it touched.

use crate::NodeId;
use crate::cache::Invalidation;
use crate::clipboard::{BatchOutcome, SkippedItem};
use crate::engine::Cms;
use crate::error::{CmsError, CmsResult, ConflictKind};
use crate::history::HistoryAction;
use crate::language::Language;
use crate::nodes::{CommentPolicy, ContentBody, ContentNode, NodeFields, NodeUpdate};
use crate::permissions::{Principal, Target};
use crate::slug::{slugify, validate_slug};
use crate::store::ContentStore;
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fields of a translation, created or updated through [`Cms::translate`]
#[derive(Debug, Clone, Default)]
pub struct TranslationFields {
	/// The existing translation to update, `None` to create one
	pub id: Option<NodeId>,
	pub title: String,
	/// Derived from the title when absent
	pub slug: Option<String>,
	pub description: String,
	/// Defaults to a copy of the canonical node's body
	pub body: Option<ContentBody>,
	pub tags: Vec<String>,
}

impl TranslationFields {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			..Default::default()
		}
	}

	pub fn updating(mut self, id: NodeId) -> Self {
		self.id = Some(id);
		self
	}

	pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
		self.slug = Some(slug.into());
		self
	}

	pub fn with_body(mut self, body: ContentBody) -> Self {
		self.body = Some(body);
		self
	}
}

impl Cms {
	// -- placement rules ---------------------------------------------------

	/// Reject `kind` below `parent` unless the registry allows it there
	pub(crate) fn ensure_allowed_kind(
		&self,
		store: &ContentStore,
		parent: Option<NodeId>,
		kind: &str,
	) -> CmsResult<()> {
		let parent_kind = match parent {
			Some(id) => Some(store.node(id)?.kind().to_string()),
			None => None,
		};
		let allowed = self.registry.get_allowed_subtypes(parent_kind.as_deref());
		if allowed.iter().any(|k| k == kind) {
			Ok(())
		} else {
			Err(CmsError::StructuralConflict(ConflictKind::DisallowedKind))
		}
	}

	fn resolve_template(&self, kind: &str, requested: Option<String>) -> CmsResult<Option<String>> {
		let info = self
			.registry
			.get_info(kind)
			.ok_or_else(|| CmsError::invalid("kind", format!("Unknown content kind '{}'.", kind)))?;
		match requested {
			Some(template) if info.registration.templates.contains(&template) => Ok(Some(template)),
			Some(template) => Err(CmsError::invalid(
				"template",
				format!("Template '{}' is not offered for '{}'.", template, kind),
			)),
			None => Ok(info.registration.default_template),
		}
	}

	/// Cache entries at and below the current path of `id`
	pub(crate) fn path_invalidation(store: &ContentStore, id: NodeId) -> Invalidation {
		store
			.absolute_path(id)
			.map_or(Invalidation::Everything, Invalidation::Subtree)
	}

	// -- create ------------------------------------------------------------

	pub(crate) fn create_in(
		&self,
		store: &mut ContentStore,
		parent: Option<NodeId>,
		fields: NodeFields,
		principal: &Principal,
		now: DateTime<Utc>,
	) -> CmsResult<NodeId> {
		if let Some(id) = parent {
			store.node(id)?;
		}
		store.check_permission(principal, Target::from(parent), "add")?;

		if fields.title.trim().is_empty() {
			return Err(CmsError::invalid("title", "This field is required."));
		}
		let kind = fields.body.kind().to_string();
		self.registry.validate_body(&fields.body)?;
		self.ensure_allowed_kind(store, parent, &kind)?;

		let language = match (&fields.language, parent) {
			(Some(language), _) => language.clone(),
			(None, Some(id)) => store.node(id)?.language.clone(),
			(None, None) => self.default_language(),
		};
		self.ensure_language(&language)?;

		let requested = fields
			.slug
			.clone()
			.unwrap_or_else(|| slugify(&fields.title));
		validate_slug(&requested)?;
		let slug = store.unique_slug_for(&requested, parent, &language, None);
		let template = self.resolve_template(&kind, fields.template.clone())?;

		let id = Uuid::new_v4();
		let mut node = ContentNode::from_fields(id, fields);
		node.slug = slug;
		node.language = language.clone();
		node.parent = parent;
		node.template = template;
		node.creator = principal.user;
		node.created_at = now;
		node.modified_at = now;
		node.position = store.next_position(parent, &language, &self.settings);
		store.nodes.insert(id, node);

		let workflow = self.type_workflow(&kind);
		store.enter_initial_state(id, workflow.as_deref(), now)?;
		store.renumber(parent, &language, &self.settings);
		store.record_history(id, HistoryAction::Created, principal, now);
		Ok(id)
	}

	/// Create a node below `parent` (the portal with `None`)
	pub async fn create(
		&self,
		parent: Option<NodeId>,
		fields: NodeFields,
		principal: &Principal,
	) -> CmsResult<ContentNode> {
		let mut txn = self.begin("create").await;
		let result = self
			.create_in(&mut txn.store, parent, fields, principal, Utc::now())
			.and_then(|id| txn.store.node(id).cloned());
		let node = self.finish(txn, result).await?;
		tracing::info!(node = %node.id, slug = %node.slug, kind = node.kind(), "node created");
		Ok(node)
	}

	// -- update ------------------------------------------------------------

	/// Edit the fields of a node
	pub async fn update(&self, id: NodeId, update: NodeUpdate, principal: &Principal) -> CmsResult<ContentNode> {
		let mut txn = self.begin("update").await;
		let result = (|| -> CmsResult<ContentNode> {
			let store = &mut txn.store;
			let current = store.node(id)?.clone();
			store.check_permission(principal, Target::Node(id), "edit")?;
			let invalidation = Self::path_invalidation(store, id);

			let mut node = current.clone();
			if let Some(title) = update.title {
				if title.trim().is_empty() {
					return Err(CmsError::invalid("title", "This field is required."));
				}
				node.title = title;
			}
			if let Some(slug) = update.slug
				&& slug != current.slug
			{
				validate_slug(&slug)?;
				node.slug = store.unique_slug_for(&slug, node.parent, &node.language, Some(id));
			}
			if let Some(body) = update.body {
				if body.kind() != current.kind() {
					return Err(CmsError::invalid("body", "The content kind can't be changed."));
				}
				self.registry.validate_body(&body)?;
				node.body = body;
			}
			if let Some(template) = update.template {
				node.template = self.resolve_template(current.kind(), Some(template))?;
			}
			if let Some(standard) = update.standard {
				if let Some(standard) = standard
					&& !store.is_descendant(standard, id)
				{
					return Err(CmsError::StructuralConflict(ConflictKind::InvalidStandard));
				}
				node.standard = standard;
			}
			if let Some(value) = update.description {
				node.description = value;
			}
			if let Some(value) = update.display_title {
				node.display_title = value;
			}
			if let Some(value) = update.order_by {
				node.order_by = value;
			}
			if let Some(value) = update.exclude_from_navigation {
				node.exclude_from_navigation = value;
			}
			if let Some(value) = update.exclude_from_search {
				node.exclude_from_search = value;
			}
			if let Some(value) = update.start_date {
				node.start_date = value;
			}
			if let Some(value) = update.end_date {
				node.end_date = value;
			}
			if let Some(value) = update.meta_title {
				node.meta_title = value;
			}
			if let Some(value) = update.meta_keywords {
				node.meta_keywords = value;
			}
			if let Some(value) = update.meta_description {
				node.meta_description = value;
			}
			if let Some(value) = update.tags {
				node.tags = value;
			}
			if let Some(value) = update.allow_comments {
				node.allow_comments = value;
			}

			let now = Utc::now();
			node.modified_at = now;
			node.reindex();
			store.nodes.insert(id, node.clone());
			store.record_history(id, HistoryAction::Edited, principal, now);
			txn.invalidate(invalidation);
			Ok(node)
		})();
		self.finish(txn, result).await
	}

	/// Choose the child shown as the default view of a node or the portal
	pub async fn set_standard(
		&self,
		owner: impl Into<Target>,
		standard: Option<NodeId>,
		principal: &Principal,
	) -> CmsResult<()> {
		let owner = owner.into();
		let mut txn = self.begin("set_standard").await;
		let result = (|| -> CmsResult<()> {
			let store = &mut txn.store;
			store.ensure_target(owner)?;
			store.check_permission(principal, owner, Cms::edit_permission(owner))?;
			if let Some(standard) = standard {
				store.node(standard)?;
			}
			match owner {
				Target::Portal => store.portal.standard = standard,
				Target::Node(id) => {
					if let Some(standard) = standard
						&& !store.is_descendant(standard, id)
					{
						return Err(CmsError::StructuralConflict(ConflictKind::InvalidStandard));
					}
					store.node_mut(id)?.standard = standard;
				}
			}
			Ok(())
		})();
		self.finish(txn, result).await
	}

	// -- delete ------------------------------------------------------------

	/// Delete `id` and its whole subtree, bottom-up
	pub(crate) fn delete_in(
		&self,
		txn: &mut Transaction<'_>,
		id: NodeId,
		principal: &Principal,
	) -> CmsResult<Vec<NodeId>> {
		let (parent, language) = {
			let node = txn.store.node(id)?;
			(node.parent, node.language.clone())
		};
		let mut subtree = vec![id];
		subtree.extend(txn.store.descendants(id));
		for node in &subtree {
			txn.store
				.check_permission(principal, Target::Node(*node), "delete")?;
		}
		let invalidation = Self::path_invalidation(&txn.store, id);

		for node in subtree.iter().rev() {
			for path in Self::remove_node(&mut txn.store, *node) {
				txn.delete_blob_after_commit(path);
			}
		}
		txn.store.renumber(parent, &language, &self.settings);
		txn.invalidate(invalidation);
		Ok(subtree)
	}

	/// Remove one node with everything hanging off it, nulling references to
	/// it. Returns the blob paths of its attachments.
	pub(crate) fn remove_node(store: &mut ContentStore, id: NodeId) -> Vec<String> {
		for node in store.nodes.values_mut() {
			if node.standard == Some(id) {
				node.standard = None;
			}
			if node.canonical == Some(id) {
				node.canonical = None;
			}
			if node.working_copy_base == Some(id) {
				node.working_copy_base = None;
			}
		}
		if store.portal.standard == Some(id) {
			store.portal.standard = None;
		}
		let target = Target::Node(id);
		let blobs = store
			.detach_attachments(target)
			.into_iter()
			.map(|attachment| attachment.blob.path)
			.collect();
		store.portlets.forget(target);
		store.permissions.forget(target);
		store.nodes.remove(&id);
		blobs
	}

	/// Delete a node together with its descendants.
	///
	/// Every node of the subtree must grant `delete`, otherwise nothing is
	/// deleted. Returns the ids of the deleted nodes.
	pub async fn delete(&self, id: NodeId, principal: &Principal) -> CmsResult<Vec<NodeId>> {
		let mut txn = self.begin("delete").await;
		let result = self.delete_in(&mut txn, id, principal);
		let deleted = self.finish(txn, result).await?;
		tracing::info!(node = %id, count = deleted.len(), "node deleted");
		Ok(deleted)
	}

	/// Delete several nodes, skipping the ones that can't be deleted
	pub async fn delete_many(&self, ids: &[NodeId], principal: &Principal) -> CmsResult<BatchOutcome> {
		let mut txn = self.begin("delete_many").await;
		let mut outcome = BatchOutcome::default();
		let mut fatal = None;
		for id in ids {
			match self.delete_in(&mut txn, *id, principal) {
				Ok(_) => outcome.succeeded.push(*id),
				Err(err) if err.is_recoverable() => {
					tracing::warn!(node = %id, error = %err, "delete skipped");
					outcome.skipped.push(SkippedItem { id: *id, reason: err });
				}
				Err(err) => {
					fatal = Some(err);
					break;
				}
			}
		}
		let result = match fatal {
			Some(err) => Err(err),
			None => Ok(outcome),
		};
		self.finish(txn, result).await
	}

	// -- move / reparent ---------------------------------------------------

	/// Place a node at `position` among its siblings and renumber them
	pub async fn move_node(&self, id: NodeId, position: i64, principal: &Principal) -> CmsResult<ContentNode> {
		let mut txn = self.begin("move").await;
		let result = (|| -> CmsResult<ContentNode> {
			let store = &mut txn.store;
			let (parent, language) = {
				let node = store.node(id)?;
				(node.parent, node.language.clone())
			};
			let target = Target::from(parent);
			store.check_permission(principal, target, Cms::edit_permission(target))?;
			store.node_mut(id)?.position = position;
			store.renumber(parent, &language, &self.settings);
			let now = Utc::now();
			let position = store.node(id)?.position;
			store.record_history(id, HistoryAction::Moved { position }, principal, now);
			store.node(id).cloned()
		})();
		self.finish(txn, result).await
	}

	/// Move a node, keeping its identity, below `new_parent`
	pub(crate) fn reparent_in(
		&self,
		txn: &mut Transaction<'_>,
		id: NodeId,
		new_parent: Option<NodeId>,
		principal: &Principal,
	) -> CmsResult<()> {
		let node = txn.store.node(id)?.clone();
		if let Some(target) = new_parent {
			txn.store.node(target)?;
			if target == id {
				return Err(CmsError::StructuralConflict(ConflictKind::SelfTarget));
			}
			if txn.store.is_descendant(target, id) {
				return Err(CmsError::StructuralConflict(ConflictKind::Cycle));
			}
		}
		if node.parent == new_parent {
			return Err(CmsError::StructuralConflict(ConflictKind::NoOp));
		}
		txn.store
			.check_permission(principal, Target::Node(id), "delete")?;
		txn.store
			.check_permission(principal, Target::from(new_parent), "add")?;
		self.ensure_allowed_kind(&txn.store, new_parent, node.kind())?;

		let invalidation = Self::path_invalidation(&txn.store, id);
		let slug = txn
			.store
			.unique_slug_for(&node.slug, new_parent, &node.language, Some(id));
		let position = txn
			.store
			.next_position(new_parent, &node.language, &self.settings);
		{
			let moved = txn.store.node_mut(id)?;
			moved.parent = new_parent;
			moved.slug = slug;
			moved.position = position;
			moved.modified_at = Utc::now();
		}
		txn.store
			.renumber(node.parent, &node.language, &self.settings);
		txn.store
			.renumber(new_parent, &node.language, &self.settings);
		Self::drop_stale_standards(&mut txn.store);
		txn.invalidate(invalidation);
		Ok(())
	}

	/// Null standards that no longer point below their owner
	fn drop_stale_standards(store: &mut ContentStore) {
		let stale: Vec<NodeId> = store
			.nodes
			.values()
			.filter(|node| {
				node.standard
					.is_some_and(|standard| !store.is_descendant(standard, node.id))
			})
			.map(|node| node.id)
			.collect();
		for id in stale {
			if let Some(node) = store.nodes.get_mut(&id) {
				node.standard = None;
			}
		}
	}

	/// Move a node below another parent (the portal with `None`)
	pub async fn reparent(
		&self,
		id: NodeId,
		new_parent: Option<NodeId>,
		principal: &Principal,
	) -> CmsResult<ContentNode> {
		let mut txn = self.begin("reparent").await;
		let result = self
			.reparent_in(&mut txn, id, new_parent, principal)
			.and_then(|_| txn.store.node(id).cloned());
		let node = self.finish(txn, result).await?;
		tracing::info!(node = %id, parent = ?new_parent, slug = %node.slug, "node reparented");
		Ok(node)
	}

	// -- translate ---------------------------------------------------------

	/// Parent of a translation in `language` of a node placed below `parent`
	pub(crate) fn translation_parent(
		store: &ContentStore,
		parent: Option<NodeId>,
		language: &Language,
	) -> Option<NodeId> {
		let parent = parent?;
		if let Some(translated) = store.get_translation(parent, language) {
			return Some(translated.id);
		}
		match store.get(parent) {
			Some(node) if node.language.is_neutral() => Some(parent),
			_ => None,
		}
	}

	pub(crate) fn translate_in(
		&self,
		store: &mut ContentStore,
		canonical: NodeId,
		language: &Language,
		fields: TranslationFields,
		principal: &Principal,
		now: DateTime<Utc>,
	) -> CmsResult<NodeId> {
		let canonical = store
			.canonical_of(canonical)
			.cloned()
			.ok_or_else(|| CmsError::NotFound(format!("node {}", canonical)))?;
		store.check_permission(principal, Target::Node(canonical.id), "edit")?;

		if language.is_neutral() {
			return Err(CmsError::invalid("language", "A translation needs a concrete language."));
		}
		self.ensure_language(language)?;
		if canonical.language.is_neutral() {
			return Err(CmsError::invalid(
				"language",
				"Language-neutral content can't be translated.",
			));
		}
		if canonical.language == *language {
			return Err(CmsError::invalid(
				"language",
				"The translation language equals the canonical language.",
			));
		}
		if fields.title.trim().is_empty() {
			return Err(CmsError::invalid("title", "This field is required."));
		}

		let existing = store
			.translations(canonical.id)
			.into_iter()
			.find(|node| node.language == *language)
			.map(|node| node.id);
		match (existing, fields.id) {
			(Some(existing), Some(id)) if existing != id => {
				return Err(CmsError::invalid(
					"id",
					"The given node is not the translation in this language.",
				));
			}
			(Some(_), None) => {
				return Err(CmsError::invalid(
					"language",
					format!("A translation in '{}' already exists.", language),
				));
			}
			(None, Some(id)) => {
				return Err(CmsError::NotFound(format!("translation {}", id)));
			}
			_ => {}
		}

		let body = fields.body.clone().unwrap_or_else(|| canonical.body.clone());
		if body.kind() != canonical.kind() {
			return Err(CmsError::invalid("body", "A translation keeps the content kind."));
		}
		self.registry.validate_body(&body)?;

		let parent = Self::translation_parent(store, canonical.parent, language);
		let requested = fields
			.slug
			.clone()
			.unwrap_or_else(|| slugify(&fields.title));
		validate_slug(&requested)?;
		let slug = store.unique_slug_for(&requested, parent, language, existing);
		let appended = store.next_position(parent, language, &self.settings);

		let id = match existing {
			Some(id) => {
				let node = store.node_mut(id)?;
				node.title = fields.title;
				node.description = fields.description;
				node.tags = fields.tags;
				node.body = body;
				node.modified_at = now;
				if node.parent != parent {
					node.parent = parent;
					node.position = appended;
				}
				node.slug = slug;
				node.reindex();
				id
			}
			None => {
				let id = Uuid::new_v4();
				let mut node = ContentNode::from_fields(
					id,
					NodeFields {
						title: fields.title,
						slug: Some(slug),
						description: fields.description,
						language: Some(language.clone()),
						tags: fields.tags,
						body,
						..NodeFields::new("", ContentBody::default())
					},
				);
				node.canonical = Some(canonical.id);
				node.parent = parent;
				node.template = canonical.template.clone();
				node.creator = principal.user;
				node.created_at = now;
				node.modified_at = now;
				node.position = appended;
				node.reindex();
				store.nodes.insert(id, node);
				let workflow = store.workflow_name_for(&canonical, self.type_workflow(canonical.kind()));
				store.enter_initial_state(id, workflow.as_deref(), now)?;
				id
			}
		};

		let standard = canonical
			.standard
			.and_then(|standard| store.get_translation(standard, language))
			.map(|node| node.id)
			.filter(|standard| store.is_descendant(*standard, id));
		store.node_mut(id)?.standard = standard;

		store.renumber(parent, language, &self.settings);
		store.record_history(
			id,
			HistoryAction::Translated {
				language: language.to_string(),
			},
			principal,
			now,
		);
		Ok(id)
	}

	/// Create or update the translation of `canonical` in `language`
	pub async fn translate(
		&self,
		canonical: NodeId,
		language: &Language,
		fields: TranslationFields,
		principal: &Principal,
	) -> CmsResult<ContentNode> {
		let mut txn = self.begin("translate").await;
		let result = (|| -> CmsResult<ContentNode> {
			let previous = fields
				.id
				.and_then(|id| txn.store.absolute_path(id))
				.map(Invalidation::Subtree);
			let id = self.translate_in(&mut txn.store, canonical, language, fields, principal, Utc::now())?;
			if let Some(invalidation) = previous {
				txn.invalidate(invalidation);
			}
			txn.store.node(id).cloned()
		})();
		let node = self.finish(txn, result).await?;
		tracing::info!(node = %node.id, canonical = %canonical, language = %language, "translation saved");
		Ok(node)
	}

	// -- queries -----------------------------------------------------------

	pub async fn get(&self, id: NodeId) -> Option<ContentNode> {
		self.store.read().await.get(id).cloned()
	}

	/// Like [`Cms::get`], failing with `NotFound`
	pub async fn node(&self, id: NodeId) -> CmsResult<ContentNode> {
		self.store.read().await.node(id).cloned()
	}

	/// Children of `parent`, ordered by position.
	///
	/// With a principal, only children it may view and that are within their
	/// activity window (always, for superusers) are returned.
	pub async fn children(&self, parent: Option<NodeId>, principal: Option<&Principal>) -> Vec<ContentNode> {
		let store = self.store.read().await;
		let now = Utc::now();
		store
			.children_of(parent)
			.into_iter()
			.filter(|node| match principal {
				None => true,
				Some(principal) => {
					store.has_permission(principal, Target::Node(node.id), "view")
						&& (principal.superuser || node.is_within_window(now))
				}
			})
			.cloned()
			.collect()
	}

	/// Parent first, root last
	pub async fn ancestors(&self, id: NodeId) -> Vec<ContentNode> {
		let store = self.store.read().await;
		store.ancestors(id).into_iter().cloned().collect()
	}

	/// Every node below `id`, parents before children
	pub async fn descendants(&self, id: NodeId) -> Vec<ContentNode> {
		let store = self.store.read().await;
		store
			.descendants(id)
			.into_iter()
			.filter_map(|id| store.get(id).cloned())
			.collect()
	}

	pub async fn translations(&self, canonical: NodeId) -> Vec<ContentNode> {
		let store = self.store.read().await;
		store.translations(canonical).into_iter().cloned().collect()
	}

	pub async fn get_translation(&self, id: NodeId, language: &Language) -> Option<ContentNode> {
		self.store
			.read()
			.await
			.get_translation(id, language)
			.cloned()
	}

	pub async fn canonical_of(&self, id: NodeId) -> Option<ContentNode> {
		self.store.read().await.canonical_of(id).cloned()
	}

	pub async fn has_language(&self, id: NodeId, language: &Language) -> bool {
		self.store.read().await.has_language(id, language)
	}

	pub async fn absolute_path(&self, id: NodeId) -> Option<String> {
		self.store.read().await.absolute_path(id)
	}

	/// Resolve a slug path in `language`. Hits are cached until the subtree
	/// changes; misses are not cached.
	pub async fn resolve_path(&self, path: &str, language: &Language) -> Option<NodeId> {
		let store = self.store.read().await;
		let normalized = normalize_path(path);
		match self.cache.get_path(&normalized, language.as_str()).await {
			Ok(Some(id)) if store.get(id).is_some() => return Some(id),
			Ok(_) => {}
			Err(err) => tracing::warn!(error = %err, "path cache lookup failed"),
		}
		let resolved = store.resolve_path(&normalized, language)?;
		if let Err(err) = self
			.cache
			.put_path(&normalized, language.as_str(), resolved)
			.await
		{
			tracing::warn!(error = %err, "path cache store failed");
		}
		tracing::debug!(path = %normalized, node = %resolved, "path resolved");
		Some(resolved)
	}

	/// Whether comments are allowed, resolving `Default` through the
	/// ancestors up to the portal
	pub async fn are_comments_allowed(&self, id: NodeId) -> CmsResult<bool> {
		let store = self.store.read().await;
		let node = store.node(id)?;
		let chain = std::iter::once(node).chain(store.ancestors(id));
		for node in chain {
			match node.allow_comments {
				CommentPolicy::Yes => return Ok(true),
				CommentPolicy::No => return Ok(false),
				CommentPolicy::Default => {}
			}
		}
		Ok(store.portal.allow_comments)
	}
}

/// `/a/b/` form of a slug path
fn normalize_path(path: &str) -> String {
	let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
	if segments.is_empty() {
		"/".to_string()
	} else {
		format!("/{}/", segments.join("/"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("about/team", "/about/team/")]
	#[case("/about//team/", "/about/team/")]
	#[case("", "/")]
	fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize_path(input), expected);
	}
}
