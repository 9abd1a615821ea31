//! The content store
//!
//! A [`ContentStore`] holds the whole tree together with everything attached
//! to it. Readers share it through the engine's lock; writers stage their
//! changes on a copy inside a [`Transaction`](crate::transaction::Transaction)
//! and swap it in on commit, after [`ContentStore::verify_integrity`] passed.

use crate::NodeId;
use crate::error::{CmsError, CmsResult};
use crate::history::HistoryEntry;
use crate::language::Language;
use crate::media::Attachment;
use crate::nodes::{ContentNode, Portal};
use crate::permissions::{PermissionTable, Target};
use crate::portlets::PortletTable;
use crate::slug::unique_slug;
use crate::workflow::WorkflowDefinition;
use canopy_conf::Settings;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Tree, permissions, workflows, attachments, portlets and history
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
	pub(crate) portal: Portal,
	pub(crate) nodes: HashMap<NodeId, ContentNode>,
	pub(crate) permissions: PermissionTable,
	pub(crate) workflows: BTreeMap<String, WorkflowDefinition>,
	pub(crate) attachments: HashMap<Uuid, Attachment>,
	pub(crate) portlets: PortletTable,
	pub(crate) history: Vec<HistoryEntry>,
}

impl ContentStore {
	pub fn new(settings: &Settings) -> Self {
		Self {
			permissions: PermissionTable::new(&settings.anonymous_role, &settings.owner_role),
			..Default::default()
		}
	}

	pub fn portal(&self) -> &Portal {
		&self.portal
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
		self.nodes.get(&id)
	}

	/// Like [`ContentStore::get`], failing with `NotFound`
	pub fn node(&self, id: NodeId) -> CmsResult<&ContentNode> {
		self.nodes
			.get(&id)
			.ok_or_else(|| CmsError::NotFound(format!("node {}", id)))
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> CmsResult<&mut ContentNode> {
		self.nodes
			.get_mut(&id)
			.ok_or_else(|| CmsError::NotFound(format!("node {}", id)))
	}

	/// Children of `parent` (roots with `None`) in every language, ordered by
	/// position, then creation time
	pub fn children_of(&self, parent: Option<NodeId>) -> Vec<&ContentNode> {
		let mut children: Vec<&ContentNode> = self
			.nodes
			.values()
			.filter(|node| node.parent == parent)
			.collect();
		children.sort_by(|a, b| {
			a.position
				.cmp(&b.position)
				.then(a.created_at.cmp(&b.created_at))
				.then(a.id.cmp(&b.id))
		});
		children
	}

	/// Parent first, root last
	pub fn ancestors(&self, id: NodeId) -> Vec<&ContentNode> {
		let mut ancestors = Vec::new();
		let mut seen = HashSet::from([id]);
		let mut current = self.get(id).and_then(|node| node.parent);
		while let Some(parent) = current {
			if !seen.insert(parent) {
				break;
			}
			let Some(node) = self.get(parent) else {
				break;
			};
			ancestors.push(node);
			current = node.parent;
		}
		ancestors
	}

	/// Every node below `id`, parents before their children
	pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
		let mut result = Vec::new();
		let mut seen = HashSet::from([id]);
		let mut stack: Vec<NodeId> = self
			.children_of(Some(id))
			.into_iter()
			.rev()
			.map(|node| node.id)
			.collect();
		while let Some(current) = stack.pop() {
			if !seen.insert(current) {
				continue;
			}
			result.push(current);
			stack.extend(
				self.children_of(Some(current))
					.into_iter()
					.rev()
					.map(|node| node.id),
			);
		}
		result
	}

	/// Whether `candidate` lies strictly below `ancestor`
	pub fn is_descendant(&self, candidate: NodeId, ancestor: NodeId) -> bool {
		self.ancestors(candidate)
			.iter()
			.any(|node| node.id == ancestor)
	}

	/// Translations pointing at `canonical`
	pub fn translations(&self, canonical: NodeId) -> Vec<&ContentNode> {
		let mut translations: Vec<&ContentNode> = self
			.nodes
			.values()
			.filter(|node| node.canonical == Some(canonical))
			.collect();
		translations.sort_by(|a, b| a.language.cmp(&b.language));
		translations
	}

	/// The canonical node of `id` (itself when canonical)
	pub fn canonical_of(&self, id: NodeId) -> Option<&ContentNode> {
		let node = self.get(id)?;
		match node.canonical {
			Some(canonical) => self.get(canonical),
			None => Some(node),
		}
	}

	/// The member of `id`'s translation group in `language`
	pub fn get_translation(&self, id: NodeId, language: &Language) -> Option<&ContentNode> {
		let canonical = self.canonical_of(id)?;
		if canonical.language == *language {
			return Some(canonical);
		}
		self.translations(canonical.id)
			.into_iter()
			.find(|node| node.language == *language)
	}

	pub fn has_language(&self, id: NodeId, language: &Language) -> bool {
		self.get_translation(id, language).is_some()
	}

	/// `/slug/slug/` path from the portal, `None` for a broken chain
	pub fn absolute_path(&self, id: NodeId) -> Option<String> {
		let node = self.get(id)?;
		let ancestors = self.ancestors(id);
		let root = ancestors.last().copied().unwrap_or(node);
		if root.parent.is_some() {
			return None;
		}
		let mut path = String::from("/");
		for ancestor in ancestors.iter().rev() {
			path.push_str(&ancestor.slug);
			path.push('/');
		}
		path.push_str(&node.slug);
		path.push('/');
		Some(path)
	}

	/// Walk `path` slug by slug, considering only content visible in `language`
	pub fn resolve_path(&self, path: &str, language: &Language) -> Option<NodeId> {
		let mut current: Option<NodeId> = None;
		let mut matched = false;
		for segment in path.split('/').filter(|segment| !segment.is_empty()) {
			let next = self
				.children_of(current)
				.into_iter()
				.filter(|node| node.slug == segment && node.language.visible_in(language))
				.min_by_key(|node| node.language.is_neutral())?;
			current = Some(next.id);
			matched = true;
		}
		if matched { current } else { None }
	}

	/// `candidate`, or the first free variant of it, among the children of
	/// `parent` that compete with `language`
	pub(crate) fn unique_slug_for(
		&self,
		candidate: &str,
		parent: Option<NodeId>,
		language: &Language,
		exclude: Option<NodeId>,
	) -> String {
		let siblings = self
			.children_of(parent)
			.into_iter()
			.filter(|node| Some(node.id) != exclude)
			.map(|node| (node.slug.as_str(), &node.language));
		unique_slug(candidate, language, siblings)
	}

	/// Position after the last sibling sharing an ordering with `language`
	pub(crate) fn next_position(
		&self,
		parent: Option<NodeId>,
		language: &Language,
		settings: &Settings,
	) -> i64 {
		self.nodes
			.values()
			.filter(|node| {
				node.parent == parent
					&& node
						.language
						.shares_positions_with(language, &settings.language_code)
			})
			.map(|node| node.position)
			.max()
			.map_or(settings.position_step, |max| max + settings.position_step)
	}

	/// Rewrite the positions of one sibling group to `step, 2*step, ...`,
	/// keeping the current order and breaking ties by title, then creation time
	pub(crate) fn renumber(&mut self, parent: Option<NodeId>, language: &Language, settings: &Settings) {
		let mut group: Vec<_> = self
			.nodes
			.values()
			.filter(|node| {
				node.parent == parent
					&& node
						.language
						.shares_positions_with(language, &settings.language_code)
			})
			.map(|node| (node.position, node.title.clone(), node.created_at, node.id))
			.collect();
		group.sort();
		for (index, (_, _, _, id)) in group.into_iter().enumerate() {
			if let Some(node) = self.nodes.get_mut(&id) {
				node.position = (index as i64 + 1) * settings.position_step;
			}
		}
	}

	/// Renumber every sibling group below `parent`
	pub(crate) fn renumber_children(&mut self, parent: Option<NodeId>, settings: &Settings) {
		let mut languages: Vec<Language> = self
			.nodes
			.values()
			.filter(|node| node.parent == parent)
			.map(|node| node.language.clone())
			.collect();
		languages.sort();
		languages.dedup();
		for language in languages {
			self.renumber(parent, &language, settings);
		}
	}

	/// Check the structural invariants of the whole store
	pub fn verify_integrity(&self) -> CmsResult<()> {
		let fail = |message: String| Err(CmsError::Integrity(message));

		let mut slugs: HashMap<(Option<NodeId>, &str), Vec<(&Language, NodeId)>> = HashMap::new();
		let mut translations: HashSet<(NodeId, &Language)> = HashSet::new();

		for node in self.nodes.values() {
			if let Some(parent) = node.parent
				&& !self.nodes.contains_key(&parent)
			{
				return fail(format!("node {} has a dangling parent {}", node.id, parent));
			}
			if self.chain_length(node.id) == usize::MAX {
				return fail(format!("node {} is part of a parent cycle", node.id));
			}
			if let Some(standard) = node.standard
				&& !self.is_descendant(standard, node.id)
			{
				return fail(format!("standard of node {} is not a descendant", node.id));
			}
			if let Some(canonical) = node.canonical {
				match self.get(canonical) {
					None => return fail(format!("node {} has a dangling canonical", node.id)),
					Some(target) if target.canonical.is_some() || target.id == node.id => {
						return fail(format!("translations of node {} chain", node.id));
					}
					Some(_) => {}
				}
				if !translations.insert((canonical, &node.language)) {
					return fail(format!(
						"node {} has more than one translation in '{}'",
						canonical, node.language
					));
				}
			}
			if let Some(base) = node.working_copy_base
				&& !self.nodes.contains_key(&base)
			{
				return fail(format!("working copy {} lost its base", node.id));
			}

			let competitors = slugs.entry((node.parent, node.slug.as_str())).or_default();
			if let Some((_, other)) = competitors
				.iter()
				.find(|(language, _)| language.overlaps(&node.language))
			{
				return fail(format!(
					"slug '{}' is used by nodes {} and {}",
					node.slug, other, node.id
				));
			}
			competitors.push((&node.language, node.id));
		}

		if let Some(standard) = self.portal.standard
			&& !self.nodes.contains_key(&standard)
		{
			return fail("portal standard is dangling".to_string());
		}
		for attachment in self.attachments.values() {
			if !self.target_exists(attachment.owner) {
				return fail(format!("attachment {} has no owner", attachment.id));
			}
		}
		for assignment in self.portlets.assignments.values() {
			if !self.target_exists(assignment.owner) {
				return fail(format!("portlet assignment {} has no owner", assignment.id));
			}
		}
		let rows_resolve = self
			.permissions
			.grants
			.iter()
			.map(|(target, _, _)| *target)
			.chain(self.permissions.blocks.iter().map(|(target, _)| *target))
			.chain(self.permissions.local_roles.iter().map(|(target, _, _)| *target))
			.all(|target| self.target_exists(target));
		if !rows_resolve {
			return fail("permission rows refer to a missing object".to_string());
		}
		Ok(())
	}

	fn target_exists(&self, target: Target) -> bool {
		match target {
			Target::Portal => true,
			Target::Node(id) => self.nodes.contains_key(&id),
		}
	}

	/// Number of parent hops up to the portal, stopping on a repeat
	fn chain_length(&self, id: NodeId) -> usize {
		let mut length = 0;
		let mut current = self.get(id).and_then(|node| node.parent);
		while let Some(parent) = current {
			if parent == id || length > self.nodes.len() {
				return usize::MAX;
			}
			length += 1;
			current = self.get(parent).and_then(|node| node.parent);
		}
		length
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::nodes::NodeFields;

	fn add(store: &mut ContentStore, parent: Option<NodeId>, slug: &str, language: Language) -> NodeId {
		let id = Uuid::new_v4();
		let mut node = ContentNode::from_fields(id, NodeFields::page(slug).with_slug(slug));
		node.parent = parent;
		node.language = language;
		store.nodes.insert(id, node);
		id
	}

	#[test]
	fn test_absolute_path_and_resolution() {
		let mut store = ContentStore::default();
		let about = add(&mut store, None, "about", Language::Neutral);
		let team = add(&mut store, Some(about), "team", Language::code("en"));

		assert_eq!(store.absolute_path(team).as_deref(), Some("/about/team/"));
		assert_eq!(store.resolve_path("/about/team/", &Language::code("en")), Some(team));
		assert_eq!(store.resolve_path("/about/team", &Language::code("de")), None);
		assert_eq!(store.resolve_path("/", &Language::code("en")), None);
	}

	#[test]
	fn test_overlapping_slugs_fail_integrity() {
		let mut store = ContentStore::default();
		add(&mut store, None, "news", Language::Neutral);
		add(&mut store, None, "news", Language::code("de"));

		assert!(matches!(store.verify_integrity(), Err(CmsError::Integrity(_))));
	}

	#[test]
	fn test_distinct_languages_share_slug() {
		let mut store = ContentStore::default();
		add(&mut store, None, "news", Language::code("en"));
		add(&mut store, None, "news", Language::code("de"));

		assert!(store.verify_integrity().is_ok());
	}

	#[test]
	fn test_cycle_fails_integrity() {
		let mut store = ContentStore::default();
		let a = add(&mut store, None, "a", Language::Neutral);
		let b = add(&mut store, Some(a), "b", Language::Neutral);
		store.nodes.get_mut(&a).unwrap().parent = Some(b);

		assert!(store.verify_integrity().is_err());
		assert_eq!(store.absolute_path(b), None);
	}

	#[test]
	fn test_renumber_breaks_ties_by_title() {
		let settings = Settings::default();
		let mut store = ContentStore::default();
		let b = add(&mut store, None, "b", Language::Neutral);
		let a = add(&mut store, None, "a", Language::code("en"));
		let other = add(&mut store, None, "c", Language::code("de"));
		for id in [a, b, other] {
			store.nodes.get_mut(&id).unwrap().position = 5;
		}

		store.renumber(None, &Language::Neutral, &settings);

		assert_eq!(store.get(a).unwrap().position, 10);
		assert_eq!(store.get(b).unwrap().position, 20);
		assert_eq!(store.get(other).unwrap().position, 5);
	}
}
