//! Copy, cut and paste
//!
//! The clipboard is a plain value owned by the caller's session. Copying or
//! cutting only records the sources; the work happens on paste, in a single
//! transaction. Sources that can't be pasted are skipped and reported, the
//! rest of the batch goes through.
//!
//! A copied node is cloned together with its subtree, its translations, its
//! attachments (with freshly copied payloads) and its portlets. A cut node
//! keeps its identity and everything attached to it.

use crate::NodeId;
use crate::engine::Cms;
use crate::error::{CmsError, CmsResult, ConflictKind};
use crate::history::HistoryAction;
use crate::language::Language;
use crate::nodes::ContentNode;
use crate::permissions::{Principal, Target};
use crate::store::ContentStore;
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardAction {
	Copy,
	Cut,
}

/// Sources waiting to be pasted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Clipboard {
	#[default]
	Empty,
	Holding {
		sources: Vec<NodeId>,
		action: ClipboardAction,
	},
}

impl Clipboard {
	pub fn is_empty(&self) -> bool {
		matches!(self, Clipboard::Empty)
	}

	pub fn sources(&self) -> &[NodeId] {
		match self {
			Clipboard::Empty => &[],
			Clipboard::Holding { sources, .. } => sources,
		}
	}

	pub fn action(&self) -> Option<ClipboardAction> {
		match self {
			Clipboard::Empty => None,
			Clipboard::Holding { action, .. } => Some(*action),
		}
	}

	pub fn clear(&mut self) {
		*self = Clipboard::Empty;
	}
}

/// Per-session state of a request handler
#[derive(Debug, Clone)]
pub struct Session {
	pub principal: Principal,
	pub language: Language,
	pub clipboard: Clipboard,
}

impl Session {
	pub fn new(principal: Principal, language: Language) -> Self {
		Self {
			principal,
			language,
			clipboard: Clipboard::default(),
		}
	}
}

/// An item a batch operation did not process
#[derive(Debug)]
pub struct SkippedItem {
	pub id: NodeId,
	pub reason: CmsError,
}

/// Result of a best-effort batch operation
#[derive(Debug, Default)]
pub struct BatchOutcome {
	/// Ids of the processed items; for pasted copies, the ids of the copies
	pub succeeded: Vec<NodeId>,
	pub skipped: Vec<SkippedItem>,
}

/// Outcome of [`Cms::paste`]
pub type PasteOutcome = BatchOutcome;

impl BatchOutcome {
	pub fn is_complete(&self) -> bool {
		self.skipped.is_empty()
	}

	/// Trailing message for the user
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cms::clipboard::BatchOutcome;
	///
	/// let outcome = BatchOutcome::default();
	/// assert_eq!(outcome.summary(), "0 object(s) processed.");
	/// ```
	pub fn summary(&self) -> String {
		if self.skipped.is_empty() {
			return format!("{} object(s) processed.", self.succeeded.len());
		}
		let reasons: Vec<String> = self
			.skipped
			.iter()
			.map(|item| format!("{}: {}", item.id, item.reason))
			.collect();
		format!(
			"{} object(s) processed; some objects were skipped ({})",
			self.succeeded.len(),
			reasons.join("; ")
		)
	}
}

impl fmt::Display for BatchOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.summary())
	}
}

impl Cms {
	/// Put `sources` on the clipboard for copying; each needs `add`
	pub async fn copy_to_clipboard(
		&self,
		clipboard: &mut Clipboard,
		sources: &[NodeId],
		principal: &Principal,
	) -> CmsResult<()> {
		self.hold(clipboard, sources, principal, ClipboardAction::Copy)
			.await
	}

	/// Put `sources` on the clipboard for moving; each needs `delete`
	pub async fn cut_to_clipboard(
		&self,
		clipboard: &mut Clipboard,
		sources: &[NodeId],
		principal: &Principal,
	) -> CmsResult<()> {
		self.hold(clipboard, sources, principal, ClipboardAction::Cut)
			.await
	}

	async fn hold(
		&self,
		clipboard: &mut Clipboard,
		sources: &[NodeId],
		principal: &Principal,
		action: ClipboardAction,
	) -> CmsResult<()> {
		if sources.is_empty() {
			return Err(CmsError::invalid("sources", "Nothing selected."));
		}
		let permission = match action {
			ClipboardAction::Copy => "add",
			ClipboardAction::Cut => "delete",
		};
		let store = self.store.read().await;
		for source in sources {
			store.node(*source)?;
			store.check_permission(principal, Target::Node(*source), permission)?;
		}
		let mut unique = Vec::with_capacity(sources.len());
		for source in sources {
			if !unique.contains(source) {
				unique.push(*source);
			}
		}
		tracing::debug!(count = unique.len(), ?action, "clipboard filled");
		*clipboard = Clipboard::Holding {
			sources: unique,
			action,
		};
		Ok(())
	}

	/// Paste the clipboard below `target` (the portal with `None`).
	///
	/// A cut clipboard is cleared by the attempt; a copied one stays usable
	/// for further pastes.
	pub async fn paste(
		&self,
		clipboard: &mut Clipboard,
		target: Option<NodeId>,
		principal: &Principal,
	) -> CmsResult<PasteOutcome> {
		let Clipboard::Holding { sources, action } = clipboard.clone() else {
			return Err(CmsError::ClipboardEmpty);
		};
		if action == ClipboardAction::Cut {
			clipboard.clear();
		}

		let mut txn = self.begin("paste").await;
		let result = async {
			if let Some(target) = target {
				txn.store.node(target)?;
			}
			let now = Utc::now();
			let mut outcome = BatchOutcome::default();
			for source in &sources {
				let savepoint = txn.savepoint();
				let attempt = match action {
					ClipboardAction::Copy => self.paste_copy(&mut txn, *source, target, principal, now).await,
					ClipboardAction::Cut => self.paste_cut(&mut txn, *source, target, principal, now),
				};
				match attempt {
					Ok(id) => outcome.succeeded.push(id),
					Err(err) if err.is_recoverable() => {
						tracing::warn!(node = %source, error = %err, "paste skipped source");
						txn.rollback_to(savepoint).await;
						outcome.skipped.push(SkippedItem {
							id: *source,
							reason: err,
						});
					}
					Err(err) => return Err(err),
				}
			}
			txn.store.renumber_children(target, &self.settings);
			Ok(outcome)
		}
		.await;

		let outcome = self.finish(txn, result).await?;
		tracing::info!(
			?action,
			target = ?target,
			pasted = outcome.succeeded.len(),
			skipped = outcome.skipped.len(),
			"clipboard pasted"
		);
		Ok(outcome)
	}

	fn paste_cut(
		&self,
		txn: &mut Transaction<'_>,
		source: NodeId,
		target: Option<NodeId>,
		principal: &Principal,
		now: DateTime<Utc>,
	) -> CmsResult<NodeId> {
		self.reparent_in(txn, source, target, principal)?;
		txn.store
			.record_history(source, HistoryAction::Cut, principal, now);
		txn.store
			.record_history(source, HistoryAction::Pasted, principal, now);
		Ok(source)
	}

	async fn paste_copy(
		&self,
		txn: &mut Transaction<'_>,
		source: NodeId,
		target: Option<NodeId>,
		principal: &Principal,
		now: DateTime<Utc>,
	) -> CmsResult<NodeId> {
		let kind = txn.store.node(source)?.kind().to_string();
		if let Some(target) = target {
			if target == source {
				return Err(CmsError::StructuralConflict(ConflictKind::SelfTarget));
			}
			if txn.store.is_descendant(target, source) {
				return Err(CmsError::StructuralConflict(ConflictKind::Cycle));
			}
		}
		txn.store
			.check_permission(principal, Target::from(target), "add")?;
		self.ensure_allowed_kind(&txn.store, target, &kind)?;

		let copy = self
			.copy_subtree(txn, source, target, principal, now)
			.await?;
		txn.store
			.record_history(copy, HistoryAction::Pasted, principal, now);
		Ok(copy)
	}

	/// A detached copy of `original` under a new identity, reset to a fresh
	/// lifecycle: no workflow state, no publication date, version 1
	pub(crate) fn clone_record(
		original: &ContentNode,
		id: NodeId,
		principal: &Principal,
		now: DateTime<Utc>,
	) -> ContentNode {
		ContentNode {
			id,
			canonical: None,
			parent: None,
			standard: None,
			state: None,
			publication_date: None,
			working_copy_base: None,
			creator: principal.user,
			created_at: now,
			modified_at: now,
			version: 1,
			..original.clone()
		}
	}

	/// Clone `source` with its subtree and translations below `target`.
	/// Returns the id of the copy of `source`.
	async fn copy_subtree(
		&self,
		txn: &mut Transaction<'_>,
		source: NodeId,
		target: Option<NodeId>,
		principal: &Principal,
		now: DateTime<Utc>,
	) -> CmsResult<NodeId> {
		let plan = CopyPlan::new(&txn.store, source);
		let store = &mut txn.store;

		// Nodes and translation links
		for old in plan.order() {
			let original = store.node(old)?.clone();
			let mut copy = Self::clone_record(&original, plan.map[&old], principal, now);
			if plan.translations.contains(&old) {
				copy.canonical = original.canonical.map(|canonical| plan.map[&canonical]);
			}
			store.nodes.insert(copy.id, copy);
		}

		// Parents: walked nodes follow the tree, translations follow their canonical
		for old in &plan.walk {
			let parent = if *old == source {
				target
			} else {
				store
					.node(*old)?
					.parent
					.and_then(|parent| plan.map.get(&parent).copied())
			};
			store.node_mut(plan.map[old])?.parent = parent;
		}
		for old in &plan.translations {
			let copy = plan.map[old];
			let (canonical, language) = {
				let node = store.node(copy)?;
				(node.canonical, node.language.clone())
			};
			let canonical_parent = canonical.and_then(|c| store.get(c)).and_then(|c| c.parent);
			let parent = Self::translation_parent(store, canonical_parent, &language);
			store.node_mut(copy)?.parent = parent;
		}

		// Slugs and positions where the copy landed next to foreign siblings
		for old in plan.order() {
			let copy = plan.map[&old];
			let (slug, parent, language, original_parent) = {
				let node = store.node(copy)?;
				let original = store.node(old)?;
				(
					original.slug.clone(),
					node.parent,
					node.language.clone(),
					original.parent.and_then(|p| plan.map.get(&p).copied()),
				)
			};
			let unique = store.unique_slug_for(&slug, parent, &language, Some(copy));
			let appended = old == source || parent != original_parent;
			let position = if appended {
				Some(store.next_position(parent, &language, &self.settings))
			} else {
				None
			};
			let node = store.node_mut(copy)?;
			node.slug = unique;
			if let Some(position) = position {
				node.position = position;
			}
		}

		// Standards point at the copies of their targets
		for old in plan.order() {
			let copy = plan.map[&old];
			let standard = store
				.node(old)?
				.standard
				.and_then(|standard| plan.map.get(&standard).copied())
				.filter(|standard| store.is_descendant(*standard, copy));
			store.node_mut(copy)?.standard = standard;
		}

		// Workflow, portlets and history
		for old in plan.order() {
			let copy = plan.map[&old];
			let workflow = {
				let node = store.node(copy)?;
				store.workflow_name_for(node, self.type_workflow(node.kind()))
			};
			store.enter_initial_state(copy, workflow.as_deref(), now)?;
			store
				.portlets
				.copy_to(Target::Node(old), Target::Node(copy));
			store.record_history(copy, HistoryAction::Copied { source: old }, principal, now);
		}

		// Attachments, with their payloads
		for old in plan.order() {
			txn.copy_attachments(Target::Node(old), Target::Node(plan.map[&old]))
				.await?;
		}

		tracing::debug!(
			source = %source,
			copy = %plan.map[&source],
			nodes = plan.map.len(),
			"subtree copied"
		);
		Ok(plan.map[&source])
	}
}

/// Which nodes a subtree copy clones, and under which new ids
struct CopyPlan {
	/// Nodes cloned through the tree: the source subtree, then the
	/// subtrees hanging below copied translations
	walk: Vec<NodeId>,
	/// Translations of walked canonical nodes, cloned through their canonical
	translations: Vec<NodeId>,
	map: HashMap<NodeId, NodeId>,
}

impl CopyPlan {
	fn new(store: &ContentStore, source: NodeId) -> Self {
		let mut subtree = vec![source];
		subtree.extend(store.descendants(source));
		let members: HashSet<NodeId> = subtree.iter().copied().collect();

		let translated_inside = |id: &NodeId| {
			store
				.get(*id)
				.and_then(|node| node.canonical)
				.is_some_and(|canonical| members.contains(&canonical))
		};
		let mut walk: Vec<NodeId> = subtree
			.iter()
			.copied()
			.filter(|id| *id == source || !translated_inside(id))
			.collect();

		let mut seen: HashSet<NodeId> = walk.iter().copied().collect();
		let mut translations = Vec::new();
		// Translated nodes below a translation wait until every canonical is planned
		let mut deferred = Vec::new();
		let mut cursor = 0;
		while cursor < walk.len() {
			let id = walk[cursor];
			cursor += 1;
			if !store.get(id).is_some_and(ContentNode::is_canonical) {
				continue;
			}
			for translation in store.translations(id) {
				if !seen.insert(translation.id) {
					continue;
				}
				translations.push(translation.id);
				for below in store.descendants(translation.id) {
					if seen.contains(&below) {
						continue;
					}
					if store.get(below).is_some_and(|node| node.canonical.is_some()) {
						deferred.push(below);
					} else {
						seen.insert(below);
						walk.push(below);
					}
				}
			}
		}
		for id in deferred {
			if seen.insert(id) {
				walk.push(id);
			}
		}

		let map = walk
			.iter()
			.chain(translations.iter())
			.map(|id| (*id, Uuid::new_v4()))
			.collect();
		Self {
			walk,
			translations,
			map,
		}
	}

	fn order(&self) -> Vec<NodeId> {
		self.walk
			.iter()
			.chain(self.translations.iter())
			.copied()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cut_clipboard_reports_action() {
		let id = Uuid::new_v4();
		let mut clipboard = Clipboard::Holding {
			sources: vec![id],
			action: ClipboardAction::Cut,
		};

		assert_eq!(clipboard.action(), Some(ClipboardAction::Cut));
		assert_eq!(clipboard.sources(), &[id]);

		clipboard.clear();
		assert!(clipboard.is_empty());
		assert!(clipboard.sources().is_empty());
	}

	#[test]
	fn test_summary_mentions_skipped() {
		let id = Uuid::new_v4();
		let outcome = BatchOutcome {
			succeeded: vec![Uuid::new_v4()],
			skipped: vec![SkippedItem {
				id,
				reason: CmsError::NotFound(format!("node {}", id)),
			}],
		};

		let summary = outcome.summary();

		assert!(summary.starts_with("1 object(s) processed; some objects were skipped"));
		assert!(summary.contains(&id.to_string()));
		assert!(!outcome.is_complete());
	}
}
