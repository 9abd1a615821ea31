//! Check-out and check-in
//!
//! A working copy is a sibling clone of a node that can be edited without
//! touching the published node. Checking it in moves its content,
//! attachments and portlets onto the base, which keeps its identity and
//! placement, and removes the working copy.

use crate::NodeId;
use crate::cache::Invalidation;
use crate::engine::Cms;
use crate::error::{CmsError, CmsResult};
use crate::history::HistoryAction;
use crate::nodes::ContentNode;
use crate::permissions::{Principal, Target};
use crate::store::ContentStore;
use chrono::Utc;
use uuid::Uuid;

const WORKING_COPY_SUFFIX: &str = "-working-copy";

impl Cms {
	/// Create a working copy of `id` next to it
	pub async fn checkout(&self, id: NodeId, principal: &Principal) -> CmsResult<ContentNode> {
		let mut txn = self.begin("checkout").await;
		let result = async {
			let base = txn.store.node(id)?.clone();
			txn.store
				.check_permission(principal, Target::Node(id), "edit")?;
			if base.is_working_copy() {
				return Err(CmsError::invalid("node", "A working copy can't be checked out."));
			}
			if Self::find_working_copy(&txn.store, id).is_some() {
				return Err(CmsError::invalid("node", "The object is already checked out."));
			}

			let now = Utc::now();
			let store = &mut txn.store;
			let mut copy = Self::clone_record(&base, Uuid::new_v4(), principal, now);
			copy.parent = base.parent;
			copy.working_copy_base = Some(id);
			let candidate = format!("{}{}", base.slug, WORKING_COPY_SUFFIX);
			copy.slug = store.unique_slug_for(&candidate, base.parent, &base.language, None);
			copy.position = store.next_position(base.parent, &base.language, &self.settings);
			let copy_id = copy.id;
			store.nodes.insert(copy_id, copy);

			let workflow = store.workflow_name_for(&base, self.type_workflow(base.kind()));
			store.enter_initial_state(copy_id, workflow.as_deref(), now)?;
			store
				.portlets
				.copy_to(Target::Node(id), Target::Node(copy_id));
			store.record_history(id, HistoryAction::CheckedOut { working_copy: copy_id }, principal, now);
			store.record_history(copy_id, HistoryAction::Copied { source: id }, principal, now);

			txn.copy_attachments(Target::Node(id), Target::Node(copy_id))
				.await?;
			if let Some(path) = txn.store.absolute_path(copy_id) {
				txn.invalidate(Invalidation::Subtree(path));
			}
			txn.store.node(copy_id).cloned()
		}
		.await;
		let copy = self.finish(txn, result).await?;
		tracing::info!(node = %id, working_copy = %copy.id, slug = %copy.slug, "node checked out");
		Ok(copy)
	}

	/// Apply `working_copy` to the node it was checked out from and remove it.
	/// Returns the updated base.
	pub async fn checkin(&self, working_copy: NodeId, principal: &Principal) -> CmsResult<ContentNode> {
		let mut txn = self.begin("checkin").await;
		let result = (|| -> CmsResult<ContentNode> {
			let copy = txn.store.node(working_copy)?.clone();
			let base = copy
				.working_copy_base
				.ok_or_else(|| CmsError::invalid("node", "The object is not a working copy."))?;
			txn.store
				.check_permission(principal, Target::Node(base), "edit")?;
			if !txn.store.children_of(Some(working_copy)).is_empty() {
				return Err(CmsError::invalid(
					"node",
					"A working copy with children can't be checked in.",
				));
			}

			let now = Utc::now();
			let invalidation = Self::path_invalidation(&txn.store, base);
			{
				let node = txn.store.node_mut(base)?;
				node.take_content_from(&copy);
				node.version += 1;
				node.modified_at = now;
			}

			let (base_target, copy_target) = (Target::Node(base), Target::Node(working_copy));
			for replaced in txn.store.detach_attachments(base_target) {
				txn.delete_blob_after_commit(replaced.blob.path);
			}
			txn.store
				.reassign_attachments(copy_target, base_target);
			txn.store.portlets.hand_over(copy_target, base_target);

			Self::remove_node(&mut txn.store, working_copy);
			txn.store
				.renumber(copy.parent, &copy.language, &self.settings);
			txn.store
				.record_history(base, HistoryAction::CheckedIn, principal, now);
			txn.invalidate(invalidation);
			txn.store.node(base).cloned()
		})();
		let base = self.finish(txn, result).await?;
		tracing::info!(node = %base.id, version = base.version, "working copy checked in");
		Ok(base)
	}

	/// The current working copy of `id`, if any
	pub async fn working_copy_of(&self, id: NodeId) -> Option<ContentNode> {
		let store = self.store.read().await;
		Self::find_working_copy(&store, id).cloned()
	}

	fn find_working_copy(store: &ContentStore, id: NodeId) -> Option<&ContentNode> {
		store
			.nodes
			.values()
			.find(|node| node.working_copy_base == Some(id))
	}
}
