//! Audit trail of content changes

use crate::NodeId;
use crate::engine::Cms;
use crate::permissions::Principal;
use crate::store::ContentStore;
use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
	Created,
	Edited,
	Transitioned { transition: String, state: String },
	/// The node was created as a copy of `source`
	Copied { source: NodeId },
	Cut,
	Pasted,
	Translated { language: String },
	CheckedOut { working_copy: NodeId },
	CheckedIn,
	Moved { position: i64 },
}

/// A single audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
	pub node: NodeId,
	pub action: HistoryAction,
	pub user: Option<UserId>,
	pub timestamp: DateTime<Utc>,
}

impl ContentStore {
	pub(crate) fn record_history(
		&mut self,
		node: NodeId,
		action: HistoryAction,
		principal: &Principal,
		timestamp: DateTime<Utc>,
	) {
		self.history.push(HistoryEntry {
			node,
			action,
			user: principal.user,
			timestamp,
		});
	}

	/// Records about `node`, oldest first
	pub fn history_of(&self, node: NodeId) -> Vec<&HistoryEntry> {
		self.history.iter().filter(|entry| entry.node == node).collect()
	}
}

impl Cms {
	/// Audit trail of `node`, oldest first
	pub async fn history(&self, node: NodeId) -> Vec<HistoryEntry> {
		self.store
			.read()
			.await
			.history_of(node)
			.into_iter()
			.cloned()
			.collect()
	}
}
