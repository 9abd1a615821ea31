//! Portlets and their slot assignments
//!
//! A portlet is a small configured widget; an assignment places one on a
//! slot of a node or of the portal. Nodes show their own assignments plus
//! those inherited from their ancestors, unless the slot is blocked.

use crate::engine::Cms;
use crate::error::{CmsError, CmsResult};
use crate::permissions::{Principal, Target};
use crate::store::ContentStore;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

/// A kind of portlet and the configuration it accepts
pub trait PortletType: Send + Sync {
	/// Identifier stored on portlets of this type
	fn type_name(&self) -> &str;

	/// Human-readable label
	fn label(&self) -> &str;

	/// Configuration used when none is given
	fn default_config(&self) -> JsonValue {
		JsonValue::Object(Default::default())
	}

	/// Check a configuration before it is stored
	fn validate(&self, config: &JsonValue) -> CmsResult<()>;
}

/// Static text
pub struct TextPortlet;

impl PortletType for TextPortlet {
	fn type_name(&self) -> &str {
		"text"
	}

	fn label(&self) -> &str {
		"Text"
	}

	fn default_config(&self) -> JsonValue {
		serde_json::json!({ "text": "" })
	}

	fn validate(&self, config: &JsonValue) -> CmsResult<()> {
		match config.get("text") {
			Some(JsonValue::String(_)) => Ok(()),
			_ => Err(CmsError::invalid("config", "A text portlet needs a 'text' string.")),
		}
	}
}

/// Navigation tree below a start level
pub struct NavigationPortlet;

impl PortletType for NavigationPortlet {
	fn type_name(&self) -> &str {
		"navigation"
	}

	fn label(&self) -> &str {
		"Navigation"
	}

	fn default_config(&self) -> JsonValue {
		serde_json::json!({ "start_level": 1, "expand_level": 0 })
	}

	fn validate(&self, config: &JsonValue) -> CmsResult<()> {
		for key in ["start_level", "expand_level"] {
			if let Some(value) = config.get(key)
				&& !value.is_u64()
			{
				return Err(CmsError::invalid(
					"config",
					format!("'{}' must be a non-negative integer.", key),
				));
			}
		}
		Ok(())
	}
}

/// Registry of available portlet types
pub struct PortletLibrary {
	types: HashMap<String, Arc<dyn PortletType>>,
}

impl PortletLibrary {
	/// A library holding the built-in text and navigation portlets
	pub fn new() -> Self {
		let mut library = Self {
			types: HashMap::new(),
		};
		library.register(Arc::new(TextPortlet));
		library.register(Arc::new(NavigationPortlet));
		library
	}

	pub fn register(&mut self, portlet_type: Arc<dyn PortletType>) {
		self.types
			.insert(portlet_type.type_name().to_string(), portlet_type);
	}

	pub fn get(&self, type_name: &str) -> Option<&dyn PortletType> {
		self.types.get(type_name).map(|t| t.as_ref())
	}

	pub fn type_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
		names.sort();
		names
	}

	/// Build a validated portlet of `type_name`
	fn create(&self, type_name: &str, title: &str, config: Option<JsonValue>) -> CmsResult<Portlet> {
		let portlet_type = self.get(type_name).ok_or_else(|| {
			CmsError::invalid("portlet_type", format!("Unknown portlet type '{}'.", type_name))
		})?;
		let config = config.unwrap_or_else(|| portlet_type.default_config());
		portlet_type.validate(&config)?;
		Ok(Portlet {
			id: Uuid::new_v4(),
			portlet_type: type_name.to_string(),
			title: title.to_string(),
			config,
		})
	}
}

impl Default for PortletLibrary {
	fn default() -> Self {
		Self::new()
	}
}

/// A configured portlet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portlet {
	pub id: Uuid,
	pub portlet_type: String,
	pub title: String,
	pub config: JsonValue,
}

/// A portlet placed on a slot of a node or the portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortletAssignment {
	pub id: Uuid,
	pub slot: String,
	pub owner: Target,
	pub portlet: Portlet,
	pub position: i64,
}

/// Slots, assignments and slot blockings
#[derive(Debug, Clone, Default)]
pub struct PortletTable {
	pub(crate) slots: BTreeSet<String>,
	pub(crate) assignments: HashMap<Uuid, PortletAssignment>,
	/// (slot, owner): the owner does not inherit portlets for the slot
	pub(crate) blockings: BTreeSet<(String, Target)>,
}

impl PortletTable {
	pub fn slots(&self) -> &BTreeSet<String> {
		&self.slots
	}

	fn ensure_slot(&self, slot: &str) -> CmsResult<()> {
		if self.slots.contains(slot) {
			Ok(())
		} else {
			Err(CmsError::invalid("slot", format!("Unknown slot '{}'.", slot)))
		}
	}

	fn assignment(&self, id: Uuid) -> CmsResult<&PortletAssignment> {
		self.assignments
			.get(&id)
			.ok_or_else(|| CmsError::NotFound(format!("portlet assignment {}", id)))
	}

	/// Assignments made directly on `owner` for `slot`, by position
	pub fn assigned(&self, owner: Target, slot: &str) -> Vec<&PortletAssignment> {
		let mut assigned: Vec<&PortletAssignment> = self
			.assignments
			.values()
			.filter(|a| a.owner == owner && a.slot == slot)
			.collect();
		assigned.sort_by_key(|a| (a.position, a.id));
		assigned
	}

	pub fn is_blocked(&self, owner: Target, slot: &str) -> bool {
		self.blockings.contains(&(slot.to_string(), owner))
	}

	/// Remove every assignment and blocking of `owner`
	pub(crate) fn forget(&mut self, owner: Target) {
		self.assignments.retain(|_, a| a.owner != owner);
		self.blockings.retain(|(_, o)| *o != owner);
	}

	/// Clone the assignments and blockings of `from` onto `to` with new identities
	pub(crate) fn copy_to(&mut self, from: Target, to: Target) -> usize {
		let copies: Vec<PortletAssignment> = self
			.assignments
			.values()
			.filter(|a| a.owner == from)
			.map(|a| PortletAssignment {
				id: Uuid::new_v4(),
				owner: to,
				portlet: Portlet {
					id: Uuid::new_v4(),
					..a.portlet.clone()
				},
				..a.clone()
			})
			.collect();
		let count = copies.len();
		for copy in copies {
			self.assignments.insert(copy.id, copy);
		}
		let blocked: Vec<String> = self
			.blockings
			.iter()
			.filter(|(_, owner)| *owner == from)
			.map(|(slot, _)| slot.clone())
			.collect();
		for slot in blocked {
			self.blockings.insert((slot, to));
		}
		count
	}

	/// Replace the assignments and blockings of `to` by those of `from`
	pub(crate) fn hand_over(&mut self, from: Target, to: Target) {
		self.forget(to);
		for assignment in self.assignments.values_mut() {
			if assignment.owner == from {
				assignment.owner = to;
			}
		}
		let blockings: Vec<(String, Target)> = self
			.blockings
			.iter()
			.filter(|(_, owner)| *owner == from)
			.cloned()
			.collect();
		for (slot, owner) in blockings {
			self.blockings.remove(&(slot.clone(), owner));
			self.blockings.insert((slot, to));
		}
	}
}

impl ContentStore {
	/// Portlets shown on `owner` in `slot`: inherited ones first, then its own
	pub fn portlets_for(&self, owner: Target, slot: &str) -> Vec<&PortletAssignment> {
		let mut portlets = Vec::new();
		if !self.portlets.is_blocked(owner, slot)
			&& let Target::Node(id) = owner
		{
			let parent = self.get(id).map(|node| Target::from(node.parent));
			if let Some(parent) = parent
				&& self.permission_chain(owner).is_some()
			{
				portlets = self.portlets_for(parent, slot);
			}
		}
		portlets.extend(self.portlets.assigned(owner, slot));
		portlets
	}
}

impl Cms {
	/// Make a slot available for assignments
	pub async fn register_slot(&self, slot: &str) -> CmsResult<()> {
		let mut txn = self.begin("register_slot").await;
		txn.store.portlets.slots.insert(slot.to_string());
		txn.commit(&self.cache).await
	}

	/// Place a new portlet at the end of `slot` on `owner`
	pub async fn add_portlet(
		&self,
		owner: impl Into<Target>,
		slot: &str,
		portlet_type: &str,
		title: &str,
		config: Option<JsonValue>,
		principal: &Principal,
	) -> CmsResult<PortletAssignment> {
		let owner = owner.into();
		let mut txn = self.begin("add_portlet").await;
		let result = (|| -> CmsResult<PortletAssignment> {
			txn.store.ensure_target(owner)?;
			txn.store
				.check_permission(principal, owner, Cms::edit_permission(owner))?;
			txn.store.portlets.ensure_slot(slot)?;
			let portlet = self.portlet_library.create(portlet_type, title, config)?;
			let position = txn
				.store
				.portlets
				.assigned(owner, slot)
				.last()
				.map_or(0, |a| a.position)
				+ self.settings.position_step;
			let assignment = PortletAssignment {
				id: Uuid::new_v4(),
				slot: slot.to_string(),
				owner,
				portlet,
				position,
			};
			txn.store
				.portlets
				.assignments
				.insert(assignment.id, assignment.clone());
			Ok(assignment)
		})();
		let assignment = self.finish(txn, result).await?;
		tracing::info!(assignment = %assignment.id, %owner, slot, portlet_type, "portlet added");
		Ok(assignment)
	}

	/// Change the title and/or configuration of an assigned portlet
	pub async fn update_portlet(
		&self,
		assignment: Uuid,
		title: Option<&str>,
		config: Option<JsonValue>,
		principal: &Principal,
	) -> CmsResult<PortletAssignment> {
		let mut txn = self.begin("update_portlet").await;
		let result = (|| -> CmsResult<PortletAssignment> {
			let current = txn.store.portlets.assignment(assignment)?.clone();
			txn.store.check_permission(
				principal,
				current.owner,
				Cms::edit_permission(current.owner),
			)?;
			if let Some(config) = &config {
				let portlet_type = self
					.portlet_library
					.get(&current.portlet.portlet_type)
					.ok_or_else(|| {
						CmsError::invalid("portlet_type", "Portlet type is no longer available.")
					})?;
				portlet_type.validate(config)?;
			}
			let entry = txn
				.store
				.portlets
				.assignments
				.get_mut(&assignment)
				.ok_or_else(|| CmsError::NotFound(format!("portlet assignment {}", assignment)))?;
			if let Some(title) = title {
				entry.portlet.title = title.to_string();
			}
			if let Some(config) = config {
				entry.portlet.config = config;
			}
			Ok(entry.clone())
		})();
		self.finish(txn, result).await
	}

	pub async fn delete_portlet(&self, assignment: Uuid, principal: &Principal) -> CmsResult<()> {
		let mut txn = self.begin("delete_portlet").await;
		let result = (|| -> CmsResult<()> {
			let owner = txn.store.portlets.assignment(assignment)?.owner;
			txn.store
				.check_permission(principal, owner, Cms::edit_permission(owner))?;
			txn.store.portlets.assignments.remove(&assignment);
			Ok(())
		})();
		self.finish(txn, result).await
	}

	/// Stop `owner` from inheriting portlets for `slot`
	pub async fn block_slot(&self, owner: impl Into<Target>, slot: &str, principal: &Principal) -> CmsResult<()> {
		self.set_slot_blocking(owner.into(), slot, principal, true)
			.await
	}

	pub async fn unblock_slot(&self, owner: impl Into<Target>, slot: &str, principal: &Principal) -> CmsResult<()> {
		self.set_slot_blocking(owner.into(), slot, principal, false)
			.await
	}

	async fn set_slot_blocking(
		&self,
		owner: Target,
		slot: &str,
		principal: &Principal,
		blocked: bool,
	) -> CmsResult<()> {
		let mut txn = self.begin("set_slot_blocking").await;
		let result = (|| -> CmsResult<()> {
			txn.store.ensure_target(owner)?;
			txn.store
				.check_permission(principal, owner, Cms::edit_permission(owner))?;
			txn.store.portlets.ensure_slot(slot)?;
			let key = (slot.to_string(), owner);
			if blocked {
				txn.store.portlets.blockings.insert(key);
			} else {
				txn.store.portlets.blockings.remove(&key);
			}
			Ok(())
		})();
		self.finish(txn, result).await
	}

	/// Portlets shown on `owner` in `slot`, inherited ones first
	pub async fn portlets_for(&self, owner: impl Into<Target>, slot: &str) -> Vec<PortletAssignment> {
		self.store
			.read()
			.await
			.portlets_for(owner.into(), slot)
			.into_iter()
			.cloned()
			.collect()
	}
}
