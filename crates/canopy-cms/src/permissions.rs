//! Permission lattice
//!
//! A permission is granted to roles on an object ([`Target`]). Lookups climb
//! from the object through its parents to the portal and stop at the first
//! object granting the permission to one of the principal's roles, or at an
//! object blocking inheritance of that permission.

use crate::cache::Invalidation;
use crate::engine::Cms;
use crate::error::{CmsError, CmsResult};
use crate::store::ContentStore;
use crate::{GroupId, NodeId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use uuid::Uuid;

/// Object permissions are attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Target {
	Portal,
	Node(NodeId),
}

impl Target {
	pub fn node(&self) -> Option<NodeId> {
		match self {
			Target::Portal => None,
			Target::Node(id) => Some(*id),
		}
	}
}

impl From<NodeId> for Target {
	fn from(id: NodeId) -> Self {
		Target::Node(id)
	}
}

impl From<Option<NodeId>> for Target {
	fn from(id: Option<NodeId>) -> Self {
		id.map_or(Target::Portal, Target::Node)
	}
}

impl fmt::Display for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Target::Portal => f.write_str("portal"),
			Target::Node(id) => write!(f, "node {}", id),
		}
	}
}

/// Holder of a local role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Actor {
	User(UserId),
	Group(GroupId),
}

/// The acting user as resolved by the request layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
	/// `None` for anonymous requests
	pub user: Option<UserId>,
	pub groups: Vec<GroupId>,
	/// Roles held globally, regardless of the object
	pub roles: BTreeSet<String>,
	pub superuser: bool,
}

impl Principal {
	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn user(id: UserId) -> Self {
		Self {
			user: Some(id),
			..Default::default()
		}
	}

	/// An authenticated principal passing every permission check
	pub fn superuser() -> Self {
		Self {
			user: Some(Uuid::new_v4()),
			superuser: true,
			..Default::default()
		}
	}

	pub fn with_group(mut self, group: GroupId) -> Self {
		self.groups.push(group);
		self
	}

	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.roles.insert(role.into());
		self
	}

	pub fn is_authenticated(&self) -> bool {
		self.user.is_some()
	}

	/// Stable text identifying everything that influences a permission decision
	pub(crate) fn cache_key(&self) -> String {
		let user = self
			.user
			.map_or_else(|| "anon".to_string(), |id| id.to_string());
		let mut groups: Vec<String> = self.groups.iter().map(Uuid::to_string).collect();
		groups.sort();
		let roles: Vec<&str> = self.roles.iter().map(String::as_str).collect();
		format!(
			"{}|{}|{}|{}",
			user,
			groups.join(","),
			roles.join(","),
			self.superuser
		)
	}

	fn actors(&self) -> Vec<Actor> {
		self.user
			.map(Actor::User)
			.into_iter()
			.chain(self.groups.iter().copied().map(Actor::Group))
			.collect()
	}
}

/// Grants, inheritance blocks and local roles of the whole tree
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
	pub(crate) roles: BTreeSet<String>,
	pub(crate) permissions: BTreeSet<String>,
	pub(crate) grants: HashSet<(Target, String, String)>,
	pub(crate) blocks: HashSet<(Target, String)>,
	pub(crate) local_roles: BTreeSet<(Target, Actor, String)>,
	pub(crate) anonymous_role: String,
	pub(crate) owner_role: String,
}

impl PermissionTable {
	pub(crate) fn new(anonymous_role: &str, owner_role: &str) -> Self {
		Self {
			anonymous_role: anonymous_role.to_string(),
			owner_role: owner_role.to_string(),
			..Default::default()
		}
	}

	pub fn roles(&self) -> &BTreeSet<String> {
		&self.roles
	}

	pub fn permissions(&self) -> &BTreeSet<String> {
		&self.permissions
	}

	pub fn has_grant(&self, target: Target, role: &str, permission: &str) -> bool {
		self.grants
			.contains(&(target, role.to_string(), permission.to_string()))
	}

	pub fn is_blocked(&self, target: Target, permission: &str) -> bool {
		self.blocks.contains(&(target, permission.to_string()))
	}

	/// Roles granted `permission` directly on `target`
	pub fn granted_roles(&self, target: Target, permission: &str) -> BTreeSet<String> {
		self.grants
			.iter()
			.filter(|(t, _, p)| *t == target && p == permission)
			.map(|(_, role, _)| role.clone())
			.collect()
	}

	pub(crate) fn ensure_role(&self, role: &str) -> CmsResult<()> {
		if self.roles.contains(role) {
			Ok(())
		} else {
			Err(CmsError::invalid("role", format!("Unknown role '{}'.", role)))
		}
	}

	pub(crate) fn ensure_permission(&self, permission: &str) -> CmsResult<()> {
		if self.permissions.contains(permission) {
			Ok(())
		} else {
			Err(CmsError::invalid(
				"permission",
				format!("Unknown permission '{}'.", permission),
			))
		}
	}

	/// Drop every row scoped to `target`
	pub(crate) fn forget(&mut self, target: Target) {
		self.grants.retain(|(t, _, _)| *t != target);
		self.blocks.retain(|(t, _)| *t != target);
		self.local_roles.retain(|(t, _, _)| *t != target);
	}
}

impl ContentStore {
	/// `target` followed by its ancestors up to and including the portal.
	///
	/// `None` when the chain is broken by a dangling parent or a cycle.
	pub(crate) fn permission_chain(&self, target: Target) -> Option<Vec<Target>> {
		let mut chain = Vec::new();
		let mut current = target;
		loop {
			chain.push(current);
			match current {
				Target::Portal => return Some(chain),
				Target::Node(id) => {
					let node = self.get(id)?;
					if chain.len() > self.nodes.len() + 1 {
						return None;
					}
					current = Target::from(node.parent);
				}
			}
		}
	}

	/// Roles the principal holds on `target`
	pub fn effective_roles(&self, principal: &Principal, target: Target) -> Option<BTreeSet<String>> {
		let chain = self.permission_chain(target)?;
		let table = &self.permissions;

		let mut roles = principal.roles.clone();
		roles.insert(table.anonymous_role.clone());

		if let (Some(user), Some(id)) = (principal.user, target.node())
			&& self.get(id).and_then(|node| node.creator) == Some(user)
		{
			roles.insert(table.owner_role.clone());
		}

		let actors = principal.actors();
		for (t, actor, role) in &table.local_roles {
			if chain.contains(t) && actors.contains(actor) {
				roles.insert(role.clone());
			}
		}
		Some(roles)
	}

	/// Whether the principal holds `permission` on `target`.
	///
	/// A broken ancestor chain denies.
	pub fn has_permission(&self, principal: &Principal, target: Target, permission: &str) -> bool {
		if principal.superuser {
			return true;
		}
		let Some(chain) = self.permission_chain(target) else {
			tracing::debug!(%target, permission, "permission chain broken, denying");
			return false;
		};
		let Some(roles) = self.effective_roles(principal, target) else {
			return false;
		};

		let table = &self.permissions;
		for object in chain {
			if roles
				.iter()
				.any(|role| table.has_grant(object, role, permission))
			{
				return true;
			}
			if table.is_blocked(object, permission) {
				return false;
			}
		}
		false
	}

	pub(crate) fn check_permission(
		&self,
		principal: &Principal,
		target: Target,
		permission: &str,
	) -> CmsResult<()> {
		if self.has_permission(principal, target, permission) {
			Ok(())
		} else {
			Err(CmsError::denied(permission, target))
		}
	}

	pub(crate) fn ensure_target(&self, target: Target) -> CmsResult<()> {
		match target {
			Target::Portal => Ok(()),
			Target::Node(id) => self.node(id).map(|_| ()),
		}
	}

	/// Cache entries affected by a permission change on `target`
	pub(crate) fn permission_invalidation(&self, target: Target) -> Invalidation {
		match target {
			Target::Portal => Invalidation::AllPermissions,
			Target::Node(id) => self
				.absolute_path(id)
				.map_or(Invalidation::AllPermissions, Invalidation::Subtree),
		}
	}
}

impl Cms {
	/// Make a role available for grants
	pub async fn register_role(&self, role: &str) -> CmsResult<()> {
		let mut txn = self.begin("register_role").await;
		txn.store.permissions.roles.insert(role.to_string());
		txn.commit(&self.cache).await
	}

	/// Make a permission codename available for grants
	pub async fn register_permission(&self, codename: &str) -> CmsResult<()> {
		let mut txn = self.begin("register_permission").await;
		txn.store.permissions.permissions.insert(codename.to_string());
		txn.commit(&self.cache).await
	}

	pub async fn roles(&self) -> BTreeSet<String> {
		self.store.read().await.permissions.roles.clone()
	}

	/// Grant `permission` to `role` on `target`. Granting twice is a no-op.
	pub async fn grant(&self, target: impl Into<Target>, role: &str, permission: &str) -> CmsResult<()> {
		let target = target.into();
		let mut txn = self.begin("grant").await;
		let result = (|| -> CmsResult<Invalidation> {
			let store = &mut txn.store;
			store.ensure_target(target)?;
			store.permissions.ensure_role(role)?;
			store.permissions.ensure_permission(permission)?;
			store
				.permissions
				.grants
				.insert((target, role.to_string(), permission.to_string()));
			Ok(store.permission_invalidation(target))
		})();
		let result = result.map(|invalidation| txn.invalidate(invalidation));
		self.finish(txn, result).await?;
		tracing::info!(%target, role, permission, "permission granted");
		Ok(())
	}

	/// Remove a grant. Removing an absent grant is a no-op.
	pub async fn remove_grant(
		&self,
		target: impl Into<Target>,
		role: &str,
		permission: &str,
	) -> CmsResult<()> {
		let target = target.into();
		let mut txn = self.begin("remove_grant").await;
		let removed = txn
			.store
			.permissions
			.grants
			.remove(&(target, role.to_string(), permission.to_string()));
		if removed {
			let invalidation = txn.store.permission_invalidation(target);
			txn.invalidate(invalidation);
		}
		txn.commit(&self.cache).await
	}

	/// Stop lookups of `permission` from climbing above `target`
	pub async fn add_inheritance_block(&self, target: impl Into<Target>, permission: &str) -> CmsResult<()> {
		let target = target.into();
		let mut txn = self.begin("add_inheritance_block").await;
		let result = (|| -> CmsResult<Invalidation> {
			let store = &mut txn.store;
			store.ensure_target(target)?;
			store.permissions.ensure_permission(permission)?;
			store
				.permissions
				.blocks
				.insert((target, permission.to_string()));
			Ok(store.permission_invalidation(target))
		})();
		let result = result.map(|invalidation| txn.invalidate(invalidation));
		self.finish(txn, result).await
	}

	pub async fn remove_inheritance_block(
		&self,
		target: impl Into<Target>,
		permission: &str,
	) -> CmsResult<()> {
		let target = target.into();
		let mut txn = self.begin("remove_inheritance_block").await;
		if txn
			.store
			.permissions
			.blocks
			.remove(&(target, permission.to_string()))
		{
			let invalidation = txn.store.permission_invalidation(target);
			txn.invalidate(invalidation);
		}
		txn.commit(&self.cache).await
	}

	/// Assign `role` to a user or group on `target` and everything below it
	pub async fn add_local_role(&self, target: impl Into<Target>, actor: Actor, role: &str) -> CmsResult<()> {
		let target = target.into();
		let mut txn = self.begin("add_local_role").await;
		let result = (|| -> CmsResult<Invalidation> {
			let store = &mut txn.store;
			store.ensure_target(target)?;
			store.permissions.ensure_role(role)?;
			store
				.permissions
				.local_roles
				.insert((target, actor, role.to_string()));
			Ok(store.permission_invalidation(target))
		})();
		let result = result.map(|invalidation| txn.invalidate(invalidation));
		self.finish(txn, result).await
	}

	pub async fn remove_local_role(
		&self,
		target: impl Into<Target>,
		actor: Actor,
		role: &str,
	) -> CmsResult<()> {
		let target = target.into();
		let mut txn = self.begin("remove_local_role").await;
		if txn
			.store
			.permissions
			.local_roles
			.remove(&(target, actor, role.to_string()))
		{
			let invalidation = txn.store.permission_invalidation(target);
			txn.invalidate(invalidation);
		}
		txn.commit(&self.cache).await
	}

	/// Roles assigned directly on `target`, per user or group
	pub async fn local_roles(&self, target: impl Into<Target>) -> BTreeMap<Actor, Vec<String>> {
		let target = target.into();
		let store = self.store.read().await;
		let mut result: BTreeMap<Actor, Vec<String>> = BTreeMap::new();
		for (t, actor, role) in &store.permissions.local_roles {
			if *t == target {
				result.entry(*actor).or_default().push(role.clone());
			}
		}
		result
	}

	/// Whether the principal holds `permission` on `target`.
	///
	/// Decisions are cached per node path and invalidated when grants, blocks,
	/// local roles, workflow states or the tree shape change.
	pub async fn has_permission(
		&self,
		principal: &Principal,
		target: impl Into<Target>,
		permission: &str,
	) -> bool {
		let target = target.into();
		if principal.superuser {
			return true;
		}
		let store = self.store.read().await;
		let path = match target {
			Target::Portal => Some("/#portal".to_string()),
			Target::Node(id) => store.absolute_path(id),
		};
		let Some(path) = path else {
			return false;
		};

		let key = format!("{}#{}#{}#{}", path, target, principal.cache_key(), permission);
		match self.cache.get_acl(&key).await {
			Ok(Some(decision)) => return decision,
			Ok(None) => {}
			Err(err) => tracing::warn!(error = %err, "permission cache lookup failed"),
		}

		let decision = store.has_permission(principal, target, permission);
		if let Err(err) = self.cache.put_acl(&key, decision).await {
			tracing::warn!(error = %err, "permission cache store failed");
		}
		tracing::debug!(%target, permission, decision, "permission resolved");
		decision
	}

	/// Like [`Cms::has_permission`], failing with `PermissionDenied`
	pub async fn check_permission(
		&self,
		principal: &Principal,
		target: impl Into<Target>,
		permission: &str,
	) -> CmsResult<()> {
		let target = target.into();
		if self.has_permission(principal, target, permission).await {
			Ok(())
		} else {
			Err(CmsError::denied(permission, target))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::nodes::{ContentNode, NodeFields};

	#[test]
	fn test_principal_cache_key_ignores_group_order() {
		let a = Uuid::new_v4();
		let b = Uuid::new_v4();
		let user = Uuid::new_v4();

		let first = Principal::user(user).with_group(a).with_group(b);
		let second = Principal::user(user).with_group(b).with_group(a);

		assert_eq!(first.cache_key(), second.cache_key());
		assert_ne!(first.cache_key(), Principal::anonymous().cache_key());
	}

	fn viewable_store() -> ContentStore {
		let mut store = ContentStore {
			permissions: PermissionTable::new("Anonymous", "Owner"),
			..Default::default()
		};
		store.permissions.grants.insert((
			Target::Portal,
			"Anonymous".to_string(),
			"view".to_string(),
		));
		store
	}

	fn insert_page(store: &mut ContentStore, parent: Option<NodeId>) -> NodeId {
		let id = Uuid::new_v4();
		let mut node = ContentNode::from_fields(id, NodeFields::page("Page"));
		node.parent = parent;
		store.nodes.insert(id, node);
		id
	}

	#[test]
	fn test_intact_chain_inherits_portal_grant() {
		let mut store = viewable_store();
		let parent = insert_page(&mut store, None);
		let child = insert_page(&mut store, Some(parent));

		assert!(store.has_permission(&Principal::anonymous(), Target::Node(child), "view"));
	}

	#[test]
	fn test_dangling_parent_denies() {
		let mut store = viewable_store();
		let orphan = insert_page(&mut store, Some(Uuid::new_v4()));
		let below = insert_page(&mut store, Some(orphan));

		for id in [orphan, below] {
			assert!(!store.has_permission(&Principal::anonymous(), Target::Node(id), "view"));
			assert_eq!(
				store.effective_roles(&Principal::anonymous(), Target::Node(id)),
				None
			);
		}
		assert!(store.has_permission(&Principal::superuser(), Target::Node(orphan), "view"));
	}

	#[test]
	fn test_target_from_optional_parent() {
		let id = Uuid::new_v4();
		assert_eq!(Target::from(None::<NodeId>), Target::Portal);
		assert_eq!(Target::from(Some(id)), Target::Node(id));
	}
}
