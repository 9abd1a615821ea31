//! Workflow engine
//!
//! A workflow is a small state machine attached to content. Each state
//! carries the grants and inheritance blocks it imposes on the permissions
//! the workflow manages; entering a state rewrites exactly those rows on the
//! object and leaves every other grant alone.

use crate::engine::Cms;
use crate::error::{CmsError, CmsResult};
use crate::history::HistoryAction;
use crate::permissions::{Principal, Target};
use crate::store::ContentStore;
use crate::NodeId;
use crate::nodes::ContentNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of a workflow state
pub type StateName = String;

/// A state of a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
	pub name: StateName,
	/// Content in this state is published
	pub public: bool,
	/// Content in this state awaits review
	pub review: bool,
	/// Names of the transitions leaving this state
	pub transitions: Vec<String>,
}

impl State {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			public: false,
			review: false,
			transitions: Vec::new(),
		}
	}

	pub fn public(mut self) -> Self {
		self.public = true;
		self
	}

	pub fn review(mut self) -> Self {
		self.review = true;
		self
	}

	pub fn with_transition(mut self, transition: impl Into<String>) -> Self {
		self.transitions.push(transition.into());
		self
	}
}

/// A directed edge to `destination`, optionally guarded by a permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
	pub name: String,
	pub destination: StateName,
	pub permission: Option<String>,
}

impl Transition {
	pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			destination: destination.into(),
			permission: None,
		}
	}

	pub fn guarded_by(mut self, permission: impl Into<String>) -> Self {
		self.permission = Some(permission.into());
		self
	}
}

/// A named state machine with per-state permission templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
	pub name: String,
	pub states: Vec<State>,
	pub transitions: Vec<Transition>,
	pub initial_state: StateName,
	/// Permissions whose grants follow the current state
	pub managed_permissions: BTreeSet<String>,
	/// (state, role, permission)
	pub state_grants: BTreeSet<(StateName, String, String)>,
	/// (state, permission)
	pub state_blocks: BTreeSet<(StateName, String)>,
}

impl WorkflowDefinition {
	/// Start describing a workflow
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cms::workflow::{State, Transition, WorkflowDefinition};
	///
	/// let workflow = WorkflowDefinition::builder("Simple")
	///     .state(State::new("Private").with_transition("Make public"))
	///     .state(State::new("Public").public().with_transition("Make private"))
	///     .transition(Transition::new("Make public", "Public"))
	///     .transition(Transition::new("Make private", "Private"))
	///     .initial("Private")
	///     .managed("view")
	///     .grant("Public", "Anonymous", "view")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(workflow.outgoing("Private")[0].destination, "Public");
	/// ```
	pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
		WorkflowBuilder::new(name)
	}

	pub fn state(&self, name: &str) -> Option<&State> {
		self.states.iter().find(|state| state.name == name)
	}

	pub fn transition(&self, name: &str) -> Option<&Transition> {
		self.transitions.iter().find(|t| t.name == name)
	}

	/// Transitions leaving `state`, in declaration order
	pub fn outgoing(&self, state: &str) -> Vec<&Transition> {
		self.state(state)
			.map(|state| {
				state
					.transitions
					.iter()
					.filter_map(|name| self.transition(name))
					.collect()
			})
			.unwrap_or_default()
	}

	pub fn is_managed(&self, permission: &str) -> bool {
		self.managed_permissions.contains(permission)
	}

	fn validate(&self) -> CmsResult<()> {
		let mut errors = crate::error::ValidationErrors::new();
		if self.states.is_empty() {
			errors.add("states", "A workflow needs at least one state.");
		}
		let mut seen = BTreeSet::new();
		for state in &self.states {
			if !seen.insert(state.name.as_str()) {
				errors.add("states", format!("Duplicate state '{}'.", state.name));
			}
			for name in &state.transitions {
				if self.transition(name).is_none() {
					errors.add(
						"transitions",
						format!("State '{}' refers to unknown transition '{}'.", state.name, name),
					);
				}
			}
		}
		if self.state(&self.initial_state).is_none() {
			errors.add(
				"initial_state",
				format!("Unknown initial state '{}'.", self.initial_state),
			);
		}
		for transition in &self.transitions {
			if self.state(&transition.destination).is_none() {
				errors.add(
					"transitions",
					format!(
						"Transition '{}' leads to unknown state '{}'.",
						transition.name, transition.destination
					),
				);
			}
		}
		for (state, _, permission) in &self.state_grants {
			self.check_state_relation(&mut errors, state, permission);
		}
		for (state, permission) in &self.state_blocks {
			self.check_state_relation(&mut errors, state, permission);
		}
		errors.into_result()
	}

	fn check_state_relation(
		&self,
		errors: &mut crate::error::ValidationErrors,
		state: &str,
		permission: &str,
	) {
		if self.state(state).is_none() {
			errors.add("state_permissions", format!("Unknown state '{}'.", state));
		}
		if !self.is_managed(permission) {
			errors.add(
				"state_permissions",
				format!("Permission '{}' is not managed by the workflow.", permission),
			);
		}
	}
}

/// Builder for [`WorkflowDefinition`]
pub struct WorkflowBuilder {
	definition: WorkflowDefinition,
}

impl WorkflowBuilder {
	fn new(name: impl Into<String>) -> Self {
		Self {
			definition: WorkflowDefinition {
				name: name.into(),
				states: Vec::new(),
				transitions: Vec::new(),
				initial_state: String::new(),
				managed_permissions: BTreeSet::new(),
				state_grants: BTreeSet::new(),
				state_blocks: BTreeSet::new(),
			},
		}
	}

	pub fn state(mut self, state: State) -> Self {
		self.definition.states.push(state);
		self
	}

	pub fn transition(mut self, transition: Transition) -> Self {
		self.definition.transitions.push(transition);
		self
	}

	pub fn initial(mut self, state: impl Into<String>) -> Self {
		self.definition.initial_state = state.into();
		self
	}

	pub fn managed(mut self, permission: impl Into<String>) -> Self {
		self.definition.managed_permissions.insert(permission.into());
		self
	}

	/// While in `state`, `role` holds `permission`
	pub fn grant(mut self, state: &str, role: &str, permission: &str) -> Self {
		self.definition.state_grants.insert((
			state.to_string(),
			role.to_string(),
			permission.to_string(),
		));
		self
	}

	/// While in `state`, `permission` is not inherited from above
	pub fn block(mut self, state: &str, permission: &str) -> Self {
		self.definition
			.state_blocks
			.insert((state.to_string(), permission.to_string()));
		self
	}

	pub fn build(self) -> CmsResult<WorkflowDefinition> {
		self.definition.validate()?;
		Ok(self.definition)
	}
}

impl ContentStore {
	/// Workflow governing `node`: its own assignment, else its content type's
	pub(crate) fn workflow_name_for(
		&self,
		node: &ContentNode,
		type_workflow: Option<String>,
	) -> Option<String> {
		node.workflow.clone().or(type_workflow)
	}

	/// Put `node` into `state` of `workflow`, rewriting the managed grants
	/// and blocks to those of the state
	pub(crate) fn enter_state(
		&mut self,
		id: NodeId,
		workflow: &WorkflowDefinition,
		state: &str,
		now: DateTime<Utc>,
	) -> CmsResult<()> {
		let state = workflow
			.state(state)
			.ok_or_else(|| CmsError::InvalidTransition(format!("unknown state '{}'", state)))?
			.clone();
		let target = Target::Node(id);

		let table = &mut self.permissions;
		table
			.grants
			.retain(|(t, _, p)| *t != target || !workflow.is_managed(p));
		table
			.blocks
			.retain(|(t, p)| *t != target || !workflow.is_managed(p));
		for (s, role, permission) in &workflow.state_grants {
			if *s == state.name {
				table
					.grants
					.insert((target, role.clone(), permission.clone()));
			}
		}
		for (s, permission) in &workflow.state_blocks {
			if *s == state.name {
				table.blocks.insert((target, permission.clone()));
			}
		}

		let node = self.node_mut(id)?;
		node.state = Some(state.name.clone());
		node.active = state.public;
		if state.public && node.publication_date.is_none() {
			node.publication_date = Some(now);
		}
		Ok(())
	}

	/// Enter the initial state of whatever workflow governs `id`
	pub(crate) fn enter_initial_state(
		&mut self,
		id: NodeId,
		workflow_name: Option<&str>,
		now: DateTime<Utc>,
	) -> CmsResult<()> {
		let Some(name) = workflow_name else {
			let node = self.node_mut(id)?;
			node.state = None;
			node.active = true;
			return Ok(());
		};
		let workflow = self
			.workflows
			.get(name)
			.cloned()
			.ok_or_else(|| CmsError::NotFound(format!("workflow '{}'", name)))?;
		let initial = workflow.initial_state.clone();
		self.enter_state(id, &workflow, &initial, now)
	}
}

impl Cms {
	/// Register (or replace) a workflow definition
	pub async fn register_workflow(&self, workflow: WorkflowDefinition) -> CmsResult<()> {
		let mut txn = self.begin("register_workflow").await;
		let result = (|| -> CmsResult<()> {
			let table = &txn.store.permissions;
			for permission in &workflow.managed_permissions {
				table.ensure_permission(permission)?;
			}
			for transition in &workflow.transitions {
				if let Some(permission) = &transition.permission {
					table.ensure_permission(permission)?;
				}
			}
			for (_, role, _) in &workflow.state_grants {
				table.ensure_role(role)?;
			}
			tracing::info!(workflow = %workflow.name, states = workflow.states.len(), "workflow registered");
			txn.store
				.workflows
				.insert(workflow.name.clone(), workflow);
			Ok(())
		})();
		self.finish(txn, result).await
	}

	pub async fn workflow(&self, name: &str) -> Option<WorkflowDefinition> {
		self.store.read().await.workflows.get(name).cloned()
	}

	/// Name of the workflow governing `node`
	pub async fn workflow_for(&self, node: NodeId) -> CmsResult<Option<String>> {
		let store = self.store.read().await;
		let node = store.node(node)?;
		Ok(store.workflow_name_for(node, self.type_workflow(node.kind())))
	}

	pub(crate) fn type_workflow(&self, kind: &str) -> Option<String> {
		self.registry
			.get_info(kind)
			.and_then(|info| info.registration.workflow)
	}

	/// Assign a workflow to a single object, or fall back to the content
	/// type's with `None`. The object enters the initial state.
	pub async fn set_workflow(&self, node: NodeId, workflow: Option<&str>) -> CmsResult<()> {
		let mut txn = self.begin("set_workflow").await;
		let result = (|| -> CmsResult<()> {
			if let Some(name) = workflow
				&& !txn.store.workflows.contains_key(name)
			{
				return Err(CmsError::NotFound(format!("workflow '{}'", name)));
			}
			let kind = {
				let current = txn.store.node_mut(node)?;
				current.workflow = workflow.map(str::to_string);
				current.kind().to_string()
			};
			let name = txn
				.store
				.node(node)
				.map(|n| txn.store.workflow_name_for(n, self.type_workflow(&kind)))?;
			txn.store
				.enter_initial_state(node, name.as_deref(), Utc::now())?;
			let invalidation = txn.store.permission_invalidation(Target::Node(node));
			txn.invalidate(invalidation);
			Ok(())
		})();
		self.finish(txn, result).await
	}

	/// Current state of `node`, if a workflow governs it
	pub async fn get_state(&self, node: NodeId) -> CmsResult<Option<State>> {
		let store = self.store.read().await;
		let current = store.node(node)?;
		let name = store.workflow_name_for(current, self.type_workflow(current.kind()));
		Ok(match (name, &current.state) {
			(Some(name), Some(state)) => store
				.workflows
				.get(&name)
				.and_then(|wf| wf.state(state))
				.cloned(),
			_ => None,
		})
	}

	/// Transitions out of the current state the principal may take.
	///
	/// Guarded transitions need their permission; unguarded ones need an
	/// authenticated principal.
	pub async fn get_allowed_transitions(
		&self,
		principal: &Principal,
		node: NodeId,
	) -> CmsResult<Vec<Transition>> {
		let store = self.store.read().await;
		let current = store.node(node)?;
		let Some(name) = store.workflow_name_for(current, self.type_workflow(current.kind())) else {
			return Ok(Vec::new());
		};
		let (Some(workflow), Some(state)) = (store.workflows.get(&name), &current.state) else {
			return Ok(Vec::new());
		};
		Ok(workflow
			.outgoing(state)
			.into_iter()
			.filter(|transition| match &transition.permission {
				Some(permission) => store.has_permission(principal, Target::Node(node), permission),
				None => principal.is_authenticated(),
			})
			.cloned()
			.collect())
	}

	/// Take `transition` from the node's current state
	pub async fn do_transition(
		&self,
		node: NodeId,
		transition: &str,
		principal: &Principal,
	) -> CmsResult<ContentNode> {
		let mut txn = self.begin("do_transition").await;
		let result = (|| -> CmsResult<ContentNode> {
			let current = txn.store.node(node)?.clone();
			let name = txn
				.store
				.workflow_name_for(&current, self.type_workflow(current.kind()))
				.ok_or_else(|| CmsError::InvalidTransition("object has no workflow".to_string()))?;
			let workflow = txn
				.store
				.workflows
				.get(&name)
				.cloned()
				.ok_or_else(|| CmsError::NotFound(format!("workflow '{}'", name)))?;
			let state = current
				.state
				.clone()
				.ok_or_else(|| CmsError::InvalidTransition("object has no state".to_string()))?;

			let step = workflow
				.outgoing(&state)
				.into_iter()
				.find(|t| t.name == transition)
				.cloned()
				.ok_or_else(|| {
					CmsError::InvalidTransition(format!(
						"'{}' does not leave state '{}'",
						transition, state
					))
				})?;

			match &step.permission {
				Some(permission) => {
					txn.store
						.check_permission(principal, Target::Node(node), permission)?
				}
				None if !principal.is_authenticated() => {
					return Err(CmsError::denied("transition", Target::Node(node)));
				}
				None => {}
			}

			let invalidation = txn.store.permission_invalidation(Target::Node(node));
			let now = Utc::now();
			txn.store
				.enter_state(node, &workflow, &step.destination, now)?;
			txn.store.record_history(
				node,
				HistoryAction::Transitioned {
					transition: step.name.clone(),
					state: step.destination.clone(),
				},
				principal,
				now,
			);
			txn.invalidate(invalidation);
			txn.store.node(node).cloned()
		})();
		let updated = self.finish(txn, result).await?;
		tracing::info!(node = %node, transition, state = ?updated.state, "workflow transition");
		Ok(updated)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_unknown_destination_rejected() {
		let result = WorkflowDefinition::builder("Broken")
			.state(State::new("A").with_transition("go"))
			.transition(Transition::new("go", "Nowhere"))
			.initial("A")
			.build();

		assert!(matches!(result, Err(CmsError::Validation(_))));
	}

	#[test]
	fn test_state_grant_must_be_managed() {
		let result = WorkflowDefinition::builder("Broken")
			.state(State::new("A"))
			.initial("A")
			.grant("A", "Reader", "view")
			.build();

		let Err(CmsError::Validation(errors)) = result else {
			panic!("expected validation error");
		};
		assert!(errors.get("state_permissions").is_some());
	}

	#[test]
	fn test_outgoing_follows_state_order() {
		let workflow = WorkflowDefinition::builder("W")
			.state(State::new("A").with_transition("b").with_transition("c"))
			.state(State::new("B"))
			.state(State::new("C"))
			.transition(Transition::new("c", "C"))
			.transition(Transition::new("b", "B"))
			.initial("A")
			.build()
			.unwrap();

		let names: Vec<&str> = workflow
			.outgoing("A")
			.iter()
			.map(|t| t.name.as_str())
			.collect();
		assert_eq!(names, vec!["b", "c"]);
	}
}
