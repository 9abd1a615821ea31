//! Default setup of a fresh site
//!
//! [`Cms::bootstrap`] registers the stock roles and permissions, grants the
//! portal-level permissions, installs the "Plain" and "Portal" workflows,
//! the Left/Right portlet slots, the stock templates and the page and
//! gallery content types. Running it again resets these definitions and
//! leaves content alone.

use crate::cache::Invalidation;
use crate::engine::Cms;
use crate::error::CmsResult;
use crate::nodes::{GALLERY_KIND, PAGE_KIND};
use crate::permissions::Target;
use crate::registry::{ContentTypeRegistration, Template};
use crate::workflow::{State, Transition, WorkflowDefinition};

pub const ANONYMOUS: &str = "Anonymous";
pub const EDITOR: &str = "Editor";
pub const MANAGER: &str = "Manager";
pub const OWNER: &str = "Owner";
pub const READER: &str = "Reader";
pub const REVIEWER: &str = "Reviewer";

pub const ROLES: [&str; 6] = [ANONYMOUS, EDITOR, MANAGER, OWNER, READER, REVIEWER];

pub const PERMISSIONS: [&str; 6] = ["add", "delete", "edit", "submit", "view", "manage_portal"];

/// Permissions each role holds on the portal
const PORTAL_GRANTS: &[(&str, &[&str])] = &[
	(ANONYMOUS, &["view"]),
	(EDITOR, &["add", "delete", "edit", "view"]),
	(
		MANAGER,
		&["add", "delete", "edit", "manage_portal", "submit", "view"],
	),
	(OWNER, &["submit", "view"]),
	(READER, &["view"]),
	(REVIEWER, &["submit", "view"]),
];

pub const PLAIN_WORKFLOW: &str = "Plain";
pub const PORTAL_WORKFLOW: &str = "Portal";

pub const SLOTS: [&str; 2] = ["Left", "Right"];

/// Two states: private content is visible to managers and owners only,
/// public content inherits view from above
pub fn plain_workflow() -> CmsResult<WorkflowDefinition> {
	let content = ["add", "delete", "edit", "view"];
	let mut builder = WorkflowDefinition::builder(PLAIN_WORKFLOW)
		.state(State::new("Private").with_transition("Make public"))
		.state(State::new("Public").public().with_transition("Make private"))
		.transition(Transition::new("Make public", "Public"))
		.transition(Transition::new("Make private", "Private"))
		.initial("Private");
	for permission in content {
		builder = builder
			.managed(permission)
			.grant("Private", MANAGER, permission)
			.grant("Private", OWNER, permission)
			.block("Private", permission);
		if permission != "view" {
			builder = builder.block("Public", permission);
		}
	}
	builder.build()
}

/// Three states with a review step; submitting needs the `submit` permission
pub fn portal_workflow() -> CmsResult<WorkflowDefinition> {
	let content = ["add", "delete", "edit", "submit", "view"];
	let mut builder = WorkflowDefinition::builder(PORTAL_WORKFLOW)
		.state(
			State::new("Private")
				.with_transition("Make public")
				.with_transition("Submit"),
		)
		.state(State::new("Submitted").review().with_transition("Make public").with_transition("Reject"))
		.state(State::new("Public").public().with_transition("Make private"))
		.transition(Transition::new("Make public", "Public"))
		.transition(Transition::new("Make private", "Private"))
		.transition(Transition::new("Submit", "Submitted").guarded_by("submit"))
		.transition(Transition::new("Reject", "Private"))
		.initial("Private");
	for permission in content {
		builder = builder
			.managed(permission)
			.grant("Private", MANAGER, permission)
			.grant("Private", OWNER, permission)
			.block("Private", permission)
			.grant("Submitted", MANAGER, permission)
			.grant("Submitted", REVIEWER, permission)
			.block("Submitted", permission)
			.grant("Public", MANAGER, permission);
		if permission != "view" {
			builder = builder.block("Public", permission);
		}
	}
	builder
		.grant("Submitted", OWNER, "view")
		.grant("Public", READER, "view")
		.build()
}

/// Stock templates
pub fn templates() -> Vec<Template> {
	vec![
		Template::new("Plain", "canopy/templates/plain.html"),
		Template::new("Article", "canopy/templates/article.html"),
		Template::new("Gallery", "canopy/templates/gallery.html").with_columns(1, 3),
		Template::new("Overview", "canopy/templates/overview.html"),
	]
}

/// Stock content types
pub fn content_types() -> Vec<ContentTypeRegistration> {
	vec![
		ContentTypeRegistration::new(PAGE_KIND, "Page")
			.with_subtype(PAGE_KIND)
			.with_subtype(GALLERY_KIND)
			.with_template("Gallery")
			.with_template("Overview")
			.with_template("Plain")
			.with_default_template("Article")
			.with_workflow(PLAIN_WORKFLOW),
		ContentTypeRegistration::new(GALLERY_KIND, "Gallery")
			.with_template("Overview")
			.with_default_template("Gallery")
			.with_workflow(PLAIN_WORKFLOW),
	]
}

impl Cms {
	/// Install the default roles, permissions, workflows, slots, templates
	/// and content types
	pub async fn bootstrap(&self) -> CmsResult<()> {
		let plain = plain_workflow()?;
		let portal = portal_workflow()?;

		let mut txn = self.begin("bootstrap").await;
		{
			let store = &mut txn.store;
			let table = &mut store.permissions;
			table.roles.extend(ROLES.iter().map(|role| role.to_string()));
			table
				.permissions
				.extend(PERMISSIONS.iter().map(|permission| permission.to_string()));
			for (role, permissions) in PORTAL_GRANTS {
				for permission in *permissions {
					table
						.grants
						.insert((Target::Portal, role.to_string(), permission.to_string()));
				}
			}
			for workflow in [plain, portal] {
				store.workflows.insert(workflow.name.clone(), workflow);
			}
			store
				.portlets
				.slots
				.extend(SLOTS.iter().map(|slot| slot.to_string()));
		}
		txn.invalidate(Invalidation::AllPermissions);
		txn.commit(&self.cache).await?;

		for template in templates() {
			self.registry.register_template(template);
		}
		for registration in content_types() {
			self.registry.register_type(registration);
		}
		tracing::info!(
			roles = ROLES.len(),
			permissions = PERMISSIONS.len(),
			"default setup installed"
		);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stock_workflows_are_valid() {
		let plain = plain_workflow().unwrap();
		let portal = portal_workflow().unwrap();

		assert_eq!(plain.initial_state, "Private");
		assert_eq!(portal.outgoing("Private").len(), 2);
		assert_eq!(
			portal.transition("Submit").and_then(|t| t.permission.as_deref()),
			Some("submit")
		);
	}

	#[test]
	fn test_public_plain_state_inherits_view() {
		let plain = plain_workflow().unwrap();

		assert!(!plain
			.state_blocks
			.contains(&("Public".to_string(), "view".to_string())));
		assert!(plain
			.state_blocks
			.contains(&("Public".to_string(), "edit".to_string())));
	}
}
