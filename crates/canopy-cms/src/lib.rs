//! # Canopy CMS
//!
//! The content-tree mutation and authorization engine of Canopy.
//!
//! ## Features
//!
//! - **Content tree**: polymorphic nodes with per-parent, per-language unique
//!   slugs, ordered positions, translations and a designated standard child
//! - **Permission lattice**: role grants per object, inherited up the tree
//!   unless blocked, with local roles for users and groups
//! - **Workflow engine**: per content type state machines whose states
//!   materialize permission grants onto the object
//! - **Clipboard**: copy/cut/paste of whole subtrees, including attachments,
//!   portlets and translations
//! - **Transactions**: every mutation is staged and committed atomically, with
//!   blob compensation and cache invalidation after commit
//!
//! ## Architecture
//!
//! ```text
//! canopy-cms
//! ├── language     - Neutral vs concrete languages
//! ├── slug         - Slug validation and uniqueness
//! ├── nodes        - Content nodes and their bodies
//! ├── permissions  - Principals, grants, blocks, local roles
//! ├── workflow     - Workflow definitions and transitions
//! ├── registry     - Content type registry
//! ├── media        - Image and file attachments
//! ├── portlets     - Slots, portlets and assignments
//! ├── history      - Audit trail per node
//! ├── store        - The in-memory content store and its integrity check
//! ├── transaction  - Staged, atomic mutation of the store
//! ├── cache        - Path and permission lookup cache
//! ├── engine       - The `Cms` handle tying it all together
//! ├── tree         - Create, update, move, reparent, delete, translate
//! ├── clipboard    - Copy, cut and paste
//! ├── working_copy - Check-out and check-in
//! └── bootstrap    - Default roles, permissions, workflows and types
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canopy_cms::prelude::*;
//!
//! # async fn example() -> canopy_cms::error::CmsResult<()> {
//! let cms = Cms::builder().build()?;
//! cms.bootstrap().await?;
//!
//! let admin = Principal::superuser();
//! let welcome = cms
//!     .create(None, NodeFields::page("Welcome").with_slug("welcome"), &admin)
//!     .await?;
//!
//! let mut clipboard = Clipboard::default();
//! cms.copy_to_clipboard(&mut clipboard, &[welcome.id], &admin).await?;
//! let outcome = cms.paste(&mut clipboard, None, &admin).await?;
//! assert_eq!(outcome.succeeded.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::broken_intra_doc_links)]

pub use serde_json;

pub mod bootstrap;
pub mod cache;
pub mod clipboard;
pub mod engine;
pub mod history;
pub mod language;
pub mod media;
pub mod nodes;
pub mod permissions;
pub mod portlets;
pub mod registry;
pub mod slug;
pub mod store;
pub mod transaction;
pub mod tree;
pub mod workflow;
pub mod working_copy;

/// Identifier of a content node
pub type NodeId = uuid::Uuid;

/// Identifier of a user
pub type UserId = uuid::Uuid;

/// Identifier of a group of users
pub type GroupId = uuid::Uuid;

pub mod prelude {
	//! Convenient re-exports of commonly used items

	pub use crate::clipboard::{BatchOutcome, Clipboard, ClipboardAction, PasteOutcome, Session};
	pub use crate::engine::{Cms, CmsBuilder};
	pub use crate::error::{CmsError, CmsResult, ConflictKind, ValidationErrors};
	pub use crate::history::{HistoryAction, HistoryEntry};
	pub use crate::language::Language;
	pub use crate::media::{Attachment, AttachmentKind, AttachmentUpdate};
	pub use crate::nodes::{CommentPolicy, ContentBody, ContentNode, NodeFields, NodeUpdate};
	pub use crate::permissions::{Actor, Principal, Target};
	pub use crate::portlets::{Portlet, PortletAssignment, PortletLibrary, PortletType};
	pub use crate::registry::{
		ContentTypeInfo, ContentTypeRegistration, ContentTypeRegistry, FieldKind, FieldSchema,
		InMemoryRegistry, Template,
	};
	pub use crate::tree::TranslationFields;
	pub use crate::workflow::{State, Transition, WorkflowDefinition};
	pub use crate::{GroupId, NodeId, UserId};
}

/// CMS error types
pub mod error {
	use crate::permissions::Target;
	use std::collections::BTreeMap;
	use std::fmt;
	use thiserror::Error;

	/// Field-level validation messages
	#[derive(Debug, Clone, Default, PartialEq, Eq)]
	pub struct ValidationErrors {
		fields: BTreeMap<String, Vec<String>>,
	}

	impl ValidationErrors {
		pub fn new() -> Self {
			Self::default()
		}

		/// A single error on a single field
		///
		/// # Examples
		///
		/// ```
		/// use canopy_cms::error::ValidationErrors;
		///
		/// let errors = ValidationErrors::field("slug", "must not be empty");
		/// assert_eq!(errors.get("slug"), Some(&["must not be empty".to_string()][..]));
		/// ```
		pub fn field(field: &str, message: impl Into<String>) -> Self {
			let mut errors = Self::new();
			errors.add(field, message);
			errors
		}

		pub fn add(&mut self, field: &str, message: impl Into<String>) {
			self.fields
				.entry(field.to_string())
				.or_default()
				.push(message.into());
		}

		pub fn is_empty(&self) -> bool {
			self.fields.is_empty()
		}

		pub fn get(&self, field: &str) -> Option<&[String]> {
			self.fields.get(field).map(Vec::as_slice)
		}

		pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
			self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
		}

		/// `Ok(())` when empty, otherwise a validation error
		pub fn into_result(self) -> CmsResult<()> {
			if self.is_empty() {
				Ok(())
			} else {
				Err(CmsError::Validation(self))
			}
		}
	}

	impl fmt::Display for ValidationErrors {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			let parts: Vec<String> = self
				.fields
				.iter()
				.map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
				.collect();
			write!(f, "{}", parts.join("; "))
		}
	}

	/// Why a structural change was rejected
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub enum ConflictKind {
		/// The target lies inside the moved subtree
		Cycle,
		/// The target is the node itself
		SelfTarget,
		/// The target does not accept this content kind
		DisallowedKind,
		/// The operation would not change anything
		NoOp,
		/// A standard must be a descendant of its owner
		InvalidStandard,
	}

	impl fmt::Display for ConflictKind {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			let text = match self {
				ConflictKind::Cycle => "object can't be placed in its own descendants",
				ConflictKind::SelfTarget => "object can't be placed into itself",
				ConflictKind::DisallowedKind => "object isn't allowed here",
				ConflictKind::NoOp => "object is already there",
				ConflictKind::InvalidStandard => "standard must be a descendant",
			};
			f.write_str(text)
		}
	}

	/// CMS-related errors
	#[derive(Error, Debug)]
	pub enum CmsError {
		/// Bad input, reported per field
		#[error("Validation failed: {0}")]
		Validation(ValidationErrors),

		/// The acting principal lacks a permission
		#[error("Permission denied: '{permission}' on {target}")]
		PermissionDenied { permission: String, target: Target },

		/// A referenced object no longer exists
		#[error("Not found: {0}")]
		NotFound(String),

		/// The structural change is not allowed
		#[error("Structural conflict: {0}")]
		StructuralConflict(ConflictKind),

		/// Workflow transition not available from the current state
		#[error("Invalid workflow transition: {0}")]
		InvalidTransition(String),

		/// The store would be left inconsistent
		#[error("Integrity error: {0}")]
		Integrity(String),

		#[error("Storage error: {0}")]
		Storage(#[from] canopy_storage::StorageError),

		#[error("Cache error: {0}")]
		Cache(#[from] canopy_cache::CacheError),

		#[error("Configuration error: {0}")]
		Config(#[from] canopy_conf::SettingsError),

		/// Paste without a prior copy or cut
		#[error("The clipboard is empty")]
		ClipboardEmpty,
	}

	impl CmsError {
		/// Errors a batch operation may skip and continue after
		pub fn is_recoverable(&self) -> bool {
			matches!(
				self,
				CmsError::NotFound(_)
					| CmsError::StructuralConflict(_)
					| CmsError::PermissionDenied { .. }
					| CmsError::Validation(_)
			)
		}

		pub(crate) fn denied(permission: &str, target: impl Into<Target>) -> Self {
			CmsError::PermissionDenied {
				permission: permission.to_string(),
				target: target.into(),
			}
		}

		pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
			CmsError::Validation(ValidationErrors::field(field, message))
		}
	}

	/// Result type for CMS operations
	pub type CmsResult<T> = Result<T, CmsError>;
}
