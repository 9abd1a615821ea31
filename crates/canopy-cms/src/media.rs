//! Image and file attachments
//!
//! Attachments belong to a node or to the portal and keep their payload in
//! the configured [`Storage`](canopy_storage::Storage). Each attachment owns
//! its payload: copying an owner copies the bytes into new storage objects.

use crate::engine::Cms;
use crate::error::{CmsError, CmsResult};
use crate::permissions::{Principal, Target};
use crate::slug::slugify;
use crate::store::ContentStore;
use crate::transaction::Transaction;
use canopy_conf::Settings;
use canopy_storage::FileMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttachmentKind {
	Image,
	File,
}

impl AttachmentKind {
	fn directory(&self) -> &'static str {
		match self {
			AttachmentKind::Image => "images",
			AttachmentKind::File => "files",
		}
	}
}

/// An image or file attached to a node or the portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
	pub id: Uuid,
	pub kind: AttachmentKind,
	pub owner: Target,
	pub title: String,
	pub slug: String,
	pub caption: String,
	pub description: String,
	pub position: i64,
	pub blob: FileMetadata,
}

/// Changes to the descriptive fields of an attachment
#[derive(Debug, Clone, Default)]
pub struct AttachmentUpdate {
	pub title: Option<String>,
	pub caption: Option<String>,
	pub description: Option<String>,
}

impl ContentStore {
	/// Attachments of `owner`, optionally of one kind, ordered by position
	pub fn attachments_of(&self, owner: Target, kind: Option<AttachmentKind>) -> Vec<&Attachment> {
		let mut attachments: Vec<&Attachment> = self
			.attachments
			.values()
			.filter(|a| a.owner == owner && kind.is_none_or(|kind| a.kind == kind))
			.collect();
		attachments.sort_by(|a, b| {
			(a.kind, a.position, &a.title, a.id).cmp(&(b.kind, b.position, &b.title, b.id))
		});
		attachments
	}

	pub(crate) fn attachment(&self, id: Uuid) -> CmsResult<&Attachment> {
		self.attachments
			.get(&id)
			.ok_or_else(|| CmsError::NotFound(format!("attachment {}", id)))
	}

	pub(crate) fn renumber_attachments(&mut self, owner: Target, kind: AttachmentKind, settings: &Settings) {
		let ids: Vec<Uuid> = self
			.attachments_of(owner, Some(kind))
			.into_iter()
			.map(|a| a.id)
			.collect();
		for (index, id) in ids.into_iter().enumerate() {
			if let Some(attachment) = self.attachments.get_mut(&id) {
				attachment.position = (index as i64 + 1) * settings.position_step;
			}
		}
	}

	/// Remove every attachment of `owner`, returning the removed ones
	pub(crate) fn detach_attachments(&mut self, owner: Target) -> Vec<Attachment> {
		let ids: Vec<Uuid> = self
			.attachments
			.values()
			.filter(|a| a.owner == owner)
			.map(|a| a.id)
			.collect();
		ids.into_iter()
			.filter_map(|id| self.attachments.remove(&id))
			.collect()
	}

	/// Hand every attachment of `from` over to `to`, keeping identity and payload
	pub(crate) fn reassign_attachments(&mut self, from: Target, to: Target) {
		for attachment in self.attachments.values_mut() {
			if attachment.owner == from {
				attachment.owner = to;
			}
		}
	}
}

impl Transaction<'_> {
	/// Clone the attachments of `from` onto `to` with freshly copied payloads
	pub(crate) async fn copy_attachments(&mut self, from: Target, to: Target) -> CmsResult<usize> {
		let sources: Vec<Attachment> = self
			.store
			.attachments_of(from, None)
			.into_iter()
			.cloned()
			.collect();
		for source in &sources {
			let blob = self.copy_blob(&source.blob.path).await?;
			let copy = Attachment {
				id: Uuid::new_v4(),
				owner: to,
				blob,
				..source.clone()
			};
			self.store.attachments.insert(copy.id, copy);
		}
		Ok(sources.len())
	}
}

impl Cms {
	/// Upload a new image or file and attach it at the end of its owner's list
	pub async fn add_attachment(
		&self,
		owner: impl Into<Target>,
		kind: AttachmentKind,
		title: &str,
		file_name: &str,
		content: &[u8],
		principal: &Principal,
	) -> CmsResult<Attachment> {
		let owner = owner.into();
		if title.trim().is_empty() {
			return Err(CmsError::invalid("title", "This field is required."));
		}
		let mut txn = self.begin("add_attachment").await;
		let result = async {
			txn.store.ensure_target(owner)?;
			txn.store
				.check_permission(principal, owner, Cms::edit_permission(owner))?;

			let name = format!("{}/{}", kind.directory(), file_name);
			let blob = txn.save_blob(&name, content).await?;
			let position = txn
				.store
				.attachments_of(owner, Some(kind))
				.last()
				.map_or(0, |a| a.position)
				+ self.settings.position_step;
			let attachment = Attachment {
				id: Uuid::new_v4(),
				kind,
				owner,
				title: title.to_string(),
				slug: slugify(title),
				caption: String::new(),
				description: String::new(),
				position,
				blob,
			};
			txn.store
				.attachments
				.insert(attachment.id, attachment.clone());
			txn.store
				.renumber_attachments(owner, kind, &self.settings);
			txn.store.attachment(attachment.id).cloned()
		}
		.await;
		let attachment = self.finish(txn, result).await?;
		tracing::info!(attachment = %attachment.id, %owner, path = %attachment.blob.path, "attachment added");
		Ok(attachment)
	}

	pub async fn update_attachment(
		&self,
		id: Uuid,
		update: AttachmentUpdate,
		principal: &Principal,
	) -> CmsResult<Attachment> {
		let mut txn = self.begin("update_attachment").await;
		let result = (|| -> CmsResult<Attachment> {
			let owner = txn.store.attachment(id)?.owner;
			txn.store
				.check_permission(principal, owner, Cms::edit_permission(owner))?;
			let attachment = txn
				.store
				.attachments
				.get_mut(&id)
				.ok_or_else(|| CmsError::NotFound(format!("attachment {}", id)))?;
			if let Some(title) = update.title {
				attachment.slug = slugify(&title);
				attachment.title = title;
			}
			if let Some(caption) = update.caption {
				attachment.caption = caption;
			}
			if let Some(description) = update.description {
				attachment.description = description;
			}
			Ok(attachment.clone())
		})();
		self.finish(txn, result).await
	}

	/// Remove an attachment; its payload is deleted after commit
	pub async fn delete_attachment(&self, id: Uuid, principal: &Principal) -> CmsResult<()> {
		let mut txn = self.begin("delete_attachment").await;
		let result = (|| -> CmsResult<Attachment> {
			let owner = txn.store.attachment(id)?.owner;
			txn.store
				.check_permission(principal, owner, Cms::edit_permission(owner))?;
			let removed = txn
				.store
				.attachments
				.remove(&id)
				.ok_or_else(|| CmsError::NotFound(format!("attachment {}", id)))?;
			txn.store
				.renumber_attachments(owner, removed.kind, &self.settings);
			Ok(removed)
		})();
		let result = result.map(|removed| txn.delete_blob_after_commit(removed.blob.path));
		self.finish(txn, result).await?;
		tracing::info!(attachment = %id, "attachment deleted");
		Ok(())
	}

	/// Place an attachment at `position` among its siblings of the same kind
	pub async fn move_attachment(
		&self,
		id: Uuid,
		position: i64,
		principal: &Principal,
	) -> CmsResult<Vec<Attachment>> {
		let mut txn = self.begin("move_attachment").await;
		let result = (|| -> CmsResult<Vec<Attachment>> {
			let (owner, kind) = {
				let attachment = txn.store.attachment(id)?;
				(attachment.owner, attachment.kind)
			};
			txn.store
				.check_permission(principal, owner, Cms::edit_permission(owner))?;
			if let Some(attachment) = txn.store.attachments.get_mut(&id) {
				attachment.position = position;
			}
			txn.store
				.renumber_attachments(owner, kind, &self.settings);
			Ok(txn
				.store
				.attachments_of(owner, Some(kind))
				.into_iter()
				.cloned()
				.collect())
		})();
		self.finish(txn, result).await
	}

	/// Attachments of `owner`, optionally restricted to one kind
	pub async fn attachments(&self, owner: impl Into<Target>, kind: Option<AttachmentKind>) -> Vec<Attachment> {
		self.store
			.read()
			.await
			.attachments_of(owner.into(), kind)
			.into_iter()
			.cloned()
			.collect()
	}

	/// Payload of an attachment
	pub async fn read_attachment(&self, id: Uuid) -> CmsResult<Vec<u8>> {
		let path = self.store.read().await.attachment(id)?.blob.path.clone();
		Ok(self.storage.read(&path).await?.content)
	}
}
