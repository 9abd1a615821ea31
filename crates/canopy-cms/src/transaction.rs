//! Transactions over the content store
//!
//! A [`Transaction`] holds the store's write lock for its whole lifetime and
//! stages every change on a private copy of the store. Committing verifies the
//! integrity of the copy, swaps it in, runs the blob deletions the
//! transaction requested and only then drops the affected cache entries.
//!
//! Dropping a transaction without committing discards the copy and deletes
//! any blob written through it.

use crate::cache::{ContentCache, Invalidation};
use crate::error::CmsResult;
use crate::store::ContentStore;
use canopy_storage::{FileMetadata, Storage};
use std::mem;
use std::sync::Arc;
use tokio::sync::RwLockWriteGuard;

/// A staged, atomic mutation of the content store
pub struct Transaction<'a> {
	guard: RwLockWriteGuard<'a, ContentStore>,
	/// The working copy all changes are applied to
	pub(crate) store: ContentStore,
	storage: Arc<dyn Storage>,
	created_blobs: Vec<String>,
	pending_deletes: Vec<String>,
	invalidations: Vec<Invalidation>,
	label: &'static str,
	done: bool,
}

/// State of a transaction to return to with [`Transaction::rollback_to`]
pub(crate) struct Savepoint {
	store: ContentStore,
	blobs: usize,
	pending_deletes: usize,
	invalidations: usize,
}

impl<'a> Transaction<'a> {
	pub(crate) fn new(
		guard: RwLockWriteGuard<'a, ContentStore>,
		storage: Arc<dyn Storage>,
		label: &'static str,
	) -> Self {
		let store = guard.clone();
		tracing::debug!(transaction = label, "transaction started");
		Self {
			guard,
			store,
			storage,
			created_blobs: Vec::new(),
			pending_deletes: Vec::new(),
			invalidations: Vec::new(),
			label,
			done: false,
		}
	}

	pub fn label(&self) -> &'static str {
		self.label
	}

	/// Write a new blob; it is deleted again if the transaction does not commit
	pub(crate) async fn save_blob(&mut self, name: &str, content: &[u8]) -> CmsResult<FileMetadata> {
		let metadata = self.storage.save(name, content).await?;
		self.created_blobs.push(metadata.path.clone());
		Ok(metadata)
	}

	/// Copy a blob into a new, independent one
	pub(crate) async fn copy_blob(&mut self, path: &str) -> CmsResult<FileMetadata> {
		let metadata = self.storage.copy(path).await?;
		self.created_blobs.push(metadata.path.clone());
		Ok(metadata)
	}

	/// Delete a blob once the transaction has committed
	pub(crate) fn delete_blob_after_commit(&mut self, path: impl Into<String>) {
		self.pending_deletes.push(path.into());
	}

	/// Drop cached data once the transaction has committed
	pub(crate) fn invalidate(&mut self, invalidation: Invalidation) {
		if !self.invalidations.contains(&invalidation) {
			self.invalidations.push(invalidation);
		}
	}

	/// Mark the current state so a later step can be undone on its own
	pub(crate) fn savepoint(&self) -> Savepoint {
		Savepoint {
			store: self.store.clone(),
			blobs: self.created_blobs.len(),
			pending_deletes: self.pending_deletes.len(),
			invalidations: self.invalidations.len(),
		}
	}

	/// Undo everything staged since `savepoint`, deleting the blobs written since
	pub(crate) async fn rollback_to(&mut self, savepoint: Savepoint) {
		self.store = savepoint.store;
		self.pending_deletes.truncate(savepoint.pending_deletes);
		self.invalidations.truncate(savepoint.invalidations);
		for path in self.created_blobs.split_off(savepoint.blobs) {
			if let Err(err) = self.storage.delete(&path).await {
				tracing::warn!(path = %path, error = %err, "compensating blob deletion failed");
			}
		}
		tracing::debug!(transaction = self.label, "rolled back to savepoint");
	}

	/// Verify and publish the staged store
	pub(crate) async fn commit(mut self, cache: &ContentCache) -> CmsResult<()> {
		if let Err(err) = self.store.verify_integrity() {
			tracing::warn!(transaction = self.label, error = %err, "integrity check failed");
			self.discard_blobs().await;
			return Err(err);
		}

		*self.guard = mem::take(&mut self.store);
		self.done = true;

		for path in mem::take(&mut self.pending_deletes) {
			if let Err(err) = self.storage.delete(&path).await {
				tracing::warn!(path = %path, error = %err, "blob deletion after commit failed");
			}
		}

		if let Err(err) = cache.apply(&self.invalidations).await {
			tracing::warn!(error = %err, "cache invalidation failed, clearing cache");
			if let Err(err) = cache.apply(&[Invalidation::Everything]).await {
				tracing::warn!(error = %err, "cache clear failed");
			}
		}
		tracing::debug!(transaction = self.label, "transaction committed");
		Ok(())
	}

	/// Discard the staged store and the blobs written through it
	pub(crate) async fn rollback(mut self) {
		tracing::warn!(transaction = self.label, "transaction rolled back");
		self.discard_blobs().await;
	}

	async fn discard_blobs(&mut self) {
		self.done = true;
		for path in mem::take(&mut self.created_blobs) {
			if let Err(err) = self.storage.delete(&path).await {
				tracing::warn!(path = %path, error = %err, "compensating blob deletion failed");
			}
		}
	}
}

impl Drop for Transaction<'_> {
	fn drop(&mut self) {
		if self.done {
			return;
		}
		tracing::warn!(
			transaction = self.label,
			"transaction dropped without commit, changes discarded"
		);
		let blobs = mem::take(&mut self.created_blobs);
		if blobs.is_empty() {
			return;
		}
		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				let storage = Arc::clone(&self.storage);
				handle.spawn(async move {
					for path in blobs {
						if let Err(err) = storage.delete(&path).await {
							tracing::warn!(path = %path, error = %err, "compensating blob deletion failed");
						}
					}
				});
			}
			Err(_) => {
				tracing::warn!(count = blobs.len(), "no runtime to delete orphaned blobs");
			}
		}
	}
}
