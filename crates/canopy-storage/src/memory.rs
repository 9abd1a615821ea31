//! In-memory storage backend

use crate::backend::{Storage, candidate_name, validate_name};
use crate::errors::{StorageError, StorageResult};
use crate::file::{FileMetadata, StoredFile};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Storage backend keeping payloads in process memory
#[derive(Clone)]
pub struct InMemoryStorage {
	files: Arc<RwLock<BTreeMap<String, StoredFile>>>,
	base_url: String,
}

impl InMemoryStorage {
	/// Create an empty in-memory storage
	///
	/// # Examples
	///
	/// ```
	/// use canopy_storage::InMemoryStorage;
	///
	/// let storage = InMemoryStorage::new();
	/// assert_eq!(storage.len(), 0);
	/// ```
	pub fn new() -> Self {
		Self {
			files: Arc::new(RwLock::new(BTreeMap::new())),
			base_url: "/media/".to_string(),
		}
	}

	/// Set the URL prefix used by [`Storage::url`]
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// Number of stored objects
	pub fn len(&self) -> usize {
		self.files.read().len()
	}

	/// Whether nothing is stored
	pub fn is_empty(&self) -> bool {
		self.files.read().is_empty()
	}
}

impl Default for InMemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Storage for InMemoryStorage {
	async fn save(&self, name: &str, content: &[u8]) -> StorageResult<FileMetadata> {
		validate_name(name)?;
		let mut files = self.files.write();
		let mut attempt = 0;
		let path = loop {
			let candidate = candidate_name(name, attempt);
			if !files.contains_key(&candidate) {
				break candidate;
			}
			attempt += 1;
		};
		let metadata = FileMetadata::for_content(path.clone(), content);
		files.insert(path, StoredFile::new(metadata.clone(), content.to_vec()));
		Ok(metadata)
	}

	async fn read(&self, path: &str) -> StorageResult<StoredFile> {
		self.files
			.read()
			.get(path)
			.cloned()
			.ok_or_else(|| StorageError::NotFound(path.to_string()))
	}

	async fn delete(&self, path: &str) -> StorageResult<()> {
		self.files
			.write()
			.remove(path)
			.map(|_| ())
			.ok_or_else(|| StorageError::NotFound(path.to_string()))
	}

	async fn exists(&self, path: &str) -> StorageResult<bool> {
		Ok(self.files.read().contains_key(path))
	}

	async fn metadata(&self, path: &str) -> StorageResult<FileMetadata> {
		self.files
			.read()
			.get(path)
			.map(|file| file.metadata.clone())
			.ok_or_else(|| StorageError::NotFound(path.to_string()))
	}

	async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
		Ok(self
			.files
			.read()
			.keys()
			.filter(|path| path.starts_with(prefix))
			.cloned()
			.collect())
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}
}
