//! Local filesystem storage backend

use crate::backend::{Storage, candidate_name, validate_name};
use crate::errors::{StorageError, StorageResult};
use crate::file::{FileMetadata, StoredFile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Storage backend writing payloads below a root directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
	root: PathBuf,
	base_url: String,
}

impl LocalStorage {
	/// Create a storage rooted at `root`. The directory is created lazily.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			base_url: "/media/".to_string(),
		}
	}

	/// Set the URL prefix used by [`Storage::url`]
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// Root directory of this storage
	pub fn root(&self) -> &Path {
		&self.root
	}

	fn full_path(&self, path: &str) -> StorageResult<PathBuf> {
		validate_name(path)?;
		Ok(self.root.join(path))
	}
}

fn map_not_found(err: std::io::Error, path: &str) -> StorageError {
	if err.kind() == ErrorKind::NotFound {
		StorageError::NotFound(path.to_string())
	} else {
		StorageError::Io(err)
	}
}

#[async_trait]
impl Storage for LocalStorage {
	async fn save(&self, name: &str, content: &[u8]) -> StorageResult<FileMetadata> {
		validate_name(name)?;
		let mut attempt = 0;
		loop {
			let candidate = candidate_name(name, attempt);
			let full = self.root.join(&candidate);
			if let Some(parent) = full.parent() {
				fs::create_dir_all(parent).await?;
			}
			// create_new makes the name reservation atomic across concurrent saves
			match fs::OpenOptions::new()
				.write(true)
				.create_new(true)
				.open(&full)
				.await
			{
				Ok(mut file) => {
					file.write_all(content).await?;
					file.flush().await?;
					tracing::debug!(path = %candidate, size = content.len(), "stored payload");
					return Ok(FileMetadata::for_content(candidate, content));
				}
				Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
				Err(err) => return Err(StorageError::Io(err)),
			}
		}
	}

	async fn read(&self, path: &str) -> StorageResult<StoredFile> {
		let full = self.full_path(path)?;
		let content = fs::read(&full).await.map_err(|e| map_not_found(e, path))?;
		let mut metadata = FileMetadata::for_content(path.to_string(), &content);
		if let Ok(meta) = fs::metadata(&full).await
			&& let Ok(modified) = meta.modified()
		{
			metadata.modified_at = DateTime::<Utc>::from(modified);
		}
		Ok(StoredFile::new(metadata, content))
	}

	async fn delete(&self, path: &str) -> StorageResult<()> {
		let full = self.full_path(path)?;
		fs::remove_file(&full)
			.await
			.map_err(|e| map_not_found(e, path))
	}

	async fn exists(&self, path: &str) -> StorageResult<bool> {
		let full = self.full_path(path)?;
		Ok(fs::try_exists(&full).await?)
	}

	async fn metadata(&self, path: &str) -> StorageResult<FileMetadata> {
		Ok(self.read(path).await?.metadata)
	}

	async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
		let mut result = Vec::new();
		let mut pending = vec![self.root.clone()];
		while let Some(dir) = pending.pop() {
			let mut entries = match fs::read_dir(&dir).await {
				Ok(entries) => entries,
				Err(err) if err.kind() == ErrorKind::NotFound => continue,
				Err(err) => return Err(StorageError::Io(err)),
			};
			while let Some(entry) = entries.next_entry().await? {
				let path = entry.path();
				if entry.file_type().await?.is_dir() {
					pending.push(path);
					continue;
				}
				let Ok(relative) = path.strip_prefix(&self.root) else {
					continue;
				};
				let relative = relative
					.components()
					.map(|c| c.as_os_str().to_string_lossy())
					.collect::<Vec<_>>()
					.join("/");
				if relative.starts_with(prefix) {
					result.push(relative);
				}
			}
		}
		result.sort();
		Ok(result)
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}
}
