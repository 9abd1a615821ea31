//! Storage backend trait

use crate::errors::{StorageError, StorageResult};
use crate::file::{FileMetadata, StoredFile};
use async_trait::async_trait;

/// A backend that stores binary payloads under string paths.
///
/// `save` never overwrites: when `name` is taken, the backend picks the next
/// available name (`photo.png`, `photo_1.png`, ...) and reports it in the
/// returned metadata.
#[async_trait]
pub trait Storage: Send + Sync {
	/// Store `content` under `name` (or the next available variant of it)
	async fn save(&self, name: &str, content: &[u8]) -> StorageResult<FileMetadata>;

	/// Read the payload stored at `path`
	async fn read(&self, path: &str) -> StorageResult<StoredFile>;

	/// Remove the payload stored at `path`
	async fn delete(&self, path: &str) -> StorageResult<()>;

	/// Whether a payload exists at `path`
	async fn exists(&self, path: &str) -> StorageResult<bool>;

	/// Metadata of the payload stored at `path`
	async fn metadata(&self, path: &str) -> StorageResult<FileMetadata>;

	/// Paths starting with `prefix`, sorted
	async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

	/// Public URL for `path`
	fn url(&self, path: &str) -> String;

	/// Copy the payload at `path` into a new, independent object
	async fn copy(&self, path: &str) -> StorageResult<FileMetadata> {
		let source = self.read(path).await?;
		self.save(&source.metadata.path, &source.content).await
	}
}

/// Reject names that are empty, absolute, or contain parent-directory segments
pub fn validate_name(name: &str) -> StorageResult<()> {
	if name.is_empty() || name.starts_with('/') || name.split('/').any(|seg| seg == "..") {
		return Err(StorageError::InvalidName(name.to_string()));
	}
	Ok(())
}

/// Candidate names tried by `save`: `name`, `stem_1.ext`, `stem_2.ext`, ...
pub(crate) fn candidate_name(name: &str, attempt: usize) -> String {
	if attempt == 0 {
		return name.to_string();
	}
	let (stem, ext) = crate::file::split_name(name);
	format!("{}_{}{}", stem, attempt, ext)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("", false)]
	#[case("/etc/passwd", false)]
	#[case("a/../b", false)]
	#[case("images/photo.png", true)]
	fn test_validate_name(#[case] name: &str, #[case] ok: bool) {
		assert_eq!(validate_name(name).is_ok(), ok);
	}

	#[test]
	fn test_candidate_name() {
		assert_eq!(candidate_name("a/photo.png", 0), "a/photo.png");
		assert_eq!(candidate_name("a/photo.png", 2), "a/photo_2.png");
		assert_eq!(candidate_name("notes", 1), "notes_1");
	}
}
