//! File metadata and representation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata about a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
	pub path: String,
	pub size: u64,
	pub content_type: Option<String>,
	pub created_at: DateTime<Utc>,
	pub modified_at: DateTime<Utc>,
	pub checksum: Option<String>,
}

impl FileMetadata {
	/// Create new file metadata
	///
	/// # Examples
	///
	/// ```
	/// use canopy_storage::FileMetadata;
	///
	/// let metadata = FileMetadata::new("test.txt".to_string(), 1024);
	/// assert_eq!(metadata.path, "test.txt");
	/// assert_eq!(metadata.size, 1024);
	/// assert!(metadata.checksum.is_none());
	/// ```
	pub fn new(path: String, size: u64) -> Self {
		let now = Utc::now();
		Self {
			path,
			size,
			content_type: None,
			created_at: now,
			modified_at: now,
			checksum: None,
		}
	}

	/// Build metadata for a payload, guessing the content type from the
	/// extension and computing the SHA-256 checksum.
	///
	/// # Examples
	///
	/// ```
	/// use canopy_storage::FileMetadata;
	///
	/// let metadata = FileMetadata::for_content("photo.png".to_string(), b"abc");
	/// assert_eq!(metadata.size, 3);
	/// assert_eq!(metadata.content_type.as_deref(), Some("image/png"));
	/// assert!(metadata.checksum.is_some());
	/// ```
	pub fn for_content(path: String, content: &[u8]) -> Self {
		let content_type = guess_content_type(&path).to_string();
		Self::new(path, content.len() as u64)
			.with_content_type(content_type)
			.with_checksum(checksum(content))
	}

	/// Set content type for the file
	pub fn with_content_type(mut self, content_type: String) -> Self {
		self.content_type = Some(content_type);
		self
	}

	/// Set checksum for the file
	pub fn with_checksum(mut self, checksum: String) -> Self {
		self.checksum = Some(checksum);
		self
	}

	/// The final path segment
	pub fn file_name(&self) -> &str {
		self.path.rsplit('/').next().unwrap_or(&self.path)
	}
}

/// Represents a stored file
#[derive(Debug, Clone)]
pub struct StoredFile {
	pub metadata: FileMetadata,
	pub content: Vec<u8>,
}

impl StoredFile {
	/// Create a new stored file with metadata and content
	///
	/// # Examples
	///
	/// ```
	/// use canopy_storage::{FileMetadata, StoredFile};
	///
	/// let metadata = FileMetadata::new("test.txt".to_string(), 5);
	/// let file = StoredFile::new(metadata, b"hello".to_vec());
	/// assert_eq!(file.content, b"hello");
	/// assert_eq!(file.size(), 5);
	/// ```
	pub fn new(metadata: FileMetadata, content: Vec<u8>) -> Self {
		Self { metadata, content }
	}

	/// Get the size of the file content in bytes
	pub fn size(&self) -> u64 {
		self.content.len() as u64
	}
}

/// Hex-encoded SHA-256 of a payload
pub fn checksum(content: &[u8]) -> String {
	let mut hasher = Sha256::new();
	hasher.update(content);
	hex::encode(hasher.finalize())
}

/// Guess a MIME type from the file extension
///
/// # Examples
///
/// ```
/// use canopy_storage::file::guess_content_type;
///
/// assert_eq!(guess_content_type("a.JPG"), "image/jpeg");
/// assert_eq!(guess_content_type("a.unknown"), "application/octet-stream");
/// ```
pub fn guess_content_type(path: &str) -> &'static str {
	let extension = path
		.rsplit_once('.')
		.map(|(_, ext)| ext.to_ascii_lowercase())
		.unwrap_or_default();
	match extension.as_str() {
		"jpg" | "jpeg" => "image/jpeg",
		"png" => "image/png",
		"gif" => "image/gif",
		"svg" => "image/svg+xml",
		"webp" => "image/webp",
		"pdf" => "application/pdf",
		"txt" => "text/plain",
		"html" | "htm" => "text/html",
		"zip" => "application/zip",
		_ => "application/octet-stream",
	}
}

/// Split `name` into stem and extension (extension keeps its dot)
pub(crate) fn split_name(name: &str) -> (&str, &str) {
	let base_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
	match name[base_start..].rfind('.') {
		Some(0) | None => (name, ""),
		Some(dot) => name.split_at(base_start + dot),
	}
}
