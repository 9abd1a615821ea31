//! Storage error types

use thiserror::Error;

/// Errors raised by storage backends
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
	/// No object is stored under the given path
	#[error("File not found: {0}")]
	NotFound(String),

	/// The requested name cannot be stored (empty, absolute, or escaping the root)
	#[error("Invalid file name: {0}")]
	InvalidName(String),

	/// Underlying I/O failure
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Backend-specific failure
	#[error("Storage backend error: {0}")]
	Backend(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
