//! Cache error types

use thiserror::Error;

/// Errors raised by cache backends
#[derive(Debug, Error)]
pub enum CacheError {
	/// A value could not be encoded or decoded
	#[error("Cache serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Backend-specific failure
	#[error("Cache backend error: {0}")]
	Backend(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
