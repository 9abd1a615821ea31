//! File storage system for Canopy
//!
//! Attachments (images and files) hold a reference to a payload kept in a
//! [`Storage`] backend. Copying an attachment streams the bytes into a new
//! storage object, so every attachment owns an independent payload.

pub mod backend;
pub mod errors;
pub mod file;
pub mod local;
pub mod memory;

pub use backend::Storage;
pub use errors::{StorageError, StorageResult};
pub use file::{FileMetadata, StoredFile};
pub use local::LocalStorage;
pub use memory::InMemoryStorage;

/// Re-export commonly used types
pub mod prelude {
	pub use super::backend::*;
	pub use super::errors::*;
	pub use super::file::*;
	pub use super::local::*;
	pub use super::memory::*;
}
