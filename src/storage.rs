//! Payload storage module.
//!
//! Backends keeping the bytes of image and file attachments.

#[cfg(feature = "storage")]
pub use canopy_storage::*;
