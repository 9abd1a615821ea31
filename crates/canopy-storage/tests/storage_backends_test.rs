//! Behaviour shared by the in-memory and local filesystem backends

use canopy_storage::prelude::*;
use rstest::*;
use std::sync::Arc;
use tempfile::TempDir;

enum Backend {
	Memory,
	Local,
}

fn make_storage(backend: Backend) -> (Arc<dyn Storage>, Option<TempDir>) {
	match backend {
		Backend::Memory => (Arc::new(InMemoryStorage::new()), None),
		Backend::Local => {
			let dir = TempDir::new().unwrap();
			let storage = LocalStorage::new(dir.path());
			(Arc::new(storage), Some(dir))
		}
	}
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn test_save_and_read(#[case] backend: Backend) {
	// Arrange
	let (storage, _dir) = make_storage(backend);

	// Act
	let metadata = storage.save("images/logo.png", b"png-bytes").await.unwrap();
	let stored = storage.read(&metadata.path).await.unwrap();

	// Assert
	assert_eq!(metadata.path, "images/logo.png");
	assert_eq!(metadata.size, 9);
	assert_eq!(stored.content, b"png-bytes");
	assert_eq!(stored.metadata.checksum, metadata.checksum);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn test_save_never_overwrites(#[case] backend: Backend) {
	let (storage, _dir) = make_storage(backend);

	let first = storage.save("files/doc.pdf", b"one").await.unwrap();
	let second = storage.save("files/doc.pdf", b"two").await.unwrap();

	assert_eq!(first.path, "files/doc.pdf");
	assert_eq!(second.path, "files/doc_1.pdf");
	assert_eq!(storage.read(&first.path).await.unwrap().content, b"one");
	assert_eq!(storage.read(&second.path).await.unwrap().content, b"two");
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn test_copy_is_independent(#[case] backend: Backend) {
	let (storage, _dir) = make_storage(backend);
	let original = storage.save("images/a.jpg", b"jpeg").await.unwrap();

	let copy = storage.copy(&original.path).await.unwrap();
	storage.delete(&original.path).await.unwrap();

	assert_ne!(copy.path, original.path);
	assert!(!storage.exists(&original.path).await.unwrap());
	assert_eq!(storage.read(&copy.path).await.unwrap().content, b"jpeg");
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn test_missing_paths(#[case] backend: Backend) {
	let (storage, _dir) = make_storage(backend);

	assert!(matches!(
		storage.read("nope.txt").await,
		Err(StorageError::NotFound(_))
	));
	assert!(matches!(
		storage.delete("nope.txt").await,
		Err(StorageError::NotFound(_))
	));
	assert!(!storage.exists("nope.txt").await.unwrap());
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::local(Backend::Local)]
#[tokio::test]
async fn test_list_by_prefix(#[case] backend: Backend) {
	let (storage, _dir) = make_storage(backend);
	storage.save("images/b.png", b"b").await.unwrap();
	storage.save("images/a.png", b"a").await.unwrap();
	storage.save("files/c.txt", b"c").await.unwrap();

	let images = storage.list("images/").await.unwrap();

	assert_eq!(images, vec!["images/a.png", "images/b.png"]);
}

#[rstest]
#[tokio::test]
async fn test_invalid_names_rejected() {
	let storage = InMemoryStorage::new();

	assert!(matches!(
		storage.save("../escape.txt", b"x").await,
		Err(StorageError::InvalidName(_))
	));
	assert!(storage.is_empty());
}

#[rstest]
fn test_url_uses_base() {
	let storage = InMemoryStorage::new().with_base_url("https://cdn.example.com/");
	assert_eq!(storage.url("a.png"), "https://cdn.example.com/a.png");
}
