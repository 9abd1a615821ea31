//! The facade wires the engine to the default backends

use canopy::prelude::*;
use rstest::rstest;
use std::sync::Arc;
use uuid::Uuid;

#[rstest]
#[tokio::test]
async fn test_bootstrapped_engine_through_facade() {
	// Arrange
	let cms = Cms::builder()
		.settings(Settings::default())
		.storage(Arc::new(InMemoryStorage::new()))
		.build()
		.unwrap();
	cms.bootstrap().await.unwrap();
	let admin = Principal::superuser();
	let editor = Principal::user(Uuid::new_v4()).with_role(canopy::bootstrap::EDITOR);

	// Act
	let page = cms
		.create(None, NodeFields::page("Start"), &editor)
		.await
		.unwrap();
	let anonymous_before = cms.has_permission(&Principal::anonymous(), page.id, "view").await;
	cms.do_transition(page.id, "Make public", &admin).await.unwrap();

	// Assert
	assert_eq!(page.slug, "start");
	assert_eq!(page.creator, editor.user);
	assert!(!anonymous_before);
	assert!(cms.has_permission(&Principal::anonymous(), page.id, "view").await);
	assert_eq!(cms.absolute_path(page.id).await.as_deref(), Some("/start/"));
}
