//! Permission lattice: inheritance, blocks, local and implicit roles


use canopy_cms::prelude::*;
use fixtures::{admin, page, unmanaged};
use rstest::rstest;
use uuid::Uuid;

fn reader() -> Principal {
	Principal::user(Uuid::new_v4()).with_role("Reader")
}

#[rstest]
#[tokio::test]
async fn test_view_inherited_from_portal() {
	// Arrange
	let cms = unmanaged().await;
	let parent = page(&cms, None, "Parent", "parent").await;
	let child = page(&cms, Some(parent.id), "Child", "child").await;
	let reader = reader();

	// Act
	cms.grant(Target::Portal, "Reader", "view").await.unwrap();

	// Assert
	assert!(cms.has_permission(&reader, parent.id, "view").await);
	assert!(cms.has_permission(&reader, child.id, "view").await);
	assert!(!cms.has_permission(&reader, child.id, "edit").await);
	assert!(!cms.has_permission(&Principal::anonymous(), child.id, "view").await);
}

#[rstest]
#[tokio::test]
async fn test_block_stops_inheritance_below() {
	// Arrange
	let cms = unmanaged().await;
	let blocked = page(&cms, None, "Blocked", "blocked").await;
	let inside = page(&cms, Some(blocked.id), "Inside", "inside").await;
	let open = page(&cms, None, "Open", "open").await;
	let reader = reader();
	cms.grant(Target::Portal, "Reader", "view").await.unwrap();
	assert!(cms.has_permission(&reader, inside.id, "view").await);

	// Act
	cms.add_inheritance_block(blocked.id, "view").await.unwrap();

	// Assert
	assert!(!cms.has_permission(&reader, blocked.id, "view").await);
	assert!(!cms.has_permission(&reader, inside.id, "view").await);
	assert!(cms.has_permission(&reader, open.id, "view").await);
}

#[rstest]
#[tokio::test]
async fn test_grant_on_blocked_object_wins() {
	// Arrange
	let cms = unmanaged().await;
	let blocked = page(&cms, None, "Blocked", "blocked").await;
	let inside = page(&cms, Some(blocked.id), "Inside", "inside").await;
	let reader = reader();
	cms.add_inheritance_block(blocked.id, "view").await.unwrap();

	// Act
	cms.grant(blocked.id, "Reader", "view").await.unwrap();

	// Assert
	assert!(cms.has_permission(&reader, blocked.id, "view").await);
	assert!(cms.has_permission(&reader, inside.id, "view").await);
}

#[rstest]
#[tokio::test]
async fn test_removing_block_restores_inheritance() {
	// Arrange
	let cms = unmanaged().await;
	let node = page(&cms, None, "Node", "node").await;
	let reader = reader();
	cms.grant(Target::Portal, "Reader", "view").await.unwrap();
	cms.add_inheritance_block(node.id, "view").await.unwrap();
	assert!(!cms.has_permission(&reader, node.id, "view").await);

	// Act
	cms.remove_inheritance_block(node.id, "view").await.unwrap();

	// Assert
	assert!(cms.has_permission(&reader, node.id, "view").await);
}

#[rstest]
#[tokio::test]
async fn test_local_role_applies_to_subtree() {
	// Arrange
	let cms = unmanaged().await;
	let section = page(&cms, None, "Section", "section").await;
	let inside = page(&cms, Some(section.id), "Inside", "inside").await;
	let elsewhere = page(&cms, None, "Elsewhere", "elsewhere").await;
	let user = Uuid::new_v4();
	let principal = Principal::user(user);
	cms.grant(Target::Portal, "Editor", "edit").await.unwrap();

	// Act
	cms.add_local_role(section.id, Actor::User(user), "Editor")
		.await
		.unwrap();

	// Assert
	assert!(cms.has_permission(&principal, section.id, "edit").await);
	assert!(cms.has_permission(&principal, inside.id, "edit").await);
	assert!(!cms.has_permission(&principal, elsewhere.id, "edit").await);
	let local = cms.local_roles(section.id).await;
	assert_eq!(local.get(&Actor::User(user)), Some(&vec!["Editor".to_string()]));
}

#[rstest]
#[tokio::test]
async fn test_group_local_role() {
	// Arrange
	let cms = unmanaged().await;
	let section = page(&cms, None, "Section", "section").await;
	let group = Uuid::new_v4();
	let member = Principal::user(Uuid::new_v4()).with_group(group);
	let outsider = Principal::user(Uuid::new_v4());
	cms.grant(Target::Portal, "Editor", "edit").await.unwrap();

	// Act
	cms.add_local_role(section.id, Actor::Group(group), "Editor")
		.await
		.unwrap();

	// Assert
	assert!(cms.has_permission(&member, section.id, "edit").await);
	assert!(!cms.has_permission(&outsider, section.id, "edit").await);

	cms.remove_local_role(section.id, Actor::Group(group), "Editor")
		.await
		.unwrap();
	assert!(!cms.has_permission(&member, section.id, "edit").await);
}

#[rstest]
#[tokio::test]
async fn test_creator_holds_owner_role() {
	// Arrange
	let cms = unmanaged().await;
	let author = Principal::user(Uuid::new_v4()).with_role("Editor");
	cms.grant(Target::Portal, "Editor", "add").await.unwrap();
	cms.grant(Target::Portal, "Owner", "edit").await.unwrap();
	let other = Principal::user(Uuid::new_v4()).with_role("Editor");

	// Act
	let node = cms
		.create(None, NodeFields::page("Mine"), &author)
		.await
		.unwrap();

	// Assert
	assert_eq!(node.creator, author.user);
	assert!(cms.has_permission(&author, node.id, "edit").await);
	assert!(!cms.has_permission(&other, node.id, "edit").await);
}

#[rstest]
#[tokio::test]
async fn test_anonymous_role_applies_to_everyone() {
	// Arrange
	let cms = unmanaged().await;
	let node = page(&cms, None, "Public", "public").await;

	// Act
	cms.grant(Target::Portal, "Anonymous", "view").await.unwrap();

	// Assert
	assert!(cms.has_permission(&Principal::anonymous(), node.id, "view").await);
	assert!(cms.has_permission(&reader(), node.id, "view").await);
}

#[rstest]
#[tokio::test]
async fn test_create_requires_add(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let parent = page(&cms, None, "Parent", "parent").await;
	let editor = Principal::user(Uuid::new_v4()).with_role("Editor");

	// Act
	let denied = cms
		.create(Some(parent.id), NodeFields::page("Child"), &editor)
		.await;
	cms.grant(parent.id, "Editor", "add").await.unwrap();
	let allowed = cms
		.create(Some(parent.id), NodeFields::page("Child"), &editor)
		.await;

	// Assert
	let Err(CmsError::PermissionDenied { permission, target }) = denied else {
		panic!("expected permission denied");
	};
	assert_eq!(permission, "add");
	assert_eq!(target, Target::Node(parent.id));
	assert!(allowed.is_ok());
	assert!(cms.delete(parent.id, &admin).await.is_ok());
}

#[rstest]
#[case::unknown_role("Janitor", "view")]
#[case::unknown_permission("Reader", "fly")]
#[tokio::test]
async fn test_grant_rejects_unregistered(#[case] role: &str, #[case] permission: &str) {
	// Arrange
	let cms = unmanaged().await;

	// Act
	let result = cms.grant(Target::Portal, role, permission).await;

	// Assert
	assert!(matches!(result, Err(CmsError::Validation(_))));
}

#[rstest]
#[tokio::test]
async fn test_portal_items_need_manage_portal() {
	// Arrange
	let cms = unmanaged().await;
	let editor = Principal::user(Uuid::new_v4()).with_role("Editor");
	cms.grant(Target::Portal, "Editor", "edit").await.unwrap();

	// Act
	let denied = cms.set_standard(Target::Portal, None, &editor).await;
	cms.grant(Target::Portal, "Editor", "manage_portal")
		.await
		.unwrap();
	let allowed = cms.set_standard(Target::Portal, None, &editor).await;

	// Assert
	assert!(matches!(denied, Err(CmsError::PermissionDenied { .. })));
	assert!(allowed.is_ok());
}

#[rstest]
#[tokio::test]
async fn test_decisions_cached_and_invalidated() {
	// Arrange
	let cms = unmanaged().await;
	let node = page(&cms, None, "Node", "node").await;
	let reader = reader();
	cms.grant(Target::Portal, "Reader", "view").await.unwrap();
	assert!(cms.has_permission(&reader, node.id, "view").await);
	let before = cms.cache_statistics().await;

	// Act
	assert!(cms.has_permission(&reader, node.id, "view").await);
	let after = cms.cache_statistics().await;
	cms.remove_grant(Target::Portal, "Reader", "view")
		.await
		.unwrap();

	// Assert
	assert_eq!(after.hits, before.hits + 1);
	assert!(!cms.has_permission(&reader, node.id, "view").await);
}
