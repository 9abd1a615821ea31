//! Content tree behaviour: slugs, positions, moves, deletes, standards and paths


use canopy_cms::prelude::*;
use fixtures::{admin, bootstrapped, child_slugs, editor, page, unmanaged};
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn test_sibling_slugs_are_made_unique(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	page(&cms, None, "Welcome", "welcome").await;

	// Act
	let second = page(&cms, None, "Welcome again", "welcome").await;
	let german = cms
		.create(
			None,
			NodeFields::page("Willkommen")
				.with_slug("welcome")
				.with_language(Language::code("de")),
			&admin,
		)
		.await
		.unwrap();
	let neutral = cms
		.create(
			None,
			NodeFields::page("Everyone")
				.with_slug("welcome")
				.with_language(Language::Neutral),
			&admin,
		)
		.await
		.unwrap();

	// Assert
	assert_eq!(second.slug, "welcome-1");
	assert_eq!(german.slug, "welcome");
	assert_eq!(neutral.slug, "welcome-2");
}

#[rstest]
#[tokio::test]
async fn test_slug_derived_from_title(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;

	// Act
	let node = cms
		.create(None, NodeFields::page("About Our Team"), &admin)
		.await
		.unwrap();

	// Assert
	assert_eq!(node.slug, "about-our-team");
	assert_eq!(node.language, Language::code("en"));
	assert_eq!(node.position, 10);
}

#[rstest]
#[case::empty_title("   ", None)]
#[case::bad_slug("Title", Some("Not A Slug"))]
#[tokio::test]
async fn test_create_rejects_invalid_fields(
	admin: Principal,
	#[case] title: &str,
	#[case] slug: Option<&str>,
) {
	// Arrange
	let cms = unmanaged().await;
	let mut fields = NodeFields::page(title);
	fields.slug = slug.map(str::to_string);

	// Act
	let result = cms.create(None, fields, &admin).await;

	// Assert
	assert!(matches!(result, Err(CmsError::Validation(_))));
	assert!(cms.children(None, None).await.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_unregistered_kind_is_rejected(admin: Principal) {
	// Arrange
	let cms = Cms::builder().build().unwrap();

	// Act
	let result = cms.create(None, NodeFields::page("Orphan"), &admin).await;

	// Assert
	let Err(CmsError::Validation(errors)) = result else {
		panic!("expected a validation error");
	};
	assert!(errors.get("kind").is_some());
}

#[rstest]
#[tokio::test]
async fn test_disallowed_subtype(admin: Principal) {
	// Arrange
	let cms = bootstrapped().await;
	let gallery = cms
		.create(
			None,
			NodeFields::new("Photos", ContentBody::Gallery { images_columns: 3 }),
			&admin,
		)
		.await
		.unwrap();

	// Act
	let result = cms
		.create(Some(gallery.id), NodeFields::page("Inside"), &admin)
		.await;

	// Assert
	assert!(matches!(
		result,
		Err(CmsError::StructuralConflict(ConflictKind::DisallowedKind))
	));
	assert_eq!(gallery.template.as_deref(), Some("Gallery"));
}

#[rstest]
#[tokio::test]
async fn test_move_renumbers_siblings(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let first = page(&cms, None, "First", "first").await;
	page(&cms, None, "Second", "second").await;
	let third = page(&cms, None, "Third", "third").await;

	// Act
	let moved = cms.move_node(third.id, 0, &admin).await.unwrap();
	cms.move_node(first.id, 35, &admin).await.unwrap();

	// Assert
	assert_eq!(moved.position, 10);
	assert_eq!(child_slugs(&cms, None).await, vec!["third", "second", "first"]);
	let positions: Vec<i64> = cms
		.children(None, None)
		.await
		.iter()
		.map(|node| node.position)
		.collect();
	assert_eq!(positions, vec![10, 20, 30]);
}

#[rstest]
#[tokio::test]
async fn test_move_ties_broken_by_title(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let zebra = page(&cms, None, "Zebra", "zebra").await;
	let apple = page(&cms, None, "Apple", "apple").await;

	// Act
	cms.move_node(apple.id, zebra.position, &admin).await.unwrap();

	// Assert
	assert_eq!(child_slugs(&cms, None).await, vec!["apple", "zebra"]);
}

#[rstest]
#[tokio::test]
async fn test_reparent_appends_and_resolves_slug(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let target = page(&cms, None, "Target", "target").await;
	page(&cms, Some(target.id), "News", "news").await;
	let news = page(&cms, None, "News", "news").await;

	// Act
	let moved = cms.reparent(news.id, Some(target.id), &admin).await.unwrap();

	// Assert
	assert_eq!(moved.id, news.id);
	assert_eq!(moved.parent, Some(target.id));
	assert_eq!(moved.slug, "news-1");
	assert_eq!(moved.position, 20);
	assert_eq!(child_slugs(&cms, None).await, vec!["target"]);
	assert_eq!(
		cms.absolute_path(news.id).await.as_deref(),
		Some("/target/news-1/")
	);
}

#[rstest]
#[tokio::test]
async fn test_reparent_structural_conflicts(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let outer = page(&cms, None, "Outer", "outer").await;
	let inner = page(&cms, Some(outer.id), "Inner", "inner").await;

	// Act
	let into_self = cms.reparent(outer.id, Some(outer.id), &admin).await;
	let into_child = cms.reparent(outer.id, Some(inner.id), &admin).await;
	let same_place = cms.reparent(inner.id, Some(outer.id), &admin).await;

	// Assert
	assert!(matches!(
		into_self,
		Err(CmsError::StructuralConflict(ConflictKind::SelfTarget))
	));
	assert!(matches!(
		into_child,
		Err(CmsError::StructuralConflict(ConflictKind::Cycle))
	));
	assert!(matches!(
		same_place,
		Err(CmsError::StructuralConflict(ConflictKind::NoOp))
	));
	assert_eq!(cms.node(inner.id).await.unwrap().parent, Some(outer.id));
}

#[rstest]
#[tokio::test]
async fn test_delete_cascades(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let parent = page(&cms, None, "Parent", "parent").await;
	let child = page(&cms, Some(parent.id), "Child", "child").await;
	let grandchild = page(&cms, Some(child.id), "Grandchild", "grandchild").await;
	let sibling = page(&cms, None, "Sibling", "sibling").await;

	// Act
	let deleted = cms.delete(parent.id, &admin).await.unwrap();

	// Assert
	assert_eq!(deleted.len(), 3);
	for id in [parent.id, child.id, grandchild.id] {
		assert!(cms.get(id).await.is_none());
	}
	let remaining = cms.node(sibling.id).await.unwrap();
	assert_eq!(remaining.position, 10);
}

#[rstest]
#[tokio::test]
async fn test_delete_denied_for_part_of_subtree(admin: Principal, editor: Principal) {
	// Arrange
	let cms = bootstrapped().await;
	let own = cms
		.create(None, NodeFields::page("Mine"), &editor)
		.await
		.unwrap();
	let foreign = page(&cms, Some(own.id), "Not mine", "not-mine").await;

	// Act
	let result = cms.delete(own.id, &editor).await;

	// Assert
	assert!(matches!(result, Err(CmsError::PermissionDenied { .. })));
	assert!(cms.get(own.id).await.is_some());
	assert!(cms.get(foreign.id).await.is_some());
	assert!(cms.delete(own.id, &admin).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn test_delete_many_skips_missing(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let first = page(&cms, None, "First", "first").await;
	let missing = uuid::Uuid::new_v4();

	// Act
	let outcome = cms.delete_many(&[first.id, missing], &admin).await.unwrap();

	// Assert
	assert_eq!(outcome.succeeded, vec![first.id]);
	assert_eq!(outcome.skipped.len(), 1);
	assert_eq!(outcome.skipped[0].id, missing);
	assert!(outcome.summary().contains("skipped"));
}

#[rstest]
#[tokio::test]
async fn test_standard_must_be_descendant(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let parent = page(&cms, None, "Parent", "parent").await;
	let child = page(&cms, Some(parent.id), "Child", "child").await;
	let sibling = page(&cms, None, "Sibling", "sibling").await;

	// Act
	cms.set_standard(parent.id, Some(child.id), &admin)
		.await
		.unwrap();
	let invalid = cms
		.update(parent.id, NodeUpdate::new().standard(Some(sibling.id)), &admin)
		.await;

	// Assert
	assert!(matches!(
		invalid,
		Err(CmsError::StructuralConflict(ConflictKind::InvalidStandard))
	));
	assert_eq!(cms.node(parent.id).await.unwrap().standard, Some(child.id));
}

#[rstest]
#[tokio::test]
async fn test_standard_dropped_when_moved_away(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let parent = page(&cms, None, "Parent", "parent").await;
	let child = page(&cms, Some(parent.id), "Child", "child").await;
	cms.set_standard(parent.id, Some(child.id), &admin)
		.await
		.unwrap();

	// Act
	cms.reparent(child.id, None, &admin).await.unwrap();

	// Assert
	assert_eq!(cms.node(parent.id).await.unwrap().standard, None);
}

#[rstest]
#[tokio::test]
async fn test_update_resolves_slug_collision(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	page(&cms, None, "Taken", "taken").await;
	let other = page(&cms, None, "Other", "other").await;

	// Act
	let updated = cms
		.update(other.id, NodeUpdate::new().slug("taken").title("Renamed"), &admin)
		.await
		.unwrap();

	// Assert
	assert_eq!(updated.slug, "taken-1");
	assert_eq!(updated.title, "Renamed");
	assert!(updated.searchable_text.contains("Renamed"));
}

#[rstest]
#[tokio::test]
async fn test_resolve_path_prefers_concrete_language(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let about = page(&cms, None, "About", "about").await;
	let team = page(&cms, Some(about.id), "Team", "team").await;
	let neutral = cms
		.create(
			None,
			NodeFields::page("Imprint")
				.with_slug("imprint")
				.with_language(Language::Neutral),
			&admin,
		)
		.await
		.unwrap();
	let en = Language::code("en");
	let de = Language::code("de");

	// Act & Assert
	assert_eq!(cms.resolve_path("/about/team/", &en).await, Some(team.id));
	assert_eq!(cms.resolve_path("about/team", &en).await, Some(team.id));
	assert_eq!(cms.resolve_path("/about/team/", &de).await, None);
	assert_eq!(cms.resolve_path("/imprint", &de).await, Some(neutral.id));
	assert_eq!(cms.resolve_path("/missing", &en).await, None);
}

#[rstest]
#[tokio::test]
async fn test_resolve_path_follows_renames(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let about = page(&cms, None, "About", "about").await;
	let en = Language::code("en");
	assert_eq!(cms.resolve_path("/about/", &en).await, Some(about.id));

	// Act
	cms.update(about.id, NodeUpdate::new().slug("about-us"), &admin)
		.await
		.unwrap();

	// Assert
	assert_eq!(cms.resolve_path("/about/", &en).await, None);
	assert_eq!(cms.resolve_path("/about-us/", &en).await, Some(about.id));
}

#[rstest]
#[tokio::test]
async fn test_comments_resolve_through_ancestors(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let parent = page(&cms, None, "Parent", "parent").await;
	let child = page(&cms, Some(parent.id), "Child", "child").await;
	assert!(!cms.are_comments_allowed(child.id).await.unwrap());

	// Act
	cms.update(parent.id, NodeUpdate::new().allow_comments(CommentPolicy::Yes), &admin)
		.await
		.unwrap();

	// Assert
	assert!(cms.are_comments_allowed(child.id).await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_translation_lifecycle(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let de = Language::code("de");
	let parent = page(&cms, None, "Welcome", "welcome").await;
	let child = page(&cms, Some(parent.id), "News", "news").await;

	// Act
	let parent_de = cms
		.translate(parent.id, &de, TranslationFields::new("Willkommen"), &admin)
		.await
		.unwrap();
	let child_de = cms
		.translate(child.id, &de, TranslationFields::new("Neuigkeiten"), &admin)
		.await
		.unwrap();
	let duplicate = cms
		.translate(parent.id, &de, TranslationFields::new("Nochmal"), &admin)
		.await;
	let updated = cms
		.translate(
			parent.id,
			&de,
			TranslationFields::new("Hallo").updating(parent_de.id),
			&admin,
		)
		.await
		.unwrap();

	// Assert
	assert_eq!(parent_de.canonical, Some(parent.id));
	assert_eq!(parent_de.slug, "willkommen");
	assert_eq!(parent_de.parent, None);
	assert_eq!(child_de.parent, Some(parent_de.id));
	assert!(matches!(duplicate, Err(CmsError::Validation(_))));
	assert_eq!(updated.id, parent_de.id);
	assert_eq!(updated.title, "Hallo");
	assert_eq!(
		cms.get_translation(child.id, &de).await.map(|n| n.id),
		Some(child_de.id)
	);
	assert_eq!(
		cms.canonical_of(child_de.id).await.map(|n| n.id),
		Some(child.id)
	);
	assert!(cms.has_language(parent.id, &de).await);
	assert_eq!(cms.translations(parent.id).await.len(), 1);
}

#[rstest]
#[case::neutral_target(Language::Neutral)]
#[case::same_as_canonical(Language::code("en"))]
#[case::not_enabled(Language::code("fr"))]
#[tokio::test]
async fn test_translate_rejects_language(admin: Principal, #[case] language: Language) {
	// Arrange
	let cms = unmanaged().await;
	let node = page(&cms, None, "Welcome", "welcome").await;

	// Act
	let result = cms
		.translate(node.id, &language, TranslationFields::new("Other"), &admin)
		.await;

	// Assert
	assert!(matches!(result, Err(CmsError::Validation(_))));
}

#[rstest]
#[tokio::test]
async fn test_deleting_canonical_detaches_translations(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let de = Language::code("de");
	let node = page(&cms, None, "Welcome", "welcome").await;
	let translation = cms
		.translate(node.id, &de, TranslationFields::new("Willkommen"), &admin)
		.await
		.unwrap();

	// Act
	cms.delete(node.id, &admin).await.unwrap();

	// Assert
	let orphan = cms.node(translation.id).await.unwrap();
	assert!(orphan.is_canonical());
}

#[rstest]
#[tokio::test]
async fn test_history_records_operations(admin: Principal) {
	// Arrange
	let cms = unmanaged().await;
	let node = page(&cms, None, "Welcome", "welcome").await;

	// Act
	cms.update(node.id, NodeUpdate::new().title("Hello"), &admin)
		.await
		.unwrap();
	cms.move_node(node.id, 5, &admin).await.unwrap();

	// Assert
	let actions: Vec<HistoryAction> = cms
		.history(node.id)
		.await
		.into_iter()
		.map(|entry| entry.action)
		.collect();
	assert_eq!(
		actions,
		vec![
			HistoryAction::Created,
			HistoryAction::Edited,
			HistoryAction::Moved { position: 10 },
		]
	);
}
