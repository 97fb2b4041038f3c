use crate::core::constants::{GROUP_CREATED, GROUP_UPDATED, MEMBER_ADDED, MEMBER_REMOVED};
use crate::core::errors::SplitError;
use crate::core::models::{GroupUpdate, Role};
use crate::tests::{create_test_service, group_with, register};
use std::sync::Arc;

#[tokio::test]
async fn test_create_group() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;

    let group = service
        .create_group(&alice, "  Goa Trip ".to_string(), Some("Beach week".to_string()))
        .await
        .unwrap();

    assert_eq!(group.name, "Goa Trip");
    assert_eq!(group.description.as_deref(), Some("Beach week"));
    assert_eq!(group.created_by.id, alice.id);
    assert_eq!(group.members.len(), 1);
    assert_eq!(group.members[0].user.id, alice.id);
    assert_eq!(group.members[0].role, Role::Creator);

    let activity = service.group_activity(&group.id, &alice).await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].action, GROUP_CREATED);
}

#[tokio::test]
async fn test_create_group_invalid_name() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;

    let result = service.create_group(&alice, "   ".to_string(), None).await;
    assert!(matches!(result, Err(SplitError::InvalidInput(field, _)) if field == "name"));

    let result = service.create_group(&alice, "x".repeat(101), None).await;
    assert!(matches!(result, Err(SplitError::InvalidInput(field, _)) if field == "name"));
}

#[tokio::test]
async fn test_list_groups_only_includes_memberships() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;

    let shared = group_with(&service, &alice, &[&bob]).await;
    service.create_group(&alice, "Solo".to_string(), None).await.unwrap();

    let alice_groups = service.list_groups(&alice).await.unwrap();
    assert_eq!(alice_groups.len(), 2);

    let bob_groups = service.list_groups(&bob).await.unwrap();
    assert_eq!(bob_groups.len(), 1);
    assert_eq!(bob_groups[0].id, shared.id);
}

#[tokio::test]
async fn test_get_group_requires_membership() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let mallory = register(&service, "Mallory").await;
    let group = group_with(&service, &alice, &[]).await;

    let result = service.get_group(&group.id, &mallory).await;
    assert!(matches!(result, Err(SplitError::GroupNotFound(_))));

    let result = service.get_group("missing", &alice).await;
    assert!(matches!(result, Err(SplitError::GroupNotFound(_))));
}

#[tokio::test]
async fn test_add_member() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let carol = register(&service, "Carol").await;
    let group = group_with(&service, &alice, &[&bob]).await;

    assert_eq!(group.members.len(), 2);
    assert_eq!(group.members[1].user.id, bob.id);
    assert_eq!(group.members[1].role, Role::Member);

    // Any member may add others, not only the creator.
    let group = service.add_member(&group.id, &bob, &carol.id).await.unwrap();
    assert_eq!(group.members.len(), 3);

    let result = service.add_member(&group.id, &alice, &bob.id).await;
    assert!(matches!(result, Err(SplitError::AlreadyGroupMember(id)) if id == bob.id));

    let result = service.add_member(&group.id, &alice, "ghost").await;
    assert!(matches!(result, Err(SplitError::UserNotFound(_))));

    let activity = service.group_activity(&group.id, &alice).await.unwrap();
    assert_eq!(activity[0].action, MEMBER_ADDED);
    assert_eq!(activity[0].user_id.as_deref(), Some(bob.id.as_str()));
    assert_eq!(activity[0].details["user_id"], serde_json::json!(carol.id));
}

#[tokio::test]
async fn test_add_member_requires_membership() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let mallory = register(&service, "Mallory").await;
    let group = group_with(&service, &alice, &[]).await;

    let result = service.add_member(&group.id, &mallory, &mallory.id).await;
    assert!(matches!(result, Err(SplitError::GroupNotFound(_))));
}

#[tokio::test]
async fn test_remove_member() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let carol = register(&service, "Carol").await;
    let group = group_with(&service, &alice, &[&bob, &carol]).await;

    // Only the creator may remove members.
    let result = service.remove_member(&group.id, &bob, &carol.id).await;
    assert!(matches!(result, Err(SplitError::GroupNotFound(_))));

    let group = service.remove_member(&group.id, &alice, &carol.id).await.unwrap();
    assert_eq!(group.members.len(), 2);
    assert!(group.members.iter().all(|m| m.user.id != carol.id));

    let result = service.remove_member(&group.id, &alice, &carol.id).await;
    assert!(matches!(result, Err(SplitError::NotGroupMember(_))));

    let result = service.remove_member(&group.id, &alice, &alice.id).await;
    assert!(matches!(result, Err(SplitError::CannotRemoveCreator)));

    let result = service.get_group(&group.id, &carol).await;
    assert!(matches!(result, Err(SplitError::GroupNotFound(_))));

    let activity = service.group_activity(&group.id, &alice).await.unwrap();
    assert_eq!(activity[0].action, MEMBER_REMOVED);
}

#[tokio::test]
async fn test_update_group() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let group = group_with(&service, &alice, &[&bob]).await;

    let update = GroupUpdate {
        name: Some("Flat".to_string()),
        description: Some("Shared rent".to_string()),
    };
    let result = service.update_group(&group.id, &bob, update.clone()).await;
    assert!(matches!(result, Err(SplitError::GroupNotFound(_))));

    let updated = service.update_group(&group.id, &alice, update).await.unwrap();
    assert_eq!(updated.name, "Flat");
    assert_eq!(updated.description.as_deref(), Some("Shared rent"));
    assert_eq!(updated.members.len(), 2);

    let activity = service.group_activity(&group.id, &bob).await.unwrap();
    assert_eq!(activity[0].action, GROUP_UPDATED);
}

#[tokio::test]
async fn test_group_update_rejects_unknown_fields() {
    let result = serde_json::from_str::<GroupUpdate>(r#"{"members": []}"#);
    assert!(result.is_err());

    let result = serde_json::from_str::<GroupUpdate>(r#"{"createdBy": "someone"}"#);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_group_activity_is_scoped_to_group() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let first = group_with(&service, &alice, &[&bob]).await;
    let second = group_with(&service, &alice, &[]).await;

    let first_activity = service.group_activity(&first.id, &alice).await.unwrap();
    assert_eq!(first_activity.len(), 2);
    assert!(first_activity.iter().all(|entry| entry.group_id.as_deref() == Some(first.id.as_str())));

    let second_activity = service.group_activity(&second.id, &alice).await.unwrap();
    assert_eq!(second_activity.len(), 1);

    let result = service.group_activity(&second.id, &bob).await;
    assert!(matches!(result, Err(SplitError::GroupNotFound(_))));
}

#[tokio::test]
async fn test_empty_group_update_changes_nothing() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let group = group_with(&service, &alice, &[&bob]).await;
    let before = service.group_activity(&group.id, &alice).await.unwrap();

    let unchanged = service
        .update_group(&group.id, &alice, GroupUpdate::default())
        .await
        .unwrap();
    assert_eq!(unchanged.name, group.name);
    assert_eq!(unchanged.members.len(), 2);

    let after = service.group_activity(&group.id, &alice).await.unwrap();
    assert_eq!(after.len(), before.len());
    assert_eq!(after[0].action, MEMBER_ADDED);

    // Still creator-only, even when there is nothing to change.
    let result = service.update_group(&group.id, &bob, GroupUpdate::default()).await;
    assert!(matches!(result, Err(SplitError::GroupNotFound(_))));
}

#[tokio::test]
async fn test_update_group_clears_blank_description() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let group = service
        .create_group(&alice, "Flat".to_string(), Some("Rent".to_string()))
        .await
        .unwrap();

    let update = GroupUpdate {
        name: None,
        description: Some("  ".to_string()),
    };
    let updated = service.update_group(&group.id, &alice, update).await.unwrap();
    assert_eq!(updated.name, "Flat");
    assert_eq!(updated.description, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_membership_changes_are_all_kept() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let leaving = register(&service, "Leaving").await;
    let group = group_with(&service, &alice, &[&leaving]).await;

    let mut newcomers = Vec::new();
    for i in 0..8 {
        newcomers.push(register(&service, &format!("Friend{}", i)).await);
    }
    let service = Arc::new(service);

    let mut tasks = Vec::new();
    for newcomer in &newcomers {
        let service = service.clone();
        let (group_id, alice, newcomer_id) = (group.id.clone(), alice.clone(), newcomer.id.clone());
        tasks.push(tokio::spawn(async move {
            service.add_member(&group_id, &alice, &newcomer_id).await.map(|_| ())
        }));
    }
    {
        let service = service.clone();
        let (group_id, alice, leaving_id) = (group.id.clone(), alice.clone(), leaving.id.clone());
        tasks.push(tokio::spawn(async move {
            service.remove_member(&group_id, &alice, &leaving_id).await.map(|_| ())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let group = service.get_group(&group.id, &alice).await.unwrap();
    assert_eq!(group.members.len(), 1 + newcomers.len());
    assert!(group.members.iter().all(|m| m.user.id != leaving.id));
    for newcomer in &newcomers {
        assert!(group.members.iter().any(|m| m.user.id == newcomer.id));
    }
}
