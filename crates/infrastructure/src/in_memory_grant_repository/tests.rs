use std::sync::Arc;

use tessera_application::{CreateGrantInput, GrantRepository};
use tessera_core::{AppError, TenantId, UserId};
use tessera_domain::{AuthObject, AuthObjectId, AuthObjectType, ResourceId, ResourceKind};

use super::InMemoryGrantRepository;

fn input(resource_id: ResourceId, auth_object: AuthObject, permissions: &[&str]) -> CreateGrantInput {
    CreateGrantInput {
        resource_kind: ResourceKind::Api,
        resource_id,
        auth_object,
        permissions: permissions.iter().map(|value| (*value).to_owned()).collect(),
        is_creator_grant: false,
    }
}

#[tokio::test]
async fn create_and_find_grants_for_identities() {
    let repository = InMemoryGrantRepository::new();
    let tenant_id = TenantId::new();
    let user = UserId::new();
    let resource = ResourceId::new();
    let other_resource = ResourceId::new();

    let created = repository
        .create_grant(
            tenant_id,
            input(resource, AuthObject::user(user), &["view", "modify"]),
        )
        .await;
    assert!(created.is_ok());
    let other = repository
        .create_grant(
            tenant_id,
            input(other_resource, AuthObject::user(user), &["view"]),
        )
        .await;
    assert!(other.is_ok());

    let found = repository
        .find_grants_for_identities(tenant_id, ResourceKind::Api, &[resource], &[user.into()])
        .await;
    assert!(found.is_ok());
    let found = found.unwrap_or_default();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].permissions, vec!["view".to_owned(), "modify".to_owned()]);

    let listed = repository
        .list_grants_for_identities(tenant_id, ResourceKind::Api, &[user.into()])
        .await;
    assert_eq!(listed.map(|grants| grants.len()).ok(), Some(2));
}

#[tokio::test]
async fn grants_do_not_leak_across_tenants_or_kinds() {
    let repository = InMemoryGrantRepository::new();
    let tenant_id = TenantId::new();
    let user = UserId::new();
    let resource = ResourceId::new();

    let created = repository
        .create_grant(tenant_id, input(resource, AuthObject::user(user), &["view"]))
        .await;
    assert!(created.is_ok());

    let other_tenant = repository
        .list_grants_for_resource(TenantId::new(), ResourceKind::Api, resource)
        .await;
    let other_kind = repository
        .list_grants_for_resource(tenant_id, ResourceKind::Service, resource)
        .await;

    assert_eq!(other_tenant.map(|grants| grants.len()).ok(), Some(0));
    assert_eq!(other_kind.map(|grants| grants.len()).ok(), Some(0));
}

#[tokio::test]
async fn duplicate_grantee_and_second_creator_grant_conflict() {
    let repository = InMemoryGrantRepository::new();
    let tenant_id = TenantId::new();
    let resource = ResourceId::new();
    let grantee = AuthObject::user(UserId::new());

    let first = repository
        .create_grant(tenant_id, input(resource, grantee, &["view"]))
        .await;
    assert!(first.is_ok());
    let duplicate = repository
        .create_grant(tenant_id, input(resource, grantee, &["modify"]))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let creator = repository
        .create_grant(
            tenant_id,
            CreateGrantInput {
                is_creator_grant: true,
                ..input(resource, AuthObject::user(UserId::new()), &["view"])
            },
        )
        .await;
    assert!(creator.is_ok());
    let second_creator = repository
        .create_grant(
            tenant_id,
            CreateGrantInput {
                is_creator_grant: true,
                ..input(resource, AuthObject::user(UserId::new()), &["view"])
            },
        )
        .await;
    assert!(matches!(second_creator, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn same_id_with_different_object_type_is_a_distinct_grantee() {
    let repository = InMemoryGrantRepository::new();
    let tenant_id = TenantId::new();
    let resource = ResourceId::new();
    let shared_id = AuthObjectId::new();
    let department = AuthObject::org_unit(shared_id, AuthObjectType::Dept);
    let group = AuthObject::org_unit(shared_id, AuthObjectType::Group);
    assert!(department.is_ok());
    assert!(group.is_ok());

    let first = repository
        .create_grant(
            tenant_id,
            input(resource, department.unwrap_or_else(|_| unreachable!()), &["view"]),
        )
        .await;
    let second = repository
        .create_grant(
            tenant_id,
            input(resource, group.unwrap_or_else(|_| unreachable!()), &["view"]),
        )
        .await;

    assert!(first.is_ok());
    assert!(second.is_ok());
}

#[tokio::test]
async fn replace_and_delete_respect_creator_grant() {
    let repository = InMemoryGrantRepository::new();
    let tenant_id = TenantId::new();
    let resource = ResourceId::new();

    let creator = repository
        .create_grant(
            tenant_id,
            CreateGrantInput {
                is_creator_grant: true,
                ..input(resource, AuthObject::user(UserId::new()), &["view"])
            },
        )
        .await;
    assert!(creator.is_ok());
    let creator = creator.unwrap_or_else(|_| unreachable!());
    let grant = repository
        .create_grant(
            tenant_id,
            input(resource, AuthObject::user(UserId::new()), &["view"]),
        )
        .await;
    assert!(grant.is_ok());
    let grant = grant.unwrap_or_else(|_| unreachable!());

    let replace_creator = repository
        .replace_grant_permissions(
            tenant_id,
            ResourceKind::Api,
            creator.grant_id,
            vec!["view".to_owned()],
        )
        .await;
    let delete_creator = repository
        .delete_grant(tenant_id, ResourceKind::Api, creator.grant_id)
        .await;
    assert!(matches!(replace_creator, Err(AppError::Validation(_))));
    assert!(matches!(delete_creator, Err(AppError::Validation(_))));

    let replaced = repository
        .replace_grant_permissions(
            tenant_id,
            ResourceKind::Api,
            grant.grant_id,
            vec!["debug".to_owned()],
        )
        .await;
    assert_eq!(
        replaced.map(|record| record.permissions).ok(),
        Some(vec!["debug".to_owned()])
    );

    let deleted = repository
        .delete_grant(tenant_id, ResourceKind::Api, grant.grant_id)
        .await;
    assert!(deleted.is_ok());
    let missing = repository
        .delete_grant(tenant_id, ResourceKind::Api, grant.grant_id)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn delete_grants_for_resource_returns_removed_count() {
    let repository = InMemoryGrantRepository::new();
    let tenant_id = TenantId::new();
    let resource = ResourceId::new();
    for _ in 0..3 {
        let created = repository
            .create_grant(
                tenant_id,
                input(resource, AuthObject::user(UserId::new()), &["view"]),
            )
            .await;
        assert!(created.is_ok());
    }

    let removed = repository
        .delete_grants_for_resource(tenant_id, ResourceKind::Api, resource)
        .await;

    assert_eq!(removed.ok(), Some(3));
}

#[tokio::test]
async fn concurrent_creator_provisioning_yields_single_grant() {
    let repository = Arc::new(InMemoryGrantRepository::new());
    let tenant_id = TenantId::new();
    let resource = ResourceId::new();
    let user = UserId::new();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repository = repository.clone();
        handles.push(tokio::spawn(async move {
            repository
                .create_grant(
                    tenant_id,
                    CreateGrantInput {
                        resource_kind: ResourceKind::Api,
                        resource_id: resource,
                        auth_object: AuthObject::user(user),
                        permissions: vec!["view".to_owned()],
                        is_creator_grant: true,
                    },
                )
                .await
                .is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if matches!(handle.await, Ok(true)) {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
}
