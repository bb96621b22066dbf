use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tessera_application::{CreateGrantInput, GrantRepository};
use tessera_core::{AppError, TenantId, UserId};
use tessera_domain::{AuthObject, AuthObjectId, AuthObjectType, ResourceId, ResourceKind};

use super::PostgresGrantRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres grant tests: {error}");
    }

    Some(pool)
}

fn grant_input(
    resource_kind: ResourceKind,
    resource_id: ResourceId,
    auth_object: AuthObject,
    permissions: &[&str],
    is_creator_grant: bool,
) -> CreateGrantInput {
    CreateGrantInput {
        resource_kind,
        resource_id,
        auth_object,
        permissions: permissions.iter().map(|value| (*value).to_owned()).collect(),
        is_creator_grant,
    }
}

#[tokio::test]
async fn create_grant_round_trips_through_identity_lookup() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool);
    let tenant_id = TenantId::new();
    let user = UserId::new();
    let department = AuthObject::org_unit(AuthObjectId::new(), AuthObjectType::Dept);
    assert!(department.is_ok());
    let department = department.unwrap_or_else(|_| unreachable!());
    let resource = ResourceId::new();

    let direct = repository
        .create_grant(
            tenant_id,
            grant_input(
                ResourceKind::Api,
                resource,
                AuthObject::user(user),
                &["view"],
                false,
            ),
        )
        .await;
    assert!(direct.is_ok());
    let via_department = repository
        .create_grant(
            tenant_id,
            grant_input(
                ResourceKind::Api,
                resource,
                department,
                &["view", "debug"],
                false,
            ),
        )
        .await;
    assert!(via_department.is_ok());

    let found = repository
        .find_grants_for_identities(
            tenant_id,
            ResourceKind::Api,
            &[resource],
            &[user.into(), department.id],
        )
        .await;
    assert!(found.is_ok());
    let found = found.unwrap_or_default();
    assert_eq!(found.len(), 2);
    assert!(
        found
            .iter()
            .any(|record| record.auth_object == department
                && record.permissions == vec!["view".to_owned(), "debug".to_owned()])
    );

    let other_kind = repository
        .find_grants_for_identities(
            tenant_id,
            ResourceKind::Service,
            &[resource],
            &[user.into()],
        )
        .await;
    assert_eq!(other_kind.map(|records| records.len()).ok(), Some(0));
}

#[tokio::test]
async fn duplicate_grants_map_to_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool);
    let tenant_id = TenantId::new();
    let resource = ResourceId::new();
    let grantee = AuthObject::user(UserId::new());

    let first = repository
        .create_grant(
            tenant_id,
            grant_input(ResourceKind::TaskSprint, resource, grantee, &["view"], false),
        )
        .await;
    assert!(first.is_ok());
    let duplicate = repository
        .create_grant(
            tenant_id,
            grant_input(ResourceKind::TaskSprint, resource, grantee, &["test"], false),
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let creator = repository
        .create_grant(
            tenant_id,
            grant_input(
                ResourceKind::TaskSprint,
                resource,
                AuthObject::user(UserId::new()),
                &["view"],
                true,
            ),
        )
        .await;
    assert!(creator.is_ok());
    let second_creator = repository
        .create_grant(
            tenant_id,
            grant_input(
                ResourceKind::TaskSprint,
                resource,
                AuthObject::user(UserId::new()),
                &["view"],
                true,
            ),
        )
        .await;
    assert!(matches!(second_creator, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn creator_grant_is_immutable_in_storage() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool);
    let tenant_id = TenantId::new();
    let resource = ResourceId::new();

    let creator = repository
        .create_grant(
            tenant_id,
            grant_input(
                ResourceKind::MockService,
                resource,
                AuthObject::user(UserId::new()),
                &["view", "release"],
                true,
            ),
        )
        .await;
    assert!(creator.is_ok());
    let creator = creator.unwrap_or_else(|_| unreachable!());

    let replaced = repository
        .replace_grant_permissions(
            tenant_id,
            ResourceKind::MockService,
            creator.grant_id,
            vec!["view".to_owned()],
        )
        .await;
    let deleted = repository
        .delete_grant(tenant_id, ResourceKind::MockService, creator.grant_id)
        .await;

    assert!(matches!(replaced, Err(AppError::Validation(_))));
    assert!(matches!(deleted, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn replace_delete_and_cascade_update_state() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool);
    let tenant_id = TenantId::new();
    let resource = ResourceId::new();
    let user = UserId::new();

    let created = repository
        .create_grant(
            tenant_id,
            grant_input(
                ResourceKind::Service,
                resource,
                AuthObject::user(user),
                &["view"],
                false,
            ),
        )
        .await;
    assert!(created.is_ok());
    let created = created.unwrap_or_else(|_| unreachable!());

    let replaced = repository
        .replace_grant_permissions(
            tenant_id,
            ResourceKind::Service,
            created.grant_id,
            vec!["view".to_owned(), "share".to_owned()],
        )
        .await;
    assert_eq!(
        replaced.map(|record| record.permissions).ok(),
        Some(vec!["view".to_owned(), "share".to_owned()])
    );

    let second = repository
        .create_grant(
            tenant_id,
            grant_input(
                ResourceKind::Service,
                resource,
                AuthObject::user(UserId::new()),
                &["view"],
                false,
            ),
        )
        .await;
    assert!(second.is_ok());
    let second = second.unwrap_or_else(|_| unreachable!());

    let deleted = repository
        .delete_grant(tenant_id, ResourceKind::Service, second.grant_id)
        .await;
    assert!(deleted.is_ok());
    let missing = repository
        .delete_grant(tenant_id, ResourceKind::Service, second.grant_id)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let removed = repository
        .delete_grants_for_resource(tenant_id, ResourceKind::Service, resource)
        .await;
    assert_eq!(removed.ok(), Some(1));
    let remaining = repository
        .list_grants_for_resource(tenant_id, ResourceKind::Service, resource)
        .await;
    assert_eq!(remaining.map(|records| records.len()).ok(), Some(0));
}
