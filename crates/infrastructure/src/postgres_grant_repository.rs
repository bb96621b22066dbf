use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use tessera_application::{CreateGrantInput, GrantRecord, GrantRepository};
use tessera_core::{AppError, AppResult, TenantId};
use tessera_domain::{
    AuthObject, AuthObjectId, AuthObjectType, GrantError, GrantId, ResourceId, ResourceKind,
};

mod lookup;
mod mutation;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed grant store shared by every resource family.
#[derive(Clone)]
pub struct PostgresGrantRepository {
    pool: PgPool,
}

impl PostgresGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const GRANT_COLUMNS: &str = r#"
    id,
    tenant_id,
    resource_kind,
    resource_id,
    auth_object_id,
    auth_object_type,
    permissions,
    is_creator_grant,
    to_char(granted_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS granted_at
"#;

#[derive(Debug, FromRow)]
struct GrantRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    resource_kind: String,
    resource_id: uuid::Uuid,
    auth_object_id: uuid::Uuid,
    auth_object_type: String,
    permissions: Vec<String>,
    is_creator_grant: bool,
    granted_at: String,
}

impl TryFrom<GrantRow> for GrantRecord {
    type Error = AppError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let object_type = AuthObjectType::from_str(row.auth_object_type.as_str())
            .map_err(|error| {
                AppError::Internal(format!(
                    "grant '{}' has invalid auth object type: {error}",
                    row.id
                ))
            })?;
        let resource_kind = ResourceKind::from_str(row.resource_kind.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "grant '{}' has invalid resource kind: {error}",
                row.id
            ))
        })?;

        Ok(Self {
            grant_id: GrantId::from_uuid(row.id),
            resource_kind,
            resource_id: ResourceId::from_uuid(row.resource_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            auth_object: AuthObject {
                id: AuthObjectId::from_uuid(row.auth_object_id),
                object_type,
            },
            permissions: row.permissions,
            is_creator_grant: row.is_creator_grant,
            granted_at: row.granted_at,
        })
    }
}

fn rows_into_records(rows: Vec<GrantRow>) -> AppResult<Vec<GrantRecord>> {
    rows.into_iter().map(GrantRecord::try_from).collect()
}

fn map_grant_conflict(error: sqlx::Error, input: &CreateGrantInput) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return GrantError::DuplicateGrant {
            resource_id: input.resource_id.to_string(),
            auth_object_id: input.auth_object.id.to_string(),
        }
        .into();
    }

    AppError::Internal(format!("failed to create grant: {error}"))
}

#[async_trait]
impl GrantRepository for PostgresGrantRepository {
    async fn find_grants_for_identities(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_ids: &[ResourceId],
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>> {
        self.find_grants_for_identities_impl(tenant_id, resource_kind, resource_ids, auth_object_ids)
            .await
    }

    async fn list_grants_for_identities(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>> {
        self.list_grants_for_identities_impl(tenant_id, resource_kind, auth_object_ids)
            .await
    }

    async fn list_grants_for_resource(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<Vec<GrantRecord>> {
        self.list_grants_for_resource_impl(tenant_id, resource_kind, resource_id)
            .await
    }

    async fn find_grant(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<Option<GrantRecord>> {
        self.find_grant_impl(tenant_id, resource_kind, grant_id)
            .await
    }

    async fn create_grant(
        &self,
        tenant_id: TenantId,
        input: CreateGrantInput,
    ) -> AppResult<GrantRecord> {
        self.create_grant_impl(tenant_id, input).await
    }

    async fn replace_grant_permissions(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
        permissions: Vec<String>,
    ) -> AppResult<GrantRecord> {
        self.replace_grant_permissions_impl(tenant_id, resource_kind, grant_id, permissions)
            .await
    }

    async fn delete_grant(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<()> {
        self.delete_grant_impl(tenant_id, resource_kind, grant_id)
            .await
    }

    async fn delete_grants_for_resource(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<u64> {
        self.delete_grants_for_resource_impl(tenant_id, resource_kind, resource_id)
            .await
    }
}
