use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use tessera_application::ResourceMetadataProvider;
use tessera_core::{AppError, AppResult, TenantId, UserId};
use tessera_domain::{ResourceId, ResourceKind, ResourceMeta};

/// PostgreSQL-backed registry of one family's guarded resources.
///
/// Resource command layers upsert here in the transaction that creates or
/// updates the resource; the authorization engine only reads.
#[derive(Clone)]
pub struct PostgresResourceRegistry {
    pool: PgPool,
    resource_kind: ResourceKind,
}

impl PostgresResourceRegistry {
    /// Creates a registry for one resource family.
    #[must_use]
    pub fn new(pool: PgPool, resource_kind: ResourceKind) -> Self {
        Self {
            pool,
            resource_kind,
        }
    }

    /// Registers or updates a resource.
    pub async fn register(&self, meta: &ResourceMeta, name: &str) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO guarded_resources (
                tenant_id,
                resource_kind,
                resource_id,
                name,
                created_by,
                auth_control_enabled
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (resource_kind, resource_id) DO UPDATE
            SET name = EXCLUDED.name,
                auth_control_enabled = EXCLUDED.auth_control_enabled
            WHERE guarded_resources.tenant_id = EXCLUDED.tenant_id
            "#,
        )
        .bind(meta.tenant_id.as_uuid())
        .bind(self.resource_kind.as_str())
        .bind(meta.resource_id.as_uuid())
        .bind(name)
        .bind(meta.created_by.as_uuid())
        .bind(meta.auth_control_enabled)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to register resource: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "{} resource '{}' belongs to another tenant",
                self.resource_kind.as_str(),
                meta.resource_id
            )));
        }

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct ResourceRow {
    resource_id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    created_by: uuid::Uuid,
    auth_control_enabled: bool,
}

impl From<ResourceRow> for ResourceMeta {
    fn from(row: ResourceRow) -> Self {
        Self {
            resource_id: ResourceId::from_uuid(row.resource_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            created_by: UserId::from_uuid(row.created_by),
            auth_control_enabled: row.auth_control_enabled,
        }
    }
}

#[async_trait]
impl ResourceMetadataProvider for PostgresResourceRegistry {
    async fn find_resource_meta(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<ResourceMeta>> {
        let row = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT resource_id, tenant_id, created_by, auth_control_enabled
            FROM guarded_resources
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND resource_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(self.resource_kind.as_str())
        .bind(resource_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find {} resource '{resource_id}': {error}",
                self.resource_kind.as_str()
            ))
        })?;

        Ok(row.map(ResourceMeta::from))
    }

    async fn list_resource_meta(
        &self,
        tenant_id: TenantId,
        resource_ids: &[ResourceId],
    ) -> AppResult<Vec<ResourceMeta>> {
        if resource_ids.is_empty() {
            return Ok(Vec::new());
        }

        let resource_ids: Vec<uuid::Uuid> =
            resource_ids.iter().map(ResourceId::as_uuid).collect();
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT resource_id, tenant_id, created_by, auth_control_enabled
            FROM guarded_resources
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND resource_id = ANY($3)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(self.resource_kind.as_str())
        .bind(resource_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list {} resources: {error}",
                self.resource_kind.as_str()
            ))
        })?;

        Ok(rows.into_iter().map(ResourceMeta::from).collect())
    }

    async fn find_resource_name(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM guarded_resources
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND resource_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(self.resource_kind.as_str())
        .bind(resource_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to resolve name of {} resource '{resource_id}': {error}",
                self.resource_kind.as_str()
            ))
        })
    }
}
