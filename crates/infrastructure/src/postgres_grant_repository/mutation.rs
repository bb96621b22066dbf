use tracing::debug;

use super::*;

impl PostgresGrantRepository {
    pub(super) async fn create_grant_impl(
        &self,
        tenant_id: TenantId,
        input: CreateGrantInput,
    ) -> AppResult<GrantRecord> {
        if !input.is_creator_grant && input.permissions.is_empty() {
            return Err(GrantError::EmptyPermissions.into());
        }

        let sql = format!(
            r#"
            INSERT INTO resource_grants (
                id,
                tenant_id,
                resource_kind,
                resource_id,
                auth_object_id,
                auth_object_type,
                permissions,
                is_creator_grant
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {GRANT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, GrantRow>(sql.as_str())
            .bind(GrantId::new().as_uuid())
            .bind(tenant_id.as_uuid())
            .bind(input.resource_kind.as_str())
            .bind(input.resource_id.as_uuid())
            .bind(input.auth_object.id.as_uuid())
            .bind(input.auth_object.object_type.as_str())
            .bind(input.permissions.as_slice())
            .bind(input.is_creator_grant)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| map_grant_conflict(error, &input))?;

        GrantRecord::try_from(row)
    }

    pub(super) async fn replace_grant_permissions_impl(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
        permissions: Vec<String>,
    ) -> AppResult<GrantRecord> {
        if permissions.is_empty() {
            return Err(GrantError::EmptyPermissions.into());
        }

        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let is_creator_grant = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT is_creator_grant
            FROM resource_grants
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND id = $3
            FOR UPDATE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(resource_kind.as_str())
        .bind(grant_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock grant: {error}")))?
        .ok_or_else(|| GrantError::GrantNotFound {
            grant_id: grant_id.to_string(),
        })?;

        if is_creator_grant {
            return Err(GrantError::CreatorGrantImmutable {
                grant_id: grant_id.to_string(),
            }
            .into());
        }

        let sql = format!(
            r#"
            UPDATE resource_grants
            SET permissions = $4
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND id = $3
            RETURNING {GRANT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, GrantRow>(sql.as_str())
            .bind(tenant_id.as_uuid())
            .bind(resource_kind.as_str())
            .bind(grant_id.as_uuid())
            .bind(permissions.as_slice())
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to replace grant permissions: {error}"))
            })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        GrantRecord::try_from(row)
    }

    pub(super) async fn delete_grant_impl(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let is_creator_grant = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT is_creator_grant
            FROM resource_grants
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND id = $3
            FOR UPDATE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(resource_kind.as_str())
        .bind(grant_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock grant: {error}")))?
        .ok_or_else(|| GrantError::GrantNotFound {
            grant_id: grant_id.to_string(),
        })?;

        if is_creator_grant {
            return Err(GrantError::CreatorGrantImmutable {
                grant_id: grant_id.to_string(),
            }
            .into());
        }

        sqlx::query(
            r#"
            DELETE FROM resource_grants
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(resource_kind.as_str())
        .bind(grant_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete grant: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn delete_grants_for_resource_impl(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<u64> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM resource_grants
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND resource_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(resource_kind.as_str())
        .bind(resource_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to delete grants of resource '{resource_id}': {error}"
            ))
        })?
        .rows_affected();

        debug!(
            %tenant_id,
            resource_kind = resource_kind.as_str(),
            %resource_id,
            rows_affected,
            "deleted resource grants"
        );

        Ok(rows_affected)
    }
}
