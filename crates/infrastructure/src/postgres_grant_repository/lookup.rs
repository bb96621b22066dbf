use super::*;

impl PostgresGrantRepository {
    pub(super) async fn find_grants_for_identities_impl(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_ids: &[ResourceId],
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>> {
        if resource_ids.is_empty() || auth_object_ids.is_empty() {
            return Ok(Vec::new());
        }

        let resource_ids: Vec<uuid::Uuid> =
            resource_ids.iter().map(ResourceId::as_uuid).collect();
        let auth_object_ids: Vec<uuid::Uuid> =
            auth_object_ids.iter().map(AuthObjectId::as_uuid).collect();
        let sql = format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM resource_grants
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND resource_id = ANY($3)
                AND auth_object_id = ANY($4)
            ORDER BY resource_id, granted_at, id
            "#
        );

        let rows = sqlx::query_as::<_, GrantRow>(sql.as_str())
            .bind(tenant_id.as_uuid())
            .bind(resource_kind.as_str())
            .bind(resource_ids)
            .bind(auth_object_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find grants for identities: {error}"))
            })?;

        rows_into_records(rows)
    }

    pub(super) async fn list_grants_for_identities_impl(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>> {
        if auth_object_ids.is_empty() {
            return Ok(Vec::new());
        }

        let auth_object_ids: Vec<uuid::Uuid> =
            auth_object_ids.iter().map(AuthObjectId::as_uuid).collect();
        let sql = format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM resource_grants
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND auth_object_id = ANY($3)
            ORDER BY resource_id, granted_at, id
            "#
        );

        let rows = sqlx::query_as::<_, GrantRow>(sql.as_str())
            .bind(tenant_id.as_uuid())
            .bind(resource_kind.as_str())
            .bind(auth_object_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list grants for identities: {error}"))
            })?;

        rows_into_records(rows)
    }

    pub(super) async fn list_grants_for_resource_impl(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<Vec<GrantRecord>> {
        let sql = format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM resource_grants
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND resource_id = $3
            ORDER BY is_creator_grant DESC, granted_at, id
            "#
        );

        let rows = sqlx::query_as::<_, GrantRow>(sql.as_str())
            .bind(tenant_id.as_uuid())
            .bind(resource_kind.as_str())
            .bind(resource_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to list grants for resource '{resource_id}': {error}"
                ))
            })?;

        rows_into_records(rows)
    }

    pub(super) async fn find_grant_impl(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<Option<GrantRecord>> {
        let sql = format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM resource_grants
            WHERE tenant_id = $1
                AND resource_kind = $2
                AND id = $3
            "#
        );

        sqlx::query_as::<_, GrantRow>(sql.as_str())
            .bind(tenant_id.as_uuid())
            .bind(resource_kind.as_str())
            .bind(grant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find grant '{grant_id}': {error}"))
            })?
            .map(GrantRecord::try_from)
            .transpose()
    }
}
