use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use tessera_application::{OrgMembershipRepository, TenantAdminDirectory};
use tessera_core::{AppError, AppResult, TenantId, UserId};
use tessera_domain::{AuthObject, AuthObjectId, AuthObjectType};

/// PostgreSQL-backed tenant directory: administrators and org unit members.
#[derive(Clone)]
pub struct PostgresTenantDirectory {
    pool: PgPool,
}

impl PostgresTenantDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Marks a user as administrator of a tenant.
    pub async fn add_admin(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tenant_admins (tenant_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (tenant_id, user_id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to add tenant admin: {error}")))?;

        Ok(())
    }

    /// Adds a user to a department or group.
    pub async fn add_member(
        &self,
        tenant_id: TenantId,
        org_unit: AuthObject,
        user_id: UserId,
    ) -> AppResult<()> {
        if !org_unit.object_type.is_org_unit() {
            return Err(AppError::Validation(format!(
                "auth object '{}' is not an org unit",
                org_unit.id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO org_unit_members (tenant_id, org_unit_id, org_unit_type, user_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, org_unit_id, user_id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(org_unit.id.as_uuid())
        .bind(org_unit.object_type.as_str())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to add org unit member: {error}"))
        })?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct OrgUnitRow {
    org_unit_id: uuid::Uuid,
    org_unit_type: String,
}

#[async_trait]
impl TenantAdminDirectory for PostgresTenantDirectory {
    async fn is_tenant_admin(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM tenant_admins
                WHERE tenant_id = $1
                    AND user_id = $2
            )
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve tenant admin: {error}")))
    }
}

#[async_trait]
impl OrgMembershipRepository for PostgresTenantDirectory {
    async fn list_org_units_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<AuthObject>> {
        let rows = sqlx::query_as::<_, OrgUnitRow>(
            r#"
            SELECT org_unit_id, org_unit_type
            FROM org_unit_members
            WHERE tenant_id = $1
                AND user_id = $2
            ORDER BY org_unit_type, org_unit_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list org unit memberships: {error}"))
        })?;

        rows.into_iter()
            .map(|row| {
                let object_type =
                    AuthObjectType::from_str(row.org_unit_type.as_str()).map_err(|error| {
                        AppError::Internal(format!(
                            "failed to decode org unit '{}' for tenant '{tenant_id}': {error}",
                            row.org_unit_id
                        ))
                    })?;
                AuthObject::org_unit(AuthObjectId::from_uuid(row.org_unit_id), object_type)
            })
            .collect()
    }
}
