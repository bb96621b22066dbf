use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tessera_application::{CreateGrantInput, GrantRecord, GrantRepository};
use tessera_core::{AppError, AppResult, TenantId};
use tessera_domain::{AuthObjectId, GrantError, GrantId, ResourceId, ResourceKind};
use tokio::sync::RwLock;

#[cfg(test)]
mod tests;

/// In-memory grant store for tests and local runs.
///
/// Writes hold the lock for the whole check-and-insert, so the uniqueness
/// rules hold under concurrent callers.
#[derive(Debug, Default)]
pub struct InMemoryGrantRepository {
    grants: RwLock<HashMap<(TenantId, ResourceKind, GrantId), GrantRecord>>,
}

impl InMemoryGrantRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
        }
    }

    async fn select(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        predicate: impl Fn(&GrantRecord) -> bool,
    ) -> Vec<GrantRecord> {
        let grants = self.grants.read().await;
        let mut values: Vec<GrantRecord> = grants
            .iter()
            .filter_map(|((stored_tenant_id, stored_kind, _), record)| {
                (stored_tenant_id == &tenant_id
                    && stored_kind == &resource_kind
                    && predicate(record))
                .then_some(record.clone())
            })
            .collect();
        values.sort_by(|left, right| {
            left.granted_at
                .cmp(&right.granted_at)
                .then_with(|| left.grant_id.cmp(&right.grant_id))
        });

        values
    }
}

#[async_trait]
impl GrantRepository for InMemoryGrantRepository {
    async fn find_grants_for_identities(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_ids: &[ResourceId],
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>> {
        Ok(self
            .select(tenant_id, resource_kind, |record| {
                resource_ids.contains(&record.resource_id)
                    && auth_object_ids.contains(&record.auth_object.id)
            })
            .await)
    }

    async fn list_grants_for_identities(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>> {
        Ok(self
            .select(tenant_id, resource_kind, |record| {
                auth_object_ids.contains(&record.auth_object.id)
            })
            .await)
    }

    async fn list_grants_for_resource(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<Vec<GrantRecord>> {
        Ok(self
            .select(tenant_id, resource_kind, |record| {
                record.resource_id == resource_id
            })
            .await)
    }

    async fn find_grant(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<Option<GrantRecord>> {
        Ok(self
            .grants
            .read()
            .await
            .get(&(tenant_id, resource_kind, grant_id))
            .cloned())
    }

    async fn create_grant(
        &self,
        tenant_id: TenantId,
        input: CreateGrantInput,
    ) -> AppResult<GrantRecord> {
        if !input.is_creator_grant && input.permissions.is_empty() {
            return Err(GrantError::EmptyPermissions.into());
        }

        let mut grants = self.grants.write().await;
        let conflict = grants.iter().any(|((stored_tenant_id, stored_kind, _), record)| {
            stored_tenant_id == &tenant_id
                && stored_kind == &input.resource_kind
                && record.resource_id == input.resource_id
                && (record.auth_object == input.auth_object
                    || (record.is_creator_grant && input.is_creator_grant))
        });
        if conflict {
            return Err(GrantError::DuplicateGrant {
                resource_id: input.resource_id.to_string(),
                auth_object_id: input.auth_object.id.to_string(),
            }
            .into());
        }

        let record = GrantRecord {
            grant_id: GrantId::new(),
            resource_kind: input.resource_kind,
            resource_id: input.resource_id,
            tenant_id,
            auth_object: input.auth_object,
            permissions: input.permissions,
            is_creator_grant: input.is_creator_grant,
            granted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };
        grants.insert(
            (tenant_id, record.resource_kind, record.grant_id),
            record.clone(),
        );

        Ok(record)
    }

    async fn replace_grant_permissions(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
        permissions: Vec<String>,
    ) -> AppResult<GrantRecord> {
        let mut grants = self.grants.write().await;
        let record = grants
            .get_mut(&(tenant_id, resource_kind, grant_id))
            .ok_or_else(|| {
                AppError::from(GrantError::GrantNotFound {
                    grant_id: grant_id.to_string(),
                })
            })?;

        if record.is_creator_grant {
            return Err(GrantError::CreatorGrantImmutable {
                grant_id: grant_id.to_string(),
            }
            .into());
        }
        if permissions.is_empty() {
            return Err(GrantError::EmptyPermissions.into());
        }

        record.permissions = permissions;
        Ok(record.clone())
    }

    async fn delete_grant(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<()> {
        let mut grants = self.grants.write().await;
        let key = (tenant_id, resource_kind, grant_id);
        match grants.get(&key) {
            None => Err(GrantError::GrantNotFound {
                grant_id: grant_id.to_string(),
            }
            .into()),
            Some(record) if record.is_creator_grant => Err(GrantError::CreatorGrantImmutable {
                grant_id: grant_id.to_string(),
            }
            .into()),
            Some(_) => {
                grants.remove(&key);
                Ok(())
            }
        }
    }

    async fn delete_grants_for_resource(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<u64> {
        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|(stored_tenant_id, stored_kind, _), record| {
            !(stored_tenant_id == &tenant_id
                && stored_kind == &resource_kind
                && record.resource_id == resource_id)
        });

        u64::try_from(before - grants.len())
            .map_err(|error| AppError::Internal(format!("grant count overflow: {error}")))
    }
}
