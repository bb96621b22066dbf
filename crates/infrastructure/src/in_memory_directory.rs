use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tessera_application::{
    OrgMembershipRepository, ResourceMetadataProvider, TenantAdminDirectory,
};
use tessera_core::{AppError, AppResult, TenantId, UserId};
use tessera_domain::{AuthObject, ResourceId, ResourceMeta};
use tokio::sync::RwLock;

/// In-memory tenant directory: administrators and org unit memberships.
#[derive(Debug, Default)]
pub struct InMemoryTenantDirectory {
    admins: RwLock<HashSet<(TenantId, UserId)>>,
    memberships: RwLock<HashMap<(TenantId, UserId), Vec<AuthObject>>>,
}

impl InMemoryTenantDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a user as administrator of a tenant.
    pub async fn add_admin(&self, tenant_id: TenantId, user_id: UserId) {
        self.admins.write().await.insert((tenant_id, user_id));
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

        let mut memberships = self.memberships.write().await;
        let units = memberships.entry((tenant_id, user_id)).or_default();
        if !units.contains(&org_unit) {
            units.push(org_unit);
        }

        Ok(())
    }
}

#[async_trait]
impl TenantAdminDirectory for InMemoryTenantDirectory {
    async fn is_tenant_admin(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        Ok(self.admins.read().await.contains(&(tenant_id, user_id)))
    }
}

#[async_trait]
impl OrgMembershipRepository for InMemoryTenantDirectory {
    async fn list_org_units_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<AuthObject>> {
        Ok(self
            .memberships
            .read()
            .await
            .get(&(tenant_id, user_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory registry of one family's guarded resources.
#[derive(Debug, Default)]
pub struct InMemoryResourceRegistry {
    resources: RwLock<HashMap<ResourceId, (ResourceMeta, String)>>,
}

impl InMemoryResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or updates a resource.
    ///
    /// An update keeps the recorded creator and fails with a conflict when the
    /// resource is registered under another tenant.
    pub async fn register(&self, meta: &ResourceMeta, name: &str) -> AppResult<()> {
        let mut resources = self.resources.write().await;
        match resources.get_mut(&meta.resource_id) {
            Some((existing, _)) if existing.tenant_id != meta.tenant_id => {
                Err(AppError::Conflict(format!(
                    "resource '{}' belongs to another tenant",
                    meta.resource_id
                )))
            }
            Some((existing, existing_name)) => {
                existing.auth_control_enabled = meta.auth_control_enabled;
                name.clone_into(existing_name);
                Ok(())
            }
            None => {
                resources.insert(meta.resource_id, (meta.clone(), name.to_owned()));
                Ok(())
            }
        }
    }

    /// Removes a resource; returns whether it was registered.
    pub async fn remove(&self, tenant_id: TenantId, resource_id: ResourceId) -> bool {
        let mut resources = self.resources.write().await;
        let owned = resources
            .get(&resource_id)
            .is_some_and(|(meta, _)| meta.tenant_id == tenant_id);
        if owned {
            resources.remove(&resource_id);
        }

        owned
    }
}

#[async_trait]
impl ResourceMetadataProvider for InMemoryResourceRegistry {
    async fn find_resource_meta(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<ResourceMeta>> {
        Ok(self
            .resources
            .read()
            .await
            .get(&resource_id)
            .filter(|(meta, _)| meta.tenant_id == tenant_id)
            .map(|(meta, _)| meta.clone()))
    }

    async fn list_resource_meta(
        &self,
        tenant_id: TenantId,
        resource_ids: &[ResourceId],
    ) -> AppResult<Vec<ResourceMeta>> {
        let resources = self.resources.read().await;
        Ok(resource_ids
            .iter()
            .filter_map(|resource_id| resources.get(resource_id))
            .filter(|(meta, _)| meta.tenant_id == tenant_id)
            .map(|(meta, _)| meta.clone())
            .collect())
    }

    async fn find_resource_name(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<String>> {
        Ok(self
            .resources
            .read()
            .await
            .get(&resource_id)
            .filter(|(meta, _)| meta.tenant_id == tenant_id)
            .map(|(_, name)| name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use tessera_application::{
        OrgMembershipRepository, ResourceMetadataProvider, TenantAdminDirectory,
    };
    use tessera_core::{AppError, TenantId, UserId};
    use tessera_domain::{AuthObject, AuthObjectId, AuthObjectType, ResourceId, ResourceMeta};

    use super::{InMemoryResourceRegistry, InMemoryTenantDirectory};

    #[tokio::test]
    async fn admins_are_tenant_scoped() {
        let directory = InMemoryTenantDirectory::new();
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        directory.add_admin(tenant_id, user_id).await;

        assert_eq!(
            directory.is_tenant_admin(tenant_id, user_id).await.ok(),
            Some(true)
        );
        assert_eq!(
            directory.is_tenant_admin(TenantId::new(), user_id).await.ok(),
            Some(false)
        );
    }

    #[tokio::test]
    async fn memberships_reject_users_and_ignore_repeats() {
        let directory = InMemoryTenantDirectory::new();
        let tenant_id = TenantId::new();
        let user_id = UserId::new();
        let group = AuthObject::org_unit(AuthObjectId::new(), AuthObjectType::Group);
        assert!(group.is_ok());
        let group = group.unwrap_or_else(|_| unreachable!());

        assert!(directory.add_member(tenant_id, group, user_id).await.is_ok());
        assert!(directory.add_member(tenant_id, group, user_id).await.is_ok());
        assert!(
            directory
                .add_member(tenant_id, AuthObject::user(UserId::new()), user_id)
                .await
                .is_err()
        );

        let units = directory.list_org_units_for_user(tenant_id, user_id).await;
        assert_eq!(units.ok(), Some(vec![group]));
    }

    #[tokio::test]
    async fn registry_hides_resources_of_other_tenants() {
        let registry = InMemoryResourceRegistry::new();
        let tenant_id = TenantId::new();
        let resource_id = ResourceId::new();
        let registered = registry
            .register(
                &ResourceMeta {
                    resource_id,
                    tenant_id,
                    created_by: UserId::new(),
                    auth_control_enabled: true,
                },
                "orders-api",
            )
            .await;
        assert!(registered.is_ok());

        let own = registry.find_resource_name(tenant_id, resource_id).await;
        let foreign = registry
            .find_resource_meta(TenantId::new(), resource_id)
            .await;
        let listed = registry
            .list_resource_meta(tenant_id, &[resource_id, ResourceId::new()])
            .await;

        assert_eq!(own.ok().flatten(), Some("orders-api".to_owned()));
        assert_eq!(foreign.ok().flatten(), None);
        assert_eq!(listed.map(|metas| metas.len()).ok(), Some(1));
        assert!(!registry.remove(TenantId::new(), resource_id).await);
        assert!(registry.remove(tenant_id, resource_id).await);
    }

    #[tokio::test]
    async fn registry_refuses_registration_over_another_tenant() {
        let registry = InMemoryResourceRegistry::new();
        let tenant_id = TenantId::new();
        let creator = UserId::new();
        let meta = ResourceMeta {
            resource_id: ResourceId::new(),
            tenant_id,
            created_by: creator,
            auth_control_enabled: true,
        };
        assert!(registry.register(&meta, "orders-api").await.is_ok());

        let hijack = registry
            .register(
                &ResourceMeta {
                    tenant_id: TenantId::new(),
                    created_by: UserId::new(),
                    ..meta.clone()
                },
                "stolen",
            )
            .await;
        let update = registry
            .register(
                &ResourceMeta {
                    created_by: UserId::new(),
                    auth_control_enabled: false,
                    ..meta.clone()
                },
                "orders-api-v2",
            )
            .await;

        assert!(matches!(hijack, Err(AppError::Conflict(_))));
        assert!(update.is_ok());
        let stored = registry
            .find_resource_meta(tenant_id, meta.resource_id)
            .await
            .ok()
            .flatten();
        assert_eq!(stored.as_ref().map(|meta| meta.created_by), Some(creator));
        assert_eq!(
            stored.map(|meta| meta.auth_control_enabled),
            Some(false)
        );
        assert_eq!(
            registry
                .find_resource_name(tenant_id, meta.resource_id)
                .await
                .ok()
                .flatten(),
            Some("orders-api-v2".to_owned())
        );
    }
}
