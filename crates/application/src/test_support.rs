use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tessera_core::{AppError, AppResult, CallerContext, TenantId, UserId};
use tessera_domain::{
    AuthObject, AuthObjectId, GrantError, GrantId, ResourceFamily, ResourceId, ResourceKind,
    ResourceMeta, ResourcePermission,
};

use crate::{
    CreateGrantInput, GrantRecord, GrantRepository, GrantService, MembershipAuthObjectExpander,
    OrgMembershipRepository, ResourceAuthorizationService, ResourceMetadataProvider,
    TenantAdminDirectory,
};

#[derive(Default)]
pub(crate) struct FakeGrantRepository {
    grants: Mutex<Vec<GrantRecord>>,
    identity_fetches: AtomicUsize,
}

impl FakeGrantRepository {
    pub(crate) fn identity_fetches(&self) -> usize {
        self.identity_fetches.load(Ordering::SeqCst)
    }

    pub(crate) async fn records(&self) -> Vec<GrantRecord> {
        self.grants.lock().await.clone()
    }
}

#[async_trait]
impl GrantRepository for FakeGrantRepository {
    async fn find_grants_for_identities(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_ids: &[ResourceId],
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>> {
        self.identity_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|record| {
                record.tenant_id == tenant_id
                    && record.resource_kind == resource_kind
                    && resource_ids.contains(&record.resource_id)
                    && auth_object_ids.contains(&record.auth_object.id)
            })
            .cloned()
            .collect())
    }

    async fn list_grants_for_identities(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|record| {
                record.tenant_id == tenant_id
                    && record.resource_kind == resource_kind
                    && auth_object_ids.contains(&record.auth_object.id)
            })
            .cloned()
            .collect())
    }

    async fn list_grants_for_resource(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<Vec<GrantRecord>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|record| {
                record.tenant_id == tenant_id
                    && record.resource_kind == resource_kind
                    && record.resource_id == resource_id
            })
            .cloned()
            .collect())
    }

    async fn find_grant(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<Option<GrantRecord>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .find(|record| {
                record.tenant_id == tenant_id
                    && record.resource_kind == resource_kind
                    && record.grant_id == grant_id
            })
            .cloned())
    }

    async fn create_grant(
        &self,
        tenant_id: TenantId,
        input: CreateGrantInput,
    ) -> AppResult<GrantRecord> {
        let mut grants = self.grants.lock().await;
        let duplicate = grants.iter().any(|record| {
            record.tenant_id == tenant_id
                && record.resource_kind == input.resource_kind
                && record.resource_id == input.resource_id
                && (record.auth_object == input.auth_object
                    || (record.is_creator_grant && input.is_creator_grant))
        });
        if duplicate {
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
            granted_at: "2026-01-01T00:00:00Z".to_owned(),
        };
        grants.push(record.clone());
        Ok(record)
    }

    async fn replace_grant_permissions(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
        permissions: Vec<String>,
    ) -> AppResult<GrantRecord> {
        let mut grants = self.grants.lock().await;
        let record = grants
            .iter_mut()
            .find(|record| {
                record.tenant_id == tenant_id
                    && record.resource_kind == resource_kind
                    && record.grant_id == grant_id
            })
            .ok_or_else(|| AppError::NotFound(format!("grant '{grant_id}' was not found")))?;
        record.permissions = permissions;
        Ok(record.clone())
    }

    async fn delete_grant(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<()> {
        self.grants.lock().await.retain(|record| {
            !(record.tenant_id == tenant_id
                && record.resource_kind == resource_kind
                && record.grant_id == grant_id)
        });
        Ok(())
    }

    async fn delete_grants_for_resource(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<u64> {
        let mut grants = self.grants.lock().await;
        let before = grants.len();
        grants.retain(|record| {
            !(record.tenant_id == tenant_id
                && record.resource_kind == resource_kind
                && record.resource_id == resource_id)
        });
        Ok(u64::try_from(before - grants.len()).unwrap_or(u64::MAX))
    }
}

#[derive(Default)]
pub(crate) struct FakeMetadataProvider {
    resources: Mutex<HashMap<ResourceId, (ResourceMeta, Option<String>)>>,
}

#[async_trait]
impl ResourceMetadataProvider for FakeMetadataProvider {
    async fn find_resource_meta(
        &self,
        _tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<ResourceMeta>> {
        Ok(self
            .resources
            .lock()
            .await
            .get(&resource_id)
            .map(|(meta, _)| meta.clone()))
    }

    async fn list_resource_meta(
        &self,
        _tenant_id: TenantId,
        resource_ids: &[ResourceId],
    ) -> AppResult<Vec<ResourceMeta>> {
        let resources = self.resources.lock().await;
        Ok(resource_ids
            .iter()
            .filter_map(|resource_id| resources.get(resource_id))
            .map(|(meta, _)| meta.clone())
            .collect())
    }

    async fn find_resource_name(
        &self,
        _tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<String>> {
        Ok(self
            .resources
            .lock()
            .await
            .get(&resource_id)
            .and_then(|(_, name)| name.clone()))
    }
}

#[derive(Default)]
pub(crate) struct FakeAdminDirectory {
    admins: Mutex<HashSet<(TenantId, UserId)>>,
}

#[async_trait]
impl TenantAdminDirectory for FakeAdminDirectory {
    async fn is_tenant_admin(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        Ok(self.admins.lock().await.contains(&(tenant_id, user_id)))
    }
}

#[derive(Default)]
pub(crate) struct FakeMembershipRepository {
    memberships: Mutex<HashMap<(TenantId, UserId), Vec<AuthObject>>>,
}

#[async_trait]
impl OrgMembershipRepository for FakeMembershipRepository {
    async fn list_org_units_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<AuthObject>> {
        Ok(self
            .memberships
            .lock()
            .await
            .get(&(tenant_id, user_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// One tenant with fake ports behind every engine collaborator.
pub(crate) struct Fixture {
    pub(crate) tenant_id: TenantId,
    pub(crate) grants: Arc<FakeGrantRepository>,
    metadata: Arc<FakeMetadataProvider>,
    admins: Arc<FakeAdminDirectory>,
    memberships: Arc<FakeMembershipRepository>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            tenant_id: TenantId::new(),
            grants: Arc::new(FakeGrantRepository::default()),
            metadata: Arc::new(FakeMetadataProvider::default()),
            admins: Arc::new(FakeAdminDirectory::default()),
            memberships: Arc::new(FakeMembershipRepository::default()),
        }
    }

    pub(crate) fn authorization<F: ResourceFamily>(&self) -> ResourceAuthorizationService<F> {
        ResourceAuthorizationService::new(
            self.grants.clone(),
            self.metadata.clone(),
            self.admins.clone(),
            Arc::new(MembershipAuthObjectExpander::new(self.memberships.clone())),
        )
    }

    pub(crate) fn grant_service<F: ResourceFamily>(&self) -> GrantService<F> {
        GrantService::new(self.authorization())
    }

    pub(crate) fn caller(&self, user_id: UserId) -> CallerContext {
        CallerContext::new(user_id, self.tenant_id)
    }

    pub(crate) async fn add_resource(
        &self,
        name: &str,
        created_by: UserId,
        auth_control_enabled: bool,
    ) -> ResourceId {
        self.add_resource_in_tenant(self.tenant_id, name, created_by, auth_control_enabled)
            .await
    }

    pub(crate) async fn add_resource_in_tenant(
        &self,
        tenant_id: TenantId,
        name: &str,
        created_by: UserId,
        auth_control_enabled: bool,
    ) -> ResourceId {
        let resource_id = ResourceId::new();
        self.metadata.resources.lock().await.insert(
            resource_id,
            (
                ResourceMeta {
                    resource_id,
                    tenant_id,
                    created_by,
                    auth_control_enabled,
                },
                Some(name.to_owned()),
            ),
        );
        resource_id
    }

    pub(crate) async fn make_admin(&self, user_id: UserId) {
        self.admins
            .admins
            .lock()
            .await
            .insert((self.tenant_id, user_id));
    }

    pub(crate) async fn join_org_unit(&self, user_id: UserId, org_unit: AuthObject) {
        self.memberships
            .memberships
            .lock()
            .await
            .entry((self.tenant_id, user_id))
            .or_default()
            .push(org_unit);
    }

    pub(crate) async fn seed_grant<P: ResourcePermission>(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
        auth_object: AuthObject,
        permissions: &[P],
        is_creator_grant: bool,
    ) -> GrantId {
        let record = GrantRecord {
            grant_id: GrantId::new(),
            resource_kind: kind,
            resource_id,
            tenant_id: self.tenant_id,
            auth_object,
            permissions: permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
            is_creator_grant,
            granted_at: "2026-01-01T00:00:00Z".to_owned(),
        };
        let grant_id = record.grant_id;
        self.grants.grants.lock().await.push(record);
        grant_id
    }

    pub(crate) async fn seed_creator_grant<P: ResourcePermission>(
        &self,
        kind: ResourceKind,
        resource_id: ResourceId,
        creator: UserId,
    ) -> GrantId {
        self.seed_grant(kind, resource_id, AuthObject::user(creator), P::all(), true)
            .await
    }
}
