use std::path::Path;

use serde::Deserialize;
use tessera_core::{AppError, AppResult, CallerContext, TenantId, UserId};
use tessera_domain::{
    AuthObject, AuthObjectId, AuthObjectType, ResourceFamily, ResourceId, ResourceKind,
    ResourceMeta,
};
use tracing::info;
use uuid::Uuid;

use crate::api_services::{MemoryStores, build_memory_state};
use crate::state::{AppState, FamilyServices};

/// Contents of `MEMORY_SEED_FILE`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemorySeed {
    #[serde(default)]
    tenant_admins: Vec<SeedAdmin>,
    #[serde(default)]
    org_unit_members: Vec<SeedMember>,
    #[serde(default)]
    resources: Vec<SeedResource>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedAdmin {
    tenant_id: Uuid,
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedMember {
    tenant_id: Uuid,
    org_unit_id: Uuid,
    org_unit_type: AuthObjectType,
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedResource {
    kind: ResourceKind,
    tenant_id: Uuid,
    resource_id: Uuid,
    name: String,
    created_by: Uuid,
    #[serde(default = "enabled")]
    auth_control_enabled: bool,
    #[serde(default = "enabled")]
    creator_grant: bool,
}

fn enabled() -> bool {
    true
}

impl SeedResource {
    fn meta(&self) -> ResourceMeta {
        ResourceMeta {
            resource_id: ResourceId::from_uuid(self.resource_id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            created_by: UserId::from_uuid(self.created_by),
            auth_control_enabled: self.auth_control_enabled,
        }
    }
}

impl MemorySeed {
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|error| {
            AppError::Validation(format!(
                "failed to read MEMORY_SEED_FILE '{}': {error}",
                path.display()
            ))
        })?;

        Self::parse(contents.as_str())
    }

    fn parse(contents: &str) -> AppResult<Self> {
        serde_json::from_str(contents)
            .map_err(|error| AppError::Validation(format!("invalid memory seed: {error}")))
    }
}

/// Builds the memory state and fills it from the seed.
///
/// Seeded resources get their creator grant through the grant commands, so the
/// same uniqueness rules apply as at runtime.
pub async fn seed_memory_state(seed: &MemorySeed) -> AppResult<AppState> {
    let stores = MemoryStores::new();

    for admin in &seed.tenant_admins {
        stores
            .directory
            .add_admin(
                TenantId::from_uuid(admin.tenant_id),
                UserId::from_uuid(admin.user_id),
            )
            .await;
    }

    for member in &seed.org_unit_members {
        let org_unit = AuthObject::org_unit(
            AuthObjectId::from_uuid(member.org_unit_id),
            member.org_unit_type,
        )?;
        stores
            .directory
            .add_member(
                TenantId::from_uuid(member.tenant_id),
                org_unit,
                UserId::from_uuid(member.user_id),
            )
            .await?;
    }

    for resource in &seed.resources {
        stores
            .registry(resource.kind)
            .register(&resource.meta(), resource.name.as_str())
            .await?;
    }

    let app_state = build_memory_state(&stores);
    for resource in seed.resources.iter().filter(|resource| resource.creator_grant) {
        let meta = resource.meta();
        match resource.kind {
            ResourceKind::Api => provision_creator_grant(&app_state.apis, &meta).await?,
            ResourceKind::Service => provision_creator_grant(&app_state.services, &meta).await?,
            ResourceKind::MockService => {
                provision_creator_grant(&app_state.mock_services, &meta).await?
            }
            ResourceKind::TaskSprint => {
                provision_creator_grant(&app_state.task_sprints, &meta).await?
            }
        }
    }

    info!(
        tenant_admins = seed.tenant_admins.len(),
        org_unit_members = seed.org_unit_members.len(),
        resources = seed.resources.len(),
        "seeded in-memory stores"
    );

    Ok(app_state)
}

async fn provision_creator_grant<F: ResourceFamily>(
    services: &FamilyServices<F>,
    meta: &ResourceMeta,
) -> AppResult<()> {
    let creator = CallerContext::new(meta.created_by, meta.tenant_id);
    services
        .for_request(creator)
        .grants
        .provision_creator_grant(&creator, meta.resource_id)
        .await?;

    Ok(())
}
