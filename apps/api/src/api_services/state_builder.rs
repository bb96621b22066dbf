use std::sync::Arc;

use sqlx::PgPool;
use tessera_application::{
    AuthObjectExpander, GrantRepository, MembershipAuthObjectExpander, OrgMembershipRepository,
    ResourceAuthorizationService, ResourceMetadataProvider, TenantAdminDirectory,
};
use tessera_domain::{Apis, MockServices, ResourceFamily, ResourceKind, Services, TaskSprints};
use tessera_infrastructure::{
    InMemoryGrantRepository, InMemoryResourceRegistry, InMemoryTenantDirectory,
    PostgresGrantRepository, PostgresResourceRegistry, PostgresTenantDirectory,
};

use crate::state::{AppState, FamilyServices};

/// Ports shared by every family except resource metadata.
struct SharedPorts {
    grant_repository: Arc<dyn GrantRepository>,
    admin_directory: Arc<dyn TenantAdminDirectory>,
    expander: Arc<dyn AuthObjectExpander>,
}

impl SharedPorts {
    fn new(
        grant_repository: Arc<dyn GrantRepository>,
        admin_directory: Arc<dyn TenantAdminDirectory>,
        membership_repository: Arc<dyn OrgMembershipRepository>,
    ) -> Self {
        Self {
            grant_repository,
            admin_directory,
            expander: Arc::new(MembershipAuthObjectExpander::new(membership_repository)),
        }
    }

    fn family<F: ResourceFamily>(
        &self,
        metadata_provider: Arc<dyn ResourceMetadataProvider>,
    ) -> FamilyServices<F> {
        FamilyServices::new(
            ResourceAuthorizationService::new(
                self.grant_repository.clone(),
                metadata_provider,
                self.admin_directory.clone(),
                self.expander.clone(),
            ),
            self.expander.clone(),
        )
    }
}

pub fn build_postgres_state(pool: PgPool) -> AppState {
    let directory = Arc::new(PostgresTenantDirectory::new(pool.clone()));
    let ports = SharedPorts::new(
        Arc::new(PostgresGrantRepository::new(pool.clone())),
        directory.clone(),
        directory,
    );
    let registry = |kind: ResourceKind| -> Arc<dyn ResourceMetadataProvider> {
        Arc::new(PostgresResourceRegistry::new(pool.clone(), kind))
    };

    AppState {
        apis: ports.family::<Apis>(registry(Apis::KIND)),
        services: ports.family::<Services>(registry(Services::KIND)),
        mock_services: ports.family::<MockServices>(registry(MockServices::KIND)),
        task_sprints: ports.family::<TaskSprints>(registry(TaskSprints::KIND)),
    }
}

/// Process-memory stores behind the memory state, kept so they can be seeded.
pub struct MemoryStores {
    pub directory: Arc<InMemoryTenantDirectory>,
    apis: Arc<InMemoryResourceRegistry>,
    services: Arc<InMemoryResourceRegistry>,
    mock_services: Arc<InMemoryResourceRegistry>,
    task_sprints: Arc<InMemoryResourceRegistry>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self {
            directory: Arc::new(InMemoryTenantDirectory::new()),
            apis: Arc::new(InMemoryResourceRegistry::new()),
            services: Arc::new(InMemoryResourceRegistry::new()),
            mock_services: Arc::new(InMemoryResourceRegistry::new()),
            task_sprints: Arc::new(InMemoryResourceRegistry::new()),
        }
    }

    /// Returns the registry of one resource family.
    pub fn registry(&self, kind: ResourceKind) -> &InMemoryResourceRegistry {
        match kind {
            ResourceKind::Api => &self.apis,
            ResourceKind::Service => &self.services,
            ResourceKind::MockService => &self.mock_services,
            ResourceKind::TaskSprint => &self.task_sprints,
        }
    }
}

impl Default for MemoryStores {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_memory_state(stores: &MemoryStores) -> AppState {
    let ports = SharedPorts::new(
        Arc::new(InMemoryGrantRepository::new()),
        stores.directory.clone(),
        stores.directory.clone(),
    );

    AppState {
        apis: ports.family::<Apis>(stores.apis.clone()),
        services: ports.family::<Services>(stores.services.clone()),
        mock_services: ports.family::<MockServices>(stores.mock_services.clone()),
        task_sprints: ports.family::<TaskSprints>(stores.task_sprints.clone()),
    }
}
