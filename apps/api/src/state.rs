use std::sync::Arc;

use tessera_application::{
    AuthObjectExpander, GrantService, RequestScopedAuthObjectExpander,
    ResourceAuthorizationService,
};
use tessera_core::CallerContext;
use tessera_domain::{Apis, MockServices, ResourceFamily, Services, TaskSprints};

/// Engine and grant commands of one resource family.
pub struct FamilyServices<F: ResourceFamily> {
    authorization: ResourceAuthorizationService<F>,
    expander: Arc<dyn AuthObjectExpander>,
}

impl<F: ResourceFamily> Clone for FamilyServices<F> {
    fn clone(&self) -> Self {
        Self {
            authorization: self.authorization.clone(),
            expander: self.expander.clone(),
        }
    }
}

impl<F: ResourceFamily> FamilyServices<F> {
    pub fn new(
        authorization: ResourceAuthorizationService<F>,
        expander: Arc<dyn AuthObjectExpander>,
    ) -> Self {
        Self {
            authorization,
            expander,
        }
    }

    /// Returns services that expand the caller's org units once per request.
    pub fn for_request(&self, caller: CallerContext) -> RequestServices<F> {
        let authorization = self
            .authorization
            .with_expander(Arc::new(RequestScopedAuthObjectExpander::new(
                self.expander.clone(),
                caller,
            )));

        RequestServices {
            grants: GrantService::new(authorization.clone()),
            authorization,
        }
    }
}

/// Services bound to one request.
pub struct RequestServices<F: ResourceFamily> {
    pub authorization: ResourceAuthorizationService<F>,
    pub grants: GrantService<F>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub apis: FamilyServices<Apis>,
    pub services: FamilyServices<Services>,
    pub mock_services: FamilyServices<MockServices>,
    pub task_sprints: FamilyServices<TaskSprints>,
}

/// Resource family reachable over HTTP.
pub trait ServedFamily: ResourceFamily + Sized {
    /// Path segment under `/api`.
    const PATH_SEGMENT: &'static str;

    fn services(state: &AppState) -> &FamilyServices<Self>;
}

impl ServedFamily for Apis {
    const PATH_SEGMENT: &'static str = "apis";

    fn services(state: &AppState) -> &FamilyServices<Self> {
        &state.apis
    }
}

impl ServedFamily for Services {
    const PATH_SEGMENT: &'static str = "services";

    fn services(state: &AppState) -> &FamilyServices<Self> {
        &state.services
    }
}

impl ServedFamily for MockServices {
    const PATH_SEGMENT: &'static str = "mock-services";

    fn services(state: &AppState) -> &FamilyServices<Self> {
        &state.mock_services
    }
}

impl ServedFamily for TaskSprints {
    const PATH_SEGMENT: &'static str = "task-sprints";

    fn services(state: &AppState) -> &FamilyServices<Self> {
        &state.task_sprints
    }
}
