//! Resource families guarded by the shared authorization engine.
//!
//! A family contributes its permission enum and its call policy table; the
//! resolution algorithm itself is shared.

use crate::permission::resource_permissions;
use crate::{AccessPolicy, PolicyException, ResolverFlags, ResourceFamily, ResourceKind};

resource_permissions! {
    /// Permissions on API catalog entries.
    pub enum ApiPermission {
        /// Read the API definition.
        View => "view",
        /// Add cases or sub-resources.
        Add => "add",
        /// Edit the API definition.
        Modify => "modify",
        /// Delete the API.
        Delete => "delete",
        /// Send debug requests against the API.
        Debug => "debug",
        /// Change who may act on the API.
        Grant => "grant",
        /// Publish a new API version.
        Release => "release",
    }
    grant = Grant;
    release = Some(ApiPermission::Release);
}

resource_permissions! {
    /// Permissions on service definitions.
    pub enum ServicePermission {
        /// Read the service.
        View => "view",
        /// Add APIs to the service.
        Add => "add",
        /// Edit the service.
        Modify => "modify",
        /// Delete the service.
        Delete => "delete",
        /// Share the service with other tenants' consumers.
        Share => "share",
        /// Change who may act on the service.
        Grant => "grant",
    }
    grant = Grant;
    release = None;
}

resource_permissions! {
    /// Permissions on mock services.
    pub enum MockServicePermission {
        /// Read the mock service.
        View => "view",
        /// Add expectations.
        Add => "add",
        /// Edit expectations.
        Modify => "modify",
        /// Delete the mock service.
        Delete => "delete",
        /// Call the mock in debug mode.
        Debug => "debug",
        /// Change who may act on the mock service.
        Grant => "grant",
        /// Start or stop serving the mock.
        Release => "release",
    }
    grant = Grant;
    release = Some(MockServicePermission::Release);
}

resource_permissions! {
    /// Permissions on test task sprints.
    pub enum TaskSprintPermission {
        /// Read the sprint.
        View => "view",
        /// Add tasks.
        Add => "add",
        /// Edit tasks.
        Modify => "modify",
        /// Delete the sprint.
        Delete => "delete",
        /// Execute the sprint's test runs.
        Test => "test",
        /// Change who may act on the sprint.
        Grant => "grant",
    }
    grant = Grant;
    release = None;
}

/// API catalog family.
#[derive(Debug, Clone, Copy)]
pub struct Apis;

impl ResourceFamily for Apis {
    type Permission = ApiPermission;
    const KIND: ResourceKind = ResourceKind::Api;
    const ACCESS_POLICY: AccessPolicy<ApiPermission> = AccessPolicy::new(&[]);
}

/// Service family.
#[derive(Debug, Clone, Copy)]
pub struct Services;

impl ResourceFamily for Services {
    type Permission = ServicePermission;
    const KIND: ResourceKind = ResourceKind::Service;
    const ACCESS_POLICY: AccessPolicy<ServicePermission> = AccessPolicy::new(SERVICE_EXCEPTIONS);
}

const SERVICE_EXCEPTIONS: &[PolicyException<ServicePermission>] = &[PolicyException {
    permission: ServicePermission::Share,
    defaults: ResolverFlags {
        ignore_admin_override: false,
        ignore_public_access_bypass: true,
    },
    note: "sharing exposes the service outside the tenant, so a public service still needs an explicit share grant",
}];

/// Mock service family.
#[derive(Debug, Clone, Copy)]
pub struct MockServices;

impl ResourceFamily for MockServices {
    type Permission = MockServicePermission;
    const KIND: ResourceKind = ResourceKind::MockService;
    const ACCESS_POLICY: AccessPolicy<MockServicePermission> =
        AccessPolicy::new(MOCK_SERVICE_EXCEPTIONS);
}

const MOCK_SERVICE_EXCEPTIONS: &[PolicyException<MockServicePermission>] = &[PolicyException {
    permission: MockServicePermission::Release,
    defaults: ResolverFlags {
        ignore_admin_override: false,
        ignore_public_access_bypass: true,
    },
    note: "legacy mock release endpoints let any viewer of a public mock release it; \
           kept aligned with apis until product confirms the looser rule",
}];

/// Task sprint family.
#[derive(Debug, Clone, Copy)]
pub struct TaskSprints;

impl ResourceFamily for TaskSprints {
    type Permission = TaskSprintPermission;
    const KIND: ResourceKind = ResourceKind::TaskSprint;
    const ACCESS_POLICY: AccessPolicy<TaskSprintPermission> = AccessPolicy::new(&[]);
}
