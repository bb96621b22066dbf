//! Domain entities and invariants of resource authorization.

#![forbid(unsafe_code)]

mod auth_object;
mod decision;
mod families;
mod grant;
mod permission;

pub use auth_object::{AuthObject, AuthObjectId, AuthObjectType, IdentitySet};
pub use decision::{
    AccessDecision, AccessDenial, effective_permissions, first_unauthorized, grant_decision,
    resolve_access, shortcut_decision,
};
pub use families::{
    ApiPermission, Apis, MockServicePermission, MockServices, ServicePermission, Services,
    TaskSprintPermission, TaskSprints,
};
pub use grant::{Grant, GrantError, GrantId, ResourceId, ResourceMeta};
pub use permission::{
    AccessPolicy, PolicyException, ResolverFlags, ResourceFamily, ResourceKind, ResourcePermission,
};
