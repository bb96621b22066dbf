//! Application services and ports of resource authorization.

#![forbid(unsafe_code)]

mod access_ports;
mod auth_object_expander;
mod grant_service;
mod resource_authorization_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    CreateGrantInput, GrantRecord, GrantRepository, OrgMembershipRepository,
    ResourceMetadataProvider, TenantAdminDirectory, decode_grants, encode_permissions,
};
pub use auth_object_expander::{
    AuthObjectExpander, MembershipAuthObjectExpander, RequestScopedAuthObjectExpander,
};
pub use grant_service::{GrantListing, GrantService};
pub use resource_authorization_service::ResourceAuthorizationService;
