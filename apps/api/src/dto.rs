mod access;
mod common;
mod grants;

pub use access::{
    AccessDecisionResponse, AccessDenialResponse, AccessibleResourcesQuery,
    AccessibleResourcesResponse, AuthorizeBatchRequest, AuthorizeRequest,
    EffectivePermissionsResponse,
};
pub use common::{HealthResponse, parse_grant_id, parse_permission, parse_resource_id};
pub use grants::{CreateGrantRequest, GrantResponse, ReplaceGrantPermissionsRequest};
