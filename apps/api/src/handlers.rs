use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use tessera_core::{AppError, CallerContext};
use tessera_domain::ResourcePermission;

use crate::dto::{
    AccessDecisionResponse, AccessibleResourcesQuery, AccessibleResourcesResponse,
    AuthorizeBatchRequest, AuthorizeRequest, CreateGrantRequest, EffectivePermissionsResponse,
    GrantResponse, ReplaceGrantPermissionsRequest, parse_grant_id, parse_permission,
    parse_resource_id,
};
use crate::error::ApiResult;
use crate::state::{AppState, ServedFamily};

mod access;
mod grants;
mod health;

pub use access::{
    accessible_resources_handler, authorize_batch_handler, authorize_handler,
    effective_permissions_handler,
};
pub use grants::{
    create_grant_handler, list_grants_handler, provision_creator_grant_handler,
    replace_grant_permissions_handler, revoke_grant_handler,
};
pub use health::health_handler;

fn parse_permission_set<P: ResourcePermission>(values: &[String]) -> Result<BTreeSet<P>, AppError> {
    values
        .iter()
        .map(|value| parse_permission::<P>(value.as_str()))
        .collect()
}
