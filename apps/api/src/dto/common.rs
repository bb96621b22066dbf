use std::str::FromStr;

use serde::Serialize;
use tessera_core::AppError;
use tessera_domain::{GrantId, ResourceId, ResourcePermission};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Parses a transport resource identifier.
pub fn parse_resource_id(value: &str) -> Result<ResourceId, AppError> {
    uuid::Uuid::parse_str(value.trim())
        .map(ResourceId::from_uuid)
        .map_err(|_| AppError::Validation(format!("invalid resource id '{value}'")))
}

/// Parses a transport grant identifier.
pub fn parse_grant_id(value: &str) -> Result<GrantId, AppError> {
    GrantId::parse(value.trim())
}

/// Parses a transport permission value of one family.
pub fn parse_permission<P: ResourcePermission>(value: &str) -> Result<P, AppError> {
    P::from_str(value.trim())
}
