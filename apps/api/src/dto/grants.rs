use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_core::{AppError, UserId};
use tessera_domain::{AuthObject, AuthObjectId, AuthObjectType, Grant, ResourcePermission};
use ts_rs::TS;

/// Incoming payload for grant creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-grant-request.ts"
)]
pub struct CreateGrantRequest {
    pub auth_object_id: String,
    pub auth_object_type: String,
    pub permissions: Vec<String>,
}

impl CreateGrantRequest {
    /// Resolves the grantee named by the payload.
    pub fn auth_object(&self) -> Result<AuthObject, AppError> {
        let id = uuid::Uuid::parse_str(self.auth_object_id.trim()).map_err(|_| {
            AppError::Validation(format!("invalid auth object id '{}'", self.auth_object_id))
        })?;

        match AuthObjectType::from_str(self.auth_object_type.trim())? {
            AuthObjectType::User => Ok(AuthObject::user(UserId::from_uuid(id))),
            object_type => AuthObject::org_unit(AuthObjectId::from_uuid(id), object_type),
        }
    }
}

/// Incoming payload replacing a grant's permission set.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/replace-grant-permissions-request.ts"
)]
pub struct ReplaceGrantPermissionsRequest {
    pub permissions: Vec<String>,
}

/// API representation of a grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/grant-response.ts"
)]
pub struct GrantResponse {
    pub grant_id: String,
    pub resource_id: String,
    pub auth_object_id: String,
    pub auth_object_type: String,
    pub permissions: Vec<String>,
    pub is_creator_grant: bool,
    pub granted_at: Option<String>,
}

impl GrantResponse {
    pub fn from_grant<P: ResourcePermission>(grant: &Grant<P>, granted_at: Option<String>) -> Self {
        Self {
            grant_id: grant.id().to_string(),
            resource_id: grant.resource_id().to_string(),
            auth_object_id: grant.auth_object().id.to_string(),
            auth_object_type: grant.auth_object().object_type.as_str().to_owned(),
            permissions: grant
                .permissions()
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
            is_creator_grant: grant.is_creator_grant(),
            granted_at,
        }
    }
}
