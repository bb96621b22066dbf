use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tessera_domain::{AccessDecision, AccessDenial, ResourceId, ResourcePermission};
use ts_rs::TS;

/// Incoming payload for a single-resource check.
///
/// Omitted flags fall back to the family's call policy table.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/authorize-request.ts"
)]
pub struct AuthorizeRequest {
    pub permission: String,
    #[serde(default)]
    pub ignore_admin_override: Option<bool>,
    #[serde(default)]
    pub ignore_public_access_bypass: Option<bool>,
}

/// Incoming payload for a batch check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/authorize-batch-request.ts"
)]
pub struct AuthorizeBatchRequest {
    pub resource_ids: Vec<String>,
    #[serde(default)]
    pub permission: Option<String>,
}

/// Query string of the reverse visibility lookup.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/accessible-resources-query.ts"
)]
pub struct AccessibleResourcesQuery {
    pub permission: String,
}

/// API representation of a denial reason.
#[derive(Debug, PartialEq, Eq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-denial-response.ts"
)]
pub struct AccessDenialResponse {
    pub kind: String,
    pub message: String,
    pub permission: Option<String>,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
}

impl From<AccessDenial> for AccessDenialResponse {
    fn from(value: AccessDenial) -> Self {
        let message = value.to_string();
        match value {
            AccessDenial::NotAuthorized => Self {
                kind: "not_authorized".to_owned(),
                message,
                permission: None,
                resource_id: None,
                resource_name: None,
            },
            AccessDenial::MissingPermission { permission } => Self {
                kind: "missing_permission".to_owned(),
                message,
                permission: Some(permission),
                resource_id: None,
                resource_name: None,
            },
            AccessDenial::NotAuthorizedOnTarget {
                resource_id,
                resource_name,
            } => Self {
                kind: "not_authorized_on_target".to_owned(),
                message,
                permission: None,
                resource_id: Some(resource_id.to_string()),
                resource_name,
            },
        }
    }
}

/// API representation of an authorization decision.
#[derive(Debug, PartialEq, Eq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-decision-response.ts"
)]
pub struct AccessDecisionResponse {
    pub allowed: bool,
    pub denial: Option<AccessDenialResponse>,
}

impl From<AccessDecision> for AccessDecisionResponse {
    fn from(value: AccessDecision) -> Self {
        match value {
            AccessDecision::Allow => Self {
                allowed: true,
                denial: None,
            },
            AccessDecision::Deny(denial) => Self {
                allowed: false,
                denial: Some(AccessDenialResponse::from(denial)),
            },
        }
    }
}

/// Resources the caller holds a permission on through grants.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/accessible-resources-response.ts"
)]
pub struct AccessibleResourcesResponse {
    pub resource_ids: Vec<String>,
}

impl From<BTreeSet<ResourceId>> for AccessibleResourcesResponse {
    fn from(value: BTreeSet<ResourceId>) -> Self {
        Self {
            resource_ids: value.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Permissions the caller can exercise on one resource.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/effective-permissions-response.ts"
)]
pub struct EffectivePermissionsResponse {
    pub permissions: Vec<String>,
}

impl EffectivePermissionsResponse {
    pub fn from_permissions<P: ResourcePermission>(permissions: &BTreeSet<P>) -> Self {
        Self {
            permissions: permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tessera_domain::{AccessDecision, AccessDenial, ResourceId};

    use super::AccessDecisionResponse;

    #[test]
    fn targeted_denial_carries_resource_details() {
        let resource_id = ResourceId::new();
        let response = AccessDecisionResponse::from(AccessDecision::Deny(
            AccessDenial::NotAuthorizedOnTarget {
                resource_id,
                resource_name: Some("orders-api".to_owned()),
            },
        ));

        assert!(!response.allowed);
        let denial = response.denial;
        assert!(denial.is_some());
        let denial = denial.unwrap_or_else(|| unreachable!());
        assert_eq!(denial.kind, "not_authorized_on_target");
        assert_eq!(denial.resource_id, Some(resource_id.to_string()));
        assert_eq!(denial.resource_name.as_deref(), Some("orders-api"));
        assert!(denial.message.contains("orders-api"));
    }

    #[test]
    fn allow_serializes_without_denial() {
        let json = serde_json::to_value(AccessDecisionResponse::from(AccessDecision::Allow));

        assert_eq!(
            json.ok(),
            Some(serde_json::json!({ "allowed": true, "denial": null }))
        );
    }
}
