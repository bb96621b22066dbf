use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tessera_core::AppError;
use thiserror::Error;

use crate::{Grant, ResolverFlags, ResourceId, ResourcePermission};

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The caller may act.
    Allow,
    /// The caller may not act.
    Deny(AccessDenial),
}

impl AccessDecision {
    /// Returns whether the decision allows the action.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts a denial into a forbidden application error.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(denial) => Err(denial.into()),
        }
    }
}

/// Typed reason attached to a denial.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessDenial {
    /// The caller holds no grant at all on a controlled resource.
    ///
    /// Carries no resource detail since the caller may not know it exists.
    #[error("no authorization")]
    NotAuthorized,

    /// The caller can see the resource but lacks one permission.
    #[error("missing permission '{permission}'")]
    MissingPermission {
        /// Storage value of the missing permission.
        permission: String,
    },

    /// A targeted denial naming the offending resource.
    #[error(
        "no authorization on '{}' ({resource_id})",
        .resource_name.as_deref().unwrap_or("unnamed resource")
    )]
    NotAuthorizedOnTarget {
        /// Offending resource.
        resource_id: ResourceId,
        /// Human-readable name, when the family could resolve one.
        resource_name: Option<String>,
    },
}

impl From<AccessDenial> for AppError {
    fn from(value: AccessDenial) -> Self {
        Self::Forbidden(value.to_string())
    }
}

/// Decides a request from facts available before any grant lookup.
///
/// Returns `None` when the grants of the caller must be consulted.
#[must_use]
pub fn shortcut_decision<P: ResourcePermission>(
    is_tenant_admin: bool,
    auth_control_enabled: bool,
    permission: P,
    flags: ResolverFlags,
) -> Option<AccessDecision> {
    if is_tenant_admin && !flags.ignore_admin_override {
        return Some(AccessDecision::Allow);
    }

    if !flags.ignore_public_access_bypass
        && permission.is_public_bypass_eligible()
        && !auth_control_enabled
    {
        return Some(AccessDecision::Allow);
    }

    None
}

/// Decides a request from the grants matching the caller's identity set.
#[must_use]
pub fn grant_decision<P: ResourcePermission>(grants: &[Grant<P>], permission: P) -> AccessDecision {
    if permission == P::VIEW && grants.is_empty() {
        return AccessDecision::Deny(AccessDenial::NotAuthorized);
    }

    if grants.iter().any(Grant::is_creator_grant) {
        return AccessDecision::Allow;
    }

    if grants
        .iter()
        .any(|grant| grant.permissions().contains(&permission))
    {
        return AccessDecision::Allow;
    }

    AccessDecision::Deny(AccessDenial::MissingPermission {
        permission: permission.as_str().to_owned(),
    })
}

/// Full single-resource resolution over already-loaded facts.
#[must_use]
pub fn resolve_access<P: ResourcePermission>(
    is_tenant_admin: bool,
    auth_control_enabled: bool,
    grants: &[Grant<P>],
    permission: P,
    flags: ResolverFlags,
) -> AccessDecision {
    shortcut_decision(is_tenant_admin, auth_control_enabled, permission, flags)
        .unwrap_or_else(|| grant_decision(grants, permission))
}

/// Returns the first resource, in the given order, whose grants do not
/// allow the permission.
#[must_use]
pub fn first_unauthorized<P: ResourcePermission>(
    required: &[ResourceId],
    grants: &[Grant<P>],
    permission: P,
) -> Option<ResourceId> {
    let mut by_resource: HashMap<ResourceId, Vec<&Grant<P>>> = HashMap::new();
    for grant in grants {
        by_resource
            .entry(grant.resource_id())
            .or_default()
            .push(grant);
    }

    required.iter().copied().find(|resource_id| {
        let Some(resource_grants) = by_resource.get(resource_id) else {
            return true;
        };

        if resource_grants.iter().any(|grant| grant.is_creator_grant()) {
            return false;
        }

        !resource_grants
            .iter()
            .any(|grant| grant.permissions().contains(&permission))
    })
}

/// Effective permission set of a caller on one resource.
#[must_use]
pub fn effective_permissions<P: ResourcePermission>(
    is_tenant_admin: bool,
    auth_control_enabled: bool,
    grants: &[Grant<P>],
) -> BTreeSet<P> {
    if is_tenant_admin || grants.iter().any(Grant::is_creator_grant) {
        return P::all().iter().copied().collect();
    }

    let mut permissions: BTreeSet<P> = grants
        .iter()
        .flat_map(|grant| grant.permissions().iter().copied())
        .collect();
    if !auth_control_enabled {
        permissions.insert(P::VIEW);
    }

    permissions
}
