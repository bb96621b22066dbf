use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use tessera_domain::first_unauthorized;

use super::*;

impl<F: ResourceFamily> ResourceAuthorizationService<F> {
    /// Resolves one permission over many resources with a single grant fetch.
    ///
    /// A denial names the first resource, in the given order, that the caller
    /// may not act on. Public resources are exempt for every permission except
    /// the grant permission.
    pub async fn authorize_batch(
        &self,
        caller: &CallerContext,
        resource_ids: &[ResourceId],
        permission: Option<F::Permission>,
    ) -> AppResult<AccessDecision> {
        let Some(permission) = permission else {
            return Ok(AccessDecision::Allow);
        };
        if resource_ids.is_empty() || self.is_tenant_admin(caller).await? {
            return Ok(AccessDecision::Allow);
        }

        let mut seen = HashSet::new();
        let ordered: Vec<ResourceId> = resource_ids
            .iter()
            .copied()
            .filter(|resource_id| seen.insert(*resource_id))
            .collect();

        let required = self.required_resources(caller, ordered, permission).await?;
        if required.is_empty() {
            return Ok(AccessDecision::Allow);
        }

        let grants = self.caller_grants(caller, &required).await?;
        let offending = if grants.is_empty() {
            required.first().copied()
        } else {
            first_unauthorized(&required, &grants, permission)
        };

        debug!(
            user_id = %caller.user_id(),
            resource_kind = F::KIND.as_str(),
            permission = permission.as_str(),
            requested = resource_ids.len(),
            checked = required.len(),
            grants = grants.len(),
            "resolved batch resource permission"
        );

        match offending {
            Some(resource_id) => self.targeted_denial(caller, resource_id).await,
            None => Ok(AccessDecision::Allow),
        }
    }

    /// Ensures the caller holds `permission` on every resource.
    pub async fn require_batch(
        &self,
        caller: &CallerContext,
        resource_ids: &[ResourceId],
        permission: F::Permission,
    ) -> AppResult<()> {
        let decision = self
            .authorize_batch(caller, resource_ids, Some(permission))
            .await?;

        if let AccessDecision::Deny(denial) = &decision {
            warn!(
                user_id = %caller.user_id(),
                resource_kind = F::KIND.as_str(),
                permission = permission.as_str(),
                %denial,
                "batch resource permission denied"
            );
        }

        decision.into_result()
    }

    async fn required_resources(
        &self,
        caller: &CallerContext,
        ordered: Vec<ResourceId>,
        permission: F::Permission,
    ) -> AppResult<Vec<ResourceId>> {
        if permission.is_grant_class() {
            return Ok(ordered);
        }

        let public: HashMap<ResourceId, bool> = self
            .metadata_provider
            .list_resource_meta(caller.tenant_id(), &ordered)
            .await?
            .into_iter()
            .filter(|meta| meta.tenant_id == caller.tenant_id())
            .map(|meta| (meta.resource_id, !meta.auth_control_enabled))
            .collect();

        // Unknown resources stay in the checked set.
        Ok(ordered
            .into_iter()
            .filter(|resource_id| !public.get(resource_id).copied().unwrap_or(false))
            .collect())
    }
}
