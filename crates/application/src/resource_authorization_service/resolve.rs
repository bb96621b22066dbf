use tracing::warn;

use tessera_domain::{ResolverFlags, grant_decision, shortcut_decision};

use super::*;

impl<F: ResourceFamily> ResourceAuthorizationService<F> {
    /// Resolves whether the caller may exercise `permission` on a resource.
    ///
    /// Precedence: tenant-admin override, public-access bypass, VIEW floor,
    /// creator grant, explicit grants. Unknown resources are an error, not a
    /// denial.
    pub async fn authorize(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
        permission: F::Permission,
        flags: ResolverFlags,
    ) -> AppResult<AccessDecision> {
        let meta = self.require_resource_meta(caller, resource_id).await?;
        let is_tenant_admin = if flags.ignore_admin_override {
            false
        } else {
            self.is_tenant_admin(caller).await?
        };

        if let Some(decision) =
            shortcut_decision(is_tenant_admin, meta.auth_control_enabled, permission, flags)
        {
            let rule = if is_tenant_admin {
                "admin_override"
            } else {
                "public_access"
            };
            log_decision(caller, F::KIND.as_str(), resource_id, permission, &decision, rule);
            return Ok(decision);
        }

        let grants = self.caller_grants(caller, &[resource_id]).await?;
        let decision = grant_decision(&grants, permission);
        log_decision(
            caller,
            F::KIND.as_str(),
            resource_id,
            permission,
            &decision,
            "grants",
        );

        Ok(decision)
    }

    /// Resolves with the flags from the family's call policy table.
    pub async fn authorize_with_defaults(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
        permission: F::Permission,
    ) -> AppResult<AccessDecision> {
        self.authorize(
            caller,
            resource_id,
            permission,
            F::ACCESS_POLICY.defaults_for(permission),
        )
        .await
    }

    /// Ensures the caller holds `permission` on a resource.
    pub async fn require(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
        permission: F::Permission,
    ) -> AppResult<()> {
        let decision = self
            .authorize_with_defaults(caller, resource_id, permission)
            .await?;

        if let AccessDecision::Deny(denial) = &decision {
            warn!(
                user_id = %caller.user_id(),
                resource_kind = F::KIND.as_str(),
                %resource_id,
                permission = permission.as_str(),
                %denial,
                "resource permission denied"
            );
        }

        decision.into_result()
    }
}
