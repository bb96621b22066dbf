use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use tessera_core::{AppError, AppResult, CallerContext};
use tessera_domain::{
    AccessDecision, AccessDenial, Grant, ResourceFamily, ResourceId, ResourceMeta,
    ResourcePermission,
};

use crate::{
    AuthObjectExpander, GrantRepository, ResourceMetadataProvider, TenantAdminDirectory,
    decode_grants,
};

mod batch;
mod resolve;
mod visibility;


/// Resource authorization engine for one resource family.
///
/// Stateless; every call reads current grant state through the ports.
pub struct ResourceAuthorizationService<F: ResourceFamily> {
    grant_repository: Arc<dyn GrantRepository>,
    metadata_provider: Arc<dyn ResourceMetadataProvider>,
    admin_directory: Arc<dyn TenantAdminDirectory>,
    expander: Arc<dyn AuthObjectExpander>,
    family: PhantomData<fn() -> F>,
}

impl<F: ResourceFamily> Clone for ResourceAuthorizationService<F> {
    fn clone(&self) -> Self {
        Self {
            grant_repository: self.grant_repository.clone(),
            metadata_provider: self.metadata_provider.clone(),
            admin_directory: self.admin_directory.clone(),
            expander: self.expander.clone(),
            family: PhantomData,
        }
    }
}

impl<F: ResourceFamily> ResourceAuthorizationService<F> {
    /// Creates the engine from its collaborators.
    #[must_use]
    pub fn new(
        grant_repository: Arc<dyn GrantRepository>,
        metadata_provider: Arc<dyn ResourceMetadataProvider>,
        admin_directory: Arc<dyn TenantAdminDirectory>,
        expander: Arc<dyn AuthObjectExpander>,
    ) -> Self {
        Self {
            grant_repository,
            metadata_provider,
            admin_directory,
            expander,
            family: PhantomData,
        }
    }

    /// Returns an engine sharing this one's ports but using another expander,
    /// typically a request-scoped one.
    #[must_use]
    pub fn with_expander(&self, expander: Arc<dyn AuthObjectExpander>) -> Self {
        Self {
            expander,
            ..self.clone()
        }
    }

    pub(crate) fn grant_repository(&self) -> &Arc<dyn GrantRepository> {
        &self.grant_repository
    }

    pub(crate) async fn require_resource_meta(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
    ) -> AppResult<ResourceMeta> {
        self.metadata_provider
            .find_resource_meta(caller.tenant_id(), resource_id)
            .await?
            .filter(|meta| meta.tenant_id == caller.tenant_id())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} resource '{resource_id}' does not exist in tenant '{}'",
                    F::KIND.as_str(),
                    caller.tenant_id()
                ))
            })
    }

    async fn is_tenant_admin(&self, caller: &CallerContext) -> AppResult<bool> {
        self.admin_directory
            .is_tenant_admin(caller.tenant_id(), caller.user_id())
            .await
    }

    async fn caller_grants(
        &self,
        caller: &CallerContext,
        resource_ids: &[ResourceId],
    ) -> AppResult<Vec<Grant<F::Permission>>> {
        let identities = self.expander.expand(caller).await?;
        let records = self
            .grant_repository
            .find_grants_for_identities(
                caller.tenant_id(),
                F::KIND,
                resource_ids,
                identities.auth_object_ids().as_slice(),
            )
            .await?;

        decode_grants(&records)
    }

    async fn targeted_denial(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
    ) -> AppResult<AccessDecision> {
        let resource_name = self
            .metadata_provider
            .find_resource_name(caller.tenant_id(), resource_id)
            .await?;

        Ok(AccessDecision::Deny(AccessDenial::NotAuthorizedOnTarget {
            resource_id,
            resource_name,
        }))
    }
}

fn log_decision<P: ResourcePermission>(
    caller: &CallerContext,
    kind: &str,
    resource_id: ResourceId,
    permission: P,
    decision: &AccessDecision,
    rule: &'static str,
) {
    debug!(
        user_id = %caller.user_id(),
        tenant_id = %caller.tenant_id(),
        resource_kind = kind,
        %resource_id,
        permission = permission.as_str(),
        allowed = decision.is_allowed(),
        rule,
        "resolved resource permission"
    );
}
