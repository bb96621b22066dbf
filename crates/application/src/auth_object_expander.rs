use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use tessera_core::{AppResult, CallerContext};
use tessera_domain::IdentitySet;

use crate::OrgMembershipRepository;

/// Expands a caller into the identity set grants are matched against.
#[async_trait]
pub trait AuthObjectExpander: Send + Sync {
    /// Returns the caller plus every org unit the caller directly belongs to.
    async fn expand(&self, caller: &CallerContext) -> AppResult<IdentitySet>;
}

/// Uncached expander reading memberships on every call.
#[derive(Clone)]
pub struct MembershipAuthObjectExpander {
    repository: Arc<dyn OrgMembershipRepository>,
}

impl MembershipAuthObjectExpander {
    /// Creates an expander over a membership repository.
    #[must_use]
    pub fn new(repository: Arc<dyn OrgMembershipRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl AuthObjectExpander for MembershipAuthObjectExpander {
    async fn expand(&self, caller: &CallerContext) -> AppResult<IdentitySet> {
        let org_units = self
            .repository
            .list_org_units_for_user(caller.tenant_id(), caller.user_id())
            .await?;

        debug!(
            user_id = %caller.user_id(),
            org_unit_count = org_units.len(),
            "expanded caller identity set"
        );

        Ok(IdentitySet::for_user(caller.user_id()).with_org_units(org_units))
    }
}

/// Expander memoizing the identity set of exactly one caller.
///
/// Build one per request; membership may change between requests.
pub struct RequestScopedAuthObjectExpander {
    inner: Arc<dyn AuthObjectExpander>,
    caller: CallerContext,
    identities: OnceCell<IdentitySet>,
}

impl RequestScopedAuthObjectExpander {
    /// Creates a request-scoped expander bound to one caller.
    #[must_use]
    pub fn new(inner: Arc<dyn AuthObjectExpander>, caller: CallerContext) -> Self {
        Self {
            inner,
            caller,
            identities: OnceCell::new(),
        }
    }
}

#[async_trait]
impl AuthObjectExpander for RequestScopedAuthObjectExpander {
    async fn expand(&self, caller: &CallerContext) -> AppResult<IdentitySet> {
        if caller != &self.caller {
            return self.inner.expand(caller).await;
        }

        self.identities
            .get_or_try_init(|| self.inner.expand(caller))
            .await
            .cloned()
    }
}
