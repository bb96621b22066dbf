use serde::{Deserialize, Serialize};

use crate::{TenantId, UserId};

/// Explicit caller identity passed into every authorization call.
///
/// There is no ambient "current user": request handlers build one of these
/// from the authenticated request and thread it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerContext {
    user_id: UserId,
    tenant_id: TenantId,
}

impl CallerContext {
    /// Creates a caller context for a user acting inside a tenant.
    #[must_use]
    pub fn new(user_id: UserId, tenant_id: TenantId) -> Self {
        Self { user_id, tenant_id }
    }

    /// Returns the acting user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the tenant the user is acting in.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
