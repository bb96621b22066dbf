use std::fmt::Debug;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_core::AppError;

/// Capability set of one resource family.
///
/// Every family exposes at least `VIEW` and `GRANT`. `RELEASE` is optional
/// because only publishable resources have a published state.
pub trait ResourcePermission:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + FromStr<Err = AppError> + 'static
{
    /// Floor permission; without it a controlled resource is invisible.
    const VIEW: Self;
    /// Permission to change who else may act on a resource.
    const GRANT: Self;
    /// State-transition permission (publish/release), when the family has one.
    const RELEASE: Option<Self>;

    /// Returns every permission of the family in declaration order.
    fn all() -> &'static [Self];

    /// Returns a stable storage value for this permission.
    fn as_str(&self) -> &'static str;

    /// Returns whether this permission changes authorization itself.
    fn is_grant_class(&self) -> bool {
        *self == Self::GRANT
    }

    /// Returns whether this permission transitions published state.
    fn is_release_class(&self) -> bool {
        Self::RELEASE == Some(*self)
    }

    /// Returns whether a public resource lets anyone exercise this permission.
    fn is_public_bypass_eligible(&self) -> bool {
        !self.is_grant_class() && !self.is_release_class()
    }
}

/// Storage discriminator for the resource families sharing the grant store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// API catalog entries.
    Api,
    /// Service definitions grouping APIs.
    Service,
    /// Mock services.
    MockService,
    /// Test task sprints.
    TaskSprint,
}

impl ResourceKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Service => "service",
            Self::MockService => "mock_service",
            Self::TaskSprint => "task_sprint",
        }
    }

    /// Returns all known resource kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ResourceKind] = &[
            ResourceKind::Api,
            ResourceKind::Service,
            ResourceKind::MockService,
            ResourceKind::TaskSprint,
        ];

        ALL
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "api" => Ok(Self::Api),
            "service" => Ok(Self::Service),
            "mock_service" => Ok(Self::MockService),
            "task_sprint" => Ok(Self::TaskSprint),
            _ => Err(AppError::Validation(format!(
                "unknown resource kind '{value}'"
            ))),
        }
    }
}

/// Per-call resolver flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverFlags {
    /// Skip the tenant-admin override.
    pub ignore_admin_override: bool,
    /// Skip the public-access bypass for resources without access control.
    pub ignore_public_access_bypass: bool,
}

/// Named deviation from the derived call defaults of one permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyException<P: 'static> {
    /// Permission the exception applies to.
    pub permission: P,
    /// Flags used instead of the derived ones.
    pub defaults: ResolverFlags,
    /// Business rule behind the deviation.
    pub note: &'static str,
}

/// Call policy table of a resource family.
///
/// Derived defaults are `ignore_admin_override = false` and
/// `ignore_public_access_bypass = is_grant_class || is_release_class`.
/// Anything else must be listed as an exception so that deviations between
/// families stay visible.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy<P: 'static> {
    exceptions: &'static [PolicyException<P>],
}

impl<P: ResourcePermission> AccessPolicy<P> {
    /// Creates a policy table from a static exception list.
    #[must_use]
    pub const fn new(exceptions: &'static [PolicyException<P>]) -> Self {
        Self { exceptions }
    }

    /// Returns the mechanically derived flags for a permission.
    #[must_use]
    pub fn derived(permission: P) -> ResolverFlags {
        ResolverFlags {
            ignore_admin_override: false,
            ignore_public_access_bypass: !permission.is_public_bypass_eligible(),
        }
    }

    /// Returns the flags to use for a permission.
    #[must_use]
    pub fn defaults_for(&self, permission: P) -> ResolverFlags {
        self.exceptions
            .iter()
            .find(|exception| exception.permission == permission)
            .map(|exception| exception.defaults)
            .unwrap_or_else(|| Self::derived(permission))
    }

    /// Returns the flags for a permission with caller-supplied overrides
    /// applied on top of the table defaults.
    #[must_use]
    pub fn flags_with_overrides(
        &self,
        permission: P,
        ignore_admin_override: Option<bool>,
        ignore_public_access_bypass: Option<bool>,
    ) -> ResolverFlags {
        let defaults = self.defaults_for(permission);
        ResolverFlags {
            ignore_admin_override: ignore_admin_override
                .unwrap_or(defaults.ignore_admin_override),
            ignore_public_access_bypass: ignore_public_access_bypass
                .unwrap_or(defaults.ignore_public_access_bypass),
        }
    }

    /// Returns the exception list.
    #[must_use]
    pub fn exceptions(&self) -> &'static [PolicyException<P>] {
        self.exceptions
    }
}

/// A family of resources sharing one permission enum and one metadata source.
pub trait ResourceFamily: Send + Sync + 'static {
    /// Permission enum of the family.
    type Permission: ResourcePermission;

    /// Storage discriminator.
    const KIND: ResourceKind;

    /// Call policy table.
    const ACCESS_POLICY: AccessPolicy<Self::Permission>;
}

/// Declares a family permission enum with storage values.
macro_rules! resource_permissions {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $value:literal,)+
        }
        grant = $grant:ident;
        release = $release:expr;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$variant_meta])* $variant,)+
        }

        impl $crate::ResourcePermission for $name {
            const VIEW: Self = Self::View;
            const GRANT: Self = Self::$grant;
            const RELEASE: Option<Self> = $release;

            fn all() -> &'static [Self] {
                const ALL: &[$name] = &[$($name::$variant,)+];
                ALL
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = tessera_core::AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(tessera_core::AppError::Validation(format!(
                        "unknown {} permission value '{value}'",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str($crate::ResourcePermission::as_str(self))
            }
        }
    };
}

pub(crate) use resource_permissions;
