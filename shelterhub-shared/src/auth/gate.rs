/// Authorization gate
///
/// Runs before a handler and decides whether it may run. Each route
/// declares a [`RouteRequirement`]; the gate resolves the request's
/// identifiers with the extractor, then asks the resolver.
///
/// # Decision sequence
///
/// 1. No capability declared: allow, without extracting anything
/// 2. No authenticated principal: `Unauthenticated`
/// 3. Shelter id unresolved: `ShelterIdRequired`
/// 4. Shelter admin: allow
/// 5. READ: `can_read_module`
/// 6. WRITE: module key required (`ModuleKeyRequired`), then `can_write_in_module`
/// 7. MANAGE: module id required (`ModuleIdRequired`), then `can_manage_module`
/// 8. Otherwise a capability-specific denial
///
/// The gate never caches decisions and never writes to the store.

use serde::Serialize;
use tracing::{debug, info};

use super::extractor::{direct_shelter_id, extract_params, ExtractedParams, RequestView};
use super::metrics::GateMetrics;
use super::middleware::AuthContext;
use super::permissions::{Capability, PermissionResolver};
use crate::models::shelter_module::ModuleKey;
use crate::store::{StoreError, TenantStore};

/// Per-route authorization requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RouteRequirement {
    /// Capability the route needs; None means no module check
    pub capability: Option<Capability>,

    /// Module key bound statically to the route
    pub module_key: Option<ModuleKey>,
}

impl RouteRequirement {
    pub const fn none() -> Self {
        Self {
            capability: None,
            module_key: None,
        }
    }

    pub const fn read() -> Self {
        Self {
            capability: Some(Capability::Read),
            module_key: None,
        }
    }

    pub const fn write() -> Self {
        Self {
            capability: Some(Capability::Write),
            module_key: None,
        }
    }

    pub const fn manage() -> Self {
        Self {
            capability: Some(Capability::Manage),
            module_key: None,
        }
    }

    pub const fn in_module(mut self, module_key: ModuleKey) -> Self {
        self.module_key = Some(module_key);
        self
    }
}

/// Why the gate let a request through
#[derive(Debug, Clone, PartialEq)]
pub enum Grant {
    /// The route declares no capability
    NoRequirement,

    /// The principal is owner or admin of the shelter
    ShelterAdmin(ExtractedParams),

    /// The capability-specific check passed
    Capability(Capability, ExtractedParams),
}

impl Grant {
    /// Extracted identifiers, if extraction ran
    pub fn params(&self) -> Option<&ExtractedParams> {
        match self {
            Grant::NoRequirement => None,
            Grant::ShelterAdmin(params) | Grant::Capability(_, params) => Some(params),
        }
    }
}

/// Gate failures
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("User is not authenticated")]
    Unauthenticated,

    #[error("Shelter id is required")]
    ShelterIdRequired,

    #[error("Module key is required for write permission")]
    ModuleKeyRequired,

    #[error("Module id is required")]
    ModuleIdRequired,

    #[error("You do not have read permission in this module")]
    ReadDenied,

    #[error("You do not have write permission in this module")]
    WriteDenied,

    #[error("You do not have management permission in this module")]
    ManageDenied,

    #[error("Only shelter owners and administrators can perform this action")]
    ShelterAdminOnly,

    #[error("Storage error during authorization: {0}")]
    Store(#[from] StoreError),
}

impl AuthzError {
    /// Short machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthzError::Unauthenticated => "unauthenticated",
            AuthzError::ShelterIdRequired => "shelter_id_required",
            AuthzError::ModuleKeyRequired => "module_key_required",
            AuthzError::ModuleIdRequired => "module_id_required",
            AuthzError::ReadDenied => "read_denied",
            AuthzError::WriteDenied => "write_denied",
            AuthzError::ManageDenied => "manage_denied",
            AuthzError::ShelterAdminOnly => "shelter_admin_only",
            AuthzError::Store(_) => "internal_error",
        }
    }

    fn denied(capability: Capability) -> Self {
        match capability {
            Capability::Read => AuthzError::ReadDenied,
            Capability::Write => AuthzError::WriteDenied,
            Capability::Manage => AuthzError::ManageDenied,
        }
    }

    fn is_denial(&self) -> bool {
        matches!(
            self,
            AuthzError::ReadDenied
                | AuthzError::WriteDenied
                | AuthzError::ManageDenied
                | AuthzError::ShelterAdminOnly
        )
    }
}

/// Module-capability gate
pub async fn authorize(
    store: &dyn TenantStore,
    principal: Option<&AuthContext>,
    requirement: RouteRequirement,
    view: &RequestView,
    metrics: &GateMetrics,
) -> Result<Grant, AuthzError> {
    let result = evaluate(store, principal, requirement, view, metrics).await;
    record(metrics, &result);
    result
}

async fn evaluate(
    store: &dyn TenantStore,
    principal: Option<&AuthContext>,
    requirement: RouteRequirement,
    view: &RequestView,
    metrics: &GateMetrics,
) -> Result<Grant, AuthzError> {
    let Some(capability) = requirement.capability else {
        return Ok(Grant::NoRequirement);
    };

    let principal = principal.ok_or(AuthzError::Unauthenticated)?;

    let params = extract_params(store, view, requirement.module_key, metrics).await;
    let shelter_id = params.shelter_id.ok_or(AuthzError::ShelterIdRequired)?;

    let resolver = PermissionResolver::new(store);
    if resolver
        .is_admin_in_shelter(principal.user_id, shelter_id)
        .await?
    {
        debug!(user_id = %principal.user_id, %shelter_id, "Shelter admin shortcut");
        return Ok(Grant::ShelterAdmin(params));
    }

    let user_id = Some(principal.user_id);
    let allowed = match capability {
        Capability::Read => resolver.can_read_module(user_id, Some(shelter_id)).await?,
        Capability::Write => {
            let module_key = params
                .module_key
                .as_deref()
                .ok_or(AuthzError::ModuleKeyRequired)?;
            resolver
                .can_write_in_module(user_id, Some(module_key), Some(shelter_id))
                .await?
        }
        Capability::Manage => {
            let module_id = params.module_id.ok_or(AuthzError::ModuleIdRequired)?;
            resolver
                .can_manage_module(user_id, Some(module_id), Some(shelter_id))
                .await?
        }
    };

    if allowed {
        Ok(Grant::Capability(capability, params))
    } else {
        info!(
            user_id = %principal.user_id,
            %shelter_id,
            capability = %capability,
            module_key = ?params.module_key,
            module_id = ?params.module_id,
            "Module permission denied"
        );
        Err(AuthzError::denied(capability))
    }
}

/// Shelter-level gate: owners and admins only
///
/// Uses the direct shelter-id sources only; there is no reverse lookup for
/// shelter-level operations.
pub async fn require_shelter_admin(
    store: &dyn TenantStore,
    principal: Option<&AuthContext>,
    view: &RequestView,
    metrics: &GateMetrics,
) -> Result<(), AuthzError> {
    let result = async {
        let principal = principal.ok_or(AuthzError::Unauthenticated)?;
        let shelter_id = direct_shelter_id(view).ok_or(AuthzError::ShelterIdRequired)?;

        let allowed = PermissionResolver::new(store)
            .can_manage_module_activation(principal.user_id, shelter_id)
            .await?;

        if allowed {
            Ok(())
        } else {
            info!(user_id = %principal.user_id, %shelter_id, "Shelter admin check failed");
            Err(AuthzError::ShelterAdminOnly)
        }
    }
    .await;

    match &result {
        Ok(()) => metrics.record_allowed(),
        Err(e) if e.is_denial() => metrics.record_denied(),
        Err(AuthzError::Store(_)) => {}
        Err(_) => metrics.record_rejected(),
    }
    result
}

fn record(metrics: &GateMetrics, result: &Result<Grant, AuthzError>) {
    match result {
        Ok(Grant::NoRequirement) => {}
        Ok(_) => metrics.record_allowed(),
        Err(e) if e.is_denial() => metrics.record_denied(),
        Err(AuthzError::Store(_)) => {}
        Err(_) => metrics.record_rejected(),
    }
}
