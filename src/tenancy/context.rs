//! Request-lifetime tenant context

use crate::domain::{StringUuid, Tenant};

/// The tenant resolved for the current request.
///
/// Created exactly once per inbound request by the [`TenantResolver`] and
/// read-only for the rest of the request; it is passed explicitly to every
/// data-access call rather than living in ambient global state, so
/// concurrent requests can never observe each other's tenant.
///
/// [`TenantResolver`]: crate::tenancy::TenantResolver
#[derive(Debug, Clone)]
pub struct TenantContext {
    tenant: Tenant,
}

impl TenantContext {
    pub fn new(tenant: Tenant) -> Self {
        Self { tenant }
    }

    /// The resolved tenant.
    pub fn current_tenant(&self) -> &Tenant {
        &self.tenant
    }

    /// The resolved tenant's id.
    pub fn current_tenant_id(&self) -> StringUuid {
        self.tenant.id
    }
}
