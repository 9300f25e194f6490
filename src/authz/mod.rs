//! Authorization engine
//!
//! `can(principal, ability, resource?)` evaluates an ordered rule list.
//! Rule order is part of the contract:
//!
//! 1. inactive principals are denied everything;
//! 2. destructive actions against one's own user record are denied, so an
//!    account can never lock itself out;
//! 3. tenant lifecycle abilities (`create_tenants`, `delete_tenants`)
//!    require a platform-level principal, admin or not;
//! 4. the admin role passes unconditionally, before any catalog lookup —
//!    capability sync can never constrain an admin;
//! 5. non-destructive checks against one's own record pass;
//! 6. the ability must be in the role bundle or the principal's direct
//!    grants;
//! 7. for instance checks the resource must belong to the principal's
//!    tenant. This is the last line of defense if row-scoping were ever
//!    bypassed upstream.

use crate::domain::{Patient, Role, StringUuid, Tenant, User};
use crate::error::{AppError, Result};
use tracing::debug;

/// The slice of a resource instance the engine needs: what it is, which
/// row, and which tenant owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef {
    pub resource_type: &'static str,
    pub resource_id: StringUuid,
    pub tenant_id: Option<StringUuid>,
}

impl From<&Patient> for ResourceRef {
    fn from(patient: &Patient) -> Self {
        Self {
            resource_type: "patients",
            resource_id: patient.id,
            tenant_id: Some(patient.tenant_id),
        }
    }
}

impl From<&User> for ResourceRef {
    fn from(user: &User) -> Self {
        Self {
            resource_type: "users",
            resource_id: user.id,
            tenant_id: user.tenant_id,
        }
    }
}

impl From<&Tenant> for ResourceRef {
    fn from(tenant: &Tenant) -> Self {
        Self {
            resource_type: "tenants",
            resource_id: tenant.id,
            tenant_id: Some(tenant.id),
        }
    }
}

/// Stateless allow/deny decision point. Shapes no queries and holds no
/// locks; safe to share across requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationEngine;

impl AuthorizationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn can(&self, principal: &User, ability: &str, resource: Option<&ResourceRef>) -> bool {
        if !principal.is_active {
            return false;
        }

        let targets_self = resource
            .map(|r| r.resource_type == "users" && r.resource_id == principal.id)
            .unwrap_or(false);

        // Self-lockout guard: nobody deletes their own account, including
        // admins.
        if targets_self && is_destructive(ability) {
            return false;
        }

        // Only platform operators create or destroy tenants.
        if is_tenant_lifecycle(ability) && principal.tenant_id.is_some() {
            return false;
        }

        if principal.role == Role::Admin {
            return true;
        }

        // Identity-reflexive: everyone may view/update their own record.
        if targets_self {
            return true;
        }

        if !self.holds(principal, ability) {
            return false;
        }

        if let Some(resource) = resource {
            if resource.tenant_id != principal.tenant_id {
                debug!(
                    principal = %principal.id,
                    ability,
                    resource = %resource.resource_id,
                    "instance check failed: resource owned by another tenant"
                );
                return false;
            }
        }

        true
    }

    /// Like [`can`](Self::can) but yields the stable forbidden error for
    /// handler use.
    pub fn authorize(
        &self,
        principal: &User,
        ability: &str,
        resource: Option<&ResourceRef>,
    ) -> Result<()> {
        if self.can(principal, ability, resource) {
            Ok(())
        } else {
            Err(AppError::forbidden_ability(ability))
        }
    }

    fn holds(&self, principal: &User, ability: &str) -> bool {
        principal
            .role
            .default_permissions()
            .contains(&ability)
            || principal.permissions.iter().any(|p| p == ability)
    }
}

fn is_destructive(ability: &str) -> bool {
    ability.starts_with("delete_") || ability.starts_with("force_delete_")
}

fn is_tenant_lifecycle(ability: &str) -> bool {
    matches!(
        ability,
        "create_tenants" | "delete_tenants" | "force_delete_tenants"
    )
}
