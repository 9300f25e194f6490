//! Row-scoping enforcer
//!
//! Every read, update and delete against a tenant-owned table goes through
//! a [`TenantScope`]: with an active tenant it AND-appends a
//! `tenant_id = ?` filter the caller cannot override, and on create it
//! stamps the current tenant onto the row. The only way to run unscoped is
//! the explicitly named [`TenantScope::without_tenant_scope`], which keeps
//! every bypass greppable.

use crate::capability::{pluralize, snake_case, Action};
use crate::domain::StringUuid;
use crate::error::{AppError, Result};
use crate::tenancy::context::TenantContext;
use sqlx::{MySql, QueryBuilder};

/// Declaration implemented by every tenant-owned entity type.
///
/// Besides naming the table for the scoping layer, each type declares its
/// capability surface: a permission prefix (default: pluralized snake-case
/// of the type name) and an action list. The capability registry collects
/// these at startup; there is no runtime reflection.
pub trait TenantOwned {
    /// Table holding rows of this type; must carry a `tenant_id` column.
    const TABLE: &'static str;
    /// Type name used for deterministic ordering of declarations.
    const RESOURCE: &'static str;

    /// Permission name suffix, e.g. `patients` in `view_patients`.
    fn permission_prefix() -> String {
        pluralize(&snake_case(Self::RESOURCE))
    }

    /// Actions crossed with the prefix to form permission names.
    fn actions() -> Vec<Action> {
        Action::defaults()
    }
}

/// The scoping decision for one unit of data access.
///
/// Shaping a query never fails; a scoped statement that matches nothing is
/// indistinguishable from "row does not exist", by design.
#[derive(Debug, Clone, Copy)]
pub struct TenantScope {
    tenant_id: Option<StringUuid>,
}

impl TenantScope {
    /// Scope to the tenant resolved for the current request.
    pub fn of(ctx: &TenantContext) -> Self {
        Self {
            tenant_id: Some(ctx.current_tenant_id()),
        }
    }

    /// Platform-level bypass: no tenant filter is applied.
    ///
    /// Call sites are the audit surface for cross-tenant access; this name
    /// must be the only way to obtain an unscoped handle.
    pub fn without_tenant_scope() -> Self {
        Self { tenant_id: None }
    }

    pub fn is_scoped(&self) -> bool {
        self.tenant_id.is_some()
    }

    pub fn tenant_id(&self) -> Option<StringUuid> {
        self.tenant_id
    }

    /// Append the tenant filter to a query.
    ///
    /// The builder's SQL must already contain a `WHERE` clause: the filter
    /// is emitted as ` AND tenant_id = ?`, so a builder without one would
    /// produce invalid SQL. Always AND-combined with the predicate already
    /// there; callers cannot weaken it into an OR or replace the bound id.
    pub fn apply(&self, qb: &mut QueryBuilder<'_, MySql>) {
        if let Some(tenant_id) = self.tenant_id {
            qb.push(" AND tenant_id = ");
            qb.push_bind(tenant_id);
        }
    }

    /// Decide the `tenant_id` to persist for a row being created.
    ///
    /// An unset id is stamped with the current tenant. A pre-set id is
    /// never silently overwritten: under an active scope it must already
    /// match, and an unscoped create must supply one explicitly.
    pub fn stamp(&self, existing: Option<StringUuid>) -> Result<StringUuid> {
        match (self.tenant_id, existing) {
            (Some(current), None) => Ok(current),
            (Some(current), Some(supplied)) if supplied == current => Ok(supplied),
            (Some(_), Some(_)) => Err(AppError::Forbidden(
                "forbidden:cross_tenant_write".to_string(),
            )),
            (None, Some(supplied)) => Ok(supplied),
            (None, None) => Err(AppError::BadRequest(
                "tenant_id is required for an unscoped create".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tenant;

    fn scoped() -> (TenantScope, StringUuid) {
        let tenant = Tenant::default();
        let id = tenant.id;
        (TenantScope::of(&TenantContext::new(tenant)), id)
    }

    #[test]
    fn test_scoped_read_gets_tenant_filter() {
        let (scope, _) = scoped();
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, tenant_id, first_name FROM patients WHERE deleted_at IS NULL",
        );
        scope.apply(&mut qb);
        assert!(qb.sql().ends_with("AND tenant_id = ?"));
    }

    #[test]
    fn test_filter_is_and_combined_with_caller_predicate() {
        let (scope, _) = scoped();
        let mut qb = QueryBuilder::<MySql>::new("UPDATE patients SET phone = NULL WHERE id = ");
        qb.push_bind(StringUuid::new_v4());
        scope.apply(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("WHERE id = ?"));
        assert!(sql.ends_with("AND tenant_id = ?"));
    }

    #[test]
    fn test_unscoped_adds_no_filter() {
        let scope = TenantScope::without_tenant_scope();
        let mut qb = QueryBuilder::<MySql>::new("SELECT id FROM patients WHERE deleted_at IS NULL");
        scope.apply(&mut qb);
        assert!(!qb.sql().contains("tenant_id"));
    }

    #[test]
    fn test_stamp_fills_unset_tenant_id() {
        let (scope, id) = scoped();
        assert_eq!(scope.stamp(None).unwrap(), id);
    }

    #[test]
    fn test_stamp_keeps_matching_tenant_id() {
        let (scope, id) = scoped();
        assert_eq!(scope.stamp(Some(id)).unwrap(), id);
    }

    #[test]
    fn test_stamp_refuses_to_overwrite_foreign_tenant_id() {
        let (scope, _) = scoped();
        let other = StringUuid::new_v4();
        assert!(matches!(
            scope.stamp(Some(other)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_unscoped_stamp_requires_explicit_tenant() {
        let scope = TenantScope::without_tenant_scope();
        assert!(matches!(scope.stamp(None), Err(AppError::BadRequest(_))));

        let explicit = StringUuid::new_v4();
        assert_eq!(scope.stamp(Some(explicit)).unwrap(), explicit);
    }
}
