//! Capability discovery
//!
//! Tenant-owned entity types declare their permission surface through
//! [`TenantOwned`](crate::tenancy::TenantOwned); an explicit
//! [`CapabilityRegistry`] collects those declarations at startup. No
//! filesystem walking or reflection: what is registered is what exists.

pub mod sync;

use crate::domain::is_valid_permission_name;
use crate::error::{AppError, Result};
use crate::tenancy::scope::TenantOwned;
use std::collections::BTreeSet;

pub use sync::{SyncOptions, SyncReport, SyncService};

/// A checkable action on a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    /// Non-standard action, e.g. `restore` or `force_delete`.
    Custom(&'static str),
}

impl Action {
    /// The default action set for a tenant-owned resource.
    pub fn defaults() -> Vec<Action> {
        vec![Action::View, Action::Create, Action::Update, Action::Delete]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resource type's declared permission surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDeclaration {
    pub resource: &'static str,
    pub prefix: String,
    pub actions: Vec<Action>,
}

impl CapabilityDeclaration {
    pub fn of<E: TenantOwned>() -> Self {
        Self {
            resource: E::RESOURCE,
            prefix: E::permission_prefix(),
            actions: E::actions(),
        }
    }

    /// Cross product `{action}_{prefix}`.
    pub fn permission_names(&self) -> Vec<String> {
        self.actions
            .iter()
            .map(|action| format!("{}_{}", action, self.prefix))
            .collect()
    }
}

/// Startup-time registry of capability declarations.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    declarations: Vec<CapabilityDeclaration>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant-owned entity type.
    ///
    /// Rejects duplicate registrations and declarations whose permission
    /// names violate the naming convention; both are startup-fatal.
    pub fn register<E: TenantOwned>(&mut self) -> Result<()> {
        self.register_declaration(CapabilityDeclaration::of::<E>())
    }

    pub fn register_declaration(&mut self, declaration: CapabilityDeclaration) -> Result<()> {
        if self
            .declarations
            .iter()
            .any(|d| d.resource == declaration.resource)
        {
            return Err(AppError::Configuration(format!(
                "resource {} registered twice",
                declaration.resource
            )));
        }
        for name in declaration.permission_names() {
            if !is_valid_permission_name(&name) {
                return Err(AppError::Configuration(format!(
                    "declared permission '{}' violates the {{action}}_{{resource}} convention",
                    name
                )));
            }
        }
        self.declarations.push(declaration);
        Ok(())
    }

    /// All declarations, sorted by resource name so repeated runs over the
    /// same registrations produce identical output regardless of
    /// registration order.
    pub fn discover(&self) -> Vec<&CapabilityDeclaration> {
        let mut declarations: Vec<_> = self.declarations.iter().collect();
        declarations.sort_by_key(|d| d.resource);
        declarations
    }

    /// The full declared permission name set, sorted and deduplicated.
    pub fn permission_names(&self) -> Vec<String> {
        self.discover()
            .iter()
            .flat_map(|d| d.permission_names())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Convert a PascalCase type name to snake_case.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Naive English pluralization, good enough for resource names.
pub fn pluralize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('y') {
        if !stem.is_empty() && !stem.ends_with(|c: char| "aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    if name.ends_with('s')
        || name.ends_with('x')
        || name.ends_with('z')
        || name.ends_with("ch")
        || name.ends_with("sh")
    {
        return format!("{name}es");
    }
    format!("{name}s")
}
