//! Tenant isolation: context, resolution and row-scoping

pub mod context;
pub mod resolver;
pub mod scope;

pub use context::TenantContext;
pub use resolver::{ResolveRequest, TenantResolver, TENANT_ID_HEADER};
pub use scope::{TenantOwned, TenantScope};
