//! Tenant resolution
//!
//! Turns an inbound request into exactly one [`TenantContext`], or fails.
//! Strategies run in strict precedence order; the first that yields a
//! tenant wins and nothing downstream re-resolves.

use crate::domain::{StringUuid, Tenant, User};
use crate::error::{AppError, Result};
use crate::repository::TenantRepository;
use crate::tenancy::context::TenantContext;
use axum::http::HeaderMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-request tenant override header (`X-Tenant-ID`), highest precedence.
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// The request surface the resolver consumes.
pub struct ResolveRequest<'a> {
    pub headers: &'a HeaderMap,
    /// Host the request was addressed to, with or without a port.
    pub host: &'a str,
}

pub struct TenantResolver<R: TenantRepository> {
    repo: Arc<R>,
    app_domain: String,
}

impl<R: TenantRepository> TenantResolver<R> {
    pub fn new(repo: Arc<R>, app_domain: impl Into<String>) -> Self {
        Self {
            repo,
            app_domain: app_domain.into().to_lowercase(),
        }
    }

    /// Resolve the tenant for one request.
    ///
    /// Precedence: explicit header, then subdomain, then the authenticated
    /// principal's bound tenant. A malformed header falls through silently;
    /// a well-formed header naming an unknown tenant fails immediately.
    pub async fn resolve(
        &self,
        request: &ResolveRequest<'_>,
        principal: Option<&User>,
    ) -> Result<TenantContext> {
        if let Some(tenant) = self.resolve_from_header(request.headers, principal).await? {
            return self.finish(tenant);
        }

        if let Some(tenant) = self.resolve_from_subdomain(request.host).await? {
            return self.finish(tenant);
        }

        if let Some(tenant) = self.resolve_from_principal(principal).await? {
            return self.finish(tenant);
        }

        Err(AppError::TenantNotFound(
            "no tenant resolvable for request".to_string(),
        ))
    }

    async fn resolve_from_header(
        &self,
        headers: &HeaderMap,
        principal: Option<&User>,
    ) -> Result<Option<Tenant>> {
        let Some(raw) = headers.get(TENANT_ID_HEADER).and_then(|v| v.to_str().ok()) else {
            return Ok(None);
        };

        let tenant_id = match StringUuid::parse_str(raw.trim()) {
            Ok(id) => id,
            Err(_) => {
                // Malformed ids skip this strategy rather than failing the
                // request; the next strategy still gets its chance.
                debug!(header = raw, "malformed tenant header, falling through");
                return Ok(None);
            }
        };

        let tenant = self
            .repo
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::TenantNotFound(format!("tenant {tenant_id} not found")))?;

        // Header resolution is trusted independently of the principal's
        // own binding (service-to-service callers). Keep the divergence
        // observable.
        if let Some(bound) = principal.and_then(|p| p.tenant_id) {
            if bound != tenant.id {
                warn!(
                    header_tenant = %tenant.id,
                    principal_tenant = %bound,
                    "tenant header overrides principal's bound tenant"
                );
            }
        }

        Ok(Some(tenant))
    }

    async fn resolve_from_subdomain(&self, host: &str) -> Result<Option<Tenant>> {
        let Some(slug) = extract_subdomain(host, &self.app_domain) else {
            return Ok(None);
        };
        // Unlike the header path, an unknown subdomain falls through.
        self.repo.find_by_slug(&slug).await
    }

    async fn resolve_from_principal(&self, principal: Option<&User>) -> Result<Option<Tenant>> {
        let Some(tenant_id) = principal.and_then(|p| p.tenant_id) else {
            return Ok(None);
        };
        self.repo.find_by_id(tenant_id).await
    }

    fn finish(&self, tenant: Tenant) -> Result<TenantContext> {
        if !tenant.is_accessible() {
            return Err(AppError::TenantInactive(format!(
                "tenant {} is not accessible",
                tenant.slug
            )));
        }
        Ok(TenantContext::new(tenant))
    }
}

/// Extract the tenant slug from a request host.
///
/// Returns `None` for the bare application domain, `localhost`, raw IP
/// addresses and hosts outside the application domain.
fn extract_subdomain(host: &str, app_domain: &str) -> Option<String> {
    let host = strip_port(host).to_lowercase();

    if host.is_empty() || host == app_domain || host == "localhost" {
        return None;
    }
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let prefix = host.strip_suffix(app_domain)?.strip_suffix('.')?;
    if prefix.is_empty() {
        return None;
    }
    Some(prefix.to_string())
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 hosts keep their colons
    if let Some(end) = host.strip_prefix('[').and_then(|h| h.find(']')) {
        return &host[1..=end];
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
