//! Catalog synchronization
//!
//! Reconciles the declared permission set into the catalog: idempotent
//! create-if-absent, optional prune of orphans, dry-run reporting. Runs at
//! deploy/maintenance time, never on a request path.

use super::CapabilityRegistry;
use crate::cache::CacheManager;
use crate::domain::{Guard, Permission};
use crate::error::Result;
use crate::repository::PermissionRepository;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub guard: Guard,
    /// Delete catalog entries no declaration produces anymore.
    pub prune: bool,
    /// Compute and report decisions without touching the catalog.
    pub dry_run: bool,
}

/// Reconciliation outcome. In dry-run mode these are the decisions that
/// would have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
    pub removed: Vec<String>,
    pub dry_run: bool,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} existing, {} removed{}",
            self.created.len(),
            self.existing.len(),
            self.removed.len(),
            if self.dry_run { " (dry-run)" } else { "" }
        )
    }
}

/// Pure reconciliation: declared set vs. current catalog names.
fn plan(declared: &[String], catalog: &[String], prune: bool) -> SyncReport {
    let declared: BTreeSet<&String> = declared.iter().collect();
    let catalog: BTreeSet<&String> = catalog.iter().collect();

    let created = declared
        .difference(&catalog)
        .map(|n| n.to_string())
        .collect();
    let existing = declared
        .intersection(&catalog)
        .map(|n| n.to_string())
        .collect();
    let removed = if prune {
        catalog
            .difference(&declared)
            .map(|n| n.to_string())
            .collect()
    } else {
        Vec::new()
    };

    SyncReport {
        created,
        existing,
        removed,
        dry_run: false,
    }
}

pub struct SyncService<P: PermissionRepository> {
    repo: Arc<P>,
    cache: Option<CacheManager>,
}

impl<P: PermissionRepository> SyncService<P> {
    pub fn new(repo: Arc<P>, cache: Option<CacheManager>) -> Self {
        Self { repo, cache }
    }

    /// Reconcile the registry's declarations into the catalog.
    ///
    /// Creation is insert-if-absent keyed on `(name, guard)`, so concurrent
    /// runs from several processes converge without locking. Writes happen
    /// in one transaction; the catalog cache is invalidated only after it
    /// commits.
    pub async fn sync(
        &self,
        registry: &CapabilityRegistry,
        options: SyncOptions,
    ) -> Result<SyncReport> {
        let declared = registry.permission_names();
        let catalog = self.repo.list_names(options.guard).await?;

        let mut report = plan(&declared, &catalog, options.prune);
        report.dry_run = options.dry_run;

        if options.dry_run {
            info!(guard = %options.guard, %report, "permission sync (dry-run)");
            return Ok(report);
        }

        if !report.created.is_empty() || !report.removed.is_empty() {
            self.repo
                .apply_sync(options.guard, &report.created, &report.removed)
                .await?;
        }

        if let Some(cache) = &self.cache {
            // A failed invalidation leaves the catalog stale for a full
            // TTL; the operator needs to see that.
            if let Err(e) = cache.invalidate_permission_catalog(options.guard).await {
                warn!(guard = %options.guard, "failed to invalidate catalog cache: {e}");
            }
        }

        info!(guard = %options.guard, %report, "permission sync applied");
        Ok(report)
    }

    /// Catalog listing for operator tooling, served from cache when warm.
    pub async fn catalog(&self, guard: Guard) -> Result<Vec<Permission>> {
        if let Some(cache) = &self.cache {
            if let Ok(Some(catalog)) = cache.get_permission_catalog(guard).await {
                return Ok(catalog);
            }
        }

        let catalog = self.repo.list(guard).await?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set_permission_catalog(guard, &catalog).await {
                warn!(guard = %guard, "failed to cache permission catalog: {e}");
            }
        }
        Ok(catalog)
    }
}
