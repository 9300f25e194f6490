use anyhow::Result;
use clap::{Parser, Subcommand};
use clinica_core::cache::CacheManager;
use clinica_core::capability::{CapabilityRegistry, SyncOptions, SyncService};
use clinica_core::config::Config;
use clinica_core::domain::{Guard, Patient};
use clinica_core::repository::PermissionRepositoryImpl;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinica-core", about = "Clinica Core maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile declared capabilities into the permission catalog
    SyncPermissions {
        /// Guard whose catalog to reconcile
        #[arg(long, default_value = "web")]
        guard: Guard,
        /// Also delete catalog entries no declaration produces anymore
        #[arg(long)]
        prune: bool,
        /// Report decisions without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// List the permission catalog for a guard
    ListPermissions {
        #[arg(long, default_value = "web")]
        guard: Guard,
    },
}

/// Every tenant-owned entity type must be registered here; the catalog only
/// ever contains what this function declares.
fn build_registry() -> Result<CapabilityRegistry> {
    let mut registry = CapabilityRegistry::new();
    registry.register::<Patient>()?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinica_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    let cache = match CacheManager::new(&config.redis).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!("Redis unavailable, running without catalog cache: {e}");
            None
        }
    };

    let service = SyncService::new(Arc::new(PermissionRepositoryImpl::new(pool)), cache);

    match cli.command {
        Command::SyncPermissions {
            guard,
            prune,
            dry_run,
        } => {
            let registry = build_registry()?;
            let report = service
                .sync(
                    &registry,
                    SyncOptions {
                        guard,
                        prune,
                        dry_run,
                    },
                )
                .await?;

            info!(%guard, "permission catalog reconciled");
            println!("{report}");
        }
        Command::ListPermissions { guard } => {
            for permission in service.catalog(guard).await? {
                println!("{}\t{}", permission.name, permission.guard);
            }
        }
    }

    Ok(())
}
