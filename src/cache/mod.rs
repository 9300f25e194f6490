//! Redis cache layer

use crate::config::RedisConfig;
use crate::domain::{Guard, Permission};
use crate::error::{AppError, Result};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Cache key prefixes
mod keys {
    pub const PERMISSION_CATALOG: &str = "clinica:permission_catalog";
    pub const USER_PERMISSIONS: &str = "clinica:user_permissions";
}

/// Default TTLs
mod ttl {
    pub const PERMISSION_CATALOG_SECS: u64 = 600; // 10 minutes
    pub const USER_PERMISSIONS_SECS: u64 = 300; // 5 minutes
}

/// Cache manager for Redis operations
#[derive(Clone)]
pub struct CacheManager {
    conn: ConnectionManager,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { conn })
    }

    /// Get a value from cache
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(v) => {
                let parsed = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Cache deserialize error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a value in cache with TTL
    async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache serialize error: {}", e)))?;

        let _: () = conn.set_ex(key, serialized, ttl.as_secs()).await?;
        Ok(())
    }

    /// Delete a key from cache
    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    // ==================== Permission Catalog Cache ====================

    /// Get the cached permission catalog for a guard
    pub async fn get_permission_catalog(&self, guard: Guard) -> Result<Option<Vec<Permission>>> {
        let key = format!("{}:{}", keys::PERMISSION_CATALOG, guard);
        self.get(&key).await
    }

    /// Cache the permission catalog for a guard
    pub async fn set_permission_catalog(
        &self,
        guard: Guard,
        catalog: &[Permission],
    ) -> Result<()> {
        let key = format!("{}:{}", keys::PERMISSION_CATALOG, guard);
        self.set(
            &key,
            &catalog,
            Duration::from_secs(ttl::PERMISSION_CATALOG_SECS),
        )
        .await
    }

    /// Invalidate the cached catalog; called only after a sync transaction
    /// has committed.
    pub async fn invalidate_permission_catalog(&self, guard: Guard) -> Result<()> {
        let key = format!("{}:{}", keys::PERMISSION_CATALOG, guard);
        self.delete(&key).await
    }

    // ==================== User Permissions Cache ====================

    /// Get a user's cached effective permission set
    pub async fn get_user_permissions(&self, user_id: Uuid) -> Result<Option<Vec<String>>> {
        let key = format!("{}:{}", keys::USER_PERMISSIONS, user_id);
        self.get(&key).await
    }

    /// Cache a user's effective permission set
    pub async fn set_user_permissions(&self, user_id: Uuid, permissions: &[String]) -> Result<()> {
        let key = format!("{}:{}", keys::USER_PERMISSIONS, user_id);
        self.set(
            &key,
            &permissions,
            Duration::from_secs(ttl::USER_PERMISSIONS_SECS),
        )
        .await
    }

    /// Invalidate a user's cached permissions after a grant change
    pub async fn invalidate_user_permissions(&self, user_id: Uuid) -> Result<()> {
        let key = format!("{}:{}", keys::USER_PERMISSIONS, user_id);
        self.delete(&key).await
    }
}
