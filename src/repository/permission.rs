//! Permission catalog repository

use crate::domain::{Guard, Permission, StringUuid};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn list(&self, guard: Guard) -> Result<Vec<Permission>>;
    async fn list_names(&self, guard: Guard) -> Result<Vec<String>>;
    /// Apply one sync decision set atomically.
    ///
    /// Creation is insert-if-absent on the `(name, guard)` unique key, so a
    /// concurrent sync inserting the same name is a benign race, not an
    /// error.
    async fn apply_sync(&self, guard: Guard, create: &[String], remove: &[String]) -> Result<()>;
}

pub struct PermissionRepositoryImpl {
    pool: MySqlPool,
}

impl PermissionRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PermissionRepositoryImpl {
    async fn list(&self, guard: Guard) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, guard, created_at, updated_at FROM permissions \
             WHERE guard = ? ORDER BY name",
        )
        .bind(guard)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    async fn list_names(&self, guard: Guard) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM permissions WHERE guard = ? ORDER BY name",
        )
        .bind(guard)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn apply_sync(&self, guard: Guard, create: &[String], remove: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for name in create {
            sqlx::query(
                "INSERT INTO permissions (id, name, guard, created_at, updated_at) \
                 VALUES (?, ?, ?, NOW(), NOW()) \
                 ON DUPLICATE KEY UPDATE updated_at = updated_at",
            )
            .bind(StringUuid::new_v4())
            .bind(name)
            .bind(guard)
            .execute(&mut *tx)
            .await?;
        }

        for name in remove {
            sqlx::query("DELETE FROM permissions WHERE name = ? AND guard = ?")
                .bind(name)
                .bind(guard)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
