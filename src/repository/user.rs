//! User repository

use crate::domain::{StringUuid, UpdateUserInput, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::MySqlPool;

const USER_COLUMNS: &str =
    "id, tenant_id, email, name, role, is_active, permissions, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Updates name/role only; there is deliberately no way to change
    /// `tenant_id` after creation.
    async fn update(&self, id: StringUuid, input: &UpdateUserInput) -> Result<User>;
    async fn set_active(&self, id: StringUuid, is_active: bool) -> Result<()>;
    async fn set_permissions(&self, id: StringUuid, permissions: &[String]) -> Result<()>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, name, role, is_active, permissions, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(user.id)
        .bind(user.tenant_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(Json(&user.permissions))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, id: StringUuid, input: &UpdateUserInput) -> Result<User> {
        let mut qb = sqlx::QueryBuilder::<sqlx::MySql>::new("UPDATE users SET updated_at = NOW()");
        if let Some(name) = &input.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(role) = input.role {
            qb.push(", role = ").push_bind(role);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.build().execute(&self.pool).await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn set_active(&self, id: StringUuid, is_active: bool) -> Result<()> {
        sqlx::query("UPDATE users SET is_active = ?, updated_at = NOW() WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_permissions(&self, id: StringUuid, permissions: &[String]) -> Result<()> {
        sqlx::query("UPDATE users SET permissions = ?, updated_at = NOW() WHERE id = ?")
            .bind(Json(permissions))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
