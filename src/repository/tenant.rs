//! Tenant directory repository

use crate::domain::{StringUuid, Tenant, UpdateTenantInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

const TENANT_COLUMNS: &str = "id, name, slug, is_active, subscription_status, subscription_plan, \
     trial_ends_at, subscription_ends_at, locale, currency, deleted_at, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<()>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Tenant>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>>;
    async fn update(&self, id: StringUuid, input: &UpdateTenantInput) -> Result<Tenant>;
    /// Mark the tenant deleted; rows referencing it are kept.
    async fn soft_delete(&self, id: StringUuid) -> Result<()>;
}

pub struct TenantRepositoryImpl {
    pool: MySqlPool,
}

impl TenantRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for TenantRepositoryImpl {
    async fn create(&self, tenant: &Tenant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tenants
                (id, name, slug, is_active, subscription_status, subscription_plan,
                 trial_ends_at, subscription_ends_at, locale, currency, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(tenant.is_active)
        .bind(tenant.subscription_status)
        .bind(tenant.subscription_plan)
        .bind(tenant.trial_ends_at)
        .bind(tenant.subscription_ends_at)
        .bind(&tenant.locale)
        .bind(&tenant.currency)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenants WHERE slug = ? AND deleted_at IS NULL"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn update(&self, id: StringUuid, input: &UpdateTenantInput) -> Result<Tenant> {
        let mut qb =
            sqlx::QueryBuilder::<sqlx::MySql>::new("UPDATE tenants SET updated_at = NOW()");
        if let Some(name) = &input.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(is_active) = input.is_active {
            qb.push(", is_active = ").push_bind(is_active);
        }
        if let Some(status) = input.subscription_status {
            qb.push(", subscription_status = ").push_bind(status);
        }
        if let Some(plan) = input.subscription_plan {
            qb.push(", subscription_plan = ").push_bind(plan);
        }
        if let Some(trial_ends_at) = input.trial_ends_at {
            qb.push(", trial_ends_at = ").push_bind(trial_ends_at);
        }
        if let Some(subscription_ends_at) = input.subscription_ends_at {
            qb.push(", subscription_ends_at = ").push_bind(subscription_ends_at);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" AND deleted_at IS NULL");
        qb.build().execute(&self.pool).await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", id)))
    }

    async fn soft_delete(&self, id: StringUuid) -> Result<()> {
        sqlx::query(
            "UPDATE tenants SET deleted_at = NOW(), is_active = FALSE, updated_at = NOW() \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
