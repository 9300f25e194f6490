//! Tenant provisioning and lifecycle

use crate::domain::{CreateTenantInput, StringUuid, Tenant, UpdateTenantInput};
use crate::error::{AppError, Result};
use crate::repository::TenantRepository;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

const TRIAL_DAYS: i64 = 14;

pub struct TenantService<R: TenantRepository> {
    repo: Arc<R>,
}

impl<R: TenantRepository> TenantService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Provision a new clinic. New tenants start a trial.
    pub async fn provision(&self, input: CreateTenantInput) -> Result<Tenant> {
        input.validate()?;

        if self.repo.find_by_slug(&input.slug).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "slug '{}' is already taken",
                input.slug
            )));
        }

        let tenant = Tenant {
            name: input.name,
            slug: input.slug,
            subscription_plan: input.subscription_plan.unwrap_or_default(),
            trial_ends_at: Some(Utc::now() + Duration::days(TRIAL_DAYS)),
            locale: input.locale.unwrap_or_else(|| "en".to_string()),
            currency: input.currency.unwrap_or_else(|| "USD".to_string()),
            ..Default::default()
        };
        self.repo.create(&tenant).await?;

        info!(tenant = %tenant.id, slug = %tenant.slug, "tenant provisioned");
        Ok(tenant)
    }

    pub async fn get(&self, id: StringUuid) -> Result<Tenant> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::TenantNotFound(format!("tenant {} not found", id)))
    }

    /// Fetch a tenant that must be reachable by request traffic.
    pub async fn find_accessible(&self, id: StringUuid) -> Result<Tenant> {
        let tenant = self.get(id).await?;
        if !tenant.is_accessible() {
            return Err(AppError::TenantInactive(format!(
                "tenant {} is not accessible",
                tenant.slug
            )));
        }
        Ok(tenant)
    }

    pub async fn update(&self, id: StringUuid, input: UpdateTenantInput) -> Result<Tenant> {
        input.validate()?;
        let _ = self.get(id).await?;
        self.repo.update(id, &input).await
    }

    /// Soft delete; owned rows keep referencing the tenant.
    pub async fn soft_delete(&self, id: StringUuid) -> Result<()> {
        let tenant = self.get(id).await?;
        self.repo.soft_delete(tenant.id).await?;
        info!(tenant = %tenant.id, "tenant soft-deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubscriptionPlan;
    use crate::repository::MockTenantRepository;
    use mockall::predicate::*;

    fn create_input(slug: &str) -> CreateTenantInput {
        CreateTenantInput {
            name: "Bright Smiles Dental".to_string(),
            slug: slug.to_string(),
            subscription_plan: Some(SubscriptionPlan::Practice),
            locale: None,
            currency: None,
        }
    }

    #[tokio::test]
    async fn test_provision_starts_trial() {
        let mut mock = MockTenantRepository::new();
        mock.expect_find_by_slug()
            .withf(|slug| slug == "bright-smiles")
            .returning(|_| Ok(None));
        mock.expect_create()
            .withf(|tenant| {
                tenant.trial_ends_at.is_some()
                    && tenant.subscription_plan == SubscriptionPlan::Practice
                    && tenant.is_accessible()
            })
            .returning(|_| Ok(()));

        let service = TenantService::new(Arc::new(mock));
        let tenant = service.provision(create_input("bright-smiles")).await.unwrap();
        assert_eq!(tenant.currency, "USD");
    }

    #[tokio::test]
    async fn test_provision_rejects_taken_slug() {
        let mut mock = MockTenantRepository::new();
        mock.expect_find_by_slug()
            .returning(|_| Ok(Some(Tenant::default())));
        mock.expect_create().never();

        let service = TenantService::new(Arc::new(mock));
        let result = service.provision(create_input("bright-smiles")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_provision_rejects_invalid_slug() {
        let mock = MockTenantRepository::new();
        let service = TenantService::new(Arc::new(mock));

        let result = service.provision(create_input("Bright Smiles")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_find_accessible_rejects_inactive() {
        let tenant = Tenant {
            is_active: false,
            ..Default::default()
        };
        let id = tenant.id;

        let mut mock = MockTenantRepository::new();
        mock.expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(tenant.clone())));

        let service = TenantService::new(Arc::new(mock));
        let result = service.find_accessible(id).await;
        assert!(matches!(result, Err(AppError::TenantInactive(_))));
    }

    #[tokio::test]
    async fn test_get_missing_tenant() {
        let mut mock = MockTenantRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));

        let service = TenantService::new(Arc::new(mock));
        let result = service.get(StringUuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::TenantNotFound(_))));
    }
}
