//! Patient CRUD behind the authorization engine and the row scope
//!
//! Every method takes the acting principal and the resolved tenant context.
//! Class-level denials surface as `Forbidden`; instance-level denials and
//! cross-tenant ids surface as `NotFound`, so a caller cannot distinguish a
//! foreign row from a missing one.

use crate::authz::{AuthorizationEngine, ResourceRef};
use crate::domain::{CreatePatientInput, Patient, StringUuid, UpdatePatientInput, User};
use crate::error::{AppError, Result};
use crate::repository::PatientRepository;
use crate::tenancy::{TenantContext, TenantScope};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub struct PatientService<R: PatientRepository> {
    repo: Arc<R>,
    engine: AuthorizationEngine,
}

impl<R: PatientRepository> PatientService<R> {
    pub fn new(repo: Arc<R>, engine: AuthorizationEngine) -> Self {
        Self { repo, engine }
    }

    pub async fn create(
        &self,
        principal: &User,
        ctx: &TenantContext,
        input: CreatePatientInput,
    ) -> Result<Patient> {
        self.engine.authorize(principal, "create_patients", None)?;
        input.validate()?;

        let patient = self.repo.create(&input, &TenantScope::of(ctx)).await?;
        info!(patient = %patient.id, tenant = %patient.tenant_id, "patient created");
        Ok(patient)
    }

    pub async fn list(&self, principal: &User, ctx: &TenantContext) -> Result<Vec<Patient>> {
        self.engine.authorize(principal, "view_patients", None)?;
        self.repo.list(&TenantScope::of(ctx)).await
    }

    pub async fn get(
        &self,
        principal: &User,
        ctx: &TenantContext,
        id: StringUuid,
    ) -> Result<Patient> {
        self.engine.authorize(principal, "view_patients", None)?;

        let patient = self.fetch(ctx, id).await?;
        let resource = ResourceRef::from(&patient);
        if !self.engine.can(principal, "view_patients", Some(&resource)) {
            return Err(not_found(id));
        }
        Ok(patient)
    }

    pub async fn update(
        &self,
        principal: &User,
        ctx: &TenantContext,
        id: StringUuid,
        input: UpdatePatientInput,
    ) -> Result<Patient> {
        self.engine.authorize(principal, "update_patients", None)?;
        input.validate()?;

        let patient = self.fetch(ctx, id).await?;
        let resource = ResourceRef::from(&patient);
        if !self.engine.can(principal, "update_patients", Some(&resource)) {
            return Err(not_found(id));
        }

        let scope = TenantScope::of(ctx);
        let affected = self.repo.update(id, &input, &scope).await?;
        if affected == 0 {
            return Err(not_found(id));
        }
        self.fetch(ctx, id).await
    }

    pub async fn soft_delete(
        &self,
        principal: &User,
        ctx: &TenantContext,
        id: StringUuid,
    ) -> Result<()> {
        self.engine.authorize(principal, "delete_patients", None)?;

        // Instance-level policy check before the statement; the last line
        // of defense if row-scoping were ever bypassed upstream.
        let patient = self.fetch(ctx, id).await?;
        let resource = ResourceRef::from(&patient);
        if !self.engine.can(principal, "delete_patients", Some(&resource)) {
            return Err(not_found(id));
        }

        let affected = self.repo.soft_delete(id, &TenantScope::of(ctx)).await?;
        if affected == 0 {
            return Err(not_found(id));
        }
        info!(patient = %id, "patient soft-deleted");
        Ok(())
    }

    pub async fn restore(
        &self,
        principal: &User,
        ctx: &TenantContext,
        id: StringUuid,
    ) -> Result<()> {
        self.engine.authorize(principal, "restore_patients", None)?;

        let patient = self
            .repo
            .find_by_id_with_deleted(id, &TenantScope::of(ctx))
            .await?
            .ok_or_else(|| not_found(id))?;
        let resource = ResourceRef::from(&patient);
        if !self.engine.can(principal, "restore_patients", Some(&resource)) {
            return Err(not_found(id));
        }

        let affected = self.repo.restore(id, &TenantScope::of(ctx)).await?;
        if affected == 0 {
            return Err(not_found(id));
        }
        info!(patient = %id, "patient restored");
        Ok(())
    }

    async fn fetch(&self, ctx: &TenantContext, id: StringUuid) -> Result<Patient> {
        self.repo
            .find_by_id(id, &TenantScope::of(ctx))
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: StringUuid) -> AppError {
    AppError::NotFound(format!("Patient {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Tenant};
    use crate::repository::MockPatientRepository;
    use mockall::predicate::*;

    fn context() -> TenantContext {
        TenantContext::new(Tenant::default())
    }

    fn principal(ctx: &TenantContext, role: Role) -> User {
        User {
            tenant_id: Some(ctx.current_tenant_id()),
            role,
            ..Default::default()
        }
    }

    fn create_input() -> CreatePatientInput {
        CreatePatientInput {
            first_name: "Ana".to_string(),
            last_name: "Reyes".to_string(),
            date_of_birth: None,
            email: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_create_runs_under_the_request_scope() {
        let ctx = context();
        let tenant_id = ctx.current_tenant_id();
        let dentist = principal(&ctx, Role::Dentist);

        let mut mock = MockPatientRepository::new();
        mock.expect_create()
            .withf(move |_, scope| scope.tenant_id() == Some(tenant_id))
            .returning(move |input, scope| {
                Ok(Patient {
                    tenant_id: scope.stamp(None)?,
                    first_name: input.first_name.clone(),
                    last_name: input.last_name.clone(),
                    ..Default::default()
                })
            });

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let patient = service.create(&dentist, &ctx, create_input()).await.unwrap();
        assert_eq!(patient.tenant_id, tenant_id);
    }

    #[tokio::test]
    async fn test_create_denied_without_the_ability() {
        let ctx = context();
        let assistant = principal(&ctx, Role::Assistant);

        let mut mock = MockPatientRepository::new();
        mock.expect_create().never();

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let result = service.create(&assistant, &ctx, create_input()).await;
        assert!(
            matches!(result, Err(AppError::Forbidden(code)) if code == "forbidden:create_patients")
        );
    }

    #[tokio::test]
    async fn test_get_hides_foreign_rows_as_not_found() {
        let ctx = context();
        let dentist = principal(&ctx, Role::Dentist);
        // A row owned by another tenant that somehow slipped past the scope.
        let foreign = Patient {
            tenant_id: StringUuid::new_v4(),
            ..Default::default()
        };
        let id = foreign.id;

        let mut mock = MockPatientRepository::new();
        mock.expect_find_by_id()
            .returning(move |_, _| Ok(Some(foreign.clone())));

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let result = service.get(&dentist, &ctx, id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_missing_row_is_not_found() {
        let ctx = context();
        let dentist = principal(&ctx, Role::Dentist);

        let mut mock = MockPatientRepository::new();
        mock.expect_find_by_id().returning(|_, _| Ok(None));

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let result = service.get(&dentist, &ctx, StringUuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_returns_the_fresh_row() {
        let ctx = context();
        let dentist = principal(&ctx, Role::Dentist);
        let patient = Patient {
            tenant_id: ctx.current_tenant_id(),
            first_name: "Ana".to_string(),
            last_name: "Reyes".to_string(),
            ..Default::default()
        };
        let id = patient.id;

        let mut mock = MockPatientRepository::new();
        mock.expect_find_by_id()
            .returning(move |_, _| Ok(Some(patient.clone())));
        mock.expect_update()
            .with(eq(id), always(), always())
            .returning(|_, _, _| Ok(1));

        let input = UpdatePatientInput {
            first_name: Some("Anna".to_string()),
            last_name: None,
            date_of_birth: None,
            email: None,
            phone: None,
        };

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let updated = service.update(&dentist, &ctx, id, input).await.unwrap();
        assert_eq!(updated.id, id);
    }

    #[tokio::test]
    async fn test_soft_delete_requires_the_delete_ability() {
        let ctx = context();
        let dentist = principal(&ctx, Role::Dentist);

        let mut mock = MockPatientRepository::new();
        mock.expect_soft_delete().never();

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let result = service.soft_delete(&dentist, &ctx, StringUuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_soft_delete_zero_rows_is_not_found() {
        let ctx = context();
        let admin = principal(&ctx, Role::Admin);
        let patient = Patient {
            tenant_id: ctx.current_tenant_id(),
            ..Default::default()
        };
        let id = patient.id;

        let mut mock = MockPatientRepository::new();
        mock.expect_find_by_id()
            .returning(move |_, _| Ok(Some(patient.clone())));
        mock.expect_soft_delete().returning(|_, _| Ok(0));

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let result = service.soft_delete(&admin, &ctx, id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_soft_delete_checks_ownership_even_when_scoping_failed() {
        let ctx = context();
        let mut dentist = principal(&ctx, Role::Dentist);
        dentist.permissions.push("delete_patients".to_string());
        // A foreign row leaking through a broken scope must still be
        // stopped by the instance check, before any statement runs.
        let foreign = Patient {
            tenant_id: StringUuid::new_v4(),
            ..Default::default()
        };
        let id = foreign.id;

        let mut mock = MockPatientRepository::new();
        mock.expect_find_by_id()
            .returning(move |_, _| Ok(Some(foreign.clone())));
        mock.expect_soft_delete().never();

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let result = service.soft_delete(&dentist, &ctx, id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_restore_brings_back_a_soft_deleted_row() {
        let ctx = context();
        let admin = principal(&ctx, Role::Admin);
        let patient = Patient {
            tenant_id: ctx.current_tenant_id(),
            deleted_at: Some(chrono::Utc::now()),
            ..Default::default()
        };
        let id = patient.id;

        let mut mock = MockPatientRepository::new();
        mock.expect_find_by_id_with_deleted()
            .with(eq(id), always())
            .returning(move |_, _| Ok(Some(patient.clone())));
        mock.expect_restore()
            .with(eq(id), always())
            .returning(|_, _| Ok(1));

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        service.restore(&admin, &ctx, id).await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_checks_ownership_even_when_scoping_failed() {
        let ctx = context();
        let mut dentist = principal(&ctx, Role::Dentist);
        dentist.permissions.push("restore_patients".to_string());
        let foreign = Patient {
            tenant_id: StringUuid::new_v4(),
            deleted_at: Some(chrono::Utc::now()),
            ..Default::default()
        };
        let id = foreign.id;

        let mut mock = MockPatientRepository::new();
        mock.expect_find_by_id_with_deleted()
            .returning(move |_, _| Ok(Some(foreign.clone())));
        mock.expect_restore().never();

        let service = PatientService::new(Arc::new(mock), AuthorizationEngine::new());
        let result = service.restore(&dentist, &ctx, id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
