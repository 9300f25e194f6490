//! Patient repository
//!
//! The data-access side of the row-scoping enforcer: every statement is
//! shaped by the [`TenantScope`] passed in, and creation stamps the owning
//! tenant through it. There is no method on this trait that runs without a
//! scope.

use crate::domain::{CreatePatientInput, Patient, StringUuid, UpdatePatientInput};
use crate::error::Result;
use crate::tenancy::TenantScope;
use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};

const PATIENT_COLUMNS: &str = "id, tenant_id, first_name, last_name, date_of_birth, email, \
     phone, deleted_at, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn create(&self, input: &CreatePatientInput, scope: &TenantScope) -> Result<Patient>;
    async fn find_by_id(&self, id: StringUuid, scope: &TenantScope) -> Result<Option<Patient>>;
    /// Like `find_by_id` but includes soft-deleted rows; the restore path
    /// must see the row it is about to bring back.
    async fn find_by_id_with_deleted(
        &self,
        id: StringUuid,
        scope: &TenantScope,
    ) -> Result<Option<Patient>>;
    async fn list(&self, scope: &TenantScope) -> Result<Vec<Patient>>;
    /// Returns the rows affected; a cross-tenant id silently matches zero.
    async fn update(
        &self,
        id: StringUuid,
        input: &UpdatePatientInput,
        scope: &TenantScope,
    ) -> Result<u64>;
    async fn soft_delete(&self, id: StringUuid, scope: &TenantScope) -> Result<u64>;
    async fn restore(&self, id: StringUuid, scope: &TenantScope) -> Result<u64>;
}

pub struct PatientRepositoryImpl {
    pool: MySqlPool,
}

impl PatientRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientRepository for PatientRepositoryImpl {
    async fn create(&self, input: &CreatePatientInput, scope: &TenantScope) -> Result<Patient> {
        // Write interception: the owning tenant comes from the scope, never
        // from the input.
        let tenant_id = scope.stamp(None)?;
        let patient = Patient {
            id: StringUuid::new_v4(),
            tenant_id,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            date_of_birth: input.date_of_birth,
            email: input.email.clone(),
            phone: input.phone.clone(),
            ..Default::default()
        };

        sqlx::query(
            r#"
            INSERT INTO patients
                (id, tenant_id, first_name, last_name, date_of_birth, email, phone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(patient.id)
        .bind(patient.tenant_id)
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(patient.date_of_birth)
        .bind(&patient.email)
        .bind(&patient.phone)
        .execute(&self.pool)
        .await?;

        Ok(patient)
    }

    async fn find_by_id(&self, id: StringUuid, scope: &TenantScope) -> Result<Option<Patient>> {
        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE deleted_at IS NULL AND id = "
        ));
        qb.push_bind(id);
        scope.apply(&mut qb);

        let patient = qb
            .build_query_as::<Patient>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(patient)
    }

    async fn find_by_id_with_deleted(
        &self,
        id: StringUuid,
        scope: &TenantScope,
    ) -> Result<Option<Patient>> {
        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = "
        ));
        qb.push_bind(id);
        scope.apply(&mut qb);

        let patient = qb
            .build_query_as::<Patient>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(patient)
    }

    async fn list(&self, scope: &TenantScope) -> Result<Vec<Patient>> {
        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE deleted_at IS NULL"
        ));
        scope.apply(&mut qb);
        qb.push(" ORDER BY last_name, first_name");

        let patients = qb.build_query_as::<Patient>().fetch_all(&self.pool).await?;

        Ok(patients)
    }

    async fn update(
        &self,
        id: StringUuid,
        input: &UpdatePatientInput,
        scope: &TenantScope,
    ) -> Result<u64> {
        let mut qb = QueryBuilder::<MySql>::new("UPDATE patients SET updated_at = NOW()");
        if let Some(first_name) = &input.first_name {
            qb.push(", first_name = ").push_bind(first_name);
        }
        if let Some(last_name) = &input.last_name {
            qb.push(", last_name = ").push_bind(last_name);
        }
        if let Some(date_of_birth) = input.date_of_birth {
            qb.push(", date_of_birth = ").push_bind(date_of_birth);
        }
        if let Some(email) = &input.email {
            qb.push(", email = ").push_bind(email);
        }
        if let Some(phone) = &input.phone {
            qb.push(", phone = ").push_bind(phone);
        }
        qb.push(" WHERE deleted_at IS NULL AND id = ").push_bind(id);
        scope.apply(&mut qb);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn soft_delete(&self, id: StringUuid, scope: &TenantScope) -> Result<u64> {
        let mut qb = QueryBuilder::<MySql>::new(
            "UPDATE patients SET deleted_at = NOW(), updated_at = NOW() \
             WHERE deleted_at IS NULL AND id = ",
        );
        qb.push_bind(id);
        scope.apply(&mut qb);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn restore(&self, id: StringUuid, scope: &TenantScope) -> Result<u64> {
        let mut qb = QueryBuilder::<MySql>::new(
            "UPDATE patients SET deleted_at = NULL, updated_at = NOW() \
             WHERE deleted_at IS NOT NULL AND id = ",
        );
        qb.push_bind(id);
        scope.apply(&mut qb);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
