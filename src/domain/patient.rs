//! Patient domain model
//!
//! The exemplar tenant-owned resource: `tenant_id` is stamped once at
//! creation by the row-scoping enforcer and never mutated afterwards.

use super::common::StringUuid;
use crate::capability::Action;
use crate::tenancy::scope::TenantOwned;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Patient entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: StringUuid,
    pub tenant_id: StringUuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Patient {
    const TABLE: &'static str = "patients";
    const RESOURCE: &'static str = "Patient";

    fn actions() -> Vec<Action> {
        let mut actions = Action::defaults();
        actions.push(Action::Custom("restore"));
        actions
    }
}

impl Default for Patient {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            tenant_id: StringUuid::nil(),
            first_name: String::new(),
            last_name: String::new(),
            date_of_birth: None,
            email: None,
            phone: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for registering a patient.
///
/// `tenant_id` is intentionally not a field and unknown fields are
/// rejected: the owning tenant comes from the resolved context, never from
/// client input.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePatientInput {
    #[validate(length(min = 1, max = 255))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Input for updating a patient
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdatePatientInput {
    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}
