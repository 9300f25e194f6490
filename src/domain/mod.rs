//! Domain models for Clinica Core

pub mod common;
pub mod patient;
pub mod permission;
pub mod tenant;
pub mod user;

pub use common::StringUuid;
pub use patient::{CreatePatientInput, Patient, UpdatePatientInput};
pub use permission::{is_valid_permission_name, Guard, Permission};
pub use tenant::{
    CreateTenantInput, SubscriptionPlan, SubscriptionStatus, Tenant, UpdateTenantInput,
};
pub use user::{CreateUserInput, Role, UpdateUserInput, User};
