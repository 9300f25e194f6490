//! Data access layer

pub mod patient;
pub mod permission;
pub mod tenant;
pub mod user;

pub use patient::{PatientRepository, PatientRepositoryImpl};
pub use permission::{PermissionRepository, PermissionRepositoryImpl};
pub use tenant::{TenantRepository, TenantRepositoryImpl};
pub use user::{UserRepository, UserRepositoryImpl};

#[cfg(test)]
pub use patient::MockPatientRepository;
#[cfg(test)]
pub use permission::MockPermissionRepository;
#[cfg(test)]
pub use tenant::MockTenantRepository;
#[cfg(test)]
pub use user::MockUserRepository;
