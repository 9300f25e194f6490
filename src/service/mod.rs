//! Business services

pub mod patient;
pub mod tenant;
pub mod user;

pub use patient::PatientService;
pub use tenant::TenantService;
pub use user::UserService;
