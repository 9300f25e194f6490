//! Clinica Core - Multi-Tenant Clinic Backend
//!
//! This crate provides the tenant isolation and authorization engine for
//! the Clinica platform: request-time tenant resolution, row-level scoping
//! of tenant-owned data, capability discovery and catalog sync, and an
//! ordered-rule authorization engine.

pub mod authz;
pub mod cache;
pub mod capability;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;
pub mod tenancy;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
