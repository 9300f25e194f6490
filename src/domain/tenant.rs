//! Tenant domain model
//!
//! A tenant is one clinic: the unit of data partitioning. Every
//! tenant-owned row carries its id, and a tenant is only reachable by
//! request traffic while `is_accessible()` holds.

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Subscription lifecycle state.
///
/// `Trialing`, `Active` and `PastDue` keep the tenant reachable; `PastDue`
/// is the grace period while billing retries. `Cancelled` and `Expired`
/// cut access without touching the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Trialing,
    Active,
    PastDue,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    /// Whether this status still allows the tenant to transact.
    pub fn allows_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Trialing | SubscriptionStatus::Active | SubscriptionStatus::PastDue
        )
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            _ => Err(format!("Unknown subscription status: {}", s)),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}

impl sqlx::Type<sqlx::MySql> for SubscriptionStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for SubscriptionStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for SubscriptionStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Subscription plan; bounds how large a clinic may grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    #[default]
    Starter,
    Practice,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn max_seats(&self) -> u32 {
        match self {
            SubscriptionPlan::Starter => 5,
            SubscriptionPlan::Practice => 25,
            SubscriptionPlan::Enterprise => 250,
        }
    }

    pub fn max_locations(&self) -> u32 {
        match self {
            SubscriptionPlan::Starter => 1,
            SubscriptionPlan::Practice => 3,
            SubscriptionPlan::Enterprise => 50,
        }
    }
}

impl std::str::FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "starter" => Ok(SubscriptionPlan::Starter),
            "practice" => Ok(SubscriptionPlan::Practice),
            "enterprise" => Ok(SubscriptionPlan::Enterprise),
            _ => Err(format!("Unknown subscription plan: {}", s)),
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubscriptionPlan::Starter => "starter",
            SubscriptionPlan::Practice => "practice",
            SubscriptionPlan::Enterprise => "enterprise",
        };
        write!(f, "{}", s)
    }
}

impl sqlx::Type<sqlx::MySql> for SubscriptionPlan {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for SubscriptionPlan {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for SubscriptionPlan {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Tenant entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: StringUuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: SubscriptionPlan,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub locale: String,
    pub currency: String,
    /// Soft-delete marker; tenants are never hard-removed while owned data
    /// exists.
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Whether request traffic may reach this tenant at all.
    ///
    /// `is_active` AND a live subscription status AND not soft-deleted.
    pub fn is_accessible(&self) -> bool {
        self.is_active && self.subscription_status.allows_access() && self.deleted_at.is_none()
    }
}

impl Default for Tenant {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            slug: String::new(),
            is_active: true,
            subscription_status: SubscriptionStatus::default(),
            subscription_plan: SubscriptionPlan::default(),
            trial_ends_at: None,
            subscription_ends_at: None,
            locale: "en".to_string(),
            currency: "USD".to_string(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for provisioning a new tenant
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTenantInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 63), custom(function = "validate_slug"))]
    pub slug: String,
    pub subscription_plan: Option<SubscriptionPlan>,
    #[validate(length(min = 2, max = 10))]
    pub locale: Option<String>,
    #[validate(length(min = 3, max = 3))]
    pub currency: Option<String>,
}

/// Validate slug format (lowercase alphanumeric with hyphens)
fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    if SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_slug"))
    }
}

/// Input for updating a tenant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTenantInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
}

// Regex for slug validation
lazy_static::lazy_static! {
    pub static ref SLUG_REGEX: regex::Regex = regex::Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}
