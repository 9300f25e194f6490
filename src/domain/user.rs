//! User (principal) domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Primary role of a principal. Closed set; there is no runtime role
/// creation.
///
/// `Admin` is deliberately granted no explicit permission bundle: the
/// authorization engine short-circuits it to "allow everything" before any
/// catalog lookup, so the catalog can never constrain an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Dentist,
    Hygienist,
    Receptionist,
    Assistant,
}

impl Role {
    /// Default permission names bundled with the role.
    pub fn default_permissions(&self) -> &'static [&'static str] {
        match self {
            // Admin passes every check unconditionally; materializing a
            // bundle here would imply the catalog could limit it.
            Role::Admin => &[],
            Role::Dentist => &[
                "view_patients",
                "create_patients",
                "update_patients",
                "view_appointments",
                "create_appointments",
                "update_appointments",
                "delete_appointments",
            ],
            Role::Hygienist => &[
                "view_patients",
                "update_patients",
                "view_appointments",
                "update_appointments",
            ],
            Role::Receptionist => &[
                "view_patients",
                "create_patients",
                "view_appointments",
                "create_appointments",
                "update_appointments",
            ],
            Role::Assistant => &["view_patients", "view_appointments"],
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "dentist" => Ok(Role::Dentist),
            "hygienist" => Ok(Role::Hygienist),
            "receptionist" => Ok(Role::Receptionist),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Dentist => "dentist",
            Role::Hygienist => "hygienist",
            Role::Receptionist => "receptionist",
            Role::Assistant => "assistant",
        };
        write!(f, "{}", s)
    }
}

impl sqlx::Type<sqlx::MySql> for Role {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for Role {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// User entity (acting principal)
///
/// `tenant_id` is `None` only for platform-level operators; a non-null
/// binding is immutable after creation. Users are deactivated, never
/// deleted, so audit trails stay intact.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: StringUuid,
    pub tenant_id: Option<StringUuid>,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    /// Direct permission grants, independent of the role bundle.
    #[sqlx(json)]
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Platform operators carry no tenant binding.
    pub fn is_platform_operator(&self) -> bool {
        self.tenant_id.is_none()
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            tenant_id: None,
            email: String::new(),
            name: String::new(),
            role: Role::Assistant,
            is_active: true,
            permissions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a new user under a tenant
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUserInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub role: Role,
}

/// Input for updating a user; the tenant binding is deliberately absent so
/// no update path can move a principal between tenants.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_no_materialized_bundle() {
        assert!(Role::Admin.default_permissions().is_empty());
    }

    #[test]
    fn test_role_bundles_are_subsets_of_convention() {
        for role in [Role::Dentist, Role::Hygienist, Role::Receptionist, Role::Assistant] {
            for perm in role.default_permissions() {
                assert!(
                    perm.contains('_'),
                    "{perm} does not follow action_resource convention"
                );
            }
        }
    }

    #[test]
    fn test_role_round_trip() {
        for s in ["admin", "dentist", "hygienist", "receptionist", "assistant"] {
            let role: Role = s.parse().unwrap();
            assert_eq!(role.to_string(), s);
        }
        assert!("surgeon".parse::<Role>().is_err());
    }

    #[test]
    fn test_platform_operator_detection() {
        let operator = User::default();
        assert!(operator.is_platform_operator());

        let bound = User {
            tenant_id: Some(StringUuid::new_v4()),
            ..Default::default()
        };
        assert!(!bound.is_platform_operator());
    }

    #[test]
    fn test_create_input_rejects_tenant_id() {
        let json = r#"{"email":"a@b.com","name":"A","role":"dentist","tenant_id":"x"}"#;
        let result: Result<CreateUserInput, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
