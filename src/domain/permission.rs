//! Permission catalog domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Permission namespace partition. Names are unique per guard, so the web
/// surface and service-to-service surface can evolve independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Guard {
    #[default]
    Web,
    Api,
}

impl std::str::FromStr for Guard {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(Guard::Web),
            "api" => Ok(Guard::Api),
            _ => Err(format!("Unknown guard: {}", s)),
        }
    }
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::Web => write!(f, "web"),
            Guard::Api => write!(f, "api"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for Guard {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for Guard {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for Guard {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Catalog entry: a named, checkable ability, unique per `(name, guard)`.
///
/// Names follow the `{action}_{resource_plural}` convention, e.g.
/// `delete_patients`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: StringUuid,
    pub name: String,
    pub guard: Guard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Permission {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            guard: Guard::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

// Permission names: lowercase snake-case segments
lazy_static::lazy_static! {
    pub static ref PERMISSION_NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)+$").unwrap();
}

/// Check a permission name against the `{action}_{resource_plural}`
/// convention.
pub fn is_valid_permission_name(name: &str) -> bool {
    PERMISSION_NAME_REGEX.is_match(name)
}
