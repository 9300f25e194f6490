//! Shared domain primitives

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// UUID persisted as CHAR(36) text.
///
/// The clinic schema stores hyphenated UUID strings, not the BINARY(16)
/// layout sqlx's `uuid` feature assumes, so this wrapper encodes and
/// decodes through `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringUuid(pub Uuid);

impl StringUuid {
    pub fn new_v4() -> Self {
        StringUuid(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        StringUuid(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::try_parse(s).map(StringUuid)
    }
}

impl std::ops::Deref for StringUuid {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for StringUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for StringUuid {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl sqlx::Type<sqlx::MySql> for StringUuid {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for StringUuid {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::MySql>>::decode(value)?;
        Ok(StringUuid(Uuid::try_parse(&s)?))
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for StringUuid {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.0.to_string(), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_distinct() {
        assert_ne!(StringUuid::new_v4(), StringUuid::new_v4());
        assert!(!StringUuid::new_v4().is_nil());
        assert!(StringUuid::nil().is_nil());
    }

    #[test]
    fn test_round_trips_through_display() {
        let s = "550e8400-e29b-41d4-a716-446655440000";
        let id: StringUuid = s.parse().unwrap();
        assert_eq!(id.to_string(), s);
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(StringUuid::parse_str("not-a-uuid").is_err());
        assert!("550e8400".parse::<StringUuid>().is_err());
    }

    #[test]
    fn test_serializes_as_a_plain_string() {
        let s = "550e8400-e29b-41d4-a716-446655440000";
        let id: StringUuid = s.parse().unwrap();

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{s}\""));
        assert_eq!(serde_json::from_str::<StringUuid>(&json).unwrap(), id);
    }
}
