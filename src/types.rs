//! Common GraphQL types

use async_graphql::{Scalar, ScalarType, Value};
use chrono::{DateTime as ChronoDateTime, Utc};

/// DateTime scalar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTime(pub ChronoDateTime<Utc>);

impl DateTime {
    /// Parse an RFC 3339 timestamp as stored in `created` / `edited`
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        ChronoDateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| DateTime(dt.with_timezone(&Utc)))
    }
}

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> async_graphql::InputValueResult<Self> {
        if let Value::String(s) = value {
            Ok(DateTime(
                ChronoDateTime::parse_from_rfc3339(&s)
                    .map_err(|e| format!("Invalid DateTime: {}", e))?
                    .with_timezone(&Utc),
            ))
        } else {
            Err("Expected string for DateTime".into())
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_rfc3339())
    }
}
