//! Filter criteria as sent by clients.
//!
//! The `filters` query parameter carries a JSON array such as
//! `[{"PropertyName": "amount", "Operator": "GreaterThan", "Value": "10"}]`.
//! Criteria are combined conjunctively; there is no OR or grouping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::query::QueryError;

/// One `property <operator> value` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(rename = "PropertyName", alias = "propertyName")]
    pub property_name: String,
    #[serde(rename = "Operator", alias = "operator")]
    pub operator: String,
    /// Raw value, converted to the property's type when the filter compiles.
    /// JSON numbers and booleans are accepted and kept in their text form.
    #[serde(
        rename = "Value",
        alias = "value",
        default,
        deserialize_with = "scalar_as_string"
    )]
    pub value: String,
}

impl FilterCriteria {
    pub fn new(
        property_name: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            operator: operator.as_str().to_string(),
            value: value.into(),
        }
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(D::Error::custom(format!(
            "filter value must be a scalar, got {other}"
        ))),
    }
}

/// Supported comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 9] = [
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::GreaterThan,
        FilterOperator::GreaterThanOrEqual,
        FilterOperator::LessThan,
        FilterOperator::LessThanOrEqual,
        FilterOperator::Contains,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equal => "Equal",
            FilterOperator::NotEqual => "NotEqual",
            FilterOperator::GreaterThan => "GreaterThan",
            FilterOperator::GreaterThanOrEqual => "GreaterThanOrEqual",
            FilterOperator::LessThan => "LessThan",
            FilterOperator::LessThanOrEqual => "LessThanOrEqual",
            FilterOperator::Contains => "Contains",
            FilterOperator::StartsWith => "StartsWith",
            FilterOperator::EndsWith => "EndsWith",
        }
    }

    /// Operators that need an orderable property.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            FilterOperator::GreaterThan
                | FilterOperator::GreaterThanOrEqual
                | FilterOperator::LessThan
                | FilterOperator::LessThanOrEqual
        )
    }

    /// Operators that need a text property.
    pub fn is_substring(self) -> bool {
        matches!(
            self,
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith
        )
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| QueryError::UnsupportedOperator(token.to_string()))
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode the JSON-encoded `filters` query parameter.
///
/// A blank string means "no filters".
pub fn parse_filters(raw: &str) -> Result<Vec<FilterCriteria>, QueryError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| QueryError::MalformedFilters(e.to_string()))
}
