// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! UI-side filter expressions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value of a filter expression. Its shape depends on the column type and
/// operator: option operators hold a list, range operators a two-element
/// list, null checks nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FilterValue {
    Boolean(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
    #[default]
    Null,
}

impl FilterValue {
    /// Null, empty text and empty lists make an expression inert
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::String(s) => s.is_empty(),
            FilterValue::List(items) => items.is_empty(),
            FilterValue::Boolean(_) | FilterValue::Number(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    /// Convert an arbitrary JSON value. Arrays keep their scalar members as
    /// strings; objects are not filter values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FilterValue::Null),
            Value::Bool(b) => Some(FilterValue::Boolean(*b)),
            Value::Number(n) => n.as_f64().map(FilterValue::Number),
            Value::String(s) => Some(FilterValue::String(s.clone())),
            Value::Array(items) => Some(FilterValue::List(
                items.iter().filter_map(scalar_text).collect(),
            )),
            Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Null => Value::Null,
            FilterValue::Boolean(b) => Value::Bool(*b),
            FilterValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FilterValue::String(s) => Value::String(s.clone()),
            FilterValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// The value as a list of strings (scalars become one-element lists)
    pub fn as_list(&self) -> Vec<String> {
        match self {
            FilterValue::Null => Vec::new(),
            FilterValue::Boolean(b) => vec![b.to_string()],
            FilterValue::Number(n) => vec![n.to_string()],
            FilterValue::String(s) => vec![s.clone()],
            FilterValue::List(items) => items.clone(),
        }
    }

    /// The value as a single string, taking the first list element
    pub fn as_text(&self) -> Option<String> {
        match self {
            FilterValue::Null => None,
            FilterValue::Boolean(b) => Some(b.to_string()),
            FilterValue::Number(n) => Some(n.to_string()),
            FilterValue::String(s) => Some(s.clone()),
            FilterValue::List(items) => items.first().cloned(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::List(value)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(value: Vec<&str>) -> Self {
        FilterValue::List(value.into_iter().map(String::from).collect())
    }
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// One predicate clause as the filter builders hold it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterExpression {
    /// Logical column key
    pub column: String,
    /// UI operator label
    pub operator: String,
    #[serde(default)]
    pub value: FilterValue,
    /// Nested key for object-valued columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_key: Option<String>,
}

impl FilterExpression {
    pub fn new(
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
            meta_key: None,
        }
    }

    pub fn with_meta_key(mut self, meta_key: impl Into<String>) -> Self {
        self.meta_key = Some(meta_key.into());
        self
    }

    /// Meta key, ignoring empty strings
    pub fn meta_key(&self) -> Option<&str> {
        self.meta_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_emptiness() {
        assert!(FilterValue::Null.is_empty());
        assert!(FilterValue::from("").is_empty());
        assert!(FilterValue::List(vec![]).is_empty());
        assert!(!FilterValue::Boolean(false).is_empty());
        assert!(!FilterValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_expression_serde() {
        let expr = FilterExpression::new("metadata", "contains", "prod").with_meta_key("env");
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            json,
            json!({"column": "metadata", "operator": "contains", "value": "prod", "metaKey": "env"})
        );

        let parsed: FilterExpression =
            serde_json::from_value(json!({"column": "tags", "operator": "any of", "value": ["a"]}))
                .unwrap();
        assert_eq!(parsed.value, FilterValue::List(vec!["a".into()]));
        assert_eq!(parsed.meta_key, None);

        let parsed: FilterExpression =
            serde_json::from_value(json!({"column": "userId", "operator": "is null"})).unwrap();
        assert_eq!(parsed.value, FilterValue::Null);
    }

    #[test]
    fn test_from_json_arrays_stringify_scalars() {
        let value = FilterValue::from_json(&json!(["a", 1, true, null, {"x": 1}])).unwrap();
        assert_eq!(value, FilterValue::List(vec!["a".into(), "1".into(), "true".into()]));
        assert!(FilterValue::from_json(&json!({"x": 1})).is_none());
    }

    #[test]
    fn test_empty_meta_key_is_ignored() {
        let expr = FilterExpression::new("metadata", "=", "x").with_meta_key("");
        assert_eq!(expr.meta_key(), None);
    }
}
