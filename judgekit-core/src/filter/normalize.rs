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

//! Conversion between UI filter expressions and the wire shape
//!
//! Wire filters look like:
//!
//! ```json
//! {"column": "tags", "columnId": "tags", "type": "arrayOptions", "op": "anyOf", "value": ["x"]}
//! ```
//!
//! Both directions are total: they run on every edit of a filter builder,
//! so malformed input is dropped element by element instead of failing the
//! whole conversion.

use super::alias::{alias_for_key, legacy_label, resolve_alias};
use super::column::{ColumnType, FilterConfiguration};
use super::expression::{scalar_text, FilterExpression, FilterValue};
use super::operators::{operator_code, operator_label, takes_value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One filter in the shape the backend accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFilter {
    pub column: String,
    /// Same key as `column`; some procedures read one name, some the other
    pub column_id: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Backend operator code
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_key: Option<String>,
}

/// How `datasetId` is presented when converting back to UI expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// Keep logical keys
    #[default]
    Keys,
    /// Restore the legacy label-keyed representation (`"Dataset"`)
    LegacyLabels,
}

/// Convert UI expressions to wire filters
pub fn to_wire(
    expressions: &[FilterExpression],
    configuration: &FilterConfiguration,
) -> Vec<NormalizedFilter> {
    expressions
        .iter()
        .map(|expr| expression_to_wire(expr, configuration))
        .collect()
}

fn expression_to_wire(expr: &FilterExpression, configuration: &FilterConfiguration) -> NormalizedFilter {
    let (key, column_type) = resolve_column(configuration, &expr.column);
    let key = key.to_string();

    let value = if takes_value(&expr.operator) {
        wire_value(&expr.value)
    } else {
        None
    };

    NormalizedFilter {
        column: key.clone(),
        column_id: key,
        column_type,
        op: operator_code(&expr.operator).into_owned(),
        value,
        meta_key: expr.meta_key().map(str::to_string),
    }
}

/// Logical key and type of a column. Legacy labels are rewritten through
/// the alias table; the type comes from the configuration, then the alias
/// table, else `string`.
pub(crate) fn resolve_column<'a>(
    configuration: &FilterConfiguration,
    column: &'a str,
) -> (&'a str, ColumnType) {
    if let Some(alias) = resolve_alias(column) {
        return (alias.key, alias.column_type);
    }
    let column_type = configuration
        .get(column)
        .map(|c| c.column_type)
        .or_else(|| alias_for_key(column).map(|a| a.column_type))
        .unwrap_or_default();
    (column, column_type)
}

fn wire_value(value: &FilterValue) -> Option<Vec<Value>> {
    match value {
        FilterValue::Null => None,
        FilterValue::List(items) => Some(items.iter().cloned().map(Value::String).collect()),
        scalar => match scalar.to_json() {
            Value::Null => None,
            json => Some(vec![json]),
        },
    }
}

/// Serialize expressions to the wire JSON text kept in form state
pub fn to_wire_json(expressions: &[FilterExpression], configuration: &FilterConfiguration) -> String {
    serde_json::to_string(&to_wire(expressions, configuration)).unwrap_or_else(|_| "[]".to_string())
}

/// Convert wire filters (or UI-shaped JSON) back to UI expressions
pub fn to_ui(wire: &Value, configuration: &FilterConfiguration) -> Vec<FilterExpression> {
    to_ui_with(wire, configuration, LabelMode::Keys)
}

/// [`to_ui`] with an explicit choice for legacy labels
pub fn to_ui_with(
    wire: &Value,
    configuration: &FilterConfiguration,
    mode: LabelMode,
) -> Vec<FilterExpression> {
    let Some(items) = wire.as_array() else {
        debug!("filter payload is not an array, ignoring it");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item.as_object() {
            Some(obj) => element_to_ui(obj, configuration, mode),
            None => {
                debug!("skipping non-object filter element: {}", item);
                None
            }
        })
        .collect()
}

/// Parse JSON text and convert it. Missing or unparsable text yields an
/// empty list.
pub fn to_ui_str(text: Option<&str>, configuration: &FilterConfiguration) -> Vec<FilterExpression> {
    let Some(text) = text else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(text) {
        Ok(value) => to_ui(&value, configuration),
        Err(e) => {
            debug!("filter text is not valid JSON: {}", e);
            Vec::new()
        }
    }
}

/// Typed variant of [`to_ui`]
pub fn filters_to_ui(
    filters: &[NormalizedFilter],
    configuration: &FilterConfiguration,
    mode: LabelMode,
) -> Vec<FilterExpression> {
    match serde_json::to_value(filters) {
        Ok(value) => to_ui_with(&value, configuration, mode),
        Err(_) => Vec::new(),
    }
}

/// Bring any accepted filter JSON into canonical wire shape
pub fn renormalize(value: &Value, configuration: &FilterConfiguration) -> Vec<NormalizedFilter> {
    to_wire(&to_ui(value, configuration), configuration)
}

fn element_to_ui(
    obj: &Map<String, Value>,
    configuration: &FilterConfiguration,
    mode: LabelMode,
) -> Option<FilterExpression> {
    let raw_column = non_empty_str(obj, "columnId").or_else(|| non_empty_str(obj, "column"))?;

    let (key, alias_type) = match resolve_alias(raw_column) {
        Some(alias) => (alias.key, Some(alias.column_type)),
        None => (raw_column, None),
    };

    let column_type = alias_type
        .or_else(|| configuration.get(key).map(|c| c.column_type))
        .or_else(|| alias_for_key(key).map(|a| a.column_type))
        .or_else(|| {
            obj.get("type")
                .and_then(Value::as_str)
                .map(ColumnType::from_name)
        })
        .unwrap_or_default();

    let operator = non_empty_str(obj, "op")
        .or_else(|| non_empty_str(obj, "operator"))
        .map(|op| operator_label(op).into_owned())
        .unwrap_or_else(|| "=".to_string());

    let value = if takes_value(&operator) {
        ui_value(obj.get("value"), column_type)
    } else {
        FilterValue::Null
    };

    let column = match mode {
        LabelMode::LegacyLabels => legacy_label(key).unwrap_or(key),
        LabelMode::Keys => key,
    };

    let meta_key = non_empty_str(obj, "metaKey")
        .or_else(|| non_empty_str(obj, "key"))
        .map(str::to_string);

    Some(FilterExpression {
        column: column.to_string(),
        operator,
        value,
        meta_key,
    })
}

fn ui_value(raw: Option<&Value>, column_type: ColumnType) -> FilterValue {
    let empty = || FilterValue::String(String::new());

    match raw {
        None | Some(Value::Null) | Some(Value::Object(_)) => empty(),
        Some(Value::Array(items)) => {
            if column_type.is_options() || items.len() > 1 {
                FilterValue::List(items.iter().filter_map(scalar_text).collect())
            } else {
                match items.first() {
                    Some(first) => match FilterValue::from_json(first) {
                        Some(FilterValue::Null) | None => empty(),
                        Some(value) => value,
                    },
                    None => empty(),
                }
            }
        }
        Some(scalar) => {
            let value = FilterValue::from_json(scalar).unwrap_or_else(empty);
            if column_type.is_options() {
                FilterValue::List(value.as_list())
            } else {
                value
            }
        }
    }
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    obj.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
