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

//! In-memory evaluation of filter expressions
//!
//! Used where rows were already fetched and filtering happens locally.
//! Expressions are AND-ed. A comparison that cannot be made (unparsable
//! number or date, missing field) excludes the row instead of erroring.

use super::column::{ColumnType, FilterConfiguration};
use super::expression::{scalar_text, FilterExpression, FilterValue};
use super::normalize::{filters_to_ui, resolve_column, LabelMode, NormalizedFilter};
use super::operators::Operator;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// Rows that satisfy every active expression
pub fn apply_filters<'a>(
    rows: &'a [Value],
    expressions: &[FilterExpression],
    configuration: &FilterConfiguration,
) -> Vec<&'a Value> {
    rows.iter()
        .filter(|row| matches(row, expressions, configuration))
        .collect()
}

/// Same as [`apply_filters`] for filters in wire shape
pub fn apply_wire_filters<'a>(
    rows: &'a [Value],
    filters: &[NormalizedFilter],
    configuration: &FilterConfiguration,
) -> Vec<&'a Value> {
    let expressions = filters_to_ui(filters, configuration, LabelMode::Keys);
    apply_filters(rows, &expressions, configuration)
}

/// True when the row satisfies every active expression
pub fn matches(row: &Value, expressions: &[FilterExpression], configuration: &FilterConfiguration) -> bool {
    expressions
        .iter()
        .all(|expr| matches_expression(row, expr, configuration))
}

fn matches_expression(row: &Value, expr: &FilterExpression, configuration: &FilterConfiguration) -> bool {
    // Unknown operators never exclude anything
    let Some(op) = Operator::parse(&expr.operator) else {
        return true;
    };
    if op.takes_value() && expr.value.is_empty() {
        return true;
    }

    let (key, column_type) = resolve_column(configuration, &expr.column);
    let field = lookup(row, key, column_type, expr.meta_key(), op);

    let field = match field {
        None | Some(Value::Null) => return op == Operator::IsNull,
        Some(value) => value,
    };

    match op {
        Operator::IsNull => false,
        Operator::IsNotNull => true,
        Operator::HasKey => true,
        _ => match column_type {
            ColumnType::String | ColumnType::StringObject => compare_text(field, op, &expr.value),
            ColumnType::Number | ColumnType::NumberObject => compare_number(field, op, &expr.value),
            ColumnType::Boolean => compare_bool(field, op, &expr.value),
            ColumnType::Datetime => compare_datetime(field, op, &expr.value),
            ColumnType::StringOptions | ColumnType::CategoryOptions => {
                compare_options(field, op, &expr.value, false)
            }
            ColumnType::ArrayOptions => compare_options(field, op, &expr.value, true),
        },
    }
}

/// Field addressed by the expression. Object columns with a meta key
/// address the nested value; `has key` reports the object itself when the
/// key is present.
fn lookup<'a>(
    row: &'a Value,
    key: &str,
    column_type: ColumnType,
    meta_key: Option<&str>,
    op: Operator,
) -> Option<&'a Value> {
    let field = row.get(key)?;
    match meta_key {
        Some(meta_key) if column_type.has_meta_key() => {
            let nested = field.get(meta_key);
            if op == Operator::HasKey {
                nested.map(|_| field)
            } else {
                nested
            }
        }
        _ => Some(field),
    }
}

fn compare_text(field: &Value, op: Operator, expected: &FilterValue) -> bool {
    let Some(actual) = scalar_text(field) else {
        return false;
    };
    let Some(expected) = expected.as_text() else {
        return false;
    };
    let actual = actual.to_lowercase();
    let expected = expected.to_lowercase();

    match op {
        Operator::Equals | Operator::KeyEquals => actual == expected,
        Operator::NotEquals => actual != expected,
        Operator::Contains => actual.contains(&expected),
        Operator::NotContains => !actual.contains(&expected),
        Operator::StartsWith => actual.starts_with(&expected),
        Operator::EndsWith => actual.ends_with(&expected),
        Operator::AnyOf | Operator::NoneOf | Operator::AllOf => {
            compare_options(&Value::String(actual), op, &FilterValue::String(expected), false)
        }
        _ => ordering_holds(op, actual.cmp(&expected)),
    }
}

fn compare_number(field: &Value, op: Operator, expected: &FilterValue) -> bool {
    match op {
        Operator::Contains
        | Operator::NotContains
        | Operator::StartsWith
        | Operator::EndsWith
        | Operator::AnyOf
        | Operator::NoneOf
        | Operator::AllOf => return compare_text(field, op, expected),
        _ => {}
    }

    let (Some(actual), Some(expected)) = (parse_number(field), expected_number(expected)) else {
        return false;
    };
    match actual.partial_cmp(&expected) {
        Some(ordering) => ordering_holds(op, ordering),
        None => false,
    }
}

fn compare_bool(field: &Value, op: Operator, expected: &FilterValue) -> bool {
    let equal = match (field, expected) {
        (Value::Bool(actual), FilterValue::Boolean(expected)) => actual == expected,
        _ => false,
    };
    match op {
        Operator::Equals => equal,
        Operator::NotEquals => !equal,
        _ => false,
    }
}

fn compare_datetime(field: &Value, op: Operator, expected: &FilterValue) -> bool {
    let Some(actual) = parse_datetime(field) else {
        return false;
    };
    let expected = match expected {
        FilterValue::Number(n) => from_epoch_millis(*n),
        other => other.as_text().and_then(|text| parse_datetime_text(&text)),
    };
    match expected {
        Some(expected) => ordering_holds(op, actual.cmp(&expected)),
        None => false,
    }
}

fn compare_options(field: &Value, op: Operator, expected: &FilterValue, exact: bool) -> bool {
    let fold = |s: String| if exact { s } else { s.to_lowercase() };

    let actual: Vec<String> = match field {
        Value::Array(items) => items.iter().filter_map(scalar_text).map(fold).collect(),
        other => match scalar_text(other) {
            Some(text) => vec![fold(text)],
            None => return false,
        },
    };
    let selected: Vec<String> = expected.as_list().into_iter().map(fold).collect();

    let intersects = selected.iter().any(|s| actual.contains(s));
    match op {
        Operator::AnyOf | Operator::Equals => intersects,
        Operator::NoneOf | Operator::NotEquals => !intersects,
        Operator::AllOf => selected.iter().all(|s| actual.contains(s)),
        _ => false,
    }
}

fn ordering_holds(op: Operator, ordering: Ordering) -> bool {
    match op {
        Operator::Equals | Operator::KeyEquals => ordering == Ordering::Equal,
        Operator::NotEquals => ordering != Ordering::Equal,
        Operator::GreaterThan => ordering == Ordering::Greater,
        Operator::LessThan => ordering == Ordering::Less,
        Operator::GreaterOrEqual => ordering != Ordering::Less,
        Operator::LessOrEqual => ordering != Ordering::Greater,
        _ => false,
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn expected_number(value: &FilterValue) -> Option<f64> {
    match value {
        FilterValue::Number(n) => Some(*n),
        other => other.as_text()?.trim().parse().ok(),
    }
}

fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_datetime_text(s),
        Value::Number(n) => match n.as_i64() {
            Some(ms) => DateTime::from_timestamp_millis(ms),
            None => from_epoch_millis(n.as_f64()?),
        },
        _ => None,
    }
}

/// Epoch milliseconds given as a float. Sub-millisecond fractions are
/// dropped; non-finite or out-of-range values are rejected.
fn from_epoch_millis(ms: f64) -> Option<DateTime<Utc>> {
    let ms = ms.trunc();
    if !ms.is_finite() || ms < i64::MIN as f64 || ms >= i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64)
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare date
/// (midnight UTC)
pub fn parse_datetime_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
