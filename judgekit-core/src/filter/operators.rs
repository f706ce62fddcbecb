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

//! Operator vocabulary and the type→operator table
//!
//! Every filter builder, the normalizer and the predicate evaluator consume
//! the tables in this module by reference. Operators have two spellings:
//! the UI label (`"any of"`) and the backend code (`"anyOf"`).

use super::column::ColumnType;
use crate::error::FilterError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// A filter operator. Serialized as its UI label; deserializes from
/// either spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    AnyOf,
    NoneOf,
    AllOf,
    IsNull,
    IsNotNull,
    HasKey,
    KeyEquals,
}

/// (operator, UI label, backend code)
const SPELLINGS: &[(Operator, &str, &str)] = &[
    (Operator::Equals, "=", "eq"),
    (Operator::NotEquals, "<>", "neq"),
    (Operator::GreaterThan, ">", "gt"),
    (Operator::LessThan, "<", "lt"),
    (Operator::GreaterOrEqual, ">=", "gte"),
    (Operator::LessOrEqual, "<=", "lte"),
    (Operator::Contains, "contains", "contains"),
    (Operator::NotContains, "does not contain", "notContains"),
    (Operator::StartsWith, "starts with", "startsWith"),
    (Operator::EndsWith, "ends with", "endsWith"),
    (Operator::AnyOf, "any of", "anyOf"),
    (Operator::NoneOf, "none of", "noneOf"),
    (Operator::AllOf, "all of", "allOf"),
    (Operator::IsNull, "is null", "isNull"),
    (Operator::IsNotNull, "is not null", "isNotNull"),
    (Operator::HasKey, "has key", "hasKey"),
    (Operator::KeyEquals, "key equals", "keyEquals"),
];

const STRING_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::Contains,
    Operator::NotContains,
    Operator::StartsWith,
    Operator::EndsWith,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::GreaterOrEqual,
    Operator::LessOrEqual,
];

const BOOLEAN_OPERATORS: &[Operator] = &[Operator::Equals, Operator::NotEquals];

const DATETIME_OPERATORS: &[Operator] = &[
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::GreaterOrEqual,
    Operator::LessOrEqual,
];

const OPTIONS_OPERATORS: &[Operator] = &[Operator::AnyOf, Operator::NoneOf];

const ARRAY_OPTIONS_OPERATORS: &[Operator] = &[Operator::AnyOf, Operator::NoneOf, Operator::AllOf];

const NESTED_KEY_OPERATORS: &[Operator] = &[Operator::HasKey, Operator::KeyEquals, Operator::Contains];

/// Legal operators for a column type.
///
/// Object-valued types share the string list; the nested-key variant is
/// available separately through [`nested_key_operators`].
pub fn operators_for(column_type: ColumnType) -> &'static [Operator] {
    match column_type {
        ColumnType::String | ColumnType::StringObject | ColumnType::NumberObject => {
            STRING_OPERATORS
        }
        ColumnType::Number => NUMBER_OPERATORS,
        ColumnType::Boolean => BOOLEAN_OPERATORS,
        ColumnType::Datetime => DATETIME_OPERATORS,
        ColumnType::StringOptions | ColumnType::CategoryOptions => OPTIONS_OPERATORS,
        ColumnType::ArrayOptions => ARRAY_OPTIONS_OPERATORS,
    }
}

/// Operators offered when an object column is filtered through a nested key
pub fn nested_key_operators() -> &'static [Operator] {
    NESTED_KEY_OPERATORS
}

/// Same as [`operators_for`] but keyed by the type's name; unknown names
/// get the string list.
pub fn operators_for_name(type_name: &str) -> &'static [Operator] {
    operators_for(ColumnType::from_name(type_name))
}

/// Translate a UI label to its backend code. Anything that is not a known
/// label (including strings that are already codes) passes through.
pub fn operator_code(label: &str) -> Cow<'_, str> {
    match Operator::from_label(label) {
        Some(op) => Cow::Borrowed(op.code()),
        None => Cow::Borrowed(label),
    }
}

/// Translate a backend code back to its UI label, passing unknown codes
/// through unchanged.
pub fn operator_label(code: &str) -> Cow<'_, str> {
    match Operator::from_code(code) {
        Some(op) => Cow::Borrowed(op.label()),
        None => Cow::Borrowed(code),
    }
}

impl Operator {
    /// Text shown in filter builders
    pub fn label(self) -> &'static str {
        self.spelling().1
    }

    /// Code the backend expects in the `op` field
    pub fn code(self) -> &'static str {
        self.spelling().2
    }

    fn spelling(self) -> &'static (Operator, &'static str, &'static str) {
        SPELLINGS
            .iter()
            .find(|(op, _, _)| *op == self)
            .unwrap_or(&SPELLINGS[0])
    }

    pub fn from_label(label: &str) -> Option<Self> {
        SPELLINGS
            .iter()
            .find(|(_, l, _)| *l == label)
            .map(|(op, _, _)| *op)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        SPELLINGS
            .iter()
            .find(|(_, _, c)| *c == code)
            .map(|(op, _, _)| *op)
    }

    /// Recognize either spelling. Labels win when a string is both
    /// (`contains`).
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        Self::from_label(trimmed).or_else(|| Self::from_code(trimmed))
    }

    /// Like [`Operator::parse`] but reports the unknown operator
    pub fn try_parse(text: &str) -> Result<Self, FilterError> {
        Self::parse(text).ok_or_else(|| FilterError::UnknownOperator(text.to_string()))
    }

    /// `is null` / `is not null` never carry a value
    pub fn is_null_check(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// False for operators that test presence only: the null checks and
    /// `has key`, whose key travels in `metaKey`
    pub fn takes_value(self) -> bool {
        !self.is_null_check() && self != Operator::HasKey
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Operator::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("unknown filter operator: {}", text)))
    }
}

/// True when the text (label or code) names a null-check operator
pub fn is_null_check(text: &str) -> bool {
    Operator::parse(text).map(Operator::is_null_check).unwrap_or(false)
}

/// True unless the text names an operator that carries no value. Unknown
/// operators keep whatever value they were given.
pub fn takes_value(text: &str) -> bool {
    Operator::parse(text).map(Operator::takes_value).unwrap_or(true)
}
