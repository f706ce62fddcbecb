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

//! Column metadata for filter builders
//!
//! A [`FilterConfiguration`] is rebuilt per screen: a fixed column list
//! (see [`FilterConfiguration::traces`]) plus option values fetched from the
//! backend once per project. It starts out usable with empty option lists
//! and is updated in place with [`FilterConfiguration::set_options`].

use super::alias::resolve_alias;
use super::expression::FilterExpression;
use super::operators::{nested_key_operators, operators_for, Operator};
use crate::error::FilterError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Semantic type of a filterable column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Boolean,
    Datetime,
    StringOptions,
    ArrayOptions,
    StringObject,
    NumberObject,
    CategoryOptions,
}

impl ColumnType {
    pub const ALL: [ColumnType; 9] = [
        ColumnType::String,
        ColumnType::Number,
        ColumnType::Boolean,
        ColumnType::Datetime,
        ColumnType::StringOptions,
        ColumnType::ArrayOptions,
        ColumnType::StringObject,
        ColumnType::NumberObject,
        ColumnType::CategoryOptions,
    ];

    /// Wire name of the type
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Datetime => "datetime",
            ColumnType::StringOptions => "stringOptions",
            ColumnType::ArrayOptions => "arrayOptions",
            ColumnType::StringObject => "stringObject",
            ColumnType::NumberObject => "numberObject",
            ColumnType::CategoryOptions => "categoryOptions",
        }
    }

    /// Parse a wire name. Unknown names are treated as `string`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .unwrap_or_default()
    }

    /// Object-valued columns are filtered through a nested key
    pub fn has_meta_key(self) -> bool {
        matches!(self, ColumnType::StringObject | ColumnType::NumberObject)
    }

    /// Option-typed columns hold a list of selected values
    pub fn is_options(self) -> bool {
        matches!(
            self,
            ColumnType::StringOptions | ColumnType::ArrayOptions | ColumnType::CategoryOptions
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ColumnType::from_name(&name))
    }
}

/// One selectable value of an option-typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOption {
    pub value: String,
    pub label: String,
}

impl ColumnOption {
    /// Option whose label is its value
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }

    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Metadata for a single filterable column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterColumn {
    /// Logical identifier shared by UI and wire shapes
    pub key: String,
    /// Display name, never used as a storage key
    pub label: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub options: Vec<ColumnOption>,
    pub has_meta_key: bool,
}

impl FilterColumn {
    pub fn new(key: impl Into<String>, label: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            column_type,
            operators: operators_for(column_type).to_vec(),
            options: Vec::new(),
            has_meta_key: column_type.has_meta_key(),
        }
    }

    pub fn with_options(mut self, options: Vec<ColumnOption>) -> Self {
        self.options = options;
        self
    }
}

/// Ordered set of filterable columns for one screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterConfiguration {
    columns: Vec<FilterColumn>,
}

impl FilterConfiguration {
    pub fn new(columns: Vec<FilterColumn>) -> Self {
        Self { columns }
    }

    /// Columns of the trace list and of evaluators targeting traces
    pub fn traces() -> Self {
        Self::new(vec![
            FilterColumn::new("timestamp", "Timestamp", ColumnType::Datetime),
            FilterColumn::new("name", "Name", ColumnType::StringOptions),
            FilterColumn::new("userId", "User ID", ColumnType::String),
            FilterColumn::new("sessionId", "Session ID", ColumnType::String),
            FilterColumn::new("tags", "Tags", ColumnType::ArrayOptions),
            FilterColumn::new("metadata", "Metadata", ColumnType::StringObject),
            FilterColumn::new("release", "Release", ColumnType::String),
            FilterColumn::new("version", "Version", ColumnType::String),
            FilterColumn::new("environment", "Environment", ColumnType::StringOptions),
            FilterColumn::new("latency", "Latency (s)", ColumnType::Number),
            FilterColumn::new("totalCost", "Total Cost ($)", ColumnType::Number),
            FilterColumn::new("bookmarked", "Bookmarked", ColumnType::Boolean),
            FilterColumn::new("level", "Level", ColumnType::CategoryOptions).with_options(
                ["DEBUG", "DEFAULT", "WARNING", "ERROR"]
                    .into_iter()
                    .map(ColumnOption::plain)
                    .collect(),
            ),
            FilterColumn::new("scores", "Scores (numeric)", ColumnType::NumberObject),
        ])
    }

    /// Columns of evaluators targeting dataset items
    pub fn dataset_items() -> Self {
        Self::new(vec![
            FilterColumn::new("datasetId", "Dataset", ColumnType::StringOptions),
            FilterColumn::new("createdAt", "Created At", ColumnType::Datetime),
            FilterColumn::new("metadata", "Metadata", ColumnType::StringObject),
        ])
    }

    pub fn columns(&self) -> &[FilterColumn] {
        &self.columns
    }

    pub fn get(&self, key: &str) -> Option<&FilterColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Look a column up by its display label
    pub fn get_by_label(&self, label: &str) -> Option<&FilterColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// Declared type of a column, `string` when the column is unknown
    pub fn column_type(&self, key: &str) -> ColumnType {
        self.get(key).map(|c| c.column_type).unwrap_or_default()
    }

    /// Legal operators for a column; unknown columns get the string set
    pub fn operators(&self, key: &str) -> &[Operator] {
        match self.get(key) {
            Some(column) => &column.operators,
            None => operators_for(ColumnType::String),
        }
    }

    /// Replace the options of a column once they arrive from the backend.
    /// Returns false when the column is not part of this configuration.
    pub fn set_options(&mut self, key: &str, options: Vec<ColumnOption>) -> bool {
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(column) => {
                column.options = options;
                true
            }
            None => false,
        }
    }

    /// Strict check of an expression against this configuration: the
    /// column must exist and the operator must be legal for its type. Null
    /// checks are accepted on every column; object columns also accept the
    /// nested-key operators.
    pub fn check(&self, expr: &FilterExpression) -> Result<(), FilterError> {
        let key = resolve_alias(&expr.column)
            .map(|alias| alias.key)
            .unwrap_or(expr.column.as_str());
        let column = self
            .get(key)
            .ok_or_else(|| FilterError::UnknownColumn(expr.column.clone()))?;
        let op = Operator::try_parse(&expr.operator)?;

        let allowed = op.is_null_check()
            || column.operators.contains(&op)
            || (column.has_meta_key && nested_key_operators().contains(&op));
        if allowed {
            Ok(())
        } else {
            Err(FilterError::OperatorNotAllowed {
                column: expr.column.clone(),
                operator: expr.operator.clone(),
                column_type: column.column_type.to_string(),
            })
        }
    }

    pub fn push(&mut self, column: FilterColumn) {
        self.columns.push(column);
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
