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

//! Filter-expression model
//!
//! - [`operators`]: operator spellings and the type→operator table
//! - [`column`]: per-column metadata and screen presets
//! - [`expression`]: UI-side expressions
//! - [`normalize`]: UI ⇄ wire conversion
//! - [`predicate`]: local evaluation against fetched rows

pub mod alias;
pub mod column;
pub mod expression;
pub mod normalize;
pub mod operators;
pub mod predicate;

pub use alias::{legacy_label, resolve_alias, ColumnAlias, COLUMN_ALIASES};
pub use column::{ColumnOption, ColumnType, FilterColumn, FilterConfiguration};
pub use expression::{FilterExpression, FilterValue};
pub use normalize::{
    filters_to_ui, renormalize, to_ui, to_ui_str, to_ui_with, to_wire, to_wire_json, LabelMode,
    NormalizedFilter,
};
pub use operators::{
    nested_key_operators, operator_code, operator_label, operators_for, operators_for_name,
    Operator,
};
pub use predicate::{apply_filters, apply_wire_filters, matches, parse_datetime_text};
