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

//! Error types for judgekit core

use thiserror::Error;

/// Errors raised by the strict helpers of the filter model.
///
/// The normalizer and the predicate evaluator never return these; they
/// degrade instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Operator '{operator}' is not valid for column '{column}' of type {column_type}")]
    OperatorNotAllowed {
        column: String,
        operator: String,
        column_type: String,
    },
}

pub type Result<T> = std::result::Result<T, FilterError>;
