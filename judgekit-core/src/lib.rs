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

//! judgekit core
//!
//! The filter-expression model shared by the trace list, evaluator target
//! filters and dataset screens: column metadata, the single operator table,
//! conversion between the UI and wire shapes, and local predicate
//! evaluation.
//!
//! ```rust
//! use judgekit_core::filter::{to_ui, to_wire, FilterConfiguration, FilterExpression};
//!
//! let config = FilterConfiguration::traces();
//! let exprs = vec![FilterExpression::new("tags", "any of", vec!["prod"])];
//!
//! let wire = to_wire(&exprs, &config);
//! assert_eq!(wire[0].op, "anyOf");
//!
//! let back = to_ui(&serde_json::to_value(&wire).unwrap(), &config);
//! assert_eq!(back, exprs);
//! ```

pub mod error;
pub mod filter;

pub use error::{FilterError, Result};
pub use filter::{
    apply_filters, to_ui, to_wire, ColumnType, FilterColumn, FilterConfiguration,
    FilterExpression, FilterValue, NormalizedFilter, Operator,
};
