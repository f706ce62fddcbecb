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

//! Errors raised while turning evaluator form state into a job payload

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Filter is not valid JSON: {0}")]
    InvalidFilterJson(String),

    #[error("Filter must be a JSON array")]
    FilterNotArray,

    #[error("Sampling must be a percentage between 0 and 100, got {0}")]
    SamplingOutOfRange(f64),

    #[error("Delay must be a non-negative number of seconds, got {0}")]
    InvalidDelay(f64),

    #[error("Template variables without a mapping: {}", .0.join(", "))]
    UnmappedVariables(Vec<String>),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
