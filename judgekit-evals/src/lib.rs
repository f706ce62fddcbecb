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

//! # judgekit evals
//!
//! Builds the request bodies for creating and updating evaluator jobs from
//! evaluator form state.
//!
//! ## Example
//!
//! ```rust
//! use judgekit_evals::{build_create, EvaluatorForm, MappingRow};
//! use judgekit_core::filter::FilterConfiguration;
//!
//! let mut form = EvaluatorForm::new("proj-1", "tmpl-1", "correctness");
//! form.filter_text = Some(r#"[{"column": "tags", "op": "anyOf", "value": ["prod"]}]"#.into());
//! form.mapping = vec![MappingRow::new("input", "trace", "input")];
//! form.sampling_percent = 0.0;
//!
//! let job = build_create(&form, &FilterConfiguration::traces()).unwrap();
//! assert_eq!(job.sampling, 0.001);
//! assert_eq!(job.delay, 30_000);
//! ```

pub mod error;
pub mod mapping;
pub mod payload;
pub mod template;

pub use error::{Result, ValidationError};
pub use mapping::{normalize_mapping, object_code, MappingRow, VariableMapping};
pub use payload::{
    build_create, build_update, derive_delay_ms, derive_sampling, derive_time_scope, parse_filter,
    CreateEvalJob, EvalTarget, EvaluatorForm, JobStatus, TimeScope, UpdateEvalJob,
    SAMPLING_EPSILON,
};
pub use template::{default_mapping_rows, extract_variables, missing_variables};
