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

//! Evaluator form to job payload, end to end

use judgekit_core::filter::{to_wire_json, FilterExpression};
use judgekit_evals::{
    build_create, build_update, default_mapping_rows, derive_sampling, extract_variables,
    EvalTarget, EvaluatorForm, JobStatus, ValidationError,
};
use proptest::prelude::*;
use serde_json::json;

const PROMPT: &str = "Given the question {{query}} and the reference {{expected_output}}, \
                      grade the answer {{output}}.";

#[test]
fn dataset_evaluator_from_template() {
    let target = EvalTarget::Dataset;
    let config = target.configuration();

    let variables = extract_variables(PROMPT);
    assert_eq!(variables, vec!["query", "expected_output", "output"]);

    let mut form = EvaluatorForm::new("proj-7", "tmpl-grade", "grade");
    form.target = target;
    form.template_variables = variables.clone();
    form.mapping = default_mapping_rows(&variables, target);
    form.filter_text = Some(to_wire_json(
        &[FilterExpression::new("Dataset", "any of", vec!["ds-a", "ds-b"])],
        &config,
    ));
    form.runs_on_new = false;
    form.runs_on_existing = true;

    let job = build_create(&form, &config).unwrap();
    let json = serde_json::to_value(&job).unwrap();

    assert_eq!(json["target"], "dataset");
    assert_eq!(json["timeScope"], json!(["EXISTING"]));
    assert_eq!(json["filter"][0]["columnId"], "datasetId");
    assert_eq!(json["filter"][0]["value"], json!(["ds-a", "ds-b"]));
    assert!(json["mapping"]
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["langfuseObject"] == "dataset_item"));
    assert_eq!(json["mapping"][1]["selectedColumnId"], "expectedOutput");
}

#[test]
fn update_reuses_create_validation() {
    let mut form = EvaluatorForm::new("proj-7", "tmpl-grade", "grade");
    form.delay_seconds = -1.0;

    let err = build_update("cfg-1", Some(JobStatus::Active), &form, &EvalTarget::Trace.configuration())
        .unwrap_err();
    assert_eq!(err, ValidationError::InvalidDelay(-1.0));
}

#[test]
fn rejected_filter_text_reports_cause() {
    let mut form = EvaluatorForm::new("p", "t", "s");
    form.filter_text = Some("\"tags\"".into());

    let err = build_create(&form, &EvalTarget::Trace.configuration()).unwrap_err();
    assert_eq!(err.to_string(), "Filter must be a JSON array");
}

proptest! {
    #[test]
    fn sampling_stays_in_unit_interval(percent in 0.0f64..=100.0) {
        let sampling = derive_sampling(percent).unwrap();
        prop_assert!(sampling > 0.0 && sampling <= 1.0);
    }

    #[test]
    fn sampling_rejects_out_of_range(percent in prop_oneof![-1.0e6f64..-1.0e-9, 100.000_001f64..1.0e6]) {
        prop_assert!(derive_sampling(percent).is_err());
    }
}
