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

//! Evaluator job payload builder
//!
//! Turns the evaluator form into the flat request objects of
//! `evals.createJob` and `evals.updateEvalJob`:
//!
//! 1. validate the filter text and the numeric fields
//! 2. renormalize the filter into wire shape
//! 3. normalize the variable mapping
//! 4. derive sampling, delay and time scope

use crate::error::{Result, ValidationError};
use crate::mapping::{normalize_mapping, MappingRow, VariableMapping};
use crate::template::missing_variables;
use judgekit_core::filter::{renormalize, FilterConfiguration, NormalizedFilter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Stand-in for a 0% sampling rate, which the backend rejects
pub const SAMPLING_EPSILON: f64 = 0.001;

/// What an evaluator runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvalTarget {
    #[default]
    Trace,
    Dataset,
}

impl EvalTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            EvalTarget::Trace => "trace",
            EvalTarget::Dataset => "dataset",
        }
    }

    /// Mapping object rows default to
    pub fn source_object(self) -> &'static str {
        self.as_str()
    }

    /// Filter columns offered for this target
    pub fn configuration(self) -> FilterConfiguration {
        match self {
            EvalTarget::Trace => FilterConfiguration::traces(),
            EvalTarget::Dataset => FilterConfiguration::dataset_items(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeScope {
    New,
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Active,
    Inactive,
}

/// Evaluator form state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorForm {
    pub project_id: String,
    pub eval_template_id: String,
    pub score_name: String,
    #[serde(default)]
    pub target: EvalTarget,
    /// Wire filter JSON as stored by the filter builder
    #[serde(default)]
    pub filter_text: Option<String>,
    #[serde(default)]
    pub mapping: Vec<MappingRow>,
    #[serde(default = "default_sampling_percent")]
    pub sampling_percent: f64,
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: f64,
    #[serde(default = "default_true")]
    pub runs_on_new: bool,
    #[serde(default)]
    pub runs_on_existing: bool,
    /// Placeholders of the selected template; each must be mapped
    #[serde(default)]
    pub template_variables: Vec<String>,
}

fn default_sampling_percent() -> f64 {
    100.0
}

fn default_delay_seconds() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

impl EvaluatorForm {
    pub fn new(
        project_id: impl Into<String>,
        eval_template_id: impl Into<String>,
        score_name: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            eval_template_id: eval_template_id.into(),
            score_name: score_name.into(),
            target: EvalTarget::default(),
            filter_text: None,
            mapping: Vec::new(),
            sampling_percent: default_sampling_percent(),
            delay_seconds: default_delay_seconds(),
            runs_on_new: true,
            runs_on_existing: false,
            template_variables: Vec::new(),
        }
    }
}

/// Body of `evals.createJob`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvalJob {
    pub project_id: String,
    pub eval_template_id: String,
    pub score_name: String,
    pub target: EvalTarget,
    pub filter: Vec<NormalizedFilter>,
    pub mapping: Vec<VariableMapping>,
    pub sampling: f64,
    /// Milliseconds
    pub delay: u64,
    pub time_scope: Vec<TimeScope>,
}

/// Body of `evals.updateEvalJob`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvalJob {
    pub eval_config_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(flatten)]
    pub job: CreateEvalJob,
}

/// Percentage in [0, 100] to a sampling fraction in (0, 1]
pub fn derive_sampling(percent: f64) -> Result<f64> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::SamplingOutOfRange(percent));
    }
    let fraction = percent / 100.0;
    Ok(if fraction == 0.0 { SAMPLING_EPSILON } else { fraction })
}

pub fn derive_delay_ms(seconds: f64) -> Result<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ValidationError::InvalidDelay(seconds));
    }
    Ok((seconds * 1000.0).round() as u64)
}

/// Selected scopes, `[NEW]` when nothing is selected
pub fn derive_time_scope(runs_on_new: bool, runs_on_existing: bool) -> Vec<TimeScope> {
    let mut scope = Vec::with_capacity(2);
    if runs_on_new {
        scope.push(TimeScope::New);
    }
    if runs_on_existing {
        scope.push(TimeScope::Existing);
    }
    if scope.is_empty() {
        scope.push(TimeScope::New);
    }
    scope
}

/// Parse stored filter text into canonical wire filters. Blank text means
/// no filter.
pub fn parse_filter(
    text: Option<&str>,
    configuration: &FilterConfiguration,
) -> Result<Vec<NormalizedFilter>> {
    let text = match text.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(text) => text,
    };

    let value: Value = serde_json::from_str(text)
        .map_err(|e| ValidationError::InvalidFilterJson(e.to_string()))?;
    if !value.is_array() {
        return Err(ValidationError::FilterNotArray);
    }
    Ok(renormalize(&value, configuration))
}

pub fn build_create(form: &EvaluatorForm, configuration: &FilterConfiguration) -> Result<CreateEvalJob> {
    let filter = parse_filter(form.filter_text.as_deref(), configuration)?;
    let sampling = derive_sampling(form.sampling_percent)?;
    let delay = derive_delay_ms(form.delay_seconds)?;

    let unmapped = missing_variables(&form.template_variables, &form.mapping);
    if !unmapped.is_empty() {
        return Err(ValidationError::UnmappedVariables(unmapped));
    }

    debug!(
        "Built evaluator job payload: template={}, filters={}, sampling={}, delay_ms={}",
        form.eval_template_id,
        filter.len(),
        sampling,
        delay
    );

    Ok(CreateEvalJob {
        project_id: form.project_id.clone(),
        eval_template_id: form.eval_template_id.clone(),
        score_name: form.score_name.clone(),
        target: form.target,
        filter,
        mapping: normalize_mapping(&form.mapping),
        sampling,
        delay,
        time_scope: derive_time_scope(form.runs_on_new, form.runs_on_existing),
    })
}

pub fn build_update(
    eval_config_id: impl Into<String>,
    status: Option<JobStatus>,
    form: &EvaluatorForm,
    configuration: &FilterConfiguration,
) -> Result<UpdateEvalJob> {
    Ok(UpdateEvalJob {
        eval_config_id: eval_config_id.into(),
        status,
        job: build_create(form, configuration)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> EvaluatorForm {
        let mut form = EvaluatorForm::new("proj-1", "tmpl-1", "helpfulness");
        form.mapping = vec![MappingRow::new("input", "trace", "input")];
        form
    }

    #[test]
    fn test_sampling() {
        assert_eq!(derive_sampling(0.0).unwrap(), SAMPLING_EPSILON);
        assert_eq!(derive_sampling(100.0).unwrap(), 1.0);
        assert_eq!(derive_sampling(25.0).unwrap(), 0.25);
        assert!(derive_sampling(100.5).is_err());
        assert!(derive_sampling(-1.0).is_err());
        assert!(derive_sampling(f64::NAN).is_err());
    }

    #[test]
    fn test_delay() {
        for (seconds, ms) in [(0.0, 0), (1.0, 1_000), (30.0, 30_000), (86_400.0, 86_400_000)] {
            assert_eq!(derive_delay_ms(seconds).unwrap(), ms);
        }
        assert_eq!(derive_delay_ms(-5.0), Err(ValidationError::InvalidDelay(-5.0)));
        assert!(derive_delay_ms(f64::INFINITY).is_err());
    }

    #[test]
    fn test_time_scope() {
        assert_eq!(derive_time_scope(false, false), vec![TimeScope::New]);
        assert_eq!(derive_time_scope(true, false), vec![TimeScope::New]);
        assert_eq!(derive_time_scope(false, true), vec![TimeScope::Existing]);
        assert_eq!(
            derive_time_scope(true, true),
            vec![TimeScope::New, TimeScope::Existing]
        );
    }

    #[test]
    fn test_filter_text_validation() {
        let config = FilterConfiguration::traces();
        assert!(parse_filter(None, &config).unwrap().is_empty());
        assert!(parse_filter(Some("   "), &config).unwrap().is_empty());
        assert!(matches!(
            parse_filter(Some("[{"), &config),
            Err(ValidationError::InvalidFilterJson(_))
        ));
        assert_eq!(
            parse_filter(Some(r#"{"column": "name"}"#), &config),
            Err(ValidationError::FilterNotArray)
        );
    }

    #[test]
    fn test_build_create_payload() {
        let mut form = form();
        form.filter_text = Some(
            r#"[{"column": "Dataset", "op": "anyOf", "value": ["ds-1"]}, {"column": "userId", "operator": "="}]"#
                .to_string(),
        );
        form.sampling_percent = 50.0;
        form.delay_seconds = 10.0;
        form.runs_on_existing = true;

        let payload = build_create(&form, &FilterConfiguration::traces()).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            json,
            json!({
                "projectId": "proj-1",
                "evalTemplateId": "tmpl-1",
                "scoreName": "helpfulness",
                "target": "trace",
                "filter": [
                    {"column": "datasetId", "columnId": "datasetId", "type": "stringOptions", "op": "anyOf", "value": ["ds-1"]},
                    {"column": "userId", "columnId": "userId", "type": "string", "op": "eq", "value": [""]}
                ],
                "mapping": [
                    {"templateVariable": "input", "langfuseObject": "trace", "selectedColumnId": "input", "jsonSelector": null}
                ],
                "sampling": 0.5,
                "delay": 10000,
                "timeScope": ["NEW", "EXISTING"]
            })
        );
    }

    #[test]
    fn test_build_update_is_flat() {
        let payload =
            build_update("cfg-9", Some(JobStatus::Inactive), &form(), &FilterConfiguration::traces())
                .unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["evalConfigId"], "cfg-9");
        assert_eq!(json["status"], "INACTIVE");
        assert_eq!(json["projectId"], "proj-1");
        assert_eq!(json["timeScope"], json!(["NEW"]));
        assert!(json.get("job").is_none());

        let without_status =
            build_update("cfg-9", None, &form(), &FilterConfiguration::traces()).unwrap();
        assert!(serde_json::to_value(&without_status).unwrap().get("status").is_none());
    }

    #[test]
    fn test_unmapped_variables_rejected() {
        let mut form = form();
        form.template_variables = vec!["input".into(), "output".into()];

        let err = build_create(&form, &FilterConfiguration::traces()).unwrap_err();
        assert_eq!(err, ValidationError::UnmappedVariables(vec!["output".into()]));
        assert_eq!(err.to_string(), "Template variables without a mapping: output");
    }

    #[test]
    fn test_form_defaults_from_json() {
        let form: EvaluatorForm = serde_json::from_value(json!({
            "projectId": "p",
            "evalTemplateId": "t",
            "scoreName": "s"
        }))
        .unwrap();

        assert_eq!(form.target, EvalTarget::Trace);
        assert_eq!(form.sampling_percent, 100.0);
        assert_eq!(form.delay_seconds, 30.0);
        assert!(form.runs_on_new);
        assert!(!form.runs_on_existing);
    }
}
