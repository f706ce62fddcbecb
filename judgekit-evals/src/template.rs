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

//! Placeholder handling for evaluator prompt templates

use crate::mapping::MappingRow;
use crate::payload::EvalTarget;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("valid placeholder pattern"))
}

/// Distinct `{{variable}}` names in order of first appearance
pub fn extract_variables(prompt: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    placeholder_pattern()
        .captures_iter(prompt)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

/// Source column a variable most likely refers to
fn default_column(variable: &str, target: EvalTarget) -> &'static str {
    let variable = variable.to_lowercase();
    match target {
        EvalTarget::Dataset if variable.contains("expected") => "expectedOutput",
        EvalTarget::Dataset if variable.contains("metadata") => "metadata",
        EvalTarget::Trace
            if ["output", "answer", "completion", "response"]
                .iter()
                .any(|hint| variable.contains(hint)) =>
        {
            "output"
        }
        EvalTarget::Trace if variable.contains("metadata") => "metadata",
        _ => "input",
    }
}

/// Initial mapping rows for a freshly selected template
pub fn default_mapping_rows(variables: &[String], target: EvalTarget) -> Vec<MappingRow> {
    variables
        .iter()
        .map(|var| MappingRow::new(var.clone(), target.source_object(), default_column(var, target)))
        .collect()
}

/// Variables with no row, or whose row names no source column
pub fn missing_variables(variables: &[String], rows: &[MappingRow]) -> Vec<String> {
    variables
        .iter()
        .filter(|var| {
            !rows
                .iter()
                .any(|row| &row.template_var == *var && !row.object_variable.trim().is_empty())
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_variables() {
        let prompt = "Judge {{output}} against {{ expected_output }}.\nQuestion: {{input}}; again {{output}}";
        assert_eq!(
            extract_variables(prompt),
            vec!["output", "expected_output", "input"]
        );
        assert!(extract_variables("no placeholders, {single} braces, {{}}").is_empty());
    }

    #[test]
    fn test_default_rows_follow_target() {
        let vars = vec!["input".to_string(), "output".to_string(), "expected_output".to_string()];

        let trace_rows = default_mapping_rows(&vars, EvalTarget::Trace);
        assert!(trace_rows.iter().all(|r| r.object == "trace"));
        assert_eq!(trace_rows[0].object_variable, "input");
        assert_eq!(trace_rows[1].object_variable, "output");

        let dataset_rows = default_mapping_rows(&vars, EvalTarget::Dataset);
        assert!(dataset_rows.iter().all(|r| r.object == "dataset"));
        assert_eq!(dataset_rows[2].object_variable, "expectedOutput");
    }

    #[test]
    fn test_missing_variables() {
        let vars = vec!["input".to_string(), "output".to_string(), "context".to_string()];
        let rows = vec![
            MappingRow::new("input", "trace", "input"),
            MappingRow::new("output", "trace", " "),
        ];
        assert_eq!(missing_variables(&vars, &rows), vec!["output", "context"]);
    }
}
