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

//! Variable mapping rows
//!
//! A mapping row binds one `{{variable}}` of an evaluator prompt to a field
//! of the object the evaluator runs on, optionally narrowed by a JSON path.

use serde::{Deserialize, Serialize};

/// Mapping row as the evaluator form holds it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRow {
    pub template_var: String,
    /// Source object: `trace`, `dataset`, `span`, `generation`, `event`
    pub object: String,
    pub object_variable: String,
    #[serde(default)]
    pub json_path: Option<String>,
}

impl MappingRow {
    pub fn new(
        template_var: impl Into<String>,
        object: impl Into<String>,
        object_variable: impl Into<String>,
    ) -> Self {
        Self {
            template_var: template_var.into(),
            object: object.into(),
            object_variable: object_variable.into(),
            json_path: None,
        }
    }

    pub fn with_json_path(mut self, json_path: impl Into<String>) -> Self {
        self.json_path = Some(json_path.into());
        self
    }
}

/// Mapping entry in the shape `evals.createJob` expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMapping {
    pub template_variable: String,
    pub langfuse_object: String,
    pub selected_column_id: String,
    /// Always serialized, `null` when no path was given
    pub json_selector: Option<String>,
}

/// Backend code of a source object
pub fn object_code(object: &str) -> String {
    let object = object.trim().to_lowercase();
    match object.as_str() {
        "dataset" => "dataset_item".to_string(),
        _ => object,
    }
}

pub fn normalize_row(row: &MappingRow) -> VariableMapping {
    let json_selector = row
        .json_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    VariableMapping {
        template_variable: row.template_var.clone(),
        langfuse_object: object_code(&row.object),
        selected_column_id: row.object_variable.clone(),
        json_selector,
    }
}

pub fn normalize_mapping(rows: &[MappingRow]) -> Vec<VariableMapping> {
    rows.iter().map(normalize_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_codes() {
        assert_eq!(object_code("trace"), "trace");
        assert_eq!(object_code("dataset"), "dataset_item");
        assert_eq!(object_code("dataset_item"), "dataset_item");
        assert_eq!(object_code("Generation"), "generation");
        assert_eq!(object_code(" span "), "span");
    }

    #[test]
    fn test_blank_json_path_becomes_null() {
        let rows = vec![
            MappingRow::new("input", "trace", "input").with_json_path("  "),
            MappingRow::new("answer", "dataset", "expectedOutput").with_json_path("$.answer"),
        ];
        let mapping = serde_json::to_value(normalize_mapping(&rows)).unwrap();

        assert_eq!(
            mapping,
            json!([
                {"templateVariable": "input", "langfuseObject": "trace", "selectedColumnId": "input", "jsonSelector": null},
                {"templateVariable": "answer", "langfuseObject": "dataset_item", "selectedColumnId": "expectedOutput", "jsonSelector": "$.answer"}
            ])
        );
    }

    #[test]
    fn test_row_deserializes_without_json_path() {
        let row: MappingRow = serde_json::from_value(
            json!({"templateVar": "q", "object": "span", "objectVariable": "metadata"}),
        )
        .unwrap();
        assert_eq!(row.json_path, None);
    }
}
