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

//! Legacy column labels that older filter builders stored as keys

use super::column::ColumnType;

/// A display label that was persisted in place of a column key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnAlias {
    pub label: &'static str,
    pub key: &'static str,
    pub column_type: ColumnType,
}

pub const COLUMN_ALIASES: &[ColumnAlias] = &[ColumnAlias {
    label: "Dataset",
    key: "datasetId",
    column_type: ColumnType::StringOptions,
}];

/// Alias entry for a legacy label, if the column is one
pub fn resolve_alias(column: &str) -> Option<&'static ColumnAlias> {
    COLUMN_ALIASES.iter().find(|a| a.label == column)
}

/// Alias entry whose key is `key`
pub fn alias_for_key(key: &str) -> Option<&'static ColumnAlias> {
    COLUMN_ALIASES.iter().find(|a| a.key == key)
}

/// Legacy label for a key that has one
pub fn legacy_label(key: &str) -> Option<&'static str> {
    alias_for_key(key).map(|a| a.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_alias() {
        let alias = resolve_alias("Dataset").unwrap();
        assert_eq!(alias.key, "datasetId");
        assert_eq!(alias.column_type, ColumnType::StringOptions);
        assert!(resolve_alias("datasetId").is_none());
        assert_eq!(legacy_label("datasetId"), Some("Dataset"));
        assert_eq!(legacy_label("name"), None);
    }
}
