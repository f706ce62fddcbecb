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

//! Runtime option values for option-typed filter columns
//!
//! Screens render their filter builder with the fixed column list right
//! away and fill in option values (trace names, tags, datasets, ...) once
//! they arrive. Values are fetched once per project.

use crate::client::RpcTransport;
use crate::error::Result;
use judgekit_core::filter::{ColumnOption, FilterConfiguration};
use moka::future::Cache;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const FILTER_OPTIONS: &str = "traces.filterOptions";
pub const DATASET_META: &str = "datasets.allDatasetMeta";

/// Option values keyed by column, in response order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeOptions {
    pub columns: Vec<(String, Vec<ColumnOption>)>,
}

impl RuntimeOptions {
    /// `traces.filterOptions` payload: an object of column key to either
    /// plain strings or `{value, label?, count?}` entries
    pub fn from_filter_options(payload: &Value) -> Self {
        let columns = payload
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter_map(|(key, entries)| {
                        let entries = entries.as_array()?;
                        Some((key.clone(), entries.iter().filter_map(parse_option).collect()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { columns }
    }

    /// `datasets.allDatasetMeta` payload: `[{id, name}]`, mapped onto the
    /// `datasetId` column
    pub fn push_datasets(&mut self, payload: &Value) {
        let datasets: Vec<ColumnOption> = payload
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let id = item.get("id").and_then(Value::as_str)?;
                        Some(match item.get("name").and_then(Value::as_str) {
                            Some(name) => ColumnOption::labeled(id, name),
                            None => ColumnOption::plain(id),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.columns.push(("datasetId".to_string(), datasets));
    }

    pub fn get(&self, key: &str) -> Option<&[ColumnOption]> {
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, options)| options.as_slice())
    }

    /// Merge into a configuration. Keys the configuration has no column
    /// for are skipped. Returns the number of columns updated.
    pub fn apply(&self, configuration: &mut FilterConfiguration) -> usize {
        self.columns
            .iter()
            .filter(|(key, options)| configuration.set_options(key, options.clone()))
            .count()
    }
}

fn parse_option(entry: &Value) -> Option<ColumnOption> {
    match entry {
        Value::String(value) => Some(ColumnOption::plain(value.as_str())),
        Value::Object(obj) => {
            let value = obj.get("value").and_then(Value::as_str)?;
            Some(match obj.get("label").and_then(Value::as_str) {
                Some(label) => ColumnOption::labeled(value, label),
                None => ColumnOption::plain(value),
            })
        }
        _ => None,
    }
}

/// Loads and caches runtime options per project
pub struct FilterOptionsLoader<T: RpcTransport + ?Sized> {
    transport: Arc<T>,
    cache: Cache<String, RuntimeOptions>,
}

impl<T: RpcTransport + ?Sized> FilterOptionsLoader<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(5 * 60))
            .build();

        Self { transport, cache }
    }

    pub async fn load(&self, project_id: &str) -> Result<RuntimeOptions> {
        if let Some(options) = self.cache.get(project_id).await {
            debug!("Filter options for project {} served from cache", project_id);
            return Ok(options);
        }

        let input = json!({ "projectId": project_id });
        let filter_options = self.transport.query(FILTER_OPTIONS, input.clone()).await?;
        let mut options = RuntimeOptions::from_filter_options(&filter_options);

        // Dataset options are optional; a partial result is not cached
        let complete = match self.transport.query(DATASET_META, input).await {
            Ok(datasets) => {
                options.push_datasets(&datasets);
                true
            }
            Err(e) => {
                warn!("Dataset options unavailable for project {}: {}", project_id, e);
                false
            }
        };

        debug!(
            "Loaded filter options for {} columns in project {}",
            options.columns.len(),
            project_id
        );
        if complete {
            self.cache.insert(project_id.to_string(), options.clone()).await;
        }
        Ok(options)
    }

    /// Load options for `project_id` and merge them into `configuration`
    pub async fn configure(&self, project_id: &str, configuration: &mut FilterConfiguration) -> Result<usize> {
        let options = self.load(project_id).await?;
        Ok(options.apply(configuration))
    }

    pub async fn invalidate(&self, project_id: &str) {
        self.cache.invalidate(project_id).await;
    }
}
