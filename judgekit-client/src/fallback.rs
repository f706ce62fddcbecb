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

//! Fallback across backend procedure variants
//!
//! Backends deployed at different versions disagree on procedure names,
//! input shapes and sortable columns. A [`CandidateChain`] holds the known
//! request shapes in preference order, tries them one after another while
//! the failures look like schema skew, and remembers per project which one
//! worked so later calls go straight to it.

use crate::client::RpcTransport;
use crate::error::{Result, RpcError};
use judgekit_core::filter::NormalizedFilter;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Input shape a procedure accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySchema {
    /// `page` plus `orderBy: {column, order}`
    Current,
    /// `offset` plus a bare `orderBy` column and `orderDirection`
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub procedure: String,
    pub schema: QuerySchema,
    pub order_by_column: String,
}

impl Candidate {
    pub fn new(procedure: impl Into<String>, schema: QuerySchema, order_by_column: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            schema,
            order_by_column: order_by_column.into(),
        }
    }
}

/// Ordered candidates with the per-project winner cached
pub struct CandidateChain {
    family: String,
    candidates: Vec<Candidate>,
    selected: Cache<String, usize>,
}

impl CandidateChain {
    pub fn new(family: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        let selected = Cache::builder()
            .max_capacity(1_000)
            .time_to_idle(Duration::from_secs(60 * 60))
            .build();

        Self {
            family: family.into(),
            candidates,
            selected,
        }
    }

    /// `traces.all` then `traces.allInput`, each ordered by `timestamp`,
    /// `createdAt` or `startTime`
    pub fn trace_list() -> Self {
        let mut candidates = Vec::new();
        for (procedure, schema) in [
            ("traces.all", QuerySchema::Current),
            ("traces.allInput", QuerySchema::Legacy),
        ] {
            for column in ["timestamp", "createdAt", "startTime"] {
                candidates.push(Candidate::new(procedure, schema, column));
            }
        }
        Self::new("trace list", candidates)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Candidate that last succeeded for `scope`
    pub async fn selected(&self, scope: &str) -> Option<&Candidate> {
        let index = self.selected.get(scope).await?;
        self.candidates.get(index)
    }

    pub async fn forget(&self, scope: &str) {
        self.selected.invalidate(scope).await;
    }

    /// Try candidates until one succeeds. The cached candidate for `scope`
    /// goes first, the rest follow in list order. Errors that are not schema
    /// skew stop the chain.
    pub async fn run<T, F, Fut>(&self, scope: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(Candidate) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let cached = self
            .selected
            .get(scope)
            .await
            .filter(|i| *i < self.candidates.len());

        let order = cached
            .into_iter()
            .chain((0..self.candidates.len()).filter(|i| Some(*i) != cached));

        let mut last = None;
        for index in order {
            let candidate = self.candidates[index].clone();
            debug!(
                "{}: trying {} ({:?}, order by {})",
                self.family, candidate.procedure, candidate.schema, candidate.order_by_column
            );

            match attempt(candidate).await {
                Ok(value) => {
                    if cached != Some(index) {
                        let winner = &self.candidates[index];
                        info!(
                            "{}: using {} ordered by {} for {}",
                            self.family, winner.procedure, winner.order_by_column, scope
                        );
                        self.selected.insert(scope.to_string(), index).await;
                    }
                    return Ok(value);
                }
                Err(e) if e.is_schema_skew() => {
                    debug!("{}: candidate rejected: {}", self.family, e);
                    last = Some(Box::new(e));
                }
                Err(e) => return Err(e),
            }
        }

        if cached.is_some() {
            self.forget(scope).await;
        }
        Err(RpcError::AllCandidatesFailed {
            family: self.family.clone(),
            last,
        })
    }
}

/// Trace list query, rendered per candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceListRequest {
    pub project_id: String,
    #[serde(default)]
    pub filter: Vec<NormalizedFilter>,
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub search_query: Option<String>,
}

fn default_limit() -> u32 {
    50
}

impl TraceListRequest {
    pub fn new(project_id: impl Into<String>, filter: Vec<NormalizedFilter>) -> Self {
        Self {
            project_id: project_id.into(),
            filter,
            page: 0,
            limit: default_limit(),
            search_query: None,
        }
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    /// Procedure input for a candidate
    pub fn render(&self, candidate: &Candidate) -> Value {
        let mut input = Map::new();
        input.insert("projectId".into(), json!(self.project_id));
        input.insert("filter".into(), json!(self.filter));
        if let Some(query) = self.search_query.as_deref().filter(|q| !q.is_empty()) {
            input.insert("searchQuery".into(), json!(query));
        }
        input.insert("limit".into(), json!(self.limit));

        match candidate.schema {
            QuerySchema::Current => {
                input.insert("page".into(), json!(self.page));
                input.insert(
                    "orderBy".into(),
                    json!({ "column": candidate.order_by_column, "order": "DESC" }),
                );
            }
            QuerySchema::Legacy => {
                input.insert(
                    "offset".into(),
                    json!(u64::from(self.page) * u64::from(self.limit)),
                );
                input.insert("orderBy".into(), json!(candidate.order_by_column));
                input.insert("orderDirection".into(), json!("DESC"));
            }
        }
        Value::Object(input)
    }
}

/// One page of trace rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TracePage {
    pub rows: Vec<Value>,
    pub total: Option<u64>,
}

impl TracePage {
    /// Accepts a bare array or an object carrying the rows under `traces`,
    /// `rows` or `data`
    pub fn from_payload(procedure: &str, payload: Value) -> Result<Self> {
        match payload {
            Value::Array(rows) => Ok(Self { rows, total: None }),
            Value::Object(mut obj) => {
                let rows = ["traces", "rows", "data"]
                    .iter()
                    .find_map(|field| match obj.remove(*field) {
                        Some(Value::Array(rows)) => Some(rows),
                        _ => None,
                    })
                    .ok_or_else(|| RpcError::MissingData {
                        procedure: procedure.to_string(),
                        status: None,
                    })?;
                let total = ["totalCount", "total"]
                    .iter()
                    .find_map(|field| obj.get(*field).and_then(Value::as_u64));
                Ok(Self { rows, total })
            }
            _ => Err(RpcError::MissingData {
                procedure: procedure.to_string(),
                status: None,
            }),
        }
    }
}

/// Fetch one page of traces through the chain, scoped by project
pub async fn list_traces<T: RpcTransport + ?Sized>(
    transport: &T,
    chain: &CandidateChain,
    request: &TraceListRequest,
) -> Result<TracePage> {
    chain
        .run(&request.project_id, |candidate| async move {
            let payload = transport
                .query(&candidate.procedure, request.render(&candidate))
                .await?;
            TracePage::from_payload(&candidate.procedure, payload)
        })
        .await
}
