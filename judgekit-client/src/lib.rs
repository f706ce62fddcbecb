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

//! # judgekit client
//!
//! Async client for the backend procedures used by the trace list and the
//! evaluator screens.
//!
//! ## Quick Start
//!
//! ```no_run
//! use judgekit_client::{list_traces, CandidateChain, ClientConfig, TraceListRequest, TrpcClient};
//! use judgekit_core::filter::{to_wire, FilterConfiguration, FilterExpression};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TrpcClient::new(ClientConfig::new("http://localhost:3000").with_api_key("sk-..."))?;
//!     let chain = CandidateChain::trace_list();
//!
//!     let config = FilterConfiguration::traces();
//!     let filter = to_wire(&[FilterExpression::new("tags", "any of", vec!["prod"])], &config);
//!
//!     let page = list_traces(&client, &chain, &TraceListRequest::new("proj-1", filter)).await?;
//!     println!("{} traces", page.rows.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod evals;
pub mod fallback;
pub mod options;
pub mod preview;

pub use client::{decode, encode, unwrap_envelope, ClientConfig, RpcTransport, TrpcClient};
pub use context::{ContextError, ContextStore, ProjectContext};
pub use error::{Result, RpcError};
pub use evals::{create_job, delete_job, update_job};
pub use fallback::{list_traces, Candidate, CandidateChain, QuerySchema, TraceListRequest, TracePage};
pub use options::{FilterOptionsLoader, RuntimeOptions};
pub use preview::{PreviewGuard, PreviewLoader, PreviewState, Ticket, LOAD_FAILED_NOTE};
