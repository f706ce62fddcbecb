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

//! Out-of-order preview responses

use async_trait::async_trait;
use judgekit_client::{
    CandidateChain, PreviewLoader, Result, RpcError, RpcTransport, TraceListRequest,
    LOAD_FAILED_NOTE,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Transport whose responses are released by the test, keyed by the
/// request's search query
#[derive(Default)]
struct GatedTransport {
    pending: Mutex<HashMap<String, oneshot::Receiver<Result<Value>>>>,
}

impl GatedTransport {
    fn gate(&self, search: &str) -> oneshot::Sender<Result<Value>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(search.to_string(), rx);
        tx
    }
}

#[async_trait]
impl RpcTransport for GatedTransport {
    async fn query(&self, procedure: &str, input: Value) -> Result<Value> {
        let search = input["searchQuery"].as_str().unwrap_or_default().to_string();
        let rx = self.pending.lock().remove(&search);
        match rx {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(RpcError::MissingData {
                    procedure: procedure.to_string(),
                    status: None,
                })
            }),
            None => Ok(json!([])),
        }
    }

    async fn mutate(&self, procedure: &str, _input: Value) -> Result<Value> {
        Err(RpcError::MissingData {
            procedure: procedure.to_string(),
            status: None,
        })
    }
}

fn request(search: &str) -> TraceListRequest {
    TraceListRequest::new("proj-1", Vec::new()).with_search(search)
}

#[tokio::test]
async fn late_response_of_older_request_is_discarded() {
    let transport = Arc::new(GatedTransport::default());
    let release_a = transport.gate("a");
    let release_b = transport.gate("b");
    let loader = PreviewLoader::new(transport.clone(), Arc::new(CandidateChain::trace_list()));

    let ticket_a = loader.begin();
    let ticket_b = loader.begin();
    let (request_a, request_b) = (request("a"), request("b"));

    let driver = async {
        release_b.send(Ok(json!([{ "id": "from-b" }]))).unwrap();
        while loader.state().ticket != Some(ticket_b) {
            tokio::task::yield_now().await;
        }
        release_a.send(Ok(json!([{ "id": "from-a" }]))).unwrap();
    };

    let (a, b, ()) = tokio::join!(
        loader.complete(ticket_a, &request_a),
        loader.complete(ticket_b, &request_b),
        driver
    );

    assert!(a.is_none());
    assert_eq!(b.unwrap().rows, vec![json!({ "id": "from-b" })]);
    assert_eq!(loader.state().rows, vec![json!({ "id": "from-b" })]);
}

#[tokio::test]
async fn newest_request_wins_in_issue_order() {
    let transport = Arc::new(GatedTransport::default());
    let loader = PreviewLoader::new(transport, Arc::new(CandidateChain::trace_list()));

    let first = loader.load(&request("x")).await.unwrap();
    assert!(first.rows.is_empty());
    assert!(!first.is_failed());

    let second = loader.load(&request("y")).await.unwrap();
    assert!(second.ticket > first.ticket);
    assert_eq!(loader.state(), second);
}

#[tokio::test]
async fn failures_degrade_to_note() {
    let transport = Arc::new(GatedTransport::default());
    let release = transport.gate("broken");
    release
        .send(Err(RpcError::Http {
            procedure: "traces.all".into(),
            status: 500,
            message: "boom".into(),
        }))
        .unwrap();

    let loader = PreviewLoader::new(transport, Arc::new(CandidateChain::trace_list()));
    let state = loader.load(&request("broken")).await.unwrap();

    assert!(state.rows.is_empty());
    assert_eq!(state.note.as_deref(), Some(LOAD_FAILED_NOTE));
    assert_eq!(loader.state(), state);
}
