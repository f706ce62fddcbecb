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

//! HTTP-level tests of the tRPC client against a mock backend

use judgekit_client::{
    create_job, delete_job, list_traces, CandidateChain, ClientConfig, FilterOptionsLoader,
    RpcError, RpcTransport, TraceListRequest, TrpcClient,
};
use judgekit_core::filter::FilterConfiguration;
use judgekit_evals::{build_create, EvaluatorForm, MappingRow};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;

fn client(server: &mockito::ServerGuard) -> TrpcClient {
    TrpcClient::new(ClientConfig::new(server.url()).with_api_key("sk-test")).unwrap()
}

fn ok_body(payload: serde_json::Value) -> String {
    json!({ "result": { "data": { "json": payload } } }).to_string()
}

fn not_found_body(procedure: &str) -> String {
    json!({
        "error": { "json": {
            "message": format!("No \"query\"-procedure on path \"{}\"", procedure),
            "code": -32004,
            "data": { "code": "NOT_FOUND", "httpStatus": 404, "path": procedure }
        }}
    })
    .to_string()
}

#[tokio::test]
async fn create_job_posts_enveloped_payload() {
    let mut server = mockito::Server::new_async().await;

    let mut form = EvaluatorForm::new("proj-1", "tmpl-1", "toxicity");
    form.mapping = vec![MappingRow::new("output", "trace", "output")];
    let job = build_create(&form, &FilterConfiguration::traces()).unwrap();

    let mock = server
        .mock("POST", "/api/trpc/evals.createJob")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::Json(json!({ "json": serde_json::to_value(&job).unwrap() })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ok_body(json!({ "id": "cfg-1", "status": "ACTIVE" })))
        .expect(1)
        .create_async()
        .await;

    let created = create_job(&client(&server), &job).await.unwrap();
    assert_eq!(created["id"], "cfg-1");
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_job_surfaces_rpc_errors() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/trpc/evals.deleteEvalJob")
        .match_body(Matcher::Json(json!({ "json": { "projectId": "p", "evalConfigId": "cfg-1" } })))
        .with_status(403)
        .with_body(
            json!({ "error": { "json": {
                "message": "User does not have access",
                "code": -32003,
                "data": { "code": "FORBIDDEN", "httpStatus": 403 }
            }}})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let err = delete_job(&client(&server), "p", "cfg-1").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "evals.deleteEvalJob returned FORBIDDEN (HTTP 403): User does not have access"
    );
    assert!(!err.is_schema_skew());
    mock.assert_async().await;
}

#[tokio::test]
async fn query_sends_input_as_url_parameter() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/trpc/traces.filterOptions")
        .match_query(Matcher::UrlEncoded(
            "input".into(),
            r#"{"json":{"projectId":"p1"}}"#.into(),
        ))
        .with_status(200)
        .with_body(ok_body(json!({ "name": ["chat"] })))
        .create_async()
        .await;

    let payload = client(&server)
        .query("traces.filterOptions", json!({ "projectId": "p1" }))
        .await
        .unwrap();
    assert_eq!(payload, json!({ "name": ["chat"] }));
    mock.assert_async().await;
}

#[tokio::test]
async fn trace_list_falls_back_to_legacy_procedure() {
    let mut server = mockito::Server::new_async().await;
    let current = server
        .mock("GET", "/api/trpc/traces.all")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(not_found_body("traces.all"))
        .expect(3)
        .create_async()
        .await;
    let legacy = server
        .mock("GET", "/api/trpc/traces.allInput")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ok_body(json!({ "traces": [{ "id": "t1" }], "totalCount": 1 })))
        .expect(2)
        .create_async()
        .await;

    let client = client(&server);
    let chain = CandidateChain::trace_list();
    let request = TraceListRequest::new("proj-1", Vec::new());

    let page = list_traces(&client, &chain, &request).await.unwrap();
    assert_eq!(page.rows, vec![json!({ "id": "t1" })]);
    assert_eq!(page.total, Some(1));

    // second call goes straight to the cached candidate
    list_traces(&client, &chain, &request).await.unwrap();

    current.assert_async().await;
    legacy.assert_async().await;
}

#[tokio::test]
async fn server_errors_do_not_walk_the_chain() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/trpc/traces.all")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("upstream timeout")
        .expect(1)
        .create_async()
        .await;

    let err = list_traces(
        &client(&server),
        &CandidateChain::trace_list(),
        &TraceListRequest::new("proj-1", Vec::new()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RpcError::Http { status: 500, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn filter_options_are_fetched_once_per_project() {
    let mut server = mockito::Server::new_async().await;
    let options = server
        .mock("GET", "/api/trpc/traces.filterOptions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ok_body(json!({ "name": ["chat", "rag"], "tags": [{ "value": "prod" }] })))
        .expect(1)
        .create_async()
        .await;
    let datasets = server
        .mock("GET", "/api/trpc/datasets.allDatasetMeta")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ok_body(json!([{ "id": "ds-1", "name": "Golden" }])))
        .expect(1)
        .create_async()
        .await;

    let loader = FilterOptionsLoader::new(Arc::new(client(&server)));

    let mut traces = FilterConfiguration::traces();
    assert_eq!(loader.configure("proj-1", &mut traces).await.unwrap(), 2);
    assert_eq!(traces.get("name").unwrap().options.len(), 2);

    let mut dataset_items = FilterConfiguration::dataset_items();
    assert_eq!(loader.configure("proj-1", &mut dataset_items).await.unwrap(), 1);
    assert_eq!(dataset_items.get("datasetId").unwrap().options[0].value, "ds-1");

    options.assert_async().await;
    datasets.assert_async().await;
}

#[tokio::test]
async fn dataset_meta_failure_still_yields_trace_options() {
    let mut server = mockito::Server::new_async().await;
    let options = server
        .mock("GET", "/api/trpc/traces.filterOptions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ok_body(json!({ "name": ["chat"], "tags": ["prod"] })))
        .expect(2)
        .create_async()
        .await;
    let datasets = server
        .mock("GET", "/api/trpc/datasets.allDatasetMeta")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("upstream down")
        .expect(2)
        .create_async()
        .await;

    let loader = FilterOptionsLoader::new(Arc::new(client(&server)));

    let mut traces = FilterConfiguration::traces();
    assert_eq!(loader.configure("proj-1", &mut traces).await.unwrap(), 2);
    assert_eq!(traces.get("tags").unwrap().options[0].value, "prod");

    // Partial options are not cached, so the next load retries datasets
    let retried = loader.load("proj-1").await.unwrap();
    assert!(retried.get("datasetId").is_none());

    options.assert_async().await;
    datasets.assert_async().await;
}
