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

//! tRPC-over-HTTP client
//!
//! Queries are `GET /api/trpc/<procedure>?input=<{"json": params}>`,
//! mutations `POST /api/trpc/<procedure>` with the same envelope as body.
//! Successful responses look like `{"result": {"data": {"json": payload}}}`.

use crate::error::{Result, RpcError};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Longest response body quoted in an error message
const MAX_ERROR_BODY: usize = 512;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the web backend
    pub base_url: String,
    /// Sent as a bearer token when set
    pub api_key: Option<String>,
    /// Request timeout (default: 30 seconds)
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

/// Procedure-call seam. [`TrpcClient`] talks HTTP; tests substitute
/// in-memory transports.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Read-only procedure
    async fn query(&self, procedure: &str, input: Value) -> Result<Value>;

    /// State-changing procedure. Never retried.
    async fn mutate(&self, procedure: &str, input: Value) -> Result<Value>;
}

pub struct TrpcClient {
    config: ClientConfig,
    http_client: HttpClient,
}

impl TrpcClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RpcError::Client)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn call(&self, method: Method, procedure: &str, input: Value) -> Result<Value> {
        let url = format!(
            "{}/api/trpc/{}",
            self.config.base_url.trim_end_matches('/'),
            procedure
        );
        let envelope = json!({ "json": input });
        debug!("tRPC {} {}", method, procedure);

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .header("Content-Type", "application/json");

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        request = if method == Method::GET {
            request.query(&[("input", envelope.to_string())])
        } else {
            request.json(&envelope)
        };

        let response = request.send().await.map_err(|source| RpcError::Transport {
            procedure: procedure.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|source| RpcError::Transport {
            procedure: procedure.to_string(),
            source,
        })?;

        unwrap_envelope(procedure, status.as_u16(), &body)
    }
}

#[async_trait]
impl RpcTransport for TrpcClient {
    async fn query(&self, procedure: &str, input: Value) -> Result<Value> {
        self.call(Method::GET, procedure, input).await
    }

    async fn mutate(&self, procedure: &str, input: Value) -> Result<Value> {
        self.call(Method::POST, procedure, input).await
    }
}

/// Extract the payload from a tRPC response body. An `error` member, a
/// non-2xx status or a missing `result.data` is a failure.
pub fn unwrap_envelope(procedure: &str, status: u16, body: &str) -> Result<Value> {
    let success = (200..300).contains(&status);

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !success => return Err(http_error(procedure, status, body)),
        Err(source) => {
            return Err(RpcError::Decode {
                procedure: procedure.to_string(),
                status: Some(status),
                source,
            })
        }
    };

    if let Some(error) = value.get("error") {
        return Err(rpc_error(procedure, status, error));
    }
    if !success {
        return Err(http_error(procedure, status, body));
    }

    let data = value
        .pointer("/result/data")
        .ok_or_else(|| RpcError::MissingData {
            procedure: procedure.to_string(),
            status: Some(status),
        })?;

    Ok(match data.get("json") {
        Some(payload) => payload.clone(),
        None => data.clone(),
    })
}

fn http_error(procedure: &str, status: u16, body: &str) -> RpcError {
    let mut message: String = body.chars().take(MAX_ERROR_BODY).collect();
    if message.is_empty() {
        message = "empty response".to_string();
    }
    RpcError::Http {
        procedure: procedure.to_string(),
        status,
        message,
    }
}

/// `{"json": {"message": .., "code": -32004, "data": {"code": "NOT_FOUND", "httpStatus": 404}}}`
fn rpc_error(procedure: &str, status: u16, error: &Value) -> RpcError {
    let error = error.get("json").unwrap_or(error);

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();

    let code = error
        .pointer("/data/code")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.get("code").map(|c| c.to_string().trim_matches('"').to_string()))
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let status = error
        .pointer("/data/httpStatus")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .or(Some(status).filter(|s| *s != 200));

    RpcError::Rpc {
        procedure: procedure.to_string(),
        code,
        message,
        status,
    }
}

/// Serialize a typed input for a procedure
pub fn encode<I: Serialize + ?Sized>(procedure: &str, input: &I) -> Result<Value> {
    serde_json::to_value(input).map_err(|source| RpcError::Encode {
        procedure: procedure.to_string(),
        source,
    })
}

/// Deserialize a procedure payload
pub fn decode<T: DeserializeOwned>(procedure: &str, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|source| RpcError::Decode {
        procedure: procedure.to_string(),
        status: None,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_success() {
        let body = r#"{"result":{"data":{"json":{"id":"cfg-1"}}}}"#;
        assert_eq!(
            unwrap_envelope("evals.createJob", 200, body).unwrap(),
            json!({"id": "cfg-1"})
        );

        let null_payload = r#"{"result":{"data":{"json":null}}}"#;
        assert_eq!(
            unwrap_envelope("evals.deleteEvalJob", 200, null_payload).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_unwrap_error_member() {
        let body = r#"{"error":{"json":{"message":"No procedure found","code":-32004,"data":{"code":"NOT_FOUND","httpStatus":404}}}}"#;
        let err = unwrap_envelope("traces.allInput", 404, body).unwrap_err();

        match &err {
            RpcError::Rpc { code, status, .. } => {
                assert_eq!(code, "NOT_FOUND");
                assert_eq!(*status, Some(404));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_schema_skew());
    }

    #[test]
    fn test_unwrap_failures() {
        assert!(matches!(
            unwrap_envelope("traces.all", 502, "<html>bad gateway</html>"),
            Err(RpcError::Http { status: 502, .. })
        ));
        assert!(matches!(
            unwrap_envelope("traces.all", 200, "{}"),
            Err(RpcError::MissingData { .. })
        ));
        assert!(matches!(
            unwrap_envelope("traces.all", 200, "not json"),
            Err(RpcError::Decode { .. })
        ));
    }

    #[test]
    fn test_success_status_failures_name_procedure_and_status() {
        let missing = unwrap_envelope("traces.all", 200, "{}").unwrap_err();
        assert_eq!(missing.to_string(), "traces.all response has no result data (HTTP 200)");

        let garbled = unwrap_envelope("traces.filterOptions", 204, "not json").unwrap_err();
        assert!(matches!(garbled, RpcError::Decode { status: Some(204), .. }));
        let message = garbled.to_string();
        assert!(message.starts_with("Failed to decode traces.filterOptions response (HTTP 204): "));
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://cloud.example.com/")
            .with_api_key("sk-1")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.api_key.as_deref(), Some("sk-1"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(ClientConfig::default().base_url, "http://localhost:3000");
    }
}
