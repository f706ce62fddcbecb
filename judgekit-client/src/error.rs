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

//! Errors of the RPC client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {procedure} failed: {source}")]
    Transport {
        procedure: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{procedure} failed with HTTP {status}: {message}")]
    Http {
        procedure: String,
        status: u16,
        message: String,
    },

    #[error("{procedure} returned {code}{}: {message}", status_suffix(.status))]
    Rpc {
        procedure: String,
        code: String,
        message: String,
        status: Option<u16>,
    },

    #[error("{procedure} response has no result data{}", status_suffix(.status))]
    MissingData {
        procedure: String,
        status: Option<u16>,
    },

    #[error("Failed to encode input for {procedure}: {source}")]
    Encode {
        procedure: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode {procedure} response{}: {source}", status_suffix(.status))]
    Decode {
        procedure: String,
        status: Option<u16>,
        #[source]
        source: serde_json::Error,
    },

    #[error("All {family} candidates failed{}", last_error_suffix(.last))]
    AllCandidatesFailed {
        family: String,
        last: Option<Box<RpcError>>,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

fn last_error_suffix(last: &Option<Box<RpcError>>) -> String {
    last.as_ref().map(|e| format!(", last error: {}", e)).unwrap_or_default()
}

/// tRPC error codes that mean the procedure or its input shape does not
/// exist on this backend version
const SKEW_CODES: &[&str] = &["NOT_FOUND", "BAD_REQUEST", "METHOD_NOT_SUPPORTED"];

impl RpcError {
    /// Whether the failure points at backend version skew rather than a
    /// real error. Skew failures move a fallback chain to its next candidate.
    pub fn is_schema_skew(&self) -> bool {
        match self {
            RpcError::Http { status, .. } => matches!(status, 400 | 404),
            RpcError::Rpc { code, status, .. } => {
                SKEW_CODES.contains(&code.as_str()) || matches!(status, Some(400 | 404))
            }
            _ => false,
        }
    }

    pub fn procedure(&self) -> Option<&str> {
        match self {
            RpcError::Transport { procedure, .. }
            | RpcError::Http { procedure, .. }
            | RpcError::Rpc { procedure, .. }
            | RpcError::MissingData { procedure, .. }
            | RpcError::Encode { procedure, .. }
            | RpcError::Decode { procedure, .. } => Some(procedure),
            RpcError::Client(_) | RpcError::AllCandidatesFailed { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc(code: &str, status: Option<u16>) -> RpcError {
        RpcError::Rpc {
            procedure: "traces.all".into(),
            code: code.into(),
            message: "boom".into(),
            status,
        }
    }

    #[test]
    fn test_schema_skew_classification() {
        assert!(rpc("NOT_FOUND", None).is_schema_skew());
        assert!(rpc("BAD_REQUEST", Some(400)).is_schema_skew());
        assert!(rpc("METHOD_NOT_SUPPORTED", Some(405)).is_schema_skew());
        assert!(!rpc("INTERNAL_SERVER_ERROR", Some(500)).is_schema_skew());
        assert!(!rpc("UNAUTHORIZED", Some(401)).is_schema_skew());

        let http = |status| RpcError::Http {
            procedure: "traces.all".into(),
            status,
            message: String::new(),
        };
        assert!(http(404).is_schema_skew());
        assert!(!http(503).is_schema_skew());
        assert!(!RpcError::MissingData {
            procedure: "x".into(),
            status: Some(200)
        }
        .is_schema_skew());
    }

    #[test]
    fn test_messages_name_procedure_and_status() {
        assert_eq!(
            rpc("NOT_FOUND", Some(404)).to_string(),
            "traces.all returned NOT_FOUND (HTTP 404): boom"
        );

        let all = RpcError::AllCandidatesFailed {
            family: "trace list".into(),
            last: Some(Box::new(rpc("NOT_FOUND", None))),
        };
        assert_eq!(
            all.to_string(),
            "All trace list candidates failed, last error: traces.all returned NOT_FOUND: boom"
        );
    }
}
