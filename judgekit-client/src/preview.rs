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

//! Trace-list previews with stale-response discard
//!
//! Every edit of a filter fires a preview request. Responses may arrive in
//! any order; only the response to the most recently issued request is
//! allowed to update the displayed state.

use crate::client::RpcTransport;
use crate::fallback::{list_traces, CandidateChain, TraceListRequest};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Note shown in place of rows when a preview cannot be loaded
pub const LOAD_FAILED_NOTE: &str = "failed to load";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Hands out increasing tickets and accepts only the newest one
#[derive(Debug, Default)]
pub struct PreviewGuard {
    latest: AtomicU64,
}

impl PreviewGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// `value` if `ticket` is still the latest, otherwise `None`
    pub fn accept<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewState {
    pub rows: Vec<Value>,
    pub total: Option<u64>,
    /// Set when loading failed; rows are empty then
    pub note: Option<String>,
    pub ticket: Option<Ticket>,
}

impl PreviewState {
    pub fn failed(ticket: Ticket) -> Self {
        Self {
            rows: Vec::new(),
            total: None,
            note: Some(LOAD_FAILED_NOTE.to_string()),
            ticket: Some(ticket),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.note.is_some()
    }
}

pub struct PreviewLoader<T: RpcTransport + ?Sized> {
    transport: Arc<T>,
    chain: Arc<CandidateChain>,
    guard: PreviewGuard,
    state: RwLock<PreviewState>,
}

impl<T: RpcTransport + ?Sized> PreviewLoader<T> {
    pub fn new(transport: Arc<T>, chain: Arc<CandidateChain>) -> Self {
        Self {
            transport,
            chain,
            guard: PreviewGuard::new(),
            state: RwLock::new(PreviewState::default()),
        }
    }

    /// Currently displayed preview
    pub fn state(&self) -> PreviewState {
        self.state.read().clone()
    }

    /// Reserve a ticket for a request about to be issued
    pub fn begin(&self) -> Ticket {
        self.guard.issue()
    }

    /// Issue a preview request. Returns the new state, or `None` when a
    /// newer request superseded this one before it completed.
    pub async fn load(&self, request: &TraceListRequest) -> Option<PreviewState> {
        let ticket = self.begin();
        self.complete(ticket, request).await
    }

    /// Run the request for an already issued ticket
    pub async fn complete(&self, ticket: Ticket, request: &TraceListRequest) -> Option<PreviewState> {
        let state = match list_traces(self.transport.as_ref(), &self.chain, request).await {
            Ok(page) => PreviewState {
                rows: page.rows,
                total: page.total,
                note: None,
                ticket: Some(ticket),
            },
            Err(e) => {
                warn!("Trace preview for project {} failed: {}", request.project_id, e);
                PreviewState::failed(ticket)
            }
        };

        let mut current = self.state.write();
        match self.guard.accept(ticket, state) {
            Some(state) => {
                *current = state.clone();
                Some(state)
            }
            None => {
                debug!("Discarding stale preview response {:?}", ticket);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_accepts_only_latest() {
        let guard = PreviewGuard::new();
        let a = guard.issue();
        let b = guard.issue();

        assert!(a < b);
        assert_eq!(guard.accept(a, "a"), None);
        assert_eq!(guard.accept(b, "b"), Some("b"));
        assert!(guard.is_current(b));

        let c = guard.issue();
        assert!(!guard.is_current(b));
        assert!(guard.is_current(c));
    }

    #[test]
    fn test_failed_state() {
        let state = PreviewState::failed(Ticket(3));
        assert!(state.is_failed());
        assert!(state.rows.is_empty());
        assert_eq!(state.note.as_deref(), Some("failed to load"));
    }
}
