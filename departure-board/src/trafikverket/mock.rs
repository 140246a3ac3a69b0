//! Scripted backend for running the client without API access.
//!
//! Replies are queued up front and handed out in order, one per request.
//! Every request is recorded, and requests still waiting on a reply are
//! counted so tests can check that abandoned requests really went away.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use super::error::TrafikverketError;
use super::transport::{Backend, RawResponse, WireRequest};

/// What the mock does with the next request.
#[derive(Debug, Clone)]
enum MockReply {
    Respond(RawResponse),
    /// Never answer.
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<WireRequest>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
}

/// Backend serving queued replies.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

/// Decrements the in-flight counter when the request future goes away,
/// whether it finished or was dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw reply.
    pub fn push(&self, response: RawResponse) {
        self.replies().push_back(MockReply::Respond(response));
    }

    /// Queue a JSON reply with the given status.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push(RawResponse::new(status, reason(status), body.to_string()));
    }

    /// Queue a reply with an arbitrary text body.
    pub fn push_text(&self, status: u16, body: impl Into<String>) {
        self.push(RawResponse::new(status, reason(status), body));
    }

    /// Queue a request that never gets an answer.
    pub fn push_hang(&self) {
        self.replies().push_back(MockReply::Hang);
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Number of requests currently waiting for a reply.
    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<WireRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replies(&self) -> std::sync::MutexGuard<'_, VecDeque<MockReply>> {
        self.state
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Backend for MockBackend {
    async fn post(&self, request: WireRequest) -> Result<RawResponse, TrafikverketError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let reply = self.replies().pop_front();
        let _guard = InFlight::enter(&self.state.in_flight);

        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Hang) => futures::future::pending().await,
            None => Ok(RawResponse::new(404, "Not Found", "no mock reply queued")),
        }
    }
}

fn reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}
