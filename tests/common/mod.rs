//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use async_trait::async_trait;
use hyperbind::reactive::ReadSignal;
use hyperbind::{
    GatewayError, HttpGateway, HttpResponse, HypermediaClient, Method, ReservedKeyMetadata,
    Resource,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// A request seen by [`MockGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Resource>,
}

/// Canned reply for [`MockGateway`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Empty,
    Status(u16),
}

impl MockReply {
    pub fn json(value: Value) -> Self {
        MockReply::Json(value)
    }

    fn into_result(self, url: &str) -> Result<HttpResponse, GatewayError> {
        match self {
            MockReply::Json(Value::Null) | MockReply::Empty => Ok(HttpResponse::new(204, None)),
            MockReply::Json(value) => Ok(HttpResponse::new(200, Some(Resource::from(value)))),
            MockReply::Status(status) => Err(GatewayError::Status {
                url: url.to_string(),
                status,
                message: format!("mock status {}", status),
            }),
        }
    }
}

struct PendingRequest {
    url: String,
    reply: oneshot::Sender<MockReply>,
}

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    pending: Vec<PendingRequest>,
    presets: HashMap<String, MockReply>,
    cancelled: Vec<String>,
}

/// In-memory gateway.
///
/// Requests for URLs with a preset reply complete immediately. Every other
/// request parks until the test calls [`MockGateway::flush`], which makes
/// response ordering fully controllable. Requests dropped before a reply
/// arrives are recorded as cancelled.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every request for `url` with `reply` until changed.
    pub fn respond_with(&self, url: &str, reply: MockReply) {
        self.state.lock().presets.insert(url.to_string(), reply);
    }

    /// Stop answering `url` automatically; later requests park again.
    pub fn clear_preset(&self, url: &str) {
        self.state.lock().presets.remove(url);
    }

    /// Deliver `reply` to the oldest parked request for `url`.
    ///
    /// Returns `false` when no such request is parked or its caller has
    /// already gone away.
    pub fn flush(&self, url: &str, reply: MockReply) -> bool {
        let pending = {
            let mut state = self.state.lock();
            let Some(position) = state.pending.iter().position(|p| p.url == url) else {
                return false;
            };
            state.pending.remove(position)
        };
        pending.reply.send(reply).is_ok()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    pub fn requests_to(&self, url: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn was_cancelled(&self, url: &str) -> bool {
        self.state.lock().cancelled.iter().any(|u| u == url)
    }

    /// Wait until at least `count` requests have been issued.
    pub async fn wait_for_requests(&self, count: usize) {
        self.wait_until(|state| state.requests.len() >= count).await;
    }

    /// Wait until a request for `url` is parked.
    pub async fn wait_for_pending(&self, url: &str) {
        self.wait_until(|state| state.pending.iter().any(|p| p.url == url))
            .await;
    }

    /// Wait until a request for `url` has been cancelled.
    pub async fn wait_for_cancel(&self, url: &str) {
        self.wait_until(|state| state.cancelled.iter().any(|u| u == url))
            .await;
    }

    async fn wait_until(&self, check: impl Fn(&MockState) -> bool) {
        let start = std::time::Instant::now();
        while start.elapsed() < WAIT_TIMEOUT {
            if check(&*self.state.lock()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("Timed out waiting on mock gateway");
    }
}

/// Marks a parked request as cancelled if its future is dropped early.
struct CancelGuard<'a> {
    gateway: &'a MockGateway,
    url: String,
    armed: bool,
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.gateway.state.lock().cancelled.push(self.url.clone());
        }
    }
}

#[async_trait]
impl HttpGateway for MockGateway {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Resource>,
    ) -> Result<HttpResponse, GatewayError> {
        let receiver = {
            let mut state = self.state.lock();
            state.requests.push(RecordedRequest {
                method,
                url: url.to_string(),
                body,
            });
            if let Some(reply) = state.presets.get(url).cloned() {
                drop(state);
                return reply.into_result(url);
            }
            let (reply, receiver) = oneshot::channel();
            state.pending.push(PendingRequest {
                url: url.to_string(),
                reply,
            });
            receiver
        };

        let mut guard = CancelGuard {
            gateway: self,
            url: url.to_string(),
            armed: true,
        };
        let reply = receiver.await;
        guard.armed = false;

        match reply {
            Ok(reply) => reply.into_result(url),
            Err(_) => MockReply::Status(599).into_result(url),
        }
    }
}

/// Client over `gateway` with the default reserved-key metadata.
pub fn client(gateway: &Arc<MockGateway>) -> HypermediaClient {
    HypermediaClient::new(gateway.clone(), Arc::new(ReservedKeyMetadata::new()))
}

pub fn resource(value: Value) -> Resource {
    Resource::from(value)
}

/// Wait until `signal` satisfies `predicate` and return that value.
pub async fn wait_for_state<T>(signal: &ReadSignal<T>, predicate: impl Fn(&T) -> bool) -> T
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let mut receiver = signal.watch();
    let value = tokio::time::timeout(WAIT_TIMEOUT, receiver.wait_for(|value| predicate(value)))
        .await
        .expect("Timed out waiting for state")
        .expect("Signal closed")
        .clone();
    value
}

/// Give spawned binding tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

/// Create a temporary config file with the given content.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
