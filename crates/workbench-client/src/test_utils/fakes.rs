use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;
use workbench_interfaces::{Envelope, FailureKind};

use crate::executor::{Method, RequestExecutor};

/// A request seen by [`ScriptedExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    /// Locator with [`ScriptedExecutor::BASE_URL`] stripped
    pub path: String,
    pub payload: Option<Value>,
}

struct ScriptedResponse {
    delay: Duration,
    envelope: Envelope<Value>,
}

/// Fake executor answering from per-route scripts.
///
/// Responses queued for a route are handed out in order; the last one repeats.
/// Routes without a script answer 404.
#[derive(Default)]
pub struct ScriptedExecutor {
    routes: Mutex<HashMap<(Method, String), VecDeque<ScriptedResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl fmt::Debug for ScriptedExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedExecutor").finish()
    }
}

impl ScriptedExecutor {
    /// Base URL clients built on this fake should use
    pub const BASE_URL: &'static str = "http://workbench.test";

    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an immediate response for `path`
    pub fn push(&self, method: Method, path: &str, envelope: Envelope<Value>) {
        self.push_delayed(method, path, Duration::ZERO, envelope);
    }

    /// Queues a response delivered after `delay`
    pub fn push_delayed(&self, method: Method, path: &str, delay: Duration, envelope: Envelope<Value>) {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(ScriptedResponse { delay, envelope });
    }

    /// Every call received so far, in arrival order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls received for one route
    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    fn next_response(&self, method: Method, path: &str) -> (Duration, Envelope<Value>) {
        let mut routes = self.routes.lock();
        match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => match queue.pop_front() {
                Some(next) => (next.delay, next.envelope),
                None => (Duration::ZERO, not_scripted(method, path)),
            },
            Some(queue) => match queue.front() {
                Some(last) => (last.delay, last.envelope.clone()),
                None => (Duration::ZERO, not_scripted(method, path)),
            },
            None => (Duration::ZERO, not_scripted(method, path)),
        }
    }
}

fn not_scripted(method: Method, path: &str) -> Envelope<Value> {
    Envelope::failure(404, FailureKind::Rejected, format!("no script for {} {}", method, path))
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, method: Method, locator: &str, payload: Option<Value>) -> Envelope<Value> {
        let path = locator
            .strip_prefix(Self::BASE_URL)
            .unwrap_or(locator)
            .to_string();

        debug!(%method, %path, "Scripted request");
        self.calls.lock().push(RecordedCall {
            method,
            path: path.clone(),
            payload,
        });

        let (delay, envelope) = self.next_response(method, &path);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        envelope
    }
}
