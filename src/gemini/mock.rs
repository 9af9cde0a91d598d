//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use super::transport::GeminiTransport;
use crate::error::{Result, StudioError};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub at: Instant,
}

#[derive(Default)]
pub struct MockTransport {
    posts: Mutex<VecDeque<Result<Value>>>,
    gets: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    get_fallback: Option<Value>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_post(self, response: Result<Value>) -> Self {
        self.posts.lock().unwrap().push_back(response);
        self
    }

    pub fn on_get(self, path: &str, response: Result<Value>) -> Self {
        self.gets
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Response returned once a path's scripted GETs run out.
    pub fn with_get_fallback(mut self, value: Value) -> Self {
        self.get_fallback = Some(value);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    fn record(&self, method: &'static str, path: &str, body: Option<Value>) {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
            at: Instant::now(),
        });
    }
}

#[async_trait]
impl GeminiTransport for MockTransport {
    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.record("POST", path, Some(body.clone()));
        self.posts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StudioError::RequestError("no scripted POST".into())))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.record("GET", path, None);
        let scripted = self
            .gets
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        match (scripted, &self.get_fallback) {
            (Some(response), _) => response,
            (None, Some(fallback)) => Ok(fallback.clone()),
            (None, None) => Err(StudioError::RequestError(format!(
                "no scripted GET for {}",
                path
            ))),
        }
    }
}
