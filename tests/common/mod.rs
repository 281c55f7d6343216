#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};

use wordbook_cache::error::{ErrorKind, RemoteError, RemoteResult};
use wordbook_cache::gateway::{Gateway, Method};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct Reply {
    result: RemoteResult<Value>,
    delay: Option<Duration>,
}

type Handler = Arc<dyn Fn(Option<&Value>) -> Value + Send + Sync>;

#[derive(Default)]
struct Inner {
    queued: HashMap<(Method, String), VecDeque<Reply>>,
    handlers: HashMap<(Method, String), Handler>,
    standing: HashMap<(Method, String), Reply>,
    calls: Vec<Call>,
}

/// Scripted in-process stand-in for the notebook service.
///
/// Queued replies are consumed first, then a route handler, then the
/// standing reply for the route. Unscripted routes answer 404.
#[derive(Clone, Default)]
pub struct FakeGateway {
    inner: Arc<Mutex<Inner>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, value: Value) {
        self.inner.lock().standing.insert(
            (method, path.to_string()),
            Reply {
                result: Ok(value),
                delay: None,
            },
        );
    }

    pub fn respond_once(&self, method: Method, path: &str, value: Value) {
        self.enqueue(method, path, Ok(value), None);
    }

    /// Computes each reply from the request body, for fakes that keep state.
    pub fn respond_with<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.inner
            .lock()
            .handlers
            .insert((method, path.to_string()), Arc::new(handler));
    }

    pub fn respond_after(&self, method: Method, path: &str, value: Value, delay: Duration) {
        self.enqueue(method, path, Ok(value), Some(delay));
    }

    pub fn fail(&self, method: Method, path: &str, kind: ErrorKind, status: u16) {
        self.inner.lock().standing.insert(
            (method, path.to_string()),
            Reply {
                result: Err(error(kind, status)),
                delay: None,
            },
        );
    }

    pub fn fail_once(&self, method: Method, path: &str, kind: ErrorKind, status: u16) {
        self.enqueue(method, path, Err(error(kind, status)), None);
    }

    fn enqueue(&self, method: Method, path: &str, result: RemoteResult<Value>, delay: Option<Duration>) {
        self.inner
            .lock()
            .queued
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Reply { result, delay });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.inner.lock().calls.last().cloned()
    }

    pub fn reset_calls(&self) {
        self.inner.lock().calls.clear();
    }

    fn next_reply(&self, method: Method, path: &str, body: Option<Value>) -> Reply {
        let mut inner = self.inner.lock();
        inner.calls.push(Call {
            method,
            path: path.to_string(),
            body: body.clone(),
        });
        let key = (method, path.to_string());
        if let Some(reply) = inner.queued.get_mut(&key).and_then(|q| q.pop_front()) {
            return reply;
        }
        if let Some(handler) = inner.handlers.get(&key) {
            return Reply {
                result: Ok(handler(body.as_ref())),
                delay: None,
            };
        }
        inner.standing.get(&key).cloned().unwrap_or_else(|| Reply {
            result: Err(error(ErrorKind::NotFound, 404)),
            delay: None,
        })
    }
}

impl Gateway for FakeGateway {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> RemoteResult<Value> {
        let reply = self.next_reply(method, path, body);
        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.result
    }
}

pub fn error(kind: ErrorKind, status: u16) -> RemoteError {
    RemoteError::new(kind, format!("scripted {kind}"), Some(status))
}

// ========== Fixtures ==========

const CREATED_AT: &str = "2026-01-21T10:00:00+00:00";

pub fn wordbook_json(id: i32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "cover_url": null,
        "sort_order": 0,
        "created_at": CREATED_AT,
        "updated_at": CREATED_AT
    })
}

pub fn chapter_json(id: i32, wordbook_id: i32, name: &str, sort_order: i32) -> Value {
    json!({
        "id": id,
        "wordbook_id": wordbook_id,
        "name": name,
        "sort_order": sort_order,
        "created_at": CREATED_AT,
        "updated_at": CREATED_AT
    })
}

pub fn tag_json(id: i32) -> Value {
    json!({ "id": id, "name": format!("tag-{id}"), "color": null, "created_at": CREATED_AT })
}

pub fn word_json(id: i32, chapter_id: i32, source: &str, tags: &[i32]) -> Value {
    let tags: Vec<Value> = tags
        .iter()
        .map(|&t| json!({ "id": t, "name": format!("tag-{t}"), "color": null }))
        .collect();
    json!({
        "id": id,
        "chapter_id": chapter_id,
        "source": source,
        "translation": format!("{source}-t"),
        "note": null,
        "sort_order": id,
        "tags": tags,
        "created_at": CREATED_AT,
        "updated_at": CREATED_AT
    })
}

pub fn ids<T, F: Fn(&T) -> i32>(items: &[T], id: F) -> Vec<i32> {
    items.iter().map(id).collect()
}
