//! In-memory backend for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::api::{AdminBackend, Collection};
use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
enum Reply {
    Ok(Value),
    Fail(u16, String),
}

struct Route {
    method: Method,
    path: String,
    reply: Reply,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Call>>,
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map(|(p, _)| p).unwrap_or(path)
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations for the same route take precedence.
    pub fn on(&self, method: Method, path: &str, body: Value) -> &Self {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            reply: Reply::Ok(body),
        });
        self
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) -> &Self {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            reply: Reply::Fail(status, message.to_string()),
        });
        self
    }

    pub fn collection(&self, collection: Collection, body: Value) -> &Self {
        self.on(Method::GET, collection.as_str(), body)
    }

    pub fn fail_collection(&self, collection: Collection) -> &Self {
        self.fail(Method::GET, collection.as_str(), 500, "collection unavailable")
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn reply(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value> {
        let bare = strip_query(path).to_string();
        self.calls.lock().unwrap().push(Call {
            method: method.clone(),
            path: path.to_string(),
            body,
        });
        let reply = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == bare)
            .map(|r| r.reply.clone());
        match reply {
            Some(Reply::Ok(v)) => Ok(v),
            Some(Reply::Fail(status, message)) => Err(ApiError::Backend { status, message }),
            None => Err(ApiError::Backend {
                status: 404,
                message: format!("no route for {method} {bare}"),
            }),
        }
    }
}

#[async_trait]
impl AdminBackend for FakeBackend {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value> {
        self.reply(method, path, body)
    }

    async fn upload_media(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<Value> {
        let body = serde_json::json!({ "file_name": file_name, "size": bytes.len() });
        self.reply(Method::POST, "media", Some(body))
    }
}
