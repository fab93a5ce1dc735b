//! Transport seam.
//!
//! The network layer is external; the client only needs something that
//! executes one operation and returns its data or error.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::cache::{Operation, mutex_lock};

use super::guard::FetchOptions;

const SOURCE: &str = "application::transport";

#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub id: Uuid,
    pub operation: Operation,
    pub url: Url,
    pub fetch: FetchOptions,
}

impl OperationRequest {
    pub fn new(operation: Operation, url: Url, fetch: FetchOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation,
            url,
            fetch,
        }
    }
}

/// Error attached to a completed operation, network or GraphQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub message: String,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for OperationError {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl OperationResult {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: OperationError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: OperationRequest) -> OperationResult;
}

/// Transport that answers from a queue of prepared results.
///
/// Requests are recorded so callers can assert on what went out. An empty
/// queue answers with a network error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<OperationResult>>,
    requests: Mutex<Vec<OperationRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: OperationResult) {
        mutex_lock(&self.responses, SOURCE, "push").push_back(result);
    }

    pub fn requests(&self) -> Vec<OperationRequest> {
        mutex_lock(&self.requests, SOURCE, "requests").clone()
    }

    pub fn request_count(&self) -> usize {
        mutex_lock(&self.requests, SOURCE, "request_count").len()
    }

    pub fn pending(&self) -> usize {
        mutex_lock(&self.responses, SOURCE, "pending").len()
    }

    /// Drop every queued result, returning how many were never used.
    pub fn discard_pending(&self) -> usize {
        let mut responses = mutex_lock(&self.responses, SOURCE, "discard_pending");
        let unused = responses.len();
        responses.clear();
        unused
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: OperationRequest) -> OperationResult {
        let name = request.operation.name.clone();
        mutex_lock(&self.requests, SOURCE, "execute").push(request);
        mutex_lock(&self.responses, SOURCE, "execute")
            .pop_front()
            .unwrap_or_else(|| {
                OperationResult::failure(OperationError::new(format!(
                    "[Network] no scripted response for `{name}`"
                )))
            })
    }
}
