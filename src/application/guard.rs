//! Session and transport guard.
//!
//! Observes every completed operation. Authentication failures send the user
//! to the login route; other errors are logged and passed through untouched.
//! Also builds the fetch options for outgoing requests, forwarding the
//! inbound cookie when rendering on the server.

use std::sync::{Arc, Mutex};

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::cache::mutex_lock;
use crate::config::GuardSettings;

use super::transport::{OperationRequest, OperationResult};

const METRIC_GUARD_REDIRECT_TOTAL: &str = "forum_guard_redirect_total";
const SOURCE: &str = "application::guard";

/// Client-side routing.
pub trait Navigator: Send + Sync {
    /// Replace the current route without adding a history entry.
    fn replace(&self, route: &str);
}

/// Navigator that only remembers the routes it was asked to visit.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        mutex_lock(&self.routes, SOURCE, "routes").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: &str) {
        mutex_lock(&self.routes, SOURCE, "replace").push(route.to_string());
    }
}

/// Where the client is running.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionContext {
    #[default]
    Browser,
    /// Server-side rendering of one inbound request.
    Server {
        #[serde(default)]
        cookie: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credentials {
    #[default]
    Include,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FetchOptions {
    pub credentials: Credentials,
    pub headers: Vec<(String, String)>,
}

impl FetchOptions {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What the guard did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardVerdict {
    Passed,
    Logged,
    Redirected,
}

pub struct SessionGuard {
    login_route: String,
    auth_failure_marker: String,
    navigator: Arc<dyn Navigator>,
}

impl SessionGuard {
    pub fn new(settings: &GuardSettings, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            login_route: settings.login_route.clone(),
            auth_failure_marker: settings.auth_failure_marker.clone(),
            navigator,
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Inspect one completed operation.
    pub fn observe(&self, request: &OperationRequest, result: &OperationResult) -> GuardVerdict {
        let Some(failure) = &result.error else {
            return GuardVerdict::Passed;
        };

        error!(
            request_id = %request.id,
            operation = %request.operation.name,
            error = %failure,
            "Operation failed"
        );

        if !failure.message.contains(&self.auth_failure_marker) {
            return GuardVerdict::Logged;
        }

        info!(
            request_id = %request.id,
            route = %self.login_route,
            "Not authenticated, redirecting"
        );
        counter!(METRIC_GUARD_REDIRECT_TOTAL).increment(1);
        self.navigator.replace(&self.login_route);
        GuardVerdict::Redirected
    }
}

/// Fetch options for one outgoing request.
///
/// Credentials are always included; the inbound cookie is forwarded only
/// when rendering on the server and the cookie is non-empty.
pub fn fetch_options(context: &ExecutionContext) -> FetchOptions {
    let mut options = FetchOptions::default();
    match context {
        ExecutionContext::Server {
            cookie: Some(cookie),
        } if !cookie.is_empty() => {
            options
                .headers
                .push(("cookie".to_string(), cookie.clone()));
        }
        _ => {}
    }
    options
}
