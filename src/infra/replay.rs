//! Recorded session replay.
//!
//! A session file lists operations together with the responses the server
//! gave. Replaying it drives the real client against a scripted transport,
//! which shows exactly which steps were answered from the cache and which
//! queries each mutation made stale.

use std::path::Path;
use std::sync::Arc;

use forum_api_types::{PostInput, UsernamePasswordInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::application::client::{Client, ClientResponse, ResultSource};
use crate::application::documents;
use crate::application::guard::{ExecutionContext, GuardVerdict};
use crate::application::transport::{OperationError, OperationResult, ScriptedTransport};
use crate::cache::Operation;

use super::error::InfraError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub context: ExecutionContext,
    pub steps: Vec<SessionStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionStep {
    pub operation: SessionOperation,
    /// Server responses, consumed in order by this step and its refetches.
    #[serde(default)]
    pub responses: Vec<OperationResult>,
    /// Re-execute the queries this step made stale.
    #[serde(default)]
    pub refetch: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionOperation {
    Me,
    Posts {
        limit: i64,
        #[serde(default)]
        cursor: Option<String>,
    },
    Post {
        id: i64,
    },
    Login {
        username_or_email: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
    ChangePassword {
        token: String,
        new_password: String,
    },
    ForgotPassword {
        email: String,
    },
    Logout,
    CreatePost {
        title: String,
        text: String,
    },
    UpdatePost {
        id: i64,
        title: String,
        text: String,
    },
    DeletePost {
        id: i64,
    },
    Vote {
        post_id: i64,
        value: i64,
    },
}

impl SessionOperation {
    pub fn to_operation(&self) -> Operation {
        match self {
            SessionOperation::Me => documents::me_query(),
            SessionOperation::Posts { limit, cursor } => {
                documents::posts_query(*limit, cursor.as_deref())
            }
            SessionOperation::Post { id } => documents::post_query(*id),
            SessionOperation::Login {
                username_or_email,
                password,
            } => documents::login_mutation(username_or_email, password),
            SessionOperation::Register {
                username,
                email,
                password,
            } => documents::register_mutation(&UsernamePasswordInput {
                username: username.clone(),
                email: email.clone(),
                password: password.clone(),
            }),
            SessionOperation::ChangePassword {
                token,
                new_password,
            } => documents::change_password_mutation(token, new_password),
            SessionOperation::ForgotPassword { email } => {
                documents::forgot_password_mutation(email)
            }
            SessionOperation::Logout => documents::logout_mutation(),
            SessionOperation::CreatePost { title, text } => {
                documents::create_post_mutation(&PostInput {
                    title: title.clone(),
                    text: text.clone(),
                })
            }
            SessionOperation::UpdatePost { id, title, text } => {
                documents::update_post_mutation(*id, title, text)
            }
            SessionOperation::DeletePost { id } => documents::delete_post_mutation(*id),
            SessionOperation::Vote { post_id, value } => {
                documents::vote_mutation(*post_id, *value)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefetchReport {
    pub operation: String,
    pub source: ResultSource,
}

/// One line of replay output.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub operation: String,
    pub source: ResultSource,
    pub data: Option<Value>,
    pub error: Option<OperationError>,
    pub verdict: GuardVerdict,
    pub stale: Vec<String>,
    pub refetched: Vec<RefetchReport>,
    pub unused_responses: usize,
}

impl StepReport {
    fn new(step: usize, operation: &Operation, response: ClientResponse) -> Self {
        Self {
            step,
            operation: operation.name.clone(),
            source: response.source,
            data: response.data,
            error: response.error,
            verdict: response.verdict,
            stale: response
                .stale
                .iter()
                .map(|operation| operation.name.clone())
                .collect(),
            refetched: Vec::new(),
            unused_responses: 0,
        }
    }
}

pub async fn load_session(path: &Path) -> Result<Session, InfraError> {
    let contents = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&contents).map_err(|source| InfraError::session(path, source))
}

/// Run every step of `session` through `client`.
///
/// `transport` must be the transport `client` was built with.
pub async fn replay(
    client: &Client,
    transport: &Arc<ScriptedTransport>,
    session: &Session,
) -> Vec<StepReport> {
    let mut reports = Vec::with_capacity(session.steps.len());

    for (index, step) in session.steps.iter().enumerate() {
        for response in &step.responses {
            transport.push(response.clone());
        }

        let operation = step.operation.to_operation();
        let response = client.execute_operation(&operation).await;
        let stale = response.stale.clone();
        let mut report = StepReport::new(index, &operation, response);

        if step.refetch && !stale.is_empty() {
            report.refetched = client
                .refetch(&stale)
                .await
                .into_iter()
                .zip(&stale)
                .map(|(response, operation)| RefetchReport {
                    operation: operation.name.clone(),
                    source: response.source,
                })
                .collect();
        }

        report.unused_responses = transport.discard_pending();
        if report.unused_responses > 0 {
            warn!(
                step = index,
                unused = report.unused_responses,
                "Recorded responses were not requested"
            );
        }
        reports.push(report);
    }

    info!(steps = reports.len(), "Replay finished");
    reports
}
