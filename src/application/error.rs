use thiserror::Error;

use crate::{config::LoadError, domain::error::DomainError, infra::error::InfraError};

/// Why a mutation handler skipped its cache update.
///
/// Handlers log these and leave the store untouched; they never reach the
/// caller of the mutation.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("`{mutation}` arguments could not be decoded: {source}")]
    Arguments {
        mutation: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{mutation}` payload could not be decoded: {source}")]
    Payload {
        mutation: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{mutation}` cached entity is malformed: {message}")]
    Cached {
        mutation: &'static str,
        message: String,
    },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl UpdateError {
    pub fn arguments(mutation: &'static str, source: serde_json::Error) -> Self {
        Self::Arguments { mutation, source }
    }

    pub fn payload(mutation: &'static str, source: serde_json::Error) -> Self {
        Self::Payload { mutation, source }
    }

    pub fn cached(mutation: &'static str, message: impl Into<String>) -> Self {
        Self::Cached {
            mutation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint `{endpoint}`: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
