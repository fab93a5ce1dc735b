use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("session file `{path}` is invalid: {source}")]
    Session {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode output: {0}")]
    Output(#[source] serde_json::Error),
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn session(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Session {
            path: path.into(),
            source,
        }
    }
}
