//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{CliArgs, Command, Overrides, ReplayArgs, ShowSettingsArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "forum-graphcache";
const ENV_PREFIX: &str = "FORUM_GRAPHCACHE";
const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";
const DEFAULT_LOGIN_ROUTE: &str = "/login";
const DEFAULT_AUTH_FAILURE_MARKER: &str = "not authenticated";
const DEFAULT_PAGINATION_FIELD: &str = "posts";
const DEFAULT_ITEMS_FIELD: &str = "posts";
const DEFAULT_HAS_MORE_FIELD: &str = "hasMore";
const DEFAULT_VIEW_TYPENAME: &str = "PaginatedPosts";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientSettings,
    pub guard: GuardSettings,
    pub pagination: PaginationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub endpoint: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardSettings {
    pub login_route: String,
    pub auth_failure_marker: String,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            auth_failure_marker: DEFAULT_AUTH_FAILURE_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationSettings {
    pub field: String,
    pub items_field: String,
    pub has_more_field: String,
    pub view_typename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    match cli.command.as_ref() {
        Some(Command::Replay(args)) => raw.apply_overrides(&args.overrides),
        Some(Command::ShowSettings(args)) => raw.apply_overrides(&args.overrides),
        None => {}
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    client: RawClientSettings,
    guard: RawGuardSettings,
    pagination: RawPaginationSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(endpoint) = overrides.endpoint.as_ref() {
            self.client.endpoint = Some(endpoint.clone());
        }
        if let Some(route) = overrides.login_route.as_ref() {
            self.guard.login_route = Some(route.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            client,
            guard,
            pagination,
            logging,
        } = raw;

        let client = build_client_settings(client)?;
        let guard = build_guard_settings(guard)?;
        let pagination = build_pagination_settings(pagination)?;
        let logging = build_logging_settings(logging)?;

        Ok(Self {
            client,
            guard,
            pagination,
            logging,
        })
    }
}

fn build_client_settings(client: RawClientSettings) -> Result<ClientSettings, LoadError> {
    let raw = client
        .endpoint
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let endpoint = Url::parse(raw.trim())
        .map_err(|err| LoadError::invalid("client.endpoint", format!("failed to parse: {err}")))?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "client.endpoint",
            "scheme must be http or https",
        ));
    }
    Ok(ClientSettings { endpoint })
}

fn build_guard_settings(guard: RawGuardSettings) -> Result<GuardSettings, LoadError> {
    let login_route = guard
        .login_route
        .unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_string());
    if !login_route.starts_with('/') {
        return Err(LoadError::invalid(
            "guard.login_route",
            "route must start with `/`",
        ));
    }
    let auth_failure_marker = non_empty(
        guard.auth_failure_marker,
        DEFAULT_AUTH_FAILURE_MARKER,
        "guard.auth_failure_marker",
    )?;
    Ok(GuardSettings {
        login_route,
        auth_failure_marker,
    })
}

fn build_pagination_settings(
    pagination: RawPaginationSettings,
) -> Result<PaginationSettings, LoadError> {
    Ok(PaginationSettings {
        field: non_empty(pagination.field, DEFAULT_PAGINATION_FIELD, "pagination.field")?,
        items_field: non_empty(
            pagination.items_field,
            DEFAULT_ITEMS_FIELD,
            "pagination.items_field",
        )?,
        has_more_field: non_empty(
            pagination.has_more_field,
            DEFAULT_HAS_MORE_FIELD,
            "pagination.has_more_field",
        )?,
        view_typename: non_empty(
            pagination.view_typename,
            DEFAULT_VIEW_TYPENAME,
            "pagination.view_typename",
        )?,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn non_empty(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    match value {
        None => Ok(default.to_string()),
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(LoadError::invalid(key, "must not be empty"));
            }
            Ok(trimmed.to_string())
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawClientSettings {
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGuardSettings {
    login_route: Option<String>,
    auth_failure_marker: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPaginationSettings {
    field: Option<String>,
    items_field: Option<String>,
    has_more_field: Option<String>,
    view_typename: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

/// Parse CLI arguments and load settings for the binary.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
