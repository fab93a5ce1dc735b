use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the forum-graphcache binary.
#[derive(Debug, Parser)]
#[command(
    name = "forum-graphcache",
    version,
    about = "Normalized GraphQL cache for the forum client"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FORUM_GRAPHCACHE_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Replay a recorded session through the cache and print each step.
    Replay(ReplayArgs),
    /// Print the resolved settings and exit.
    #[command(name = "settings")]
    ShowSettings(ShowSettingsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Print the store contents after the last step.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub dump_store: bool,

    /// Recorded session to replay (JSON).
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ShowSettingsArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the GraphQL endpoint.
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the route used after an authentication failure.
    #[arg(long = "login-route", value_name = "ROUTE")]
    pub login_route: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}
