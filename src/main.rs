use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use forum_graphcache::{
    application::{
        client::{Client, ClientConfig},
        error::AppError,
        guard::RecordingNavigator,
        transport::ScriptedTransport,
    },
    config,
    infra::{error::InfraError, replay, telemetry},
};
use serde_json::json;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Some(config::Command::Replay(args)) => run_replay(settings, args).await,
        Some(config::Command::ShowSettings(_)) | None => show_settings(&settings),
    }
}

async fn run_replay(settings: config::Settings, args: config::ReplayArgs) -> Result<(), AppError> {
    let session = replay::load_session(&args.file).await?;
    info!(
        file = %args.file.display(),
        steps = session.steps.len(),
        "Loaded session"
    );

    let transport = Arc::new(ScriptedTransport::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let client = Client::new(
        ClientConfig::from(&settings),
        session.context.clone(),
        transport.clone(),
        navigator.clone(),
    );

    let reports = replay::replay(&client, &transport, &session).await;

    let mut stdout = io::stdout().lock();
    for report in &reports {
        let line = serde_json::to_string(report).map_err(InfraError::Output)?;
        writeln!(stdout, "{line}").map_err(InfraError::from)?;
    }

    let summary = json!({
        "redirects": navigator.routes(),
        "requests": transport.request_count(),
    });
    writeln!(stdout, "{summary}").map_err(InfraError::from)?;

    if args.dump_store {
        writeln!(stdout, "{}", client.snapshot()).map_err(InfraError::from)?;
    }
    Ok(())
}

fn show_settings(settings: &config::Settings) -> Result<(), AppError> {
    let summary = json!({
        "client": { "endpoint": settings.client.endpoint.as_str() },
        "guard": {
            "login_route": settings.guard.login_route,
            "auth_failure_marker": settings.guard.auth_failure_marker,
        },
        "pagination": {
            "field": settings.pagination.field,
            "items_field": settings.pagination.items_field,
            "has_more_field": settings.pagination.has_more_field,
            "view_typename": settings.pagination.view_typename,
        },
        "logging": { "level": settings.logging.level.to_string() },
    });
    writeln!(io::stdout(), "{summary}").map_err(InfraError::from)?;
    Ok(())
}
