// ABOUTME: Entry point for the shipyard CLI application.
// ABOUTME: Wires configuration and collaborators into one pipeline run.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use shipyard::collaborators::{
    CommandContext, CommandDeployer, CommandRunner, CommandStatusPublisher, CommandToolchain,
    HttpHealthCheck, NoopStatusPublisher, StatusPublisher,
};
use shipyard::config::{Config, Credentials};
use shipyard::error::{Error, Result};
use shipyard::notify::{HttpSink, HttpSinkConfig, NotificationEmitter};
use shipyard::output::{Output, OutputMode};
use shipyard::pipeline::{
    Collaborators, EXIT_ABORTED, EXIT_FAILURE, EXIT_INTERRUPTED, PipelineInputs,
    StageGraphExecutor,
};
use shipyard::rollback::DirRollbackStore;
use shipyard::types::{EnvironmentName, Revision, RunId};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON reports on stdout stay parseable.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);
    output.start_timer();

    let code = tokio::select! {
        code = run(cli.command, &output) => code,
        _ = tokio::signal::ctrl_c() => {
            output.error("interrupted");
            EXIT_INTERRUPTED
        }
    };

    std::process::exit(code);
}

async fn run(command: Commands, output: &Output) -> i32 {
    match command {
        Commands::Run {
            environment,
            revision,
            dry_run,
            run_id,
        } => match run_pipeline(&environment, &revision, dry_run, run_id, output).await {
            Ok(code) => code,
            Err(Error::Invariant(e)) => {
                output.error(&format!("pipeline aborted: {e}"));
                EXIT_ABORTED
            }
            Err(e) => {
                output.error(&e.to_string());
                EXIT_FAILURE
            }
        },
    }
}

async fn run_pipeline(
    environment: &str,
    revision: &str,
    dry_run: bool,
    run_id: Option<String>,
    output: &Output,
) -> Result<i32> {
    let environment =
        EnvironmentName::new(environment).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let revision = Revision::new(revision).map_err(|e| Error::InvalidConfig(e.to_string()))?;

    let cwd = env::current_dir()?;
    let config = Config::discover(&cwd)?;
    let credentials = Credentials::resolve(&config);

    let mut inputs = PipelineInputs::new(environment.clone(), revision.clone()).dry_run(dry_run);
    if let Some(id) = run_id {
        inputs = inputs.with_run_id(RunId::new(id));
    }

    output.progress(&format!(
        "Running {} pipeline for {} at {}",
        config.service,
        environment,
        revision.short()
    ));

    let context = CommandContext {
        service: config.service.clone(),
        environment,
        revision,
        dry_run,
    };
    let collaborators = command_collaborators(&cwd, &config, &credentials, context);
    let emitter = notification_emitter(&config, &credentials, output);
    let store = Arc::new(DirRollbackStore::new(cwd.join(&config.rollback.dir)));

    let executor = StageGraphExecutor::new(config, credentials, collaborators, store, emitter)
        .with_workdir(cwd);
    let report = executor.run(&inputs).await?;

    output.report(&report);
    Ok(report.exit_code())
}

fn command_collaborators(
    workdir: &Path,
    config: &Config,
    credentials: &Credentials,
    context: CommandContext,
) -> Collaborators {
    let runner = CommandRunner::new(workdir);

    let status: Arc<dyn StatusPublisher> = match &config.status {
        Some(status) => Arc::new(CommandStatusPublisher::new(
            runner.clone(),
            status.clone(),
            context.clone(),
        )),
        None => Arc::new(NoopStatusPublisher),
    };

    Collaborators {
        toolchain: Arc::new(CommandToolchain::new(
            runner.clone(),
            config.toolchain.clone(),
            context.clone(),
        )),
        deployer: Arc::new(CommandDeployer::new(
            runner,
            config.deploy.clone(),
            context,
            credentials.deploy_token.clone(),
        )),
        health: Arc::new(HttpHealthCheck::new()),
        status,
    }
}

/// Notifications are sent only when both telemetry keys are configured.
fn notification_emitter(
    config: &Config,
    credentials: &Credentials,
    output: &Output,
) -> NotificationEmitter {
    let Some((api_key, app_key)) = credentials.telemetry() else {
        tracing::debug!("telemetry credentials not set, notifications disabled");
        return NotificationEmitter::disabled();
    };

    let sink = HttpSink::new(HttpSinkConfig {
        endpoint: config.notify.endpoint.clone(),
        api_key: api_key.to_string(),
        app_key: app_key.to_string(),
        source_type_name: config.notify.source_type_name.clone(),
        timeout: config.notify.timeout,
    });

    match sink {
        Ok(sink) => NotificationEmitter::new(Arc::new(sink)),
        Err(e) => {
            output.warning(&format!("notifications disabled: {e}"));
            NotificationEmitter::disabled()
        }
    }
}
