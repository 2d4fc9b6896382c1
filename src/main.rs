//! camerad client CLI
//!
//! Runs single camera commands, or an interactive shell that keeps the
//! connection to camerad open between commands.

use camerad_client::{
    execute, parse_line, CameraCommand, FileConfig, HostSelection, Session, ShellAction,
};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "camerad-client", version, about = "Client for the camerad camera-interface server")]
struct Cli {
    /// Host configuration file (TOML, or legacy hosts.json)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reply timeout in seconds, overriding the config file
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<f64>,

    /// Log every command and reply
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Start an interactive shell
    Shell {
        /// Serve Prometheus metrics on this port
        #[cfg(feature = "metrics")]
        #[arg(long)]
        metrics_port: Option<u16>,
    },
    #[command(flatten)]
    Camera(CameraCommand),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let session = match build_session(&cli) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = match cli.command {
        #[cfg(feature = "metrics")]
        CliCommand::Shell { metrics_port } => runtime.block_on(shell(session, metrics_port)),
        #[cfg(not(feature = "metrics"))]
        CliCommand::Shell { .. } => runtime.block_on(shell(session)),
        CliCommand::Camera(command) => runtime.block_on(one_shot(session, command)),
    };

    // stdin reads run on a blocking thread that may never return
    runtime.shutdown_background();
    code
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("camerad-client").join("hosts.toml"))
        .filter(|path| path.is_file())
}

fn build_session(cli: &Cli) -> Result<Session, camerad_client::ConfigError> {
    let path = cli.config.clone().or_else(default_config_path);
    let mut config = match path.as_deref() {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };

    if let Some(secs) = cli.timeout {
        config.client.reply_timeout_secs = secs;
        config.client.validate()?;
    }
    config.client.verbose |= cli.verbose;

    Ok(Session::new(config.host_table()?, config.client))
}

fn load_config(path: &Path) -> Result<FileConfig, camerad_client::ConfigError> {
    info!(path = %path.display(), "Using host configuration");
    FileConfig::from_file(path)
}

async fn one_shot(mut session: Session, command: CameraCommand) -> ExitCode {
    if command.needs_connection() {
        if let Err(e) = session.connect(&HostSelection::All).await {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let result = execute(&mut session, command).await;
    session.disconnect().await;

    match result {
        Ok(Some(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "metrics")]
fn start_metrics(port: Option<u16>) -> Option<camerad_client::metrics::SharedMetrics> {
    use camerad_client::metrics::{serve, MetricsRegistry, MetricsServerConfig, MetricsState};
    use std::sync::Arc;

    let port = port?;
    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            return None;
        }
    };
    let state = Arc::new(tokio::sync::RwLock::new(MetricsState::new(registry)));
    let shared = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = serve(MetricsServerConfig::with_port(port), shared).await {
            error!("Metrics server failed: {}", e);
        }
    });
    Some(state)
}

async fn shell(
    mut session: Session,
    #[cfg(feature = "metrics")] metrics_port: Option<u16>,
) -> ExitCode {
    #[cfg(feature = "metrics")]
    let metrics = start_metrics(metrics_port);

    let (interrupt_tx, mut interrupted) = tokio::sync::watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(true);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    info!("camerad client v{}", camerad_client::VERSION);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed = false;

    loop {
        print!("camerad> ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            Ok(()) = interrupted.changed() => {
                println!();
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                failed = true;
                break;
            }
        };

        match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(ShellAction::Quit)) => break,
            Ok(Some(ShellAction::Run(command))) => match execute(&mut session, command).await {
                Ok(Some(output)) => println!("{}", output),
                Ok(None) => {}
                Err(e) => eprintln!("error: {}", e),
            },
            Err(e) => {
                let _ = e.print();
            }
        }

        #[cfg(feature = "metrics")]
        if let Some(state) = &metrics {
            let snapshot = camerad_client::metrics::MetricsSnapshot::from_stats(session.stats());
            state.write().await.update(snapshot);
        }
    }

    if session.is_connected() {
        if let Err(e) = session.close().await {
            warn!("Close failed: {}", e);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
