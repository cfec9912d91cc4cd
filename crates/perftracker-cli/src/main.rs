// crates/perftracker-cli/src/main.rs
// ============================================================================
// Module: PerfTracker CLI Entry Point
// Description: Command dispatcher for serving and configuration utilities.
// Purpose: Start the PerfTracker HTTP server and validate configuration files.
// Dependencies: clap, perftracker-config, perftracker-server, thiserror, tokio,
// tracing-subscriber
// ============================================================================

//! ## Overview
//! `perftracker serve` loads configuration, installs the tracing subscriber,
//! and runs the HTTP server until interrupted. `perftracker config check`
//! validates a file strictly (a file must exist), and `perftracker config
//! example` prints a commented starting point.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use perftracker_config::LogFormat;
use perftracker_config::LoggingConfig;
use perftracker_config::PerfTrackerConfig;
use perftracker_config::config_toml_example;
use perftracker_server::PerfTrackerServer;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "perftracker", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the PerfTracker HTTP server.
    Serve(ConfigPathArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a PerfTracker configuration file.
    Check(ConfigPathArgs),
    /// Print an example configuration file.
    Example,
}

/// Config file selection shared by commands.
#[derive(Args, Debug)]
struct ConfigPathArgs {
    /// Optional config file path (defaults to perftracker.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the parsed command.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Check(args) => command_config_check(&args),
            ConfigCommand::Example => command_config_example(),
        },
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ConfigPathArgs) -> CliResult<ExitCode> {
    let config = PerfTrackerConfig::load_or_default(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    init_tracing(&config.logging)?;
    info!(bind = %config.server.bind, "configuration loaded");

    let server = tokio::task::spawn_blocking(move || PerfTrackerServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Installs the global tracing subscriber.
fn init_tracing(logging: &LoggingConfig) -> CliResult<()> {
    let env_override = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(&logging.level, env_override.as_deref());
    let filter = EnvFilter::try_new(directives)
        .map_err(|err| CliError::new(format!("invalid log filter '{directives}': {err}")))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| CliError::new(format!("tracing init failed: {err}")))
}

/// Selects filter directives; a non-empty `RUST_LOG` wins over config.
fn filter_directives<'a>(level: &'a str, env_override: Option<&'a str>) -> &'a str {
    env_override.map(str::trim).filter(|value| !value.is_empty()).unwrap_or_else(|| level.trim())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes `config check`.
fn command_config_check(args: &ConfigPathArgs) -> CliResult<ExitCode> {
    let config = PerfTrackerConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    write_stdout_line(&check_summary(&config))?;
    Ok(ExitCode::SUCCESS)
}

/// Summarizes a validated configuration.
fn check_summary(config: &PerfTrackerConfig) -> String {
    let store = config.store.sqlite_config().map_or_else(
        || "memory".to_string(),
        |sqlite| format!("sqlite ({})", sqlite.path.display()),
    );
    format!("config ok: bind {}, store {store}", config.server.bind)
}

/// Executes `config example`.
fn command_config_example() -> CliResult<ExitCode> {
    write_stdout_line(config_toml_example().trim_end())?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "{message}");
    ExitCode::FAILURE
}
