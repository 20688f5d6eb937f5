//! check-event-inclusion — lists Wwise events no SoundBank includes
//!
//! Usage:
//!   check-event-inclusion check <project_path> <output_path> <waapi_port>
//!   check-event-inclusion install [--waapi-port 8080] [--base-menu CustomTools]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rf_bank_audit::{
    reveal_in_file_browser, AuditConfig, AuditRequest, Auditor, InstallRequest, Installer,
    LogReporter,
};
use rf_waapi::{WaapiClient, DEFAULT_PORT};

#[derive(Parser)]
#[command(
    name = "check-event-inclusion",
    about = "List Wwise events that are not included in any SoundBank",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Wait for Enter before exiting
    #[arg(long, global = true)]
    pause: bool,

    /// Do not show the report in the file browser
    #[arg(long, global = true)]
    no_reveal: bool,

    /// WAAPI connection timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u32>,

    /// Give up on a single WAAPI call after this many milliseconds (default: wait)
    #[arg(long, global = true)]
    call_timeout_ms: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit the project open in Wwise
    Check {
        /// Project file Wwise must have open
        project_path: PathBuf,
        /// Directory receiving the CSV report
        output_path: PathBuf,
        /// WAAPI port
        waapi_port: u16,
    },
    /// Register the audit as a Wwise add-on command
    Install {
        /// WAAPI port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        waapi_port: u16,
        /// Main menu the command appears under
        #[arg(long)]
        base_menu: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{:#}", e);
            return finish(cli.pause, ExitCode::FAILURE);
        }
    };

    let code = match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    };

    finish(config.pause_on_exit, code)
}

/// Config file (or defaults) with command-line overrides applied
fn load_config(cli: &Cli) -> Result<AuditConfig> {
    let mut config = AuditConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if cli.pause {
        config.pause_on_exit = true;
    }
    if cli.no_reveal {
        config.reveal_report = false;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if cli.call_timeout_ms.is_some() {
        config.call_timeout_ms = cli.call_timeout_ms;
    }
    config.validate().context("Invalid command-line options")?;

    Ok(config)
}

fn run(command: Commands, config: &AuditConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match command {
        Commands::Check {
            project_path,
            output_path,
            waapi_port,
        } => runtime.block_on(check(project_path, output_path, waapi_port, config)),
        Commands::Install {
            waapi_port,
            base_menu,
        } => runtime.block_on(install(waapi_port, base_menu, config)),
    }
}

async fn connect(port: u16, config: &AuditConfig) -> Result<WaapiClient> {
    let connection = config.connection(port);
    let url = connection.url.clone();
    WaapiClient::connect(connection)
        .await
        .with_context(|| format!("Failed to connect to WAAPI at {}", url))
}

async fn check(
    project_path: PathBuf,
    output_path: PathBuf,
    waapi_port: u16,
    config: &AuditConfig,
) -> Result<()> {
    let client = connect(waapi_port, config).await?;

    let reporter = LogReporter;
    let request = AuditRequest::new(project_path, output_path);
    let outcome = Auditor::new(&reporter)
        .run(client, &request)
        .await
        .context("Event inclusion check aborted")?;

    log::info!(
        "[Audit] {} of {} events not included in {} SoundBanks",
        outcome.unincluded.len(),
        outcome.total_events,
        outcome.bank_count
    );

    if config.reveal_report {
        reveal_in_file_browser(&outcome.report_path);
    }
    Ok(())
}

async fn install(waapi_port: u16, base_menu: Option<String>, config: &AuditConfig) -> Result<()> {
    log::info!(
        "[Install] Using WAAPI port: {}. Set a custom port with --waapi-port.",
        waapi_port
    );

    let executable = std::env::current_exe().context("Cannot locate the running executable")?;
    let request = InstallRequest {
        waapi_port,
        base_menu: base_menu.unwrap_or_else(|| config.install.base_menu.clone()),
        log_dir: config.install.log_dir.clone(),
        executable,
    };

    let client = connect(waapi_port, config).await?;
    let outcome = Installer::run(client, &request).await.context("Install aborted")?;

    log::info!("[Install] Command definition: {}", outcome.definition_path.display());
    Ok(())
}

fn finish(pause: bool, code: ExitCode) -> ExitCode {
    if pause {
        print!("Press Enter to exit...");
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
    code
}
