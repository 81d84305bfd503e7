use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

mod config;
mod export;
mod output;
mod source;
mod store;
mod targets;
mod telemetry;
mod util;

use config::{BackupConfig, ExportSettings, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "couch-backup", about = "Export CouchDB databases to S3")]
struct Cli {
    /// Backup config (JSON); falls back to $BACKUP_CONFIG
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Periodic export, keys timestamped per object
    Scheduled(export::ScheduledCmd),
    /// On-demand export, keys grouped under one run prefix
    Manual(export::ManualCmd),
    /// List configured targets
    Targets(targets::TargetsCmd),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and BACKUP_LOG_FORMAT
    telemetry::config::init_tracing();

    let path = cli
        .config
        .or_else(|| env::var("BACKUP_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let cfg = BackupConfig::load(&path)?;
    let settings = ExportSettings::from_env();

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let ok = match cli.command {
        Commands::Scheduled(args) => export::scheduled(&cfg, &settings, args, &cancel).await?,
        Commands::Manual(args) => export::manual(&cfg, &settings, args, &cancel).await?,
        Commands::Targets(args) => { targets::run(&cfg, args)?; true }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Finish the in-flight target, start no more.
    Drain,
    /// Second signal: leave now.
    Abort,
}

fn on_interrupt(cancel: &CancellationToken) -> Interrupt {
    if cancel.is_cancelled() {
        Interrupt::Abort
    } else {
        cancel.cancel();
        Interrupt::Drain
    }
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&cancel) {
                Interrupt::Drain => tracing::warn!("interrupt received, stopping after the current target (Ctrl-C again to abort)"),
                Interrupt::Abort => {
                    tracing::error!("second interrupt, aborting");
                    std::process::exit(130);
                }
            }
        }
    });
}
