//! Command-line interface for source-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # Verify credentials
//! source-sync check --config postgres.yaml
//!
//! # Print the catalog of readable streams
//! source-sync discover --config postgres.yaml
//!
//! # Read the configured streams, resuming from an explicit state file
//! source-sync read --config postgres.yaml --catalog catalog.json --state state.json
//!
//! # Read with persisted checkpoints, resuming from the latest one
//! source-sync read --config postgres.yaml --catalog catalog.json \
//!   --state-dir .source-sync-state --resume --checkpoint-interval 10000 --timeout 2h
//! ```
//!
//! Messages are written to stdout, one JSON document per line. Logs go to
//! stderr and are filtered with `RUST_LOG`.

use std::future::Future;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use checkpoint::{FilesystemStore, SyncManager, SyncPhase};
use clap::{Parser, Subcommand};
use source_sync::config::{load_configured_catalog, load_file, load_state, parse_duration};
use source_sync::{JsonLinesEmitter, MessageEmitter, MessageSequencer, SyncOptions};
use source_sync_postgresql::{PostgresConfig, PostgresProvider};
use sync_core::{LogLevel, Message, State};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "source-sync")]
#[command(about = "Extract relational tables as typed record and state messages")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open and close a connection to the source
    Check {
        /// Connection config file (JSON, YAML or TOML)
        #[arg(long, env = "SOURCE_SYNC_CONFIG")]
        config: PathBuf,
    },

    /// Emit the catalog of readable streams
    Discover {
        /// Connection config file (JSON, YAML or TOML)
        #[arg(long, env = "SOURCE_SYNC_CONFIG")]
        config: PathBuf,
    },

    /// Read the configured streams
    Read {
        /// Connection config file (JSON, YAML or TOML)
        #[arg(long, env = "SOURCE_SYNC_CONFIG")]
        config: PathBuf,

        /// Configured catalog: streams to read and their sync modes
        #[arg(long)]
        catalog: PathBuf,

        /// State to resume from
        #[arg(long, conflicts_with = "resume")]
        state: Option<PathBuf>,

        /// Directory where every STATE snapshot is also persisted
        #[arg(long, env = "SOURCE_SYNC_STATE_DIR")]
        state_dir: Option<PathBuf>,

        /// Resume from the latest snapshot persisted in --state-dir
        #[arg(long, requires = "state_dir")]
        resume: bool,

        /// Emit a STATE every N records of an incremental stream
        #[arg(long)]
        checkpoint_interval: Option<NonZeroU64>,

        /// Stop after this long, e.g. "90s", "30m", "2h"
        #[arg(long)]
        timeout: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // stdout carries protocol messages only
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => run_check(config).await,
        Commands::Discover { config } => run_discover(config).await,
        Commands::Read {
            config,
            catalog,
            state,
            state_dir,
            resume,
            checkpoint_interval,
            timeout,
        } => {
            run_read(ReadArgs {
                config,
                catalog,
                state,
                state_dir,
                resume,
                checkpoint_interval,
                timeout,
            })
            .await
        }
    }
}

struct ReadArgs {
    config: PathBuf,
    catalog: PathBuf,
    state: Option<PathBuf>,
    state_dir: Option<PathBuf>,
    resume: bool,
    checkpoint_interval: Option<NonZeroU64>,
    timeout: Option<String>,
}

fn sequencer(
    config: &Path,
    checkpoint_interval: Option<NonZeroU64>,
) -> anyhow::Result<MessageSequencer<PostgresProvider>> {
    let pg: PostgresConfig = load_file(config)
        .with_context(|| format!("Failed to load connection config from {config:?}"))?;
    let options = SyncOptions {
        namespaces: pg.schemas.clone(),
        encoding: pg.encoding,
        checkpoint_interval,
    };
    Ok(MessageSequencer::new(PostgresProvider::new(pg), options))
}

async fn run_check(config: PathBuf) -> anyhow::Result<()> {
    let sequencer = sequencer(&config, None)?;
    let mut emitter = JsonLinesEmitter::new(tokio::io::stdout());
    let target = sequencer.provider().config().display_target();

    match sequencer.check().await {
        Ok(()) => {
            emitter
                .emit(Message::log(
                    LogLevel::Info,
                    format!("Connected to {target}"),
                ))
                .await?;
            emitter.flush().await?;
            Ok(())
        }
        Err(e) => {
            emitter
                .emit(Message::log(LogLevel::Error, e.to_string()))
                .await?;
            emitter.flush().await?;
            Err(anyhow::Error::new(e).context(format!("Connection check against {target} failed")))
        }
    }
}

async fn run_discover(config: PathBuf) -> anyhow::Result<()> {
    let sequencer = sequencer(&config, None)?;
    let mut emitter = JsonLinesEmitter::new(tokio::io::stdout());
    let catalog = sequencer.discover(&mut emitter).await?;
    info!("Discovered {} streams", catalog.len());
    Ok(())
}

async fn run_read(args: ReadArgs) -> anyhow::Result<()> {
    let sequencer = sequencer(&args.config, args.checkpoint_interval)?;
    let configured = load_configured_catalog(&args.catalog)
        .with_context(|| format!("Failed to load configured catalog from {:?}", args.catalog))?;
    let timeout = args
        .timeout
        .as_deref()
        .map(parse_duration)
        .transpose()
        .context("Invalid --timeout")?;

    let manager = args
        .state_dir
        .as_ref()
        .map(|dir| SyncManager::new(FilesystemStore::new(dir)));

    let state = match (&args.state, &manager) {
        (Some(path), _) => load_state(path)?,
        (None, Some(manager)) if args.resume => match manager.read_latest::<State>().await? {
            Some(state) => {
                info!("Resuming from persisted state of {} streams", state.len());
                state
            }
            None => {
                info!("No persisted state found, reading from the beginning");
                State::new()
            }
        },
        _ => State::new(),
    };

    let stdout = tokio::io::stdout();
    let report = match manager {
        Some(manager) => {
            let mut emitter = JsonLinesEmitter::with_checkpoints(stdout, manager);
            let report = with_deadline(
                sequencer.read(&configured, state, &mut emitter),
                timeout,
            )
            .await??;

            if let Some(manager) = emitter.checkpoints() {
                let phase = if report.has_failures() {
                    SyncPhase::InProgress
                } else {
                    SyncPhase::Completed
                };
                manager
                    .emit_checkpoint(&report.state, phase)
                    .await
                    .context("Failed to persist final state")?;
            }
            report
        }
        None => {
            let mut emitter = JsonLinesEmitter::new(stdout);
            with_deadline(sequencer.read(&configured, state, &mut emitter), timeout).await??
        }
    };

    info!(
        "Read {} records from {} streams",
        report.records_emitted(),
        report.streams.len()
    );

    let failed: Vec<String> = report
        .failed()
        .map(|s| s.stream.clone())
        .collect();
    if !failed.is_empty() {
        bail!("{} stream(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

/// Race `fut` against Ctrl-C and an optional timeout.
///
/// Losing drops `fut`, which drops its connection and any in-flight rows.
async fn with_deadline<F: Future>(fut: F, timeout: Option<Duration>) -> anyhow::Result<F::Output> {
    let deadline = async {
        match timeout {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        output = fut => Ok(output),
        _ = tokio::signal::ctrl_c() => {
            warn!("Received interrupt signal (Ctrl+C), stopping");
            bail!("Interrupted")
        }
        _ = deadline => {
            warn!("Timeout reached, stopping");
            bail!("Timed out after {:?}", timeout.unwrap_or_default())
        }
    }
}
