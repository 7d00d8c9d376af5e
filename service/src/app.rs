//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::core::cli::{self, CliConfig, Commands, SystemCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG, PROCESS_LOCK_FILENAME};
use crate::core::storage::{AppStorage, DataSubdir};
use crate::data::SqliteService;
use crate::domain::plans::{ProcessOutcome, SessionController, compact};
use crate::recorder::{
    MemoryBuffer, MySqlExecutor, QueryExecutor, TraceBuffer, UnconfiguredExecutor,
};

pub struct CoreApp {
    pub config: AppConfig,
    pub storage: AppStorage,
    pub store: Arc<SqliteService>,
    pub buffer: Arc<MemoryBuffer>,
    pub executor: Arc<dyn QueryExecutor>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            // System maintenance runs without touching the data directory
            // beyond what the command itself does
            Some(Commands::System {
                command: system_cmd,
            }) => Self::handle_system_command(system_cmd),
            command => {
                let app = Self::init(&cli_config).await?;
                match command {
                    Some(Commands::Process) => app.run_process_once().await,
                    Some(Commands::Compact) => app.run_compact_once().await,
                    // Start, or no subcommand at all
                    _ => app.run_daemon().await,
                }
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init(&config).await?;

        let store = Arc::new(
            SqliteService::init(&storage)
                .await
                .context("Failed to initialize the record store")?,
        );

        let executor: Arc<dyn QueryExecutor> = match config.executor.mysql_url.as_deref() {
            Some(url) => Arc::new(
                MySqlExecutor::connect(url)
                    .await
                    .context("Failed to connect to the observed database")?,
            ),
            None => {
                tracing::warn!(
                    "No executor.mysql_url configured; statements without a \
                     captured plan cannot be processed"
                );
                Arc::new(UnconfiguredExecutor)
            }
        };

        Ok(Self {
            config,
            storage,
            store,
            buffer: Arc::new(MemoryBuffer::new()),
            executor,
        })
    }

    fn controller(&self) -> SessionController {
        SessionController::new(
            self.store.pool().clone(),
            self.buffer.clone(),
            self.executor.clone(),
            self.storage
                .subdir_path(DataSubdir::Locks, PROCESS_LOCK_FILENAME),
            self.config.recorder.chunk_size,
            self.config.recorder.keep_recording_after_processing,
        )
    }

    /// `process` subcommand: one pass over whatever the buffer holds
    async fn run_process_once(&self) -> Result<()> {
        match self.controller().process().await? {
            ProcessOutcome::Completed { processed } => {
                println!("Processed {} captured statements.", processed);
            }
            ProcessOutcome::AlreadyRunning => {
                println!("A processing pass is already running; nothing done.");
            }
        }
        self.store.close().await;
        Ok(())
    }

    /// `compact` subcommand: one deduplication pass over the record store
    async fn run_compact_once(&self) -> Result<()> {
        let report = compact(
            self.store.pool(),
            self.config.recorder.dedup_candidate_limit,
        )
        .await?;
        println!(
            "Compacted {} of {} duplicate query texts ({} records deleted).",
            report.merged, report.candidates, report.deleted_records
        );
        self.store.close().await;
        Ok(())
    }

    /// `start` subcommand: capture continuously and process on schedule
    async fn run_daemon(&self) -> Result<()> {
        if self.config.recorder.enabled {
            self.buffer.start();
            tracing::info!("Statement capture enabled");
        } else {
            tracing::info!("Statement capture disabled; waiting for schedule anyway");
        }

        let controller = self.controller();
        tracing::info!(
            interval = %self.config.recorder.processing_interval,
            data_dir = %self.storage.data_dir().display(),
            "Scheduler started"
        );

        loop {
            let delay = self
                .config
                .recorder
                .processing_interval
                .next_delay(Utc::now())?;
            tracing::debug!(secs = delay.as_secs(), "Next processing pass scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    match controller.process().await {
                        Ok(ProcessOutcome::Completed { processed }) => {
                            tracing::info!(processed, "Scheduled pass finished");
                        }
                        Ok(ProcessOutcome::AlreadyRunning) => {
                            tracing::info!("Scheduled pass skipped, previous one still running");
                        }
                        // Buffer survives; the next scheduled pass retries
                        Err(e) => {
                            tracing::error!(error = %e, "Scheduled pass failed");
                        }
                    }
                    if let Err(e) = self.store.checkpoint().await {
                        tracing::warn!(error = %e, "WAL checkpoint failed");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.store.close().await;
        Ok(())
    }

    fn handle_system_command(cmd: SystemCommands) -> Result<()> {
        match cmd {
            SystemCommands::Prune { yes } => Self::prune_data(yes),
        }
    }

    fn prune_data(skip_confirm: bool) -> Result<()> {
        let data_dir = AppStorage::resolve_data_dir();

        if !data_dir.exists() {
            println!(
                "Nothing to prune. Data directory does not exist: {}",
                data_dir.display()
            );
            return Ok(());
        }

        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);

        println!("This will permanently delete the local data directory:");
        println!("  {}", data_dir.display());
        println!();
        println!(
            "Make sure the daemon is not running. \
             Deleting data while it is running will cause data corruption."
        );

        if !skip_confirm {
            print!("\nContinue? [y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
                println!("Aborted.");
                return Ok(());
            }
        }

        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("Failed to delete data directory: {}", data_dir.display()))?;
        println!("Pruned: {}", data_dir.display());
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}
