use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CHUNK_SIZE, ENV_CONFIG, ENV_DEBUG, ENV_DEDUP_CANDIDATE_LIMIT, ENV_KEEP_RECORDING,
    ENV_MYSQL_URL, ENV_PROCESSING_INTERVAL, ENV_RECORDER_ENABLED,
};

#[derive(Parser)]
#[command(name = "plansight")]
#[command(version, about = "SQL query-plan observability pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Enable debug mode
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Connection URL of the observed MariaDB/MySQL database
    #[arg(long, global = true, env = ENV_MYSQL_URL)]
    pub mysql_url: Option<String>,

    /// Enable statement capture on daemon startup
    #[arg(long, global = true, env = ENV_RECORDER_ENABLED)]
    pub recorder_enabled: Option<bool>,

    /// Processing interval: Hourly, Daily, Weekly, or a cron expression
    #[arg(long, global = true, env = ENV_PROCESSING_INTERVAL)]
    pub processing_interval: Option<String>,

    /// Keep statement capture switched on after a processing pass
    #[arg(long, global = true, env = ENV_KEEP_RECORDING)]
    pub keep_recording: Option<bool>,

    /// Number of statements persisted per transaction
    #[arg(long, global = true, env = ENV_CHUNK_SIZE)]
    pub chunk_size: Option<usize>,

    /// Max duplicate-text candidates examined per compaction pass
    #[arg(long, global = true, env = ENV_DEDUP_CANDIDATE_LIMIT)]
    pub dedup_candidate_limit: Option<usize>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the scheduler daemon (default command)
    Start,
    /// Run one processing pass over the captured statements
    Process,
    /// Run one deduplication pass over the record store
    Compact,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete the local data directory (record store, locks). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub mysql_url: Option<String>,
    pub recorder_enabled: Option<bool>,
    pub processing_interval: Option<String>,
    pub keep_recording: Option<bool>,
    pub chunk_size: Option<usize>,
    pub dedup_candidate_limit: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        debug: cli.debug,
        mysql_url: cli.mysql_url,
        recorder_enabled: cli.recorder_enabled,
        processing_interval: cli.processing_interval,
        keep_recording: cli.keep_recording,
        chunk_size: cli.chunk_size,
        dedup_candidate_limit: cli.dedup_candidate_limit,
    };
    (config, cli.command)
}
