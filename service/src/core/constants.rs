// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "PlanSight";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "plansight";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".plansight";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "plansight.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "PLANSIGHT_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "PLANSIGHT_DEBUG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "PLANSIGHT_LOG";

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "PLANSIGHT_DATA_DIR";

/// Environment variable for the observed database connection URL
pub const ENV_MYSQL_URL: &str = "PLANSIGHT_MYSQL_URL";

/// Environment variable to enable statement capture
pub const ENV_RECORDER_ENABLED: &str = "PLANSIGHT_RECORDER_ENABLED";

/// Environment variable for the processing interval
pub const ENV_PROCESSING_INTERVAL: &str = "PLANSIGHT_PROCESSING_INTERVAL";

/// Environment variable to keep capture on after a processing pass
pub const ENV_KEEP_RECORDING: &str = "PLANSIGHT_KEEP_RECORDING";

/// Environment variable for processing chunk size
pub const ENV_CHUNK_SIZE: &str = "PLANSIGHT_CHUNK_SIZE";

/// Environment variable for the dedup candidate limit
pub const ENV_DEDUP_CANDIDATE_LIMIT: &str = "PLANSIGHT_DEDUP_CANDIDATE_LIMIT";

// =============================================================================
// Recorder Defaults
// =============================================================================

/// Default processing interval
pub const DEFAULT_PROCESSING_INTERVAL: &str = "Hourly";

/// Default number of statements persisted per transaction
pub const DEFAULT_CHUNK_SIZE: usize = 2500;

/// Default number of duplicate-text candidates examined per compaction pass
pub const DEFAULT_DEDUP_CANDIDATE_LIMIT: usize = 10_000;

// =============================================================================
// Process Lock
// =============================================================================

/// Lock file guarding a processing pass (in the locks subdirectory)
pub const PROCESS_LOCK_FILENAME: &str = "process_sql_metadata.lock";

/// Total time to wait for the process lock before reporting busy
pub const LOCK_ACQUIRE_TIMEOUT_MS: u64 = 100;

/// Delay between lock acquisition attempts
pub const LOCK_RETRY_DELAY_MS: u64 = 20;

// =============================================================================
// SQLite Record Store
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "plansight.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -64000 = 64MB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite WAL auto-checkpoint threshold (pages, ~4MB at 1000)
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

// =============================================================================
// MySQL Query Executor
// =============================================================================

/// Max connections against the observed database; EXPLAIN traffic is light
pub const MYSQL_MAX_CONNECTIONS: u32 = 2;
