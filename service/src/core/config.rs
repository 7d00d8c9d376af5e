use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_CHUNK_SIZE, DEFAULT_DEDUP_CANDIDATE_LIMIT,
    DEFAULT_PROCESSING_INTERVAL,
};
use super::schedule::ProcessingInterval;

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Recorder configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RecorderFileConfig {
    /// Switch statement capture on at daemon startup
    pub enabled: Option<bool>,
    /// Hourly, Daily, Weekly, or a cron expression
    pub processing_interval: Option<String>,
    /// Keep capture on after a successful processing pass
    pub keep_recording_after_processing: Option<bool>,
    /// Statements persisted per transaction
    pub chunk_size: Option<usize>,
    /// Max duplicate-text candidates examined per compaction pass
    pub dedup_candidate_limit: Option<usize>,
}

/// Query executor configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExecutorFileConfig {
    /// Connection URL of the observed MariaDB/MySQL database
    pub mysql_url: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub recorder: Option<RecorderFileConfig>,
    pub executor: Option<ExecutorFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Recorder
        if let Some(recorder) = other.recorder {
            let current = self.recorder.get_or_insert_with(RecorderFileConfig::default);
            if recorder.enabled.is_some() {
                tracing::trace!(enabled = ?recorder.enabled, "Merging recorder.enabled");
                current.enabled = recorder.enabled;
            }
            if recorder.processing_interval.is_some() {
                tracing::trace!(interval = ?recorder.processing_interval, "Merging recorder.processing_interval");
                current.processing_interval = recorder.processing_interval;
            }
            if recorder.keep_recording_after_processing.is_some() {
                tracing::trace!(
                    keep = ?recorder.keep_recording_after_processing,
                    "Merging recorder.keep_recording_after_processing"
                );
                current.keep_recording_after_processing = recorder.keep_recording_after_processing;
            }
            if recorder.chunk_size.is_some() {
                tracing::trace!(chunk_size = ?recorder.chunk_size, "Merging recorder.chunk_size");
                current.chunk_size = recorder.chunk_size;
            }
            if recorder.dedup_candidate_limit.is_some() {
                tracing::trace!(
                    limit = ?recorder.dedup_candidate_limit,
                    "Merging recorder.dedup_candidate_limit"
                );
                current.dedup_candidate_limit = recorder.dedup_candidate_limit;
            }
        }

        // Executor
        if let Some(executor) = other.executor {
            let current = self.executor.get_or_insert_with(ExecutorFileConfig::default);
            if executor.mysql_url.is_some() {
                tracing::trace!(mysql_url = "***", "Merging executor.mysql_url");
                current.mysql_url = executor.mysql_url;
            }
        }

        // Debug
        if other.debug.is_some() {
            tracing::trace!(debug = ?other.debug, "Merging debug");
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Recorder configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub enabled: bool,
    pub processing_interval: ProcessingInterval,
    pub keep_recording_after_processing: bool,
    pub chunk_size: usize,
    pub dedup_candidate_limit: usize,
}

/// Query executor configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Connection URL of the observed database; processing that needs a
    /// live EXPLAIN fails without it
    pub mysql_url: Option<String>,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub recorder: RecorderConfig,
    pub executor: ExecutorConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.plansight/plansight.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.plansight/plansight.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Extract file config values with defaults
        let file_recorder = file_config.recorder.unwrap_or_default();
        let file_executor = file_config.executor.unwrap_or_default();

        // 4. Layer configs: defaults -> file config -> CLI/env overrides
        let enabled = cli
            .recorder_enabled
            .or(file_recorder.enabled)
            .unwrap_or(false);

        let interval_expr = cli
            .processing_interval
            .clone()
            .or(file_recorder.processing_interval)
            .unwrap_or_else(|| DEFAULT_PROCESSING_INTERVAL.to_string());
        let processing_interval = ProcessingInterval::parse(&interval_expr)
            .with_context(|| format!("Invalid recorder.processing_interval: {}", interval_expr))?;

        let keep_recording_after_processing = cli
            .keep_recording
            .or(file_recorder.keep_recording_after_processing)
            .unwrap_or(false);

        let chunk_size = cli
            .chunk_size
            .or(file_recorder.chunk_size)
            .unwrap_or(DEFAULT_CHUNK_SIZE);

        let dedup_candidate_limit = cli
            .dedup_candidate_limit
            .or(file_recorder.dedup_candidate_limit)
            .unwrap_or(DEFAULT_DEDUP_CANDIDATE_LIMIT);

        let mysql_url = cli.mysql_url.clone().or(file_executor.mysql_url);

        // debug: CLI/env flag takes precedence, then file config, default false
        let debug = cli.debug || file_config.debug.unwrap_or(false);

        let config = Self {
            recorder: RecorderConfig {
                enabled,
                processing_interval,
                keep_recording_after_processing,
                chunk_size,
                dedup_candidate_limit,
            },
            executor: ExecutorConfig { mysql_url },
            debug,
        };

        config.validate()?;

        tracing::debug!(
            recorder_enabled = config.recorder.enabled,
            processing_interval = %config.recorder.processing_interval,
            keep_recording = config.recorder.keep_recording_after_processing,
            chunk_size = config.recorder.chunk_size,
            dedup_candidate_limit = config.recorder.dedup_candidate_limit,
            executor_configured = config.executor.mysql_url.is_some(),
            debug = config.debug,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.recorder.chunk_size == 0 {
            anyhow::bail!("Configuration error: recorder.chunk_size must be greater than 0");
        }
        if self.recorder.dedup_candidate_limit == 0 {
            anyhow::bail!(
                "Configuration error: recorder.dedup_candidate_limit must be greater than 0"
            );
        }
        Ok(())
    }
}

/// Path to the per-user profile config file
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_parse() {
        let json = r#"{
            "recorder": {
                "enabled": true,
                "processing_interval": "0 * * * *",
                "chunk_size": 500
            },
            "executor": { "mysql_url": "mysql://root@localhost/app" },
            "debug": true
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        let recorder = config.recorder.unwrap();
        assert_eq!(recorder.enabled, Some(true));
        assert_eq!(recorder.processing_interval.as_deref(), Some("0 * * * *"));
        assert_eq!(recorder.chunk_size, Some(500));
        assert_eq!(recorder.keep_recording_after_processing, None);
        assert_eq!(
            config.executor.unwrap().mysql_url.as_deref(),
            Some("mysql://root@localhost/app")
        );
        assert_eq!(config.debug, Some(true));
    }

    #[test]
    fn test_file_config_unknown_fields_collected() {
        let json = r#"{ "recorder": {}, "recroder": { "enabled": true } }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        match &config.extra {
            serde_json::Value::Object(map) => assert!(map.contains_key("recroder")),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{ "recorder": { "enabled": false, "chunk_size": 100 } }"#,
        )
        .unwrap();
        let overlay: FileConfig =
            serde_json::from_str(r#"{ "recorder": { "enabled": true } }"#).unwrap();
        base.merge(overlay);
        let recorder = base.recorder.unwrap();
        assert_eq!(recorder.enabled, Some(true));
        // Untouched fields survive the merge
        assert_eq!(recorder.chunk_size, Some(100));
    }

    #[test]
    fn test_load_defaults() {
        let cli = CliConfig {
            // Point at a directory-local name that does not exist so the
            // loader falls back to defaults
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.recorder.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(
            config.recorder.dedup_candidate_limit,
            DEFAULT_DEDUP_CANDIDATE_LIMIT
        );
        assert_eq!(
            config.recorder.processing_interval,
            ProcessingInterval::Hourly
        );
        assert!(!config.recorder.keep_recording_after_processing);
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let cli = CliConfig {
            chunk_size: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }

    #[test]
    fn test_invalid_interval_is_config_error() {
        let cli = CliConfig {
            processing_interval: Some("whenever".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::load(&cli).is_err());
    }
}
