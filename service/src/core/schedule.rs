//! Processing interval parsing and tick calculation
//!
//! Named intervals (Hourly/Daily/Weekly) map to fixed delays; anything else
//! is treated as a cron expression and validated at config load time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid processing interval '{expr}': {source}")]
    InvalidCron {
        expr: String,
        #[source]
        source: croner::errors::CronError,
    },

    #[error("No upcoming occurrence for cron expression '{0}'")]
    NoOccurrence(String),
}

/// How often the daemon runs a processing pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingInterval {
    Hourly,
    Daily,
    Weekly,
    Cron(String),
}

impl ProcessingInterval {
    /// Parse an interval string; unknown names are validated as cron
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let trimmed = expr.trim();
        match trimmed.to_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            _ => {
                Cron::new(trimmed)
                    .parse()
                    .map_err(|source| ScheduleError::InvalidCron {
                        expr: trimmed.to_string(),
                        source,
                    })?;
                Ok(Self::Cron(trimmed.to_string()))
            }
        }
    }

    /// Delay from `now` until the next processing tick
    pub fn next_delay(&self, now: DateTime<Utc>) -> Result<Duration, ScheduleError> {
        match self {
            Self::Hourly => Ok(Duration::from_secs(60 * 60)),
            Self::Daily => Ok(Duration::from_secs(24 * 60 * 60)),
            Self::Weekly => Ok(Duration::from_secs(7 * 24 * 60 * 60)),
            Self::Cron(expr) => {
                let cron = Cron::new(expr)
                    .parse()
                    .map_err(|source| ScheduleError::InvalidCron {
                        expr: expr.clone(),
                        source,
                    })?;
                let next = cron
                    .find_next_occurrence(&now, false)
                    .map_err(|_| ScheduleError::NoOccurrence(expr.clone()))?;
                let delta = (next - now).to_std().unwrap_or(Duration::ZERO);
                Ok(delta)
            }
        }
    }
}

impl std::fmt::Display for ProcessingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hourly => write!(f, "Hourly"),
            Self::Daily => write!(f, "Daily"),
            Self::Weekly => write!(f, "Weekly"),
            Self::Cron(expr) => write!(f, "{}", expr),
        }
    }
}
