//! Application configuration.
//!
//! Resolved in layers: defaults, then an optional JSON file, then
//! environment overrides. CLI flags are applied last by the caller.

use crate::error::ConfigError;
use odds_core::Sport;
use odds_engine::{DetectorConfig, MIN_VALID_QUOTES};
use odds_store::MemoryStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_TTL_HOURS: &str = "ODDS_TTL_HOURS";
pub const ENV_WORKERS: &str = "ODDS_WORKERS";
pub const ENV_SPORTS: &str = "ODDS_SPORTS";

/// Longest record lifetime accepted: ten years.
pub const MAX_TTL_HOURS: u32 = 24 * 365 * 10;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Detector configuration.
    pub detector: DetectorSettings,
    /// Store configuration.
    pub store: StoreSettings,
    /// Odds source configuration.
    pub source: SourceSettings,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            detector: DetectorSettings::default(),
            store: StoreSettings::default(),
            source: SourceSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid with `path` when given, then with the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Check every setting is usable. Run once all layers are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detector.min_valid_quotes < MIN_VALID_QUOTES {
            return Err(ConfigError::InvalidSetting {
                field: "detector.min_valid_quotes",
                reason: format!(
                    "{} is below {}; a single quote cannot form an opportunity",
                    self.detector.min_valid_quotes, MIN_VALID_QUOTES
                ),
            });
        }
        if self.store.ttl_hours == 0 || self.store.ttl_hours > MAX_TTL_HOURS {
            return Err(ConfigError::InvalidSetting {
                field: "store.ttl_hours",
                reason: format!(
                    "{} is outside 1..={}",
                    self.store.ttl_hours, MAX_TTL_HOURS
                ),
            });
        }
        if self.source.sports.is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "source.sports",
                reason: "no sports configured".to_string(),
            });
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Apply `ODDS_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_TTL_HOURS) {
            self.store.ttl_hours = parse_env(ENV_TTL_HOURS, &value)?;
        }
        if let Some(value) = lookup(ENV_WORKERS) {
            self.detector.workers = parse_env(ENV_WORKERS, &value)?;
        }
        if let Some(value) = lookup(ENV_SPORTS) {
            let sports: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if sports.is_empty() {
                return Err(ConfigError::InvalidEnv {
                    var: ENV_SPORTS,
                    value,
                });
            }
            self.source.sports = sports;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// Detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Valid quotes a game needs before it can be flagged.
    pub min_valid_quotes: usize,
    /// Worker threads for batch evaluation. 1 evaluates sequentially.
    pub workers: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            min_valid_quotes: 2,
            workers: 1,
        }
    }
}

impl From<&DetectorSettings> for DetectorConfig {
    fn from(settings: &DetectorSettings) -> Self {
        DetectorConfig {
            min_valid_quotes: settings.min_valid_quotes,
        }
    }
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Hours a stored quote or opportunity stays visible.
    pub ttl_hours: u32,
    /// Upper bound on stored quotes.
    pub max_quotes: Option<usize>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            max_quotes: None,
        }
    }
}

impl StoreSettings {
    pub fn build(&self) -> MemoryStore {
        let store = MemoryStore::with_ttl_hours(self.ttl_hours);
        match self.max_quotes {
            Some(limit) => store.with_capacity_limit(limit),
            None => store,
        }
    }
}

/// Odds source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Provider sport keys to ingest.
    pub sports: Vec<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            sports: Sport::defaults().iter().map(|s| s.key().to_string()).collect(),
        }
    }
}

impl SourceSettings {
    pub fn sports(&self) -> Vec<Sport> {
        self.sports.iter().map(|key| Sport::new(key)).collect()
    }
}
