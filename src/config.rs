//! # CloudSweep Configuration
//!
//! Layered configuration: built-in defaults, then `config/cloudsweep.*`, then
//! `config/cloudsweep.<environment>.*`, then `CLOUDSWEEP__SECTION__KEY`
//! environment variables. Files are optional; validation is not.
//!
//! ```rust,no_run
//! use cloudsweep_core::config::CloudSweepConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CloudSweepConfig::load()?;
//! println!("cleanup concurrency: {}", config.cleanup.max_concurrency);
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    DEFAULT_CLEANUP_CONCURRENCY, DEFAULT_ESTIMATE_CONCURRENCY, DEFAULT_EVENT_CHANNEL_CAPACITY,
};
use crate::error::{CloudSweepError, Result};
use crate::logging::detect_environment;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CloudSweepConfig {
    pub environment: String,
    pub database: DatabaseConfig,
    pub scan: ScanConfig,
    pub cleanup: CleanupConfig,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Concurrent cost/carbon estimate calls per scan
    pub estimate_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Concurrent remediation calls per provider group
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Explicit filter directive; falls back to an environment default
    pub level: Option<String>,
}

impl Default for CloudSweepConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: DatabaseConfig::default(),
            scan: ScanConfig::default(),
            cleanup: CleanupConfig::default(),
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/cloudsweep_development".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            estimate_concurrency: DEFAULT_ESTIMATE_CONCURRENCY,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_CLEANUP_CONCURRENCY,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: None,
        }
    }
}

impl CloudSweepConfig {
    /// Load configuration from `./config` with environment auto-detection
    pub fn load() -> Result<Self> {
        Self::load_from_directory(Path::new("config"), &detect_environment())
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory(config_dir: &Path, environment: &str) -> Result<Self> {
        let base: PathBuf = config_dir.join("cloudsweep");
        let env_specific: PathBuf = config_dir.join(format!("cloudsweep.{environment}"));

        debug!(
            environment = %environment,
            directory = %config_dir.display(),
            "Loading configuration"
        );

        let config: CloudSweepConfig = Config::builder()
            .set_default("environment", environment)?
            .add_source(File::from(base).required(false))
            .add_source(File::from(env_specific).required(false))
            .add_source(
                Environment::with_prefix("CLOUDSWEEP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            return Err(CloudSweepError::Configuration(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if self.scan.estimate_concurrency == 0 {
            return Err(CloudSweepError::Configuration(
                "scan.estimate_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.cleanup.max_concurrency == 0 {
            return Err(CloudSweepError::Configuration(
                "cleanup.max_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(CloudSweepError::Configuration(
                "events.channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
