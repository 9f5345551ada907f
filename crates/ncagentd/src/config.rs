//! Configuration file support for ncagentd
//!
//! Loads and validates agent configuration from TOML files.
//! Default location: /etc/ncagent/ncagentd.toml

use crate::error::{AgentError, Result};
use ncagent_core::{SchedulerConfig, DEFAULT_CONCURRENCY_CEILING, DEFAULT_HANDLER_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ncagent/ncagentd.toml";

/// Reconciliation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum concurrent handler calls per resource kind
    #[serde(default = "default_concurrency_ceiling")]
    pub concurrency_ceiling: usize,

    /// Per-resource handler timeout in seconds, 0 disables it
    #[serde(default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataplaneMode {
    /// Log programming requests without touching the host.
    #[default]
    DryRun,
}

/// Dataplane configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataplaneConfig {
    #[serde(default)]
    pub mode: DataplaneMode,

    /// Integration bridge ports are plugged into
    #[serde(default = "default_bridge")]
    pub bridge: String,

    /// Serve DHCP entries locally
    #[serde(default = "default_dhcp_enabled")]
    pub dhcp_enabled: bool,
}

/// Complete ncagentd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dataplane: DataplaneConfig,
}

fn default_concurrency_ceiling() -> usize {
    DEFAULT_CONCURRENCY_CEILING
}

fn default_handler_timeout_secs() -> u64 {
    DEFAULT_HANDLER_TIMEOUT.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bridge() -> String {
    "br-int".to_string()
}

fn default_dhcp_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency_ceiling: default_concurrency_ceiling(),
            handler_timeout_secs: default_handler_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for DataplaneConfig {
    fn default() -> Self {
        Self {
            mode: DataplaneMode::default(),
            bridge: default_bridge(),
            dhcp_enabled: default_dhcp_enabled(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                AgentError::Configuration(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AgentError::Io(e)),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AgentError::Configuration(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        match self.engine.handler_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::default()
            .with_concurrency_ceiling(self.engine.concurrency_ceiling)
            .with_handler_timeout(self.handler_timeout())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.concurrency_ceiling == 0 {
            return Err(AgentError::Configuration(
                "concurrency_ceiling must be > 0".to_string(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(AgentError::Configuration(
                "logging level must not be empty".to_string(),
            ));
        }

        if self.dataplane.bridge.is_empty() {
            return Err(AgentError::Configuration(
                "dataplane bridge must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
