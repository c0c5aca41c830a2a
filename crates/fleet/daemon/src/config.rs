//! Configuration for fleet-daemon

use crate::error::{DaemonError, DaemonResult};
use fleet_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Ledger configuration
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Remote service configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// SQLite connection URL
    #[serde(default = "default_ledger_url")]
    pub url: String,

    /// Maximum connections in pool
    #[serde(default = "default_pool_size")]
    pub max_connections: u32,

    /// Allow-list file read once at startup
    #[serde(default = "default_seed_file")]
    pub seed_file: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            url: default_ledger_url(),
            max_connections: default_pool_size(),
            seed_file: default_seed_file(),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between reconciliation passes
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Pause between consecutive commands within a pass
    #[serde(default)]
    pub command_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            command_delay_ms: 0,
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}

fn default_ledger_url() -> String {
    "sqlite://device.db".to_string()
}

fn default_pool_size() -> u32 {
    4
}

fn default_seed_file() -> String {
    "snlist.csv".to_string()
}

fn default_interval() -> u64 {
    15 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file and `FLEET_*` env vars
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables, e.g. FLEET_GATEWAY__USERNAME
        builder = builder.add_source(
            config::Environment::with_prefix("FLEET")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("gateway.states")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject settings the daemon cannot run with
    pub fn validate(&self) -> DaemonResult<()> {
        if self.scheduler.interval_secs == 0 {
            return Err(DaemonError::Config(
                "scheduler.interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.gateway.page_size == 0 {
            return Err(DaemonError::Config(
                "gateway.page_size must be greater than zero".to_string(),
            ));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(DaemonError::Config(
                "gateway.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.gateway.states.iter().all(|s| s.trim().is_empty()) {
            return Err(DaemonError::Config(
                "gateway.states must name at least one state".to_string(),
            ));
        }
        if self.gateway.username.trim().is_empty() {
            return Err(DaemonError::Config(
                "gateway.username is required (set FLEET_GATEWAY__USERNAME)".to_string(),
            ));
        }
        Ok(())
    }
}
