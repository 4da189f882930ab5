//! Configuration management for happymap.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::colors::ColorStrategy;
use crate::error::{HappyMapError, Result};
use crate::metrics::MetricId;

/// Command-line arguments for happymap
#[derive(Parser, Debug)]
#[command(name = "happymap")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the happiness table (CSV or JSON)
    #[arg(long, env = "HAPPYMAP_TABLE")]
    pub table: Option<PathBuf>,

    /// Path to the country coordinates CSV
    #[arg(long, env = "HAPPYMAP_COORDINATES")]
    pub coordinates: Option<PathBuf>,

    /// Host address to bind to
    #[arg(short = 'H', long, env = "HAPPYMAP_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "HAPPYMAP_PORT")]
    pub port: Option<u16>,

    /// Default color policy (gradient, banded)
    #[arg(long, env = "HAPPYMAP_POLICY")]
    pub policy: Option<String>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "HAPPYMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "HAPPYMAP_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Dataset file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Happiness table (CSV, or JSON array of rows)
    #[serde(default = "default_table_path")]
    pub table_path: PathBuf,

    /// Country coordinates CSV
    #[serde(default = "default_coordinates_path")]
    pub coordinates_path: PathBuf,
}

/// Rendering defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Color policy used when a request does not name one
    #[serde(default = "default_policy")]
    pub policy: String,

    /// Metric shown on start
    #[serde(default = "default_metric")]
    pub default_metric: String,

    /// Animation tick interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Data configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Render configuration
    #[serde(default)]
    pub render: RenderConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Build configuration from parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments and environment
        if let Some(table) = args.table {
            config.data.table_path = table;
        }
        if let Some(coordinates) = args.coordinates {
            config.data.coordinates_path = coordinates;
        }
        if let Some(host) = args.host {
            config.server.host = host;
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
        if let Some(policy) = args.policy {
            config.render.policy = policy;
        }
        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.server = other.server;
        self.data = other.data;
        self.render = other.render;
        self.log_level = other.log_level;
    }

    /// Default color policy as a strategy
    pub fn color_strategy(&self) -> Result<ColorStrategy> {
        self.render.policy.parse()
    }

    /// Default metric as an id
    pub fn default_metric(&self) -> Result<MetricId> {
        self.render.default_metric.parse()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(HappyMapError::Config {
                message: "Server host cannot be empty".to_string(),
            });
        }

        // Validate port (0 is not a valid port for users)
        if self.server.port == 0 {
            return Err(HappyMapError::Config {
                message: "Server port cannot be 0".to_string(),
            });
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(HappyMapError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        self.color_strategy().map_err(|e| HappyMapError::Config {
            message: e.to_string(),
        })?;
        self.default_metric().map_err(|e| HappyMapError::Config {
            message: e.to_string(),
        })?;

        if self.render.tick_ms == 0 {
            return Err(HappyMapError::Config {
                message: "Animation tick interval cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            render: RenderConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            table_path: default_table_path(),
            coordinates_path: default_coordinates_path(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            default_metric: default_metric(),
            tick_ms: default_tick_ms(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_table_path() -> PathBuf {
    PathBuf::from("resources/world-happiness-table-2024.csv")
}

fn default_coordinates_path() -> PathBuf {
    PathBuf::from("resources/country-coordinates.csv")
}

fn default_policy() -> String {
    "gradient".to_string()
}

fn default_metric() -> String {
    "happiness".to_string()
}

fn default_tick_ms() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}
