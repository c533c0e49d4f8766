//! Configuration structures.

use serde::{Deserialize, Serialize};
use tickgraph_engine::EngineConfig;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub data: DataSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "tickgraph".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Defaults for CSV-backed sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Column read when none is given on the command line.
    pub column: String,
    /// Column rows are ordered by, if any.
    pub timestamp_column: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            column: "close".to_string(),
            timestamp_column: None,
        }
    }
}
