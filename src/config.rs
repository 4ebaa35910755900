use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use config::{Config, Environment, File};

use crate::error::{Result, SentimentError};
use crate::models::{SortKey, Theme, TimeWindow};
use crate::session::DashboardSettings;

/// Prefix of environment overrides, e.g. `SENTIMENT_DASHBOARD__DASHBOARD__WINDOW_DAYS=2`
pub const ENV_PREFIX: &str = "SENTIMENT_DASHBOARD";

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input table location
    pub data: DataConfig,
    /// Initial selector values
    pub dashboard: DashboardConfig,
    /// Log output
    pub logging: LoggingConfig,
    /// Rendering colors
    pub theme: ThemeConfig,
}

/// Where the exported message table lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path of the CSV export
    pub csv_path: String,
}

/// Initial dashboard selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Symbol selected at startup; first symbol of the table when unset
    pub default_symbol: Option<String>,
    /// Series window in days: 2, 10 or 30
    pub window_days: u32,
    /// Initial bucket ordering: "recency" or "score"
    pub default_sort: String,
    /// Cap on each message list; unbounded when unset
    pub bucket_limit: Option<usize>,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Daily-rolling JSON log file, none when unset
    pub file_path: Option<String>,
    /// Console format: "json" or "text"
    pub format: String,
}

/// Rendering theme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// "light" or "dark"
    pub base: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                csv_path: "export_symboles.csv".to_string(),
            },
            dashboard: DashboardConfig {
                default_symbol: None,
                window_days: TimeWindow::default().days(),
                default_sort: SortKey::default().as_str().to_string(),
                bucket_limit: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            theme: ThemeConfig {
                base: "light".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from the default locations and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with precedence, lowest first: built-in defaults,
    /// `config/default`, `config/local`, `config`, the explicit `path`, environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        for (key, value) in Self::default().defaults() {
            builder = builder.set_default(key, value)?;
        }

        builder = builder
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SentimentError::InvalidConfig(format!("Failed to load configuration: {e}")))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| SentimentError::InvalidConfig(format!("Failed to deserialize configuration: {e}")))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.data.csv_path.trim().is_empty() {
            return Err(SentimentError::InvalidConfig("csv_path cannot be empty".to_string()));
        }

        if let Some(symbol) = &self.dashboard.default_symbol {
            if symbol.trim().is_empty() {
                return Err(SentimentError::InvalidConfig(
                    "default_symbol cannot be empty when set".to_string(),
                ));
            }
        }

        self.window()?;
        self.sort_key()?;

        if self.dashboard.bucket_limit == Some(0) {
            return Err(SentimentError::InvalidConfig("bucket_limit must be greater than 0".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(SentimentError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(SentimentError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        self.theme()?;

        Ok(())
    }

    /// Series window
    pub fn window(&self) -> Result<TimeWindow> {
        TimeWindow::try_from(self.dashboard.window_days)
    }

    /// Initial bucket ordering
    pub fn sort_key(&self) -> Result<SortKey> {
        self.dashboard.default_sort.parse()
    }

    /// Rendering theme
    pub fn theme(&self) -> Result<Theme> {
        self.theme.base.parse()
    }

    /// Path of the CSV export
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data.csv_path)
    }

    /// True if console logs should be JSON
    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.logging.format == "json"
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Initial session settings
    pub fn dashboard_settings(&self) -> Result<DashboardSettings> {
        Ok(DashboardSettings {
            default_symbol: self.dashboard.default_symbol.clone(),
            window: self.window()?,
            default_sort: self.sort_key()?,
            bucket_limit: self.dashboard.bucket_limit,
        })
    }

    /// Flatten into dotted keys for use as configuration defaults
    fn defaults(self) -> Vec<(&'static str, config::Value)> {
        let mut values = vec![
            ("data.csv_path", config::Value::from(self.data.csv_path)),
            ("dashboard.window_days", config::Value::from(i64::from(self.dashboard.window_days))),
            ("dashboard.default_sort", config::Value::from(self.dashboard.default_sort)),
            ("logging.level", config::Value::from(self.logging.level)),
            ("logging.format", config::Value::from(self.logging.format)),
            ("theme.base", config::Value::from(self.theme.base)),
        ];

        if let Some(symbol) = self.dashboard.default_symbol {
            values.push(("dashboard.default_symbol", config::Value::from(symbol)));
        }
        if let Some(limit) = self.dashboard.bucket_limit {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            values.push(("dashboard.bucket_limit", config::Value::from(limit)));
        }
        if let Some(file_path) = self.logging.file_path {
            values.push(("logging.file_path", config::Value::from(file_path)));
        }

        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.data.csv_path, "export_symboles.csv");
        assert_eq!(config.dashboard.window_days, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.dashboard.window_days = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_skip_unset_options() {
        let keys: Vec<&str> = AppConfig::default().defaults().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"dashboard.window_days"));
        assert!(!keys.contains(&"dashboard.bucket_limit"));
        assert!(!keys.contains(&"logging.file_path"));
    }
}
