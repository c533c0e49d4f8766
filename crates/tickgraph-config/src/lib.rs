//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, DataSettings, LoggingConfig};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Prefix of environment overrides, e.g. `TICKGRAPH__ENGINE__WARMUP=partial`.
pub const ENV_PREFIX: &str = "TICKGRAPH";

/// Load configuration from file and environment.
///
/// Without a path only environment overrides are applied on top of the
/// defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    build(path, ENV_PREFIX)
}

fn build(path: Option<&Path>, env_prefix: &str) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use tickgraph_engine::{ErrorPolicy, WarmupPolicy};

    fn from_toml(contents: &str) -> Result<AppConfig, ConfigError> {
        Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.app.name, "tickgraph");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
        assert_eq!(config.engine.warmup, WarmupPolicy::AllRoots);
        assert_eq!(config.data.column, "close");
    }

    #[test]
    fn test_engine_section() {
        let config = from_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [engine]
            warmup = "partial"
            on_error = "close_lane"
            progress_every = 500
            "#,
        )
        .unwrap();

        assert!(config.logging.is_json());
        assert_eq!(config.engine.warmup, WarmupPolicy::Partial);
        assert_eq!(config.engine.on_error, ErrorPolicy::CloseLane);
        assert_eq!(config.engine.progress_every, 500);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        assert!(from_toml("[engine]\nwarmup = \"sometimes\"\n").is_err());
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("TICKGRAPH_CONFIG_TEST__ENGINE__PROGRESS_EVERY", "42");
        let config = build(None, "TICKGRAPH_CONFIG_TEST").unwrap();
        std::env::remove_var("TICKGRAPH_CONFIG_TEST__ENGINE__PROGRESS_EVERY");

        assert_eq!(config.engine.progress_every, 42);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_config(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
