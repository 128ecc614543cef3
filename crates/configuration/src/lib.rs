use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{DatabaseSettings, RetrySettings, Settings};

/// Loads the application configuration.
///
/// Reads `soiltrack.toml` when present, then applies `SOILTRACK_*`
/// environment overrides (e.g. `SOILTRACK_DATABASE__MAX_CONNECTIONS=20`).
/// Every field has a default, so a missing file yields the stock settings.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("soiltrack").required(false))
        .add_source(config::Environment::with_prefix("SOILTRACK").separator("__"))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;

    if settings.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }
    if settings.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.database.acquire_timeout_secs, 5);
        assert_eq!(settings.retry.max_attempts, 3);
    }

    #[test]
    fn settings_resolve_without_a_config_file() {
        let settings = load_settings().unwrap();
        assert!(settings.retry.max_attempts >= 1);
        assert!(settings.database.max_connections >= 1);
    }
}
