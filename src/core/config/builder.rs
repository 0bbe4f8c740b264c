//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile};
use crate::core::error::{AppError, Result};
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// This is the primary way users should create a `Config` object.
/// It handles loading from files, applying overrides, and validation.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.overrides.validation.max_concurrency = Some(value);
        self
    }
    pub fn max_verification_attempts(mut self, value: u32) -> Self {
        self.overrides.verifier.max_attempts = Some(value);
        self
    }
    pub fn sleep_between_requests(mut self, min: f32, max: f32) -> Self {
        self.overrides.network.min_sleep = Some(min);
        self.overrides.network.max_sleep = Some(max);
        self
    }
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs());
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.user_agent = Some(value.into());
        self
    }
    pub fn verifier_base_url(mut self, value: impl Into<String>) -> Self {
        self.overrides.verifier.base_url = Some(value.into());
        self
    }
    pub fn verifier_api_key(mut self, value: impl Into<String>) -> Self {
        self.overrides.verifier.api_key = Some(value.into());
        self
    }
    pub fn format_hints_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.data.format_hints = Some(path.into());
        self
    }
    pub fn bad_emails_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.data.bad_emails = Some(path.into());
        self
    }
    pub fn pattern_db_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.data.pattern_db = Some(path.into());
        self
    }
    pub fn require_format_hints(mut self, required: bool) -> Self {
        self.overrides.data.require_format_hints = Some(required);
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings,
    /// overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./lead-resolver.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    tracing::debug!("Found potential default config file: {}", path_str);
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config);
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::info!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.max_verification_attempts, 3);
        assert!(config.email_regex.is_match("jane.doe@acme.com"));
        assert!(!config.email_regex.is_match("jane doe@acme"));
    }

    #[test]
    fn test_overrides_apply() {
        let config = ConfigBuilder::new()
            .max_concurrency(3)
            .max_verification_attempts(5)
            .verifier_api_key("test-key")
            .pattern_db_path("/tmp/db.json")
            .build()
            .unwrap();
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.max_verification_attempts, 5);
        assert_eq!(config.verifier_api_key, "test-key");
        assert_eq!(config.pattern_db_path, "/tmp/db.json");
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = ConfigBuilder::new()
            .max_concurrency(0)
            .max_verification_attempts(0)
            .build()
            .unwrap();
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.max_verification_attempts, 1);
    }

    #[test]
    fn test_negative_sleep_rejected() {
        let result = ConfigBuilder::new().sleep_between_requests(-1.0, 0.5).build();
        assert!(result.is_err());
    }
}
