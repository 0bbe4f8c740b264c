//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Returns the parsed `ConfigFile` content. Internal to the builder logic.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    tracing::debug!("Attempting to parse TOML from: {}", file_path);
    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

/// Applies settings from a parsed `ConfigFile` onto a mutable `Config`
/// instance. Internal helper for the builder. This merges settings.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Network
    if let Some(timeout) = file_config.network.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(min_sleep) = file_config.network.min_sleep {
        config.sleep_between_requests.0 = min_sleep;
    }
    if let Some(max_sleep) = file_config.network.max_sleep {
        config.sleep_between_requests.1 = max_sleep;
    }
    if let Some(ref user_agent) = file_config.network.user_agent {
        config.user_agent = user_agent.clone();
    }

    // Verifier
    if let Some(ref base_url) = file_config.verifier.base_url {
        if !base_url.trim().is_empty() {
            config.verifier_base_url = base_url.trim().to_string();
        }
    }
    if let Some(ref api_key) = file_config.verifier.api_key {
        config.verifier_api_key = api_key.trim().to_string();
    }
    if let Some(attempts) = file_config.verifier.max_attempts {
        config.max_verification_attempts = attempts;
    }

    // Validation
    if let Some(concurrency) = file_config.validation.max_concurrency {
        config.max_concurrency = concurrency;
    }

    // Data files
    if let Some(ref path) = file_config.data.format_hints {
        config.format_hints_path = path.clone();
    }
    if let Some(ref path) = file_config.data.bad_emails {
        config.bad_emails_path = path.clone();
    }
    if let Some(ref path) = file_config.data.pattern_db {
        config.pattern_db_path = path.clone();
    }
    if let Some(required) = file_config.data.require_format_hints {
        config.require_format_hints = required;
    }
}
