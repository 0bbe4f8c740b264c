//! Contains validation logic for the final Config struct.

use super::Config;
use crate::core::error::{AppError, Result};

/// Validates the configuration settings after loading and potential overrides.
/// Mutates the config to clamp values or set defaults where applicable and
/// logical. Internal helper for the builder's `build` method.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.sleep_between_requests.0 < 0.0 || config.sleep_between_requests.1 < 0.0 {
        return Err(AppError::Config(
            "Sleep durations cannot be negative.".to_string(),
        ));
    }
    if config.sleep_between_requests.0 > config.sleep_between_requests.1 {
        tracing::warn!(
            "Min sleep ({:.2}s) > Max sleep ({:.2}s). Setting max sleep = min sleep.",
            config.sleep_between_requests.0,
            config.sleep_between_requests.1
        );
        config.sleep_between_requests.1 = config.sleep_between_requests.0;
    }
    if config.verifier_base_url.trim().is_empty() {
        return Err(AppError::Config(
            "Verifier base URL cannot be empty.".to_string(),
        ));
    }
    if config.verifier_api_key.trim().is_empty() {
        tracing::warn!(
            "No verifier API key configured. Verification requests will be rejected by the provider."
        );
    }
    if config.max_verification_attempts == 0 {
        tracing::warn!("Max verification attempts was set to 0. Setting to 1.");
        config.max_verification_attempts = 1;
    }
    if config.max_concurrency == 0 {
        tracing::warn!("Max concurrency was set to 0. Setting to 1.");
        config.max_concurrency = 1;
    }
    if config.pattern_db_path.trim().is_empty() {
        return Err(AppError::Config(
            "Pattern database path cannot be empty.".to_string(),
        ));
    }
    Ok(())
}
