//! Application configuration: the runtime `Config` struct, the TOML file
//! schema, and the fluent builder.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

/// Fully resolved runtime configuration.
///
/// Construct via [`ConfigBuilder`]; defaults are applied first, then an
/// optional TOML file, then explicit overrides, then validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Timeout for each verification HTTP request.
    pub request_timeout: Duration,
    /// Min/max seconds slept between verification retry attempts.
    pub sleep_between_requests: (f32, f32),
    pub user_agent: String,

    /// Base URL of the verification provider endpoint.
    pub verifier_base_url: String,
    /// API key sent with each verification request.
    pub verifier_api_key: String,
    /// Retry budget per candidate address.
    pub max_verification_attempts: u32,

    /// Maximum number of contacts validated concurrently.
    pub max_concurrency: usize,

    pub format_hints_path: String,
    pub bad_emails_path: String,
    pub pattern_db_path: String,
    /// When set, a missing format hints file aborts startup.
    pub require_format_hints: bool,

    /// Sanity check applied to every rendered candidate address.
    pub email_regex: Regex,

    /// Path of the TOML file the configuration was loaded from, if any.
    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            sleep_between_requests: (0.1, 0.5),
            user_agent: format!("lead-resolver/{}", env!("CARGO_PKG_VERSION")),
            verifier_base_url: "https://api.millionverifier.com/api/v3/".to_string(),
            verifier_api_key: String::new(),
            max_verification_attempts: 3,
            max_concurrency: 10,
            format_hints_path: "./data/email_formats.json".to_string(),
            bad_emails_path: "./data/bad_emails.json".to_string(),
            pattern_db_path: "./data/dynamic_email_format_db.json".to_string(),
            require_format_hints: false,
            email_regex: Regex::new(
                r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)+$",
            )
            .expect("default email regex must compile"),
            loaded_config_path: None,
        }
    }
}

/// Raw, partial configuration as parsed from a TOML file. Every field is
/// optional; unset fields keep their current value when merged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub network: NetworkSection,
    pub verifier: VerifierSection,
    pub validation: ValidationSection,
    pub data: DataSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub request_timeout: Option<u64>,
    pub min_sleep: Option<f32>,
    pub max_sleep: Option<f32>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifierSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub format_hints: Option<String>,
    pub bad_emails: Option<String>,
    pub pattern_db: Option<String>,
    pub require_format_hints: Option<bool>,
}
