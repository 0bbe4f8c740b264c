//! Error types for the lead-resolver library.

use thiserror::Error;

/// All errors produced by this crate.
///
/// Note that most failure modes inside the validation engine are *recovered*
/// rather than surfaced: transport failures degrade to an indeterminate
/// verification outcome, corrupt data files degrade to empty structures, and
/// malformed candidates are skipped. The variants here cover the remaining
/// hard failures (setup, configuration, persistence).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Required data file missing: {0}")]
    MissingDataFile(String),

    #[error("Verification transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Verification provider error: {0}")]
    Provider(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AppError>;
