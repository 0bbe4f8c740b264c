//! Data structures shared across the validation engine.

use serde::{Deserialize, Serialize};

/// Terminal classification of a contact's email after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmailStatus {
    /// No candidate could be confirmed; `validated_email` stays empty.
    #[default]
    Invalid,
    /// The verification provider confirmed the address exists.
    Valid,
    /// The domain accepts mail to any local part, so the reported address is
    /// a best-effort guess rather than a confirmed mailbox.
    #[serde(rename = "Catch-All")]
    CatchAll,
}

impl std::fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailStatus::Invalid => write!(f, "Invalid"),
            EmailStatus::Valid => write!(f, "Valid"),
            EmailStatus::CatchAll => write!(f, "Catch-All"),
        }
    }
}

/// One input row from the lead spreadsheet.
///
/// Field names mirror the tabular column headers the surrounding pipeline
/// uses, so rows round-trip through JSON without a mapping layer. The two
/// output fields are written exactly once by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "FIRST NAME", default)]
    pub first_name: String,
    #[serde(rename = "LAST NAME", default)]
    pub last_name: String,
    #[serde(rename = "COMPANY", default)]
    pub company: String,
    #[serde(rename = "EMAIL STATUS", default)]
    pub email_status: EmailStatus,
    #[serde(rename = "VALIDATED EMAIL", default)]
    pub validated_email: String,
}

impl Contact {
    /// Convenience constructor for a fresh, unvalidated row.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            company: company.into(),
            email_status: EmailStatus::Invalid,
            validated_email: String::new(),
        }
    }
}

/// Tri-state answer from the external verification provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Provider result code 1: the mailbox exists.
    DefiniteValid,
    /// Provider result code 2: the domain accepts anything.
    CatchAll,
    /// Everything else, including transport failure after retries. Treated as
    /// "try the next candidate".
    Indeterminate,
}

/// Output of a full batch run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Every input row, annotated, in the original input order.
    pub results: Vec<Contact>,
    /// Only the Valid / Catch-All rows, sorted ascending by company name.
    pub deliverable: Vec<Contact>,
}

impl ValidationReport {
    pub fn valid_count(&self) -> usize {
        self.results
            .iter()
            .filter(|c| c.email_status == EmailStatus::Valid)
            .count()
    }

    pub fn catch_all_count(&self) -> usize {
        self.results
            .iter()
            .filter(|c| c.email_status == EmailStatus::CatchAll)
            .count()
    }

    pub fn invalid_count(&self) -> usize {
        self.results
            .iter()
            .filter(|c| c.email_status == EmailStatus::Invalid)
            .count()
    }
}
