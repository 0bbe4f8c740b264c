//! Read-only data inputs consulted during validation: static per-domain
//! format hints and the known-bad address set.

use crate::core::error::{AppError, Result};

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Static mapping of company domain to a literal address pattern string,
/// e.g. `"acme.com" -> "{first}.{last}@acme.com"`. Supplied out-of-band and
/// never mutated by the engine.
#[derive(Debug, Clone, Default)]
pub struct FormatHints {
    map: HashMap<String, String>,
}

impl FormatHints {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads hints from a JSON object file.
    ///
    /// A missing or unparseable file is fatal only when `required` is set;
    /// otherwise it degrades to an empty mapping with a log entry.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                return Err(AppError::MissingDataFile(format!(
                    "format hints file '{}' not found",
                    path.display()
                )));
            }
            tracing::info!(
                "Format hints file '{}' not found, continuing without static hints.",
                path.display()
            );
            return Ok(Self::empty());
        }

        let parsed: std::result::Result<HashMap<String, String>, AppError> = (|| {
            let content = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        })();

        match parsed {
            Ok(map) => {
                tracing::info!(
                    "Loaded format hints for {} domains from '{}'.",
                    map.len(),
                    path.display()
                );
                Ok(Self { map })
            }
            Err(e) if required => Err(e),
            Err(e) => {
                tracing::warn!(
                    "Could not parse format hints '{}' ({}), continuing without static hints.",
                    path.display(),
                    e
                );
                Ok(Self::empty())
            }
        }
    }

    pub fn get(&self, domain: &str) -> Option<&str> {
        self.map.get(domain).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[cfg(test)]
    pub fn from_pairs<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        Self {
            map: pairs.into_iter().collect(),
        }
    }
}

/// Set of addresses known to be undeliverable. Candidates found here are
/// skipped without a network call. Lookup is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct BadEmailSet {
    set: HashSet<String>,
}

impl BadEmailSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the bad-email set from JSON.
    ///
    /// Accepts either an array of address strings or an object keyed by
    /// address (both shapes exist in historical data files). Missing or
    /// corrupt content yields an empty set with a warning, never an error.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!(
                "Bad emails file '{}' not found, continuing with an empty set.",
                path.display()
            );
            return Self::empty();
        }
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    "Could not read bad emails file '{}' ({}), continuing with an empty set.",
                    path.display(),
                    e
                );
                return Self::empty();
            }
        };
        let value: Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    "Bad emails file '{}' is not valid JSON ({}), continuing with an empty set.",
                    path.display(),
                    e
                );
                return Self::empty();
            }
        };

        let set: HashSet<String> = match value {
            Value::Array(entries) => entries
                .into_iter()
                .filter_map(|v| v.as_str().map(|s| s.trim().to_lowercase()))
                .collect(),
            Value::Object(entries) => entries
                .into_iter()
                .map(|(k, _)| k.trim().to_lowercase())
                .collect(),
            _ => {
                tracing::warn!(
                    "Bad emails file '{}' has an unexpected shape, continuing with an empty set.",
                    path.display()
                );
                HashSet::new()
            }
        };

        tracing::info!(
            "Loaded {} known-bad addresses from '{}'.",
            set.len(),
            path.display()
        );
        Self { set }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.set.contains(&email.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    #[cfg(test)]
    pub fn from_addresses<I: IntoIterator<Item = String>>(addresses: I) -> Self {
        Self {
            set: addresses.into_iter().map(|a| a.to_lowercase()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_format_hints_missing_optional() {
        let hints = FormatHints::load(Path::new("/nonexistent/hints.json"), false).unwrap();
        assert!(hints.is_empty());
    }

    #[test]
    fn test_format_hints_missing_required_is_fatal() {
        let result = FormatHints::load(Path::new("/nonexistent/hints.json"), true);
        assert!(matches!(result, Err(AppError::MissingDataFile(_))));
    }

    #[test]
    fn test_format_hints_loads_mapping() {
        let path = write_temp(
            "lead-resolver-hints.json",
            r#"{"acme.com": "{first}.{last}@acme.com"}"#,
        );
        let hints = FormatHints::load(&path, true).unwrap();
        assert_eq!(hints.get("acme.com"), Some("{first}.{last}@acme.com"));
        assert_eq!(hints.get("globex.com"), None);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_format_hints_corrupt_optional_degrades() {
        let path = write_temp("lead-resolver-hints-corrupt.json", "not json at all");
        let hints = FormatHints::load(&path, false).unwrap();
        assert!(hints.is_empty());
        assert!(FormatHints::load(&path, true).is_err());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bad_emails_array_shape() {
        let path = write_temp(
            "lead-resolver-bad-array.json",
            r#"["Dead@acme.com", "gone@globex.com"]"#,
        );
        let bad = BadEmailSet::load(&path);
        assert!(bad.contains("dead@acme.com"));
        assert!(bad.contains("DEAD@ACME.COM"));
        assert!(!bad.contains("alive@acme.com"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bad_emails_object_shape() {
        let path = write_temp(
            "lead-resolver-bad-object.json",
            r#"{"dead@acme.com": "bounced 2024-11-02"}"#,
        );
        let bad = BadEmailSet::load(&path);
        assert!(bad.contains("dead@acme.com"));
        assert_eq!(bad.len(), 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bad_emails_missing_or_corrupt_is_empty() {
        assert!(BadEmailSet::load(Path::new("/nonexistent/bad.json")).is_empty());
        let path = write_temp("lead-resolver-bad-corrupt.json", "{{{{");
        assert!(BadEmailSet::load(&path).is_empty());
        let _ = fs::remove_file(&path);
    }
}
