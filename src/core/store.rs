//! The dynamic per-domain pattern database.
//!
//! Tracks, for every company domain, how often each candidate pattern has
//! produced a provider-confirmed address, plus which domains turned out to be
//! catch-all. Shared across all concurrent validations in a run and persisted
//! once at the end.

use crate::core::error::Result;
use crate::utils::patterns::PatternKey;

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Reserved top-level key in the durable form holding catch-all flags.
const CATCH_ALL_KEY: &str = "_catchall_domains";

#[derive(Debug, Default)]
struct StoreInner {
    /// domain -> pattern -> confirmation count. Insertion order of the inner
    /// map is the discovery order used to break priority ties.
    usage: IndexMap<String, IndexMap<PatternKey, u32>>,
    catch_all: IndexSet<String>,
}

/// Thread-safe pattern usage store.
///
/// Counts only ever increase, and only for patterns that produced a
/// definite-valid verification. Catch-all marks are monotonic within a run.
#[derive(Debug, Default)]
pub struct PatternStore {
    inner: RwLock<StoreInner>,
}

impl PatternStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store from its durable JSON form.
    ///
    /// A missing file yields an empty store; unreadable or corrupt content
    /// also yields an empty store with a warning. Never fails the run.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(
                "Pattern database '{}' not found, starting with an empty store.",
                path.display()
            );
            return Self::new();
        }
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(value) => {
                    let store = Self::from_json(&value);
                    tracing::info!(
                        "Loaded pattern database from '{}' ({} domains, {} catch-all).",
                        path.display(),
                        store.domain_count(),
                        store.catch_all_count()
                    );
                    store
                }
                Err(e) => {
                    tracing::warn!(
                        "Pattern database '{}' is not valid JSON ({}), resetting to empty.",
                        path.display(),
                        e
                    );
                    Self::new()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Could not read pattern database '{}' ({}), resetting to empty.",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Rebuilds a store from a durable JSON value, skipping malformed entries.
    pub fn from_json(value: &Value) -> Self {
        let mut inner = StoreInner::default();
        let Some(object) = value.as_object() else {
            tracing::warn!("Pattern database root is not a JSON object, resetting to empty.");
            return Self::new();
        };

        for (domain, entry) in object {
            if domain == CATCH_ALL_KEY {
                if let Some(flags) = entry.as_object() {
                    for (flagged_domain, flag) in flags {
                        if flag.as_bool() == Some(true) {
                            inner.catch_all.insert(flagged_domain.clone());
                        }
                    }
                } else {
                    tracing::warn!("Catch-all section is not a JSON object, ignoring it.");
                }
                continue;
            }

            let Some(patterns) = entry.as_object() else {
                tracing::warn!(
                    "Pattern entry for domain '{}' is not a JSON object, skipping.",
                    domain
                );
                continue;
            };
            let mut counts = IndexMap::new();
            for (pattern, count) in patterns {
                match count.as_u64() {
                    Some(n) => {
                        counts.insert(PatternKey::parse(pattern), n as u32);
                    }
                    None => {
                        tracing::warn!(
                            "Non-integer usage count for '{}' at domain '{}', skipping.",
                            pattern,
                            domain
                        );
                    }
                }
            }
            inner.usage.insert(domain.clone(), counts);
        }

        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Serializes the store into its durable JSON form.
    pub fn to_json(&self) -> Value {
        let inner = self.inner.read();
        let mut root = Map::new();
        for (domain, counts) in &inner.usage {
            let mut patterns = Map::new();
            for (key, count) in counts {
                patterns.insert(key.as_str().to_string(), json!(count));
            }
            root.insert(domain.clone(), Value::Object(patterns));
        }
        if !inner.catch_all.is_empty() {
            let mut flags = Map::new();
            for domain in &inner.catch_all {
                flags.insert(domain.clone(), json!(true));
            }
            root.insert(CATCH_ALL_KEY.to_string(), Value::Object(flags));
        }
        Value::Object(root)
    }

    /// Persists the store atomically: writes to `<path>.tmp`, then renames.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = path.with_extension("tmp");
        let serialized = serde_json::to_string_pretty(&self.to_json())?;
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, path)?;
        tracing::info!(
            "Pattern database saved to '{}' ({} domains, {} catch-all).",
            path.display(),
            self.domain_count(),
            self.catch_all_count()
        );
        Ok(())
    }

    /// Records one confirmed use of a pattern at a domain.
    ///
    /// Only called after a definite-valid verification; catch-all and
    /// indeterminate outcomes never increment counts.
    pub fn record_usage(&self, domain: &str, key: &PatternKey) {
        let mut inner = self.inner.write();
        let counts = inner.usage.entry(domain.to_string()).or_default();
        let count = counts.entry(key.clone()).or_insert(0);
        *count += 1;
        tracing::debug!(
            "Recorded pattern '{}' for domain '{}' (count now {}).",
            key.as_str(),
            domain,
            count
        );
    }

    /// Snapshot of a domain's recorded patterns in discovery order.
    pub fn usage_for(&self, domain: &str) -> Vec<(PatternKey, u32)> {
        let inner = self.inner.read();
        inner
            .usage
            .get(domain)
            .map(|counts| counts.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }

    /// Marks a domain as catch-all. Monotonic within a run.
    pub fn mark_catch_all(&self, domain: &str) {
        let mut inner = self.inner.write();
        if inner.catch_all.insert(domain.to_string()) {
            tracing::info!("Domain '{}' marked as catch-all.", domain);
        }
    }

    pub fn is_catch_all(&self, domain: &str) -> bool {
        self.inner.read().catch_all.contains(domain)
    }

    pub fn domain_count(&self) -> usize {
        self.inner.read().usage.len()
    }

    pub fn catch_all_count(&self) -> usize {
        self.inner.read().catch_all.len()
    }
}
