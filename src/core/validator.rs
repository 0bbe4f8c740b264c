//! Per-contact validation state machine.

use crate::core::config::Config;
use crate::core::inputs::{BadEmailSet, FormatHints};
use crate::core::models::{Contact, EmailStatus, VerificationOutcome};
use crate::core::store::PatternStore;
use crate::utils::domain::company_domain;
use crate::utils::patterns::{candidate_patterns, PatternKey};
use crate::verification::Verifier;

use std::sync::Arc;

/// Validates one contact at a time: candidate generation, verification,
/// early termination, and pattern-store updates.
///
/// Generic over the [`Verifier`] so the state machine can be driven by
/// scripted outcomes in tests. One instance is shared by all concurrent
/// validations in a batch; the pattern store is the only mutable state and
/// synchronizes internally.
pub struct LeadValidator<V> {
    config: Arc<Config>,
    verifier: V,
    hints: FormatHints,
    bad_emails: BadEmailSet,
    store: Arc<PatternStore>,
}

impl<V: Verifier> LeadValidator<V> {
    pub fn new(
        config: Arc<Config>,
        verifier: V,
        hints: FormatHints,
        bad_emails: BadEmailSet,
        store: Arc<PatternStore>,
    ) -> Self {
        Self {
            config,
            verifier,
            hints,
            bad_emails,
            store,
        }
    }

    /// The shared pattern store, for persistence after the batch completes.
    pub fn pattern_store(&self) -> &Arc<PatternStore> {
        &self.store
    }

    /// Runs the validation state machine for one contact.
    ///
    /// Always returns an annotated contact; no failure here aborts a batch.
    /// Transitions:
    /// - missing mandatory fields resolve Invalid without any network call;
    /// - a domain already known catch-all resolves Catch-All without any
    ///   network call, with a synthesized display address;
    /// - otherwise candidates are tried in priority order until the first
    ///   DefiniteValid (recorded in the store) or CatchAll (domain marked),
    ///   both of which stop iteration; exhaustion resolves Invalid.
    pub async fn validate(&self, mut contact: Contact) -> Contact {
        let task_label = format!(
            "{} {} / {}",
            contact.first_name.trim(),
            contact.last_name.trim(),
            contact.company.trim()
        );
        tracing::debug!(target: "validate_task", "[{}] Starting validation.", task_label);

        let missing = missing_mandatory_fields(&contact);
        if !missing.is_empty() {
            tracing::warn!(target: "validate_task",
                "[{}] Missing {}, resolving Invalid without verification.",
                task_label,
                missing.join(", ")
            );
            contact.email_status = EmailStatus::Invalid;
            contact.validated_email.clear();
            return contact;
        }

        let domain = company_domain(&contact.company);

        if self.store.is_catch_all(&domain) {
            contact.validated_email = self.display_address(&contact, &domain);
            contact.email_status = EmailStatus::CatchAll;
            tracing::info!(target: "validate_task",
                "[{}] Domain '{}' already known catch-all, skipping verification.",
                task_label, domain
            );
            return contact;
        }

        let candidates = candidate_patterns(self.hints.get(&domain), &self.store.usage_for(&domain));
        let total = candidates.len();
        tracing::debug!(target: "validate_task",
            "[{}] {} candidate patterns for domain '{}'.", task_label, total, domain
        );

        for (index, key) in candidates.iter().enumerate() {
            let candidate_label = format!("[{}:{}/{}]", task_label, index + 1, total);

            let local = key.render(&contact.first_name, &contact.last_name);
            if local.is_empty() {
                tracing::debug!(target: "validate_task",
                    "{} Pattern '{}' rendered empty, skipping.", candidate_label, key.as_str());
                continue;
            }
            let address = format!("{}@{}", local, domain);

            if !self.config.email_regex.is_match(&address) {
                tracing::debug!(target: "validate_task",
                    "{} Rendered address '{}' failed format check, skipping.",
                    candidate_label, address);
                continue;
            }
            if self.bad_emails.contains(&address) {
                tracing::debug!(target: "validate_task",
                    "{} Address '{}' is a known-bad email, skipping.", candidate_label, address);
                continue;
            }

            match self.verifier.verify(&address).await {
                VerificationOutcome::DefiniteValid => {
                    self.store.record_usage(&domain, key);
                    contact.email_status = EmailStatus::Valid;
                    contact.validated_email = address;
                    tracing::info!(target: "validate_task",
                        "{} Confirmed valid: {} (pattern '{}').",
                        candidate_label, contact.validated_email, key.as_str());
                    return contact;
                }
                VerificationOutcome::CatchAll => {
                    // First catch-all wins; later candidates are never tried.
                    self.store.mark_catch_all(&domain);
                    contact.email_status = EmailStatus::CatchAll;
                    contact.validated_email = address;
                    tracing::info!(target: "validate_task",
                        "{} Domain '{}' is catch-all, stopping with {}.",
                        candidate_label, domain, contact.validated_email);
                    return contact;
                }
                VerificationOutcome::Indeterminate => {
                    tracing::debug!(target: "validate_task",
                        "{} Indeterminate for '{}', trying next candidate.",
                        candidate_label, address);
                }
            }
        }

        tracing::info!(target: "validate_task",
            "[{}] All candidates exhausted without confirmation, resolving Invalid.", task_label);
        contact.email_status = EmailStatus::Invalid;
        contact.validated_email.clear();
        contact
    }

    /// Best-effort address for a catch-all domain, built from the static hint
    /// or the `{first}.{last}` fallback. Display only, never verified.
    fn display_address(&self, contact: &Contact, domain: &str) -> String {
        let key = self
            .hints
            .get(domain)
            .map(PatternKey::from_hint)
            .unwrap_or(PatternKey::FirstDotLast);
        let mut local = key.render(&contact.first_name, &contact.last_name);
        if local.is_empty() {
            local = PatternKey::FirstDotLast.render(&contact.first_name, &contact.last_name);
        }
        if local.is_empty() {
            return String::new();
        }
        format!("{}@{}", local, domain)
    }
}

/// Names the mandatory fields that are blank after trimming, if any.
fn missing_mandatory_fields(contact: &Contact) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if contact.first_name.trim().is_empty() {
        missing.push("first name");
    }
    if contact.last_name.trim().is_empty() {
        missing.push("last name");
    }
    if contact.company.trim().is_empty() {
        missing.push("company");
    }
    missing
}
