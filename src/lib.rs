//! # Lead Resolver Core Library
//!
//! This crate infers the most likely email address for business contacts and
//! confirms deliverability through an external verification provider,
//! learning the correct address pattern per company domain as it goes.
//!
//! It is designed to be used either directly as a library or via the
//! `lead-resolver` command-line tool (which uses this library).

mod core;
mod utils;
mod verification;

pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, Result};
pub use crate::core::inputs::{BadEmailSet, FormatHints};
pub use crate::core::models::{Contact, EmailStatus, ValidationReport, VerificationOutcome};
pub use crate::core::store::PatternStore;
pub use crate::core::validator::LeadValidator;
pub use crate::utils::domain::company_domain;
pub use crate::utils::patterns::{candidate_patterns, PatternKey, FALLBACK_PATTERNS};
pub use crate::verification::{
    HttpTransport, RetryPolicy, VerificationClient, Verifier, VerifierTransport,
};

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;

/// Wires the production verification stack into a [`LeadValidator`].
pub fn initialize_validator(
    config: Arc<Config>,
    hints: FormatHints,
    bad_emails: BadEmailSet,
    store: Arc<PatternStore>,
) -> Result<LeadValidator<VerificationClient<HttpTransport>>> {
    let transport = HttpTransport::new(&config)?;
    let client = VerificationClient::new(transport, RetryPolicy::from_config(&config));
    Ok(LeadValidator::new(
        config, client, hints, bad_emails, store,
    ))
}

/// Validates a single contact. Thin wrapper around
/// [`LeadValidator::validate`] for single-contact callers.
pub async fn validate_single_lead<V: Verifier>(
    validator: &LeadValidator<V>,
    contact: Contact,
) -> Contact {
    validator.validate(contact).await
}

/// Applies the validator concurrently across a full contact batch.
///
/// At most `config.max_concurrency` validations run at once. Completion
/// order is arbitrary, but `results` preserves the original input order; a
/// task that fails to join degrades its row to Invalid rather than aborting
/// the batch. `deliverable` holds only the Valid / Catch-All rows, sorted
/// ascending by company name (ties by last, then first name).
pub async fn validate_leads<V>(
    config: Arc<Config>,
    validator: Arc<LeadValidator<V>>,
    contacts: Vec<Contact>,
) -> ValidationReport
where
    V: Verifier + Send + Sync + 'static,
{
    let total = contacts.len();
    if total == 0 {
        return ValidationReport {
            results: Vec::new(),
            deliverable: Vec::new(),
        };
    }

    let originals = contacts.clone();
    let mut slots: Vec<Option<Contact>> = vec![None; total];
    let mut tasks = FuturesUnordered::new();

    for (index, contact) in contacts.into_iter().enumerate() {
        while tasks.len() >= config.max_concurrency {
            match tasks.next().await {
                Some(joined) => collect_joined(&mut slots, joined),
                None => {
                    tracing::warn!("Task queue unexpectedly empty while limiting concurrency.");
                    break;
                }
            }
        }

        let validator_clone = Arc::clone(&validator);
        tasks.push(tokio::spawn(async move {
            (index, validator_clone.validate(contact).await)
        }));
    }

    while let Some(joined) = tasks.next().await {
        collect_joined(&mut slots, joined);
    }

    let results: Vec<Contact> = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                // The task panicked or was cancelled; keep the row, degraded.
                let mut contact = originals[index].clone();
                contact.email_status = EmailStatus::Invalid;
                contact.validated_email.clear();
                contact
            })
        })
        .collect();

    let mut deliverable: Vec<Contact> = results
        .iter()
        .filter(|c| {
            matches!(
                c.email_status,
                EmailStatus::Valid | EmailStatus::CatchAll
            )
        })
        .cloned()
        .collect();
    deliverable.sort_by(|a, b| {
        (&a.company, &a.last_name, &a.first_name).cmp(&(&b.company, &b.last_name, &b.first_name))
    });

    ValidationReport {
        results,
        deliverable,
    }
}

fn collect_joined(
    slots: &mut [Option<Contact>],
    joined: std::result::Result<(usize, Contact), tokio::task::JoinError>,
) {
    match joined {
        Ok((index, contact)) => {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(contact);
            }
        }
        Err(e) => {
            tracing::error!("A validation task failed to join: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validator::tests::ScriptedVerifier;

    fn config_with_concurrency(n: usize) -> Arc<Config> {
        Arc::new(
            ConfigBuilder::new()
                .max_concurrency(n)
                .build()
                .expect("config should build"),
        )
    }

    fn validator_with(
        verifier: ScriptedVerifier,
        config: Arc<Config>,
        store: Arc<PatternStore>,
    ) -> Arc<LeadValidator<ScriptedVerifier>> {
        Arc::new(LeadValidator::new(
            config,
            verifier,
            FormatHints::empty(),
            BadEmailSet::empty(),
            store,
        ))
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let config = config_with_concurrency(4);
        let v = validator_with(
            ScriptedVerifier::new([]),
            Arc::clone(&config),
            Arc::new(PatternStore::new()),
        );
        let report = validate_leads(config, v, Vec::new()).await;
        assert!(report.results.is_empty());
        assert!(report.deliverable.is_empty());
    }

    #[tokio::test]
    async fn test_results_preserve_input_order_and_deliverable_sorts_by_company() {
        let verifier = ScriptedVerifier::new([
            ("bob.beta@zeta.com", VerificationOutcome::DefiniteValid),
            ("jane@acme.com", VerificationOutcome::CatchAll),
        ]);
        let config = config_with_concurrency(4);
        let v = validator_with(verifier, Arc::clone(&config), Arc::new(PatternStore::new()));

        let contacts = vec![
            Contact::new("Bob", "Beta", "Zeta"),
            Contact::new("Jane", "Doe", "Acme"),
            Contact::new("Nameless", "", "Globex"),
        ];
        let report = validate_leads(config, v, contacts).await;

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[0].company, "Zeta");
        assert_eq!(report.results[0].email_status, EmailStatus::Valid);
        assert_eq!(report.results[1].company, "Acme");
        assert_eq!(report.results[1].email_status, EmailStatus::CatchAll);
        assert_eq!(report.results[2].company, "Globex");
        assert_eq!(report.results[2].email_status, EmailStatus::Invalid);

        let companies: Vec<&str> = report
            .deliverable
            .iter()
            .map(|c| c.company.as_str())
            .collect();
        assert_eq!(companies, vec!["Acme", "Zeta"]);

        assert_eq!(report.valid_count(), 1);
        assert_eq!(report.catch_all_count(), 1);
        assert_eq!(report.invalid_count(), 1);
    }

    #[tokio::test]
    async fn test_catch_all_learned_mid_batch_short_circuits_later_contacts() {
        let verifier = ScriptedVerifier::new([("jane@acme.com", VerificationOutcome::CatchAll)]);
        let calls = Arc::clone(&verifier.calls);
        // Serial execution so the second contact observes the first's mark.
        let config = config_with_concurrency(1);
        let store = Arc::new(PatternStore::new());
        let v = validator_with(verifier, Arc::clone(&config), Arc::clone(&store));

        let contacts = vec![
            Contact::new("Jane", "Doe", "Acme"),
            Contact::new("John", "Smith", "Acme"),
        ];
        let report = validate_leads(config, v, contacts).await;

        assert_eq!(report.results[0].email_status, EmailStatus::CatchAll);
        assert_eq!(report.results[1].email_status, EmailStatus::CatchAll);
        assert_eq!(report.results[1].validated_email, "john.smith@acme.com");
        // Only the first contact's first candidate hit the network.
        assert_eq!(*calls.lock(), vec!["jane@acme.com".to_string()]);
        assert!(store.is_catch_all("acme.com"));
    }

    #[tokio::test]
    async fn test_rerun_with_fresh_store_is_idempotent() {
        let contacts = vec![
            Contact::new("Jane", "Doe", "Acme"),
            Contact::new("Bob", "Beta", "Zeta"),
        ];
        let outcomes = [
            ("jane.doe@acme.com", VerificationOutcome::DefiniteValid),
            ("bob@zeta.com", VerificationOutcome::CatchAll),
        ];

        let mut classifications = Vec::new();
        for _ in 0..2 {
            let config = config_with_concurrency(2);
            let v = validator_with(
                ScriptedVerifier::new(outcomes),
                Arc::clone(&config),
                Arc::new(PatternStore::new()),
            );
            let report = validate_leads(config, v, contacts.clone()).await;
            classifications.push(
                report
                    .results
                    .iter()
                    .map(|c| (c.email_status, c.validated_email.clone()))
                    .collect::<Vec<_>>(),
            );
        }
        assert_eq!(classifications[0], classifications[1]);
    }
}
