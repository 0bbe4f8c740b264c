//! Client for the external email verification provider.

use super::retry::RetryPolicy;
use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::core::models::VerificationOutcome;

use serde::Deserialize;
use std::future::Future;
use tokio::time::sleep;

/// Raw JSON payload returned by the verification provider.
///
/// Only the integer result code is interpreted; everything else is carried
/// for logging. Code 1 means the mailbox exists, 2 means the domain is
/// catch-all, anything else is treated as indeterminate.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub resultcode: i64,
    #[serde(default)]
    pub subresult: Option<String>,
}

/// The transport seam under the verification client.
///
/// Production uses [`HttpTransport`]; tests substitute a scripted fake so the
/// retry policy and outcome mapping can be exercised without a network.
pub trait VerifierTransport: Send + Sync {
    fn query(&self, email: &str) -> impl Future<Output = Result<ProviderResponse>> + Send;
}

/// Anything able to classify an address into a [`VerificationOutcome`].
///
/// The validator is generic over this so its state machine can be tested
/// against scripted outcomes.
pub trait Verifier: Send + Sync {
    fn verify(&self, email: &str) -> impl Future<Output = VerificationOutcome> + Send;
}

/// HTTP transport issuing `GET {base_url}?api={key}&email={address}`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                AppError::Initialization(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: config.verifier_base_url.clone(),
            api_key: config.verifier_api_key.clone(),
        })
    }
}

impl VerifierTransport for HttpTransport {
    async fn query(&self, email: &str) -> Result<ProviderResponse> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("api", self.api_key.as_str()), ("email", email)])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<ProviderResponse>().await?)
    }
}

/// Maps provider result codes onto the engine's tri-state outcome.
fn outcome_from_code(code: i64) -> VerificationOutcome {
    match code {
        1 => VerificationOutcome::DefiniteValid,
        2 => VerificationOutcome::CatchAll,
        _ => VerificationOutcome::Indeterminate,
    }
}

/// Wraps a transport with bounded retry and outcome mapping.
///
/// Transport failures never reach callers: after the retry budget is
/// exhausted the client logs a warning and reports `Indeterminate`, which the
/// validator treats as "try the next candidate".
pub struct VerificationClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: VerifierTransport> VerificationClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }
}

impl<T: VerifierTransport> Verifier for VerificationClient<T> {
    async fn verify(&self, email: &str) -> VerificationOutcome {
        for attempt in 1..=self.policy.max_attempts {
            match self.transport.query(email).await {
                Ok(response) => {
                    let outcome = outcome_from_code(response.resultcode);
                    tracing::debug!(target: "verify_task",
                        "Provider answered for <{}> on attempt {}: code={} subresult={:?} -> {:?}",
                        email, attempt, response.resultcode, response.subresult, outcome
                    );
                    return outcome;
                }
                Err(e) => {
                    tracing::warn!(target: "verify_task",
                        "Verification request for <{}> failed on attempt {}/{}: {}",
                        email, attempt, self.policy.max_attempts, e
                    );
                    if attempt < self.policy.max_attempts {
                        sleep(self.policy.delay()).await;
                    }
                }
            }
        }
        tracing::warn!(target: "verify_task",
            "All {} verification attempts failed for <{}>, treating as indeterminate.",
            self.policy.max_attempts, email
        );
        VerificationOutcome::Indeterminate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport returning a scripted sequence of results.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<ProviderResponse>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<ProviderResponse>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl VerifierTransport for ScriptedTransport {
        async fn query(&self, _email: &str) -> Result<ProviderResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::Provider("script exhausted".to_string())))
        }
    }

    fn response(code: i64) -> Result<ProviderResponse> {
        Ok(ProviderResponse {
            resultcode: code,
            subresult: None,
        })
    }

    fn failure() -> Result<ProviderResponse> {
        Err(AppError::Provider("connection reset".to_string()))
    }

    fn no_sleep_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, (0.0, 0.0))
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(outcome_from_code(1), VerificationOutcome::DefiniteValid);
        assert_eq!(outcome_from_code(2), VerificationOutcome::CatchAll);
        assert_eq!(outcome_from_code(0), VerificationOutcome::Indeterminate);
        assert_eq!(outcome_from_code(3), VerificationOutcome::Indeterminate);
        assert_eq!(outcome_from_code(-1), VerificationOutcome::Indeterminate);
    }

    #[tokio::test]
    async fn test_first_attempt_success_does_not_retry() {
        let transport = ScriptedTransport::new(vec![response(1)]);
        let client = VerificationClient::new(transport, no_sleep_policy(3));
        assert_eq!(
            client.verify("jane.doe@acme.com").await,
            VerificationOutcome::DefiniteValid
        );
        assert_eq!(client.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let transport = ScriptedTransport::new(vec![failure(), response(2)]);
        let client = VerificationClient::new(transport, no_sleep_policy(3));
        assert_eq!(
            client.verify("jane.doe@acme.com").await,
            VerificationOutcome::CatchAll
        );
        assert_eq!(client.transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_yield_indeterminate() {
        let transport = ScriptedTransport::new(vec![failure(), failure(), failure()]);
        let client = VerificationClient::new(transport, no_sleep_policy(3));
        assert_eq!(
            client.verify("jane.doe@acme.com").await,
            VerificationOutcome::Indeterminate
        );
        assert_eq!(client.transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_unexpected_code_is_indeterminate_without_retry() {
        let transport = ScriptedTransport::new(vec![response(7)]);
        let client = VerificationClient::new(transport, no_sleep_policy(3));
        assert_eq!(
            client.verify("jane.doe@acme.com").await,
            VerificationOutcome::Indeterminate
        );
        // A parsed provider answer is an outcome, not a transport failure.
        assert_eq!(client.transport.calls(), 1);
    }
}
