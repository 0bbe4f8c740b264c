//! Verification of candidate addresses against the external provider.

mod client;
mod retry;

pub use client::{HttpTransport, ProviderResponse, VerificationClient, Verifier, VerifierTransport};
pub use retry::RetryPolicy;
