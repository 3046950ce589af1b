//! Kubernetes client construction

mod client;

pub use client::{resolve_client, CredentialError, CredentialMode};

#[cfg(test)]
pub use client::mock_client;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "client_test.rs"]
mod tests;
