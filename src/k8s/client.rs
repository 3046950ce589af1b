use kube::config::{InClusterError, KubeConfigOptions, Kubeconfig, KubeconfigError};
use kube::{Client, Config};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read kubeconfig from {path}: {source}")]
    ReadKubeconfig {
        path: String,
        #[source]
        source: KubeconfigError,
    },

    #[error("Failed to load kubeconfig from {path}: {source}")]
    LoadKubeconfig {
        path: String,
        #[source]
        source: KubeconfigError,
    },

    #[error("Failed to load in-cluster config: {0}")]
    InCluster(#[source] InClusterError),

    #[error("Failed to create Kubernetes client: {0}")]
    Client(#[source] kube::Error),
}

/// How cluster credentials are obtained
///
/// The two modes are mutually exclusive and chosen only by whether a
/// kubeconfig path was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialMode {
    /// Service account token and CA mounted into the pod
    InCluster,
    /// Credentials read from a kubeconfig file
    OutOfCluster(PathBuf),
}

impl CredentialMode {
    /// Out-of-cluster if `kubeconfig` is present and non-empty, in-cluster otherwise
    pub fn from_kubeconfig(kubeconfig: Option<&str>) -> Self {
        match kubeconfig {
            Some(path) if !path.trim().is_empty() => {
                CredentialMode::OutOfCluster(PathBuf::from(path.trim()))
            }
            _ => CredentialMode::InCluster,
        }
    }
}

/// Build the process-wide Kubernetes client
///
/// Runs once at startup. Failures are not retried: a missing or malformed
/// kubeconfig, or a pod without a mounted service account, will not fix
/// itself.
pub async fn resolve_client(mode: &CredentialMode) -> Result<Client, CredentialError> {
    // kube and reqwest both pull in rustls; pick ring explicitly.
    // install_default() is idempotent.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = match mode {
        CredentialMode::OutOfCluster(path) => {
            info!(path = %path.display(), "Using out of cluster config");
            let display = path.display().to_string();
            let kubeconfig =
                Kubeconfig::read_from(path).map_err(|source| CredentialError::ReadKubeconfig {
                    path: display.clone(),
                    source,
                })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|source| CredentialError::LoadKubeconfig {
                    path: display,
                    source,
                })?
        }
        CredentialMode::InCluster => {
            info!("Using in cluster config");
            Config::incluster().map_err(CredentialError::InCluster)?
        }
    };

    Client::try_from(config).map_err(CredentialError::Client)
}

/// Client pointing at an unreachable API server, for unit tests
///
/// Construction needs no cluster; any request made with it fails.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub fn mock_client() -> Client {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut config = Config::new("https://localhost:8080".parse().unwrap());
    config.default_namespace = "default".to_string();
    config.accept_invalid_certs = true;

    Client::try_from(config).unwrap()
}
