//! Startup sequence
//!
//! Credential resolution, config loading and validation run strictly in
//! that order. The control loop only ever receives node groups that all
//! passed validation; any failure aborts before anything is started.

use crate::config::Settings;
use crate::controller::RunOptions;
use crate::k8s::{CredentialError, CredentialMode};
use crate::nodegroup::{load_node_groups, validate_node_groups, LoadError, ValidationReport};
use std::future::Future;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("There are {} problems when validating the node groups. Please check {path}\n{report}", .report.error_count())]
    Validation {
        path: String,
        report: ValidationReport,
    },
}

/// Build the run options from validated settings
///
/// `resolve` turns the selected credential mode into a client; production
/// passes `|mode| async move { resolve_client(&mode).await }`.
pub async fn prepare_run_options<R, F>(
    settings: &Settings,
    resolve: R,
) -> Result<RunOptions, StartupError>
where
    R: FnOnce(CredentialMode) -> F,
    F: Future<Output = Result<kube::Client, CredentialError>>,
{
    let mode = CredentialMode::from_kubeconfig(settings.kubeconfig.as_deref());
    let client = resolve(mode).await.inspect_err(|e| {
        error!(error = %e, "Failed to create Kubernetes client");
    })?;

    let path = settings.nodegroups_path.display().to_string();
    let node_groups = load_node_groups(&settings.nodegroups_path).inspect_err(|e| {
        error!(error = %e, path = %path, "Failed to load node group config");
    })?;

    let report = validate_node_groups(&node_groups);
    if !report.is_ok() {
        error!(
            problems = report.error_count(),
            node_groups = report.failures.len(),
            path = %path,
            "Node group validation failed"
        );
        return Err(StartupError::Validation { path, report });
    }

    for group in &node_groups {
        info!(
            nodegroup = %group.name,
            dry_mode = group.effective_dry_mode(settings.dry_mode),
            "Registered node group"
        );
    }

    Ok(RunOptions {
        scan_interval: settings.scan_interval,
        client,
        node_groups,
        dry_mode: settings.dry_mode,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "bootstrap_test.rs"]
mod tests;
