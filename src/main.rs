use clap::Parser;
use nodescaler::bootstrap::prepare_run_options;
use nodescaler::config::{Args, LogLevel, Settings};
use nodescaler::controller::Controller;
use nodescaler::k8s::resolve_client;
use nodescaler::server::{
    create_metrics, run_metrics_server, wait_for_signal, LifecycleCoordinator, ReadinessState,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` when set, otherwise from `--loglevel`
fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Validated before logging is set up and before any cluster or file work
    let settings = Settings::from_args(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings.log_level))
        .init();

    info!(level = %settings.log_level, "Starting nodescaler");

    let opts = prepare_run_options(&settings, |mode| async move {
        resolve_client(&mode).await
    })
    .await?;

    let metrics = create_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to create metrics registry: {}", e))?;
    info!("Prometheus metrics registry initialized");

    let readiness = ReadinessState::new();
    let coordinator = LifecycleCoordinator::new(readiness.clone());
    let stop = coordinator.stop_signal();

    let server = run_metrics_server(settings.address, readiness, metrics.clone(), stop.clone());
    let controller = Controller::new(opts, stop, Some(metrics));

    if let Err(e) = coordinator
        .run(wait_for_signal(), server, controller.run_forever(true))
        .await
    {
        error!(error = %e, "Shutdown could not be coordinated");
        return Err(e.into());
    }

    info!("nodescaler shut down gracefully");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
