//! HTTP server, stop signal, and lifecycle coordination
//!
//! Provides the Prometheus scrape endpoint and Kubernetes health probes:
//! - `/metrics` - Prometheus metrics
//! - `/healthz` - Liveness probe (process is running)
//! - `/readyz` - Readiness probe (control loop is running)
//!
//! Also provides graceful shutdown handling for SIGTERM/SIGINT.

mod health;
pub mod lifecycle;
pub mod metrics;
pub mod shutdown;

pub use health::{run_metrics_server, serve_metrics, ReadinessState};
pub use lifecycle::{LifecycleCoordinator, LifecycleError, LifecycleState};
pub use metrics::{create_metrics, ControllerMetrics, SharedMetrics};
pub use shutdown::{shutdown_channel, wait_for_signal, ShutdownController, ShutdownSignal};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "lifecycle_test.rs"]
mod lifecycle_tests;
