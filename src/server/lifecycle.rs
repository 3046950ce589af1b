//! Process lifecycle coordination
//!
//! The coordinator owns the stop signal and the lifetimes of the three
//! concurrent activities:
//! - the termination watcher (closes the signal on SIGINT/SIGTERM)
//! - the metrics server (stops gracefully on the signal, failures isolated)
//! - the control loop driver (awaited on the caller's task)
//!
//! State machine: `Starting → Running → ShuttingDown → Stopped`.

use super::health::ReadinessState;
use super::shutdown::{shutdown_channel, ShutdownController, ShutdownSignal};
use std::future::Future;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to register termination signal handler: {0}")]
    SignalRegistration(#[source] std::io::Error),

    #[error("Termination watcher task failed: {0}")]
    WatcherFailed(#[source] tokio::task::JoinError),
}

pub struct LifecycleCoordinator {
    shutdown: ShutdownController,
    signal: ShutdownSignal,
    state: watch::Sender<LifecycleState>,
    readiness: ReadinessState,
}

impl LifecycleCoordinator {
    /// Create a coordinator in `Starting` with an open stop signal
    pub fn new(readiness: ReadinessState) -> Self {
        let (shutdown, signal) = shutdown_channel();
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            shutdown,
            signal,
            state,
            readiness,
        }
    }

    /// Read-only view of the stop signal for the driver and the metrics server
    pub fn stop_signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    /// Observe state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Run until the driver returns
    ///
    /// `termination` resolves on the first termination notification (or fails
    /// to register), `metrics_server` runs alongside, and `driver` is awaited
    /// on this task. Both `metrics_server` and `driver` are expected to watch
    /// `stop_signal()`.
    ///
    /// Returns an error only if the termination watcher could not be set up,
    /// in which case the stop signal is closed so the driver still returns.
    pub async fn run<T, M, D>(
        self,
        termination: T,
        metrics_server: M,
        driver: D,
    ) -> Result<(), LifecycleError>
    where
        T: Future<Output = Result<&'static str, std::io::Error>> + Send + 'static,
        M: Future<Output = Result<(), std::io::Error>> + Send + 'static,
        D: Future<Output = ()>,
    {
        let LifecycleCoordinator {
            shutdown,
            signal,
            state,
            readiness,
        } = self;

        let watcher: JoinHandle<Result<&'static str, std::io::Error>> = tokio::spawn(
            async move {
                let result = termination.await;
                match &result {
                    Ok(name) => {
                        info!(signal = name, "Stopping autoscaler gracefully");
                    }
                    Err(e) => {
                        error!(error = %e, "Termination watcher failed, stopping");
                    }
                }
                shutdown.shutdown();
                result
            },
        );

        let server = tokio::spawn(async move {
            if let Err(e) = metrics_server.await {
                warn!(error = %e, "Metrics server failed");
            }
        });

        enter(&state, LifecycleState::Running);
        readiness.set_ready();

        tokio::pin!(driver);
        let mut stop = signal.clone();
        let driver_done = tokio::select! {
            _ = &mut driver => true,
            _ = stop.wait() => false,
        };

        enter(&state, LifecycleState::ShuttingDown);
        readiness.set_not_ready();

        if !driver_done {
            driver.await;
        } else if !signal.is_shutdown() {
            warn!("Control loop returned before the stop signal closed");
        }

        // Closing the signal is the watcher's last act, so it is joined
        // whenever the signal is closed. Otherwise the driver returned on its
        // own and the watcher is still waiting for a signal.
        let outcome = if signal.is_shutdown() || watcher.is_finished() {
            match watcher.await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(LifecycleError::SignalRegistration(e)),
                Err(e) => Err(LifecycleError::WatcherFailed(e)),
            }
        } else {
            watcher.abort();
            Ok(())
        };

        if !signal.is_shutdown() {
            server.abort();
        }
        if let Err(e) = server.await {
            if !e.is_cancelled() {
                warn!(error = %e, "Metrics server task failed");
            }
        }

        enter(&state, LifecycleState::Stopped);
        outcome
    }
}

fn enter(state: &watch::Sender<LifecycleState>, next: LifecycleState) {
    state.send_replace(next);
    info!(state = ?next, "Lifecycle state changed");
}
