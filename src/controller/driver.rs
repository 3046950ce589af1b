use super::scanner::{ClusterScanner, KubeScanner, NodeGroupSnapshot};
use crate::nodegroup::NodeGroupSpec;
use crate::server::{SharedMetrics, ShutdownSignal};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Everything the control loop needs, fixed once validation has passed
#[derive(Clone)]
pub struct RunOptions {
    pub scan_interval: Duration,
    pub client: kube::Client,
    /// Exactly the validated node groups, in config order
    pub node_groups: Vec<NodeGroupSpec>,
    /// Global override forcing dry mode on every node group
    pub dry_mode: bool,
}

/// Where a node group's size sits relative to its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeStatus {
    BelowMin,
    WithinBounds,
    AboveMax,
}

impl SizeStatus {
    pub fn of(group: &NodeGroupSpec, snapshot: &NodeGroupSnapshot) -> Self {
        let nodes = snapshot.nodes as i64;
        if nodes < group.min_nodes {
            SizeStatus::BelowMin
        } else if nodes > group.max_nodes {
            SizeStatus::AboveMax
        } else {
            SizeStatus::WithinBounds
        }
    }
}

/// Outcome of one pass over all node groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub scanned: usize,
    pub failed: usize,
}

/// The control loop driver
///
/// Scans every node group once per scan interval until the stop signal
/// closes. A failing scan is logged and counted; it never ends the loop.
pub struct Controller {
    opts: RunOptions,
    scanner: Arc<dyn ClusterScanner>,
    stop: ShutdownSignal,
    metrics: Option<SharedMetrics>,
}

impl Controller {
    /// Controller scanning the cluster behind `opts.client`
    pub fn new(opts: RunOptions, stop: ShutdownSignal, metrics: Option<SharedMetrics>) -> Self {
        let scanner = KubeScanner::new(opts.client.clone());
        Self::with_scanner(opts, scanner, stop, metrics)
    }

    pub fn with_scanner(
        opts: RunOptions,
        scanner: impl ClusterScanner + 'static,
        stop: ShutdownSignal,
        metrics: Option<SharedMetrics>,
    ) -> Self {
        Controller {
            opts,
            scanner: Arc::new(scanner),
            stop,
            metrics,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.opts
    }

    /// Scan every node group once
    pub async fn run_once(&self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();

        for group in &self.opts.node_groups {
            let dry_mode = group.effective_dry_mode(self.opts.dry_mode);

            let snapshot = match self.scanner.scan(group).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    report.failed += 1;
                    warn!(nodegroup = %group.name, error = %e, "Scan failed, continuing with next node group");
                    if let Some(ref metrics) = self.metrics {
                        metrics.record_scan_error(&group.name);
                    }
                    continue;
                }
            };

            report.scanned += 1;
            if let Some(ref metrics) = self.metrics {
                metrics.record_snapshot(&group.name, &snapshot, dry_mode);
            }

            debug!(
                nodegroup = %group.name,
                nodes = snapshot.nodes,
                pods = snapshot.pods,
                cpu_percent = snapshot.cpu_request_percent(),
                memory_percent = snapshot.memory_request_percent(),
                dry_mode,
                "Scanned node group"
            );

            match SizeStatus::of(group, &snapshot) {
                SizeStatus::BelowMin => warn!(
                    nodegroup = %group.name,
                    nodes = snapshot.nodes,
                    min_nodes = group.min_nodes,
                    dry_mode,
                    "Node group is below min_nodes"
                ),
                SizeStatus::AboveMax => warn!(
                    nodegroup = %group.name,
                    nodes = snapshot.nodes,
                    max_nodes = group.max_nodes,
                    dry_mode,
                    "Node group is above max_nodes"
                ),
                SizeStatus::WithinBounds => {}
            }
        }

        if let Some(ref metrics) = self.metrics {
            metrics.record_scan_cycle(started.elapsed().as_secs_f64());
        }
        report
    }

    /// Run until the stop signal closes
    ///
    /// With `run_immediately` the first pass starts right away, otherwise
    /// after one scan interval. The signal is checked between passes and
    /// during a pass, so the loop returns promptly once it closes.
    pub async fn run_forever(self, run_immediately: bool) {
        let mut stop = self.stop.clone();
        let mut ticker = interval(self.opts.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !run_immediately {
            ticker.reset();
        }

        info!(
            scan_interval = ?self.opts.scan_interval,
            node_groups = self.opts.node_groups.len(),
            dry_mode = self.opts.dry_mode,
            "Control loop started"
        );

        loop {
            tokio::select! {
                _ = stop.wait() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                report = self.run_once() => {
                    debug!(scanned = report.scanned, failed = report.failed, "Scan cycle complete");
                }
                _ = stop.wait() => break,
            }
        }

        info!("Control loop stopped");
    }
}
