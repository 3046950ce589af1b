//! Prometheus metrics for the control loop

use crate::controller::NodeGroupSnapshot;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics shared between the control loop and the HTTP endpoint
pub type SharedMetrics = Arc<ControllerMetrics>;

/// Controller metrics registered in a private registry
pub struct ControllerMetrics {
    registry: Registry,
    scan_cycles_total: IntCounter,
    scan_errors_total: IntCounterVec,
    scan_duration_seconds: Histogram,
    node_group_nodes: IntGaugeVec,
    node_group_pods: IntGaugeVec,
    node_group_cpu_request_percent: GaugeVec,
    node_group_memory_request_percent: GaugeVec,
    node_group_dry_mode: IntGaugeVec,
}

/// Create the metrics registry with all controller metrics registered
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    let registry = Registry::new();

    let scan_cycles_total = IntCounter::with_opts(Opts::new(
        "nodescaler_scan_cycles_total",
        "Number of completed scan cycles",
    ))?;
    let scan_errors_total = IntCounterVec::new(
        Opts::new(
            "nodescaler_scan_errors_total",
            "Number of failed node group scans",
        ),
        &["nodegroup"],
    )?;
    let scan_duration_seconds = Histogram::with_opts(
        HistogramOpts::new(
            "nodescaler_scan_duration_seconds",
            "Duration of a full scan cycle over all node groups",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    )?;
    let node_group_nodes = IntGaugeVec::new(
        Opts::new("nodescaler_node_group_nodes", "Nodes in the node group"),
        &["nodegroup"],
    )?;
    let node_group_pods = IntGaugeVec::new(
        Opts::new(
            "nodescaler_node_group_pods",
            "Non-terminal pods scheduled onto the node group",
        ),
        &["nodegroup"],
    )?;
    let node_group_cpu_request_percent = GaugeVec::new(
        Opts::new(
            "nodescaler_node_group_cpu_request_percent",
            "Requested CPU as a percentage of allocatable CPU",
        ),
        &["nodegroup"],
    )?;
    let node_group_memory_request_percent = GaugeVec::new(
        Opts::new(
            "nodescaler_node_group_memory_request_percent",
            "Requested memory as a percentage of allocatable memory",
        ),
        &["nodegroup"],
    )?;
    let node_group_dry_mode = IntGaugeVec::new(
        Opts::new(
            "nodescaler_node_group_dry_mode",
            "1 if the node group runs in dry mode",
        ),
        &["nodegroup"],
    )?;

    registry.register(Box::new(scan_cycles_total.clone()))?;
    registry.register(Box::new(scan_errors_total.clone()))?;
    registry.register(Box::new(scan_duration_seconds.clone()))?;
    registry.register(Box::new(node_group_nodes.clone()))?;
    registry.register(Box::new(node_group_pods.clone()))?;
    registry.register(Box::new(node_group_cpu_request_percent.clone()))?;
    registry.register(Box::new(node_group_memory_request_percent.clone()))?;
    registry.register(Box::new(node_group_dry_mode.clone()))?;

    Ok(Arc::new(ControllerMetrics {
        registry,
        scan_cycles_total,
        scan_errors_total,
        scan_duration_seconds,
        node_group_nodes,
        node_group_pods,
        node_group_cpu_request_percent,
        node_group_memory_request_percent,
        node_group_dry_mode,
    }))
}

impl ControllerMetrics {
    /// Record a finished scan cycle and how long it took
    pub fn record_scan_cycle(&self, duration_secs: f64) {
        self.scan_cycles_total.inc();
        self.scan_duration_seconds.observe(duration_secs);
    }

    pub fn record_scan_error(&self, nodegroup: &str) {
        self.scan_errors_total.with_label_values(&[nodegroup]).inc();
    }

    /// Publish the latest observed state of a node group
    pub fn record_snapshot(&self, nodegroup: &str, snapshot: &NodeGroupSnapshot, dry_mode: bool) {
        let labels = [nodegroup];
        self.node_group_nodes
            .with_label_values(&labels)
            .set(snapshot.nodes as i64);
        self.node_group_pods
            .with_label_values(&labels)
            .set(snapshot.pods as i64);
        self.node_group_cpu_request_percent
            .with_label_values(&labels)
            .set(snapshot.cpu_request_percent());
        self.node_group_memory_request_percent
            .with_label_values(&labels)
            .set(snapshot.memory_request_percent());
        self.node_group_dry_mode
            .with_label_values(&labels)
            .set(i64::from(dry_mode));
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_registered_metrics() {
        let metrics = create_metrics().unwrap();
        metrics.record_scan_cycle(0.2);
        metrics.record_scan_error("pool-a");

        let body = metrics.encode().unwrap();
        assert!(body.contains("nodescaler_scan_cycles_total 1"));
        assert!(body.contains(r#"nodescaler_scan_errors_total{nodegroup="pool-a"} 1"#));
        assert!(body.contains("nodescaler_scan_duration_seconds_count 1"));
    }

    #[test]
    fn test_record_snapshot_sets_gauges() {
        let metrics = create_metrics().unwrap();
        let snapshot = NodeGroupSnapshot {
            nodes: 3,
            pods: 12,
            cpu_requested_millis: 1500,
            cpu_allocatable_millis: 6000,
            memory_requested_bytes: 1 << 30,
            memory_allocatable_bytes: 4 << 30,
        };

        metrics.record_snapshot("pool-a", &snapshot, true);

        let body = metrics.encode().unwrap();
        assert!(body.contains(r#"nodescaler_node_group_nodes{nodegroup="pool-a"} 3"#));
        assert!(body.contains(r#"nodescaler_node_group_pods{nodegroup="pool-a"} 12"#));
        assert!(body.contains(r#"nodescaler_node_group_cpu_request_percent{nodegroup="pool-a"} 25"#));
        assert!(
            body.contains(r#"nodescaler_node_group_memory_request_percent{nodegroup="pool-a"} 25"#)
        );
        assert!(body.contains(r#"nodescaler_node_group_dry_mode{nodegroup="pool-a"} 1"#));
    }
}
