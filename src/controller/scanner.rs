//! Observing node groups in the cluster
//!
//! `ClusterScanner` is the seam between the control loop and the cluster.
//! `KubeScanner` lists the group's nodes by label and the pods scheduled
//! onto them; tests substitute their own scanner.

use crate::nodegroup::NodeGroupSpec;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, ListParams};
use kube::ResourceExt;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Scan failed: {0}")]
    Other(String),
}

/// Point-in-time view of one node group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeGroupSnapshot {
    pub nodes: usize,
    /// Non-terminal pods scheduled onto the group's nodes
    pub pods: usize,
    pub cpu_requested_millis: i64,
    pub cpu_allocatable_millis: i64,
    pub memory_requested_bytes: i64,
    pub memory_allocatable_bytes: i64,
}

impl NodeGroupSnapshot {
    pub fn cpu_request_percent(&self) -> f64 {
        percent(self.cpu_requested_millis, self.cpu_allocatable_millis)
    }

    pub fn memory_request_percent(&self) -> f64 {
        percent(self.memory_requested_bytes, self.memory_allocatable_bytes)
    }
}

fn percent(used: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

/// Trait for observing a node group
///
/// Production code uses `KubeScanner`. Tests use in-memory scanners.
#[async_trait]
pub trait ClusterScanner: Send + Sync {
    async fn scan(&self, group: &NodeGroupSpec) -> Result<NodeGroupSnapshot, ScanError>;
}

/// Scanner backed by the Kubernetes API
pub struct KubeScanner {
    client: kube::Client,
}

impl KubeScanner {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterScanner for KubeScanner {
    async fn scan(&self, group: &NodeGroupSpec) -> Result<NodeGroupSnapshot, ScanError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let node_list = nodes
            .list(&ListParams::default().labels(&group.label_selector()))
            .await?;

        if node_list.items.is_empty() {
            debug!(nodegroup = %group.name, selector = %group.label_selector(), "No nodes match selector");
            return Ok(NodeGroupSnapshot::default());
        }

        let pods: Api<Pod> = Api::all(self.client.clone());
        let pod_list = pods
            .list(&ListParams::default().fields("status.phase!=Succeeded,status.phase!=Failed"))
            .await?;

        Ok(snapshot_from(&node_list.items, &pod_list.items))
    }
}

/// Summarize nodes and the pods scheduled onto them
///
/// Pods on other nodes, unscheduled pods and terminal pods are ignored.
pub fn snapshot_from(nodes: &[Node], pods: &[Pod]) -> NodeGroupSnapshot {
    let mut snapshot = NodeGroupSnapshot {
        nodes: nodes.len(),
        ..Default::default()
    };

    let names: HashSet<String> = nodes.iter().map(|n| n.name_any()).collect();

    for node in nodes {
        let allocatable = node.status.as_ref().and_then(|s| s.allocatable.as_ref());
        if let Some(allocatable) = allocatable {
            let cpu = allocatable.get("cpu").and_then(parse_cpu_millis).unwrap_or(0);
            let memory = allocatable
                .get("memory")
                .and_then(parse_memory_bytes)
                .unwrap_or(0);
            snapshot.cpu_allocatable_millis = snapshot.cpu_allocatable_millis.saturating_add(cpu);
            snapshot.memory_allocatable_bytes =
                snapshot.memory_allocatable_bytes.saturating_add(memory);
        }
    }

    for pod in pods {
        let Some(spec) = pod.spec.as_ref() else {
            continue;
        };
        let on_group = spec
            .node_name
            .as_ref()
            .is_some_and(|node| names.contains(node));
        let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
        if !on_group || matches!(phase, Some("Succeeded") | Some("Failed")) {
            continue;
        }

        snapshot.pods += 1;
        for container in &spec.containers {
            let requests = container
                .resources
                .as_ref()
                .and_then(|r| r.requests.as_ref());
            if let Some(requests) = requests {
                let cpu = requests.get("cpu").and_then(parse_cpu_millis).unwrap_or(0);
                let memory = requests
                    .get("memory")
                    .and_then(parse_memory_bytes)
                    .unwrap_or(0);
                snapshot.cpu_requested_millis = snapshot.cpu_requested_millis.saturating_add(cpu);
                snapshot.memory_requested_bytes =
                    snapshot.memory_requested_bytes.saturating_add(memory);
            }
        }
    }

    snapshot
}

/// Parse a CPU quantity ("250m", "2", "0.5") into millicores
pub fn parse_cpu_millis(quantity: &Quantity) -> Option<i64> {
    let value = quantity.0.trim();

    if let Some(millis) = value.strip_suffix('m') {
        return millis.parse::<i64>().ok().filter(|m| *m >= 0);
    }

    let cores: f64 = value.parse().ok()?;
    let millis = cores * 1000.0;
    if !millis.is_finite() || millis < 0.0 || millis > i64::MAX as f64 {
        return None;
    }
    Some(millis.round() as i64)
}

/// Parse a memory quantity ("128Mi", "1Gi", "500M", "1e9", "1024", "1500m") into bytes
///
/// Fractional byte counts from the milli suffix are rounded.
pub fn parse_memory_bytes(quantity: &Quantity) -> Option<i64> {
    const SUFFIXES: [(&str, f64); 13] = [
        ("Ki", 1024.0),
        ("Mi", 1_048_576.0),
        ("Gi", 1_073_741_824.0),
        ("Ti", 1_099_511_627_776.0),
        ("Pi", 1_125_899_906_842_624.0),
        ("Ei", 1_152_921_504_606_846_976.0),
        ("k", 1e3),
        ("M", 1e6),
        ("G", 1e9),
        ("T", 1e12),
        ("P", 1e15),
        ("E", 1e18),
        ("m", 1e-3),
    ];

    let value = quantity.0.trim();
    let (number, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, mult)| value.strip_suffix(suffix).map(|n| (n, *mult)))
        .unwrap_or((value, 1.0));

    let parsed: f64 = number.parse().ok()?;
    let bytes = parsed * multiplier;
    if !bytes.is_finite() || bytes < 0.0 || bytes > i64::MAX as f64 {
        return None;
    }
    Some(bytes.round() as i64)
}
