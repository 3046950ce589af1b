use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// One pool of scalable compute capacity
///
/// Every field defaults when absent so that missing values are reported by
/// the validator rather than rejected by the decoder. Unknown keys are
/// rejected, which catches typos such as `max_node`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NodeGroupSpec {
    /// Unique identifier of the node group
    pub name: String,

    /// Node label key used to select the group's nodes
    pub label_key: String,

    /// Node label value used to select the group's nodes
    pub label_value: String,

    /// Name of the backing group at the cloud provider (e.g. an ASG)
    pub cloud_provider_group_name: String,

    pub min_nodes: i64,
    pub max_nodes: i64,

    /// If true, decisions are computed but never applied
    pub dry_mode: bool,

    pub taint_upper_capacity_threshold_percent: i64,
    pub taint_lower_capacity_threshold_percent: i64,
    pub scale_up_threshold_percent: i64,

    pub slow_node_removal_rate: i64,
    pub fast_node_removal_rate: i64,

    /// Format: "30s", "5m", "1h"
    pub soft_delete_grace_period: String,
    pub hard_delete_grace_period: String,
    pub scale_up_cool_down_period: String,
}

impl NodeGroupSpec {
    /// Dry mode after applying the global override
    ///
    /// The global `--drymode` flag wins: a group is dry if either it or the
    /// process says so.
    pub fn effective_dry_mode(&self, global_dry_mode: bool) -> bool {
        self.dry_mode || global_dry_mode
    }

    /// Kubernetes label selector for the group's nodes (`key=value`)
    pub fn label_selector(&self) -> String {
        format!("{}={}", self.label_key, self.label_value)
    }
}

/// Top-level shape of the node group config document
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeGroupDocument {
    node_groups: Vec<NodeGroupSpec>,
}

/// Structural decoding failure of the node group config
///
/// The decoder message is part of `Display`, so it is not also exposed as
/// the error source.
#[derive(Debug, Error)]
#[error("Failed to decode node group config: {0}")]
pub struct ConfigDecodeError(serde_yaml::Error);

impl From<serde_yaml::Error> for ConfigDecodeError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigDecodeError(err)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open config file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] ConfigDecodeError),
}

/// Decode node group specs from a YAML (or JSON) stream
///
/// Order follows the document. Either the whole sequence decodes or an error
/// is returned; nothing is partially accepted. No semantic checks happen here.
pub fn unmarshal_node_groups<R: Read>(reader: R) -> Result<Vec<NodeGroupSpec>, ConfigDecodeError> {
    let document: NodeGroupDocument = serde_yaml::from_reader(reader)?;
    Ok(document.node_groups)
}

/// Open and decode the node group config file at `path`
pub fn load_node_groups(path: &Path) -> Result<Vec<NodeGroupSpec>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    Ok(unmarshal_node_groups(BufReader::new(file))?)
}
