//! Node group configuration
//!
//! - `spec` - the `NodeGroupSpec` type and the config file loader
//! - `validation` - per-group rules and the aggregated report

pub mod spec;
pub mod validation;

pub use spec::{load_node_groups, unmarshal_node_groups, ConfigDecodeError, LoadError, NodeGroupSpec};
pub use validation::{
    validate_node_group, validate_node_groups, NodeGroupFailure, ValidationError, ValidationReport,
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "spec_test.rs"]
mod spec_tests;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "validation_test.rs"]
mod validation_tests;
