use super::spec::NodeGroupSpec;
use crate::config::parse_duration;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, info};

/// One rule violation of a node group spec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must be larger than 0, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("min_nodes must be >= 0, got {0}")]
    NegativeMinNodes(i64),

    #[error("max_nodes ({max}) must not be smaller than min_nodes ({min})")]
    MaxBelowMin { min: i64, max: i64 },

    #[error("{field} must be between 1 and 100, got {value}")]
    PercentOutOfRange { field: &'static str, value: i64 },

    #[error("taint_lower_capacity_threshold_percent ({lower}) must be lower than taint_upper_capacity_threshold_percent ({upper})")]
    TaintThresholdOrder { lower: i64, upper: i64 },

    #[error("scale_up_threshold_percent ({scale_up}) must be higher than taint_upper_capacity_threshold_percent ({upper})")]
    ScaleUpThresholdOrder { upper: i64, scale_up: i64 },

    #[error("slow_node_removal_rate ({slow}) must not exceed fast_node_removal_rate ({fast})")]
    RemovalRateOrder { slow: i64, fast: i64 },

    #[error("{field} invalid duration '{value}': expected a positive duration such as '30s', '1m30s' or '1h'")]
    InvalidDuration { field: &'static str, value: String },

    #[error("soft_delete_grace_period ({soft}) must be less than hard_delete_grace_period ({hard})")]
    GracePeriodOrder { soft: String, hard: String },

    #[error("name '{name}' is already used by node group #{first_index}")]
    DuplicateName { name: String, first_index: usize },
}

/// Validate a single node group spec
///
/// Every rule is checked independently, so a spec with several problems
/// yields one error per problem rather than stopping at the first.
///
/// # Validation Rules
/// - `name`, `label_key`, `label_value`, `cloud_provider_group_name` non-empty
/// - `min_nodes >= 0`, `max_nodes > 0`, `min_nodes <= max_nodes`
/// - threshold percents in 1-100, with lower taint < upper taint < scale up
/// - `slow_node_removal_rate > 0` and not above `fast_node_removal_rate`
/// - grace and cool-down periods parse as durations, soft < hard
pub fn validate_node_group(spec: &NodeGroupSpec) -> Vec<ValidationError> {
    let mut problems = Vec::new();
    let mut check = |ok: bool, problem: ValidationError| {
        if !ok {
            problems.push(problem);
        }
    };

    for (field, value) in [
        ("name", &spec.name),
        ("label_key", &spec.label_key),
        ("label_value", &spec.label_value),
        ("cloud_provider_group_name", &spec.cloud_provider_group_name),
    ] {
        check(!value.is_empty(), ValidationError::EmptyField { field });
    }

    check(
        spec.min_nodes >= 0,
        ValidationError::NegativeMinNodes(spec.min_nodes),
    );
    check(
        spec.max_nodes > 0,
        ValidationError::NotPositive {
            field: "max_nodes",
            value: spec.max_nodes,
        },
    );
    check(
        spec.min_nodes <= spec.max_nodes,
        ValidationError::MaxBelowMin {
            min: spec.min_nodes,
            max: spec.max_nodes,
        },
    );

    let upper = spec.taint_upper_capacity_threshold_percent;
    let lower = spec.taint_lower_capacity_threshold_percent;
    let scale_up = spec.scale_up_threshold_percent;
    for (field, value) in [
        ("taint_upper_capacity_threshold_percent", upper),
        ("taint_lower_capacity_threshold_percent", lower),
        ("scale_up_threshold_percent", scale_up),
    ] {
        check(
            (1..=100).contains(&value),
            ValidationError::PercentOutOfRange { field, value },
        );
    }
    check(
        lower < upper,
        ValidationError::TaintThresholdOrder { lower, upper },
    );
    check(
        upper < scale_up,
        ValidationError::ScaleUpThresholdOrder { upper, scale_up },
    );

    check(
        spec.slow_node_removal_rate > 0,
        ValidationError::NotPositive {
            field: "slow_node_removal_rate",
            value: spec.slow_node_removal_rate,
        },
    );
    check(
        spec.slow_node_removal_rate <= spec.fast_node_removal_rate,
        ValidationError::RemovalRateOrder {
            slow: spec.slow_node_removal_rate,
            fast: spec.fast_node_removal_rate,
        },
    );

    let soft = check_duration(
        &mut problems,
        "soft_delete_grace_period",
        &spec.soft_delete_grace_period,
    );
    let hard = check_duration(
        &mut problems,
        "hard_delete_grace_period",
        &spec.hard_delete_grace_period,
    );
    check_duration(
        &mut problems,
        "scale_up_cool_down_period",
        &spec.scale_up_cool_down_period,
    );
    if let (Some(soft), Some(hard)) = (soft, hard) {
        if soft >= hard {
            problems.push(ValidationError::GracePeriodOrder {
                soft: spec.soft_delete_grace_period.clone(),
                hard: spec.hard_delete_grace_period.clone(),
            });
        }
    }

    problems
}

/// Empty → `EmptyField`, unparseable → `InvalidDuration`, never both
fn check_duration(
    problems: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
) -> Option<std::time::Duration> {
    if value.is_empty() {
        problems.push(ValidationError::EmptyField { field });
        return None;
    }
    let parsed = parse_duration(value);
    if parsed.is_none() {
        problems.push(ValidationError::InvalidDuration {
            field,
            value: value.to_string(),
        });
    }
    parsed
}

/// All errors found for one node group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeGroupFailure {
    /// Position of the group in the config document
    pub index: usize,
    pub name: String,
    pub errors: Vec<ValidationError>,
}

/// Aggregated outcome of validating every node group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub failures: Vec<NodeGroupFailure>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sum of per-group error counts
    pub fn error_count(&self) -> usize {
        self.failures.iter().map(|f| f.errors.len()).sum()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} problem(s) in {} node group(s)",
            self.error_count(),
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  node group #{} '{}':", failure.index, failure.name)?;
            for err in &failure.errors {
                write!(f, "\n    - {}", err)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Validate every node group, collecting all failures
///
/// Names must be unique across the sequence; a repeated name is reported on
/// the later occurrence. Groups are logged as PASS/FAIL as they are checked.
pub fn validate_node_groups(specs: &[NodeGroupSpec]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for (index, spec) in specs.iter().enumerate() {
        let mut errors = validate_node_group(spec);

        if !spec.name.is_empty() {
            if let Some(&first_index) = seen.get(spec.name.as_str()) {
                errors.push(ValidationError::DuplicateName {
                    name: spec.name.clone(),
                    first_index,
                });
            } else {
                seen.insert(spec.name.as_str(), index);
            }
        }

        if errors.is_empty() {
            info!(nodegroup = %spec.name, "Validating options: [PASS]");
            continue;
        }

        error!(nodegroup = %spec.name, index, "Validating options: [FAIL]");
        for err in &errors {
            error!(nodegroup = %spec.name, error = %err, "failed check");
        }
        report.failures.push(NodeGroupFailure {
            index,
            name: spec.name.clone(),
            errors,
        });
    }

    report
}
