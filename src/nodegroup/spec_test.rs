use super::spec::*;
use std::io::Write;

const TWO_GROUPS: &str = r#"
node_groups:
  - name: pool-a
    label_key: customer
    label_value: shared
    cloud_provider_group_name: asg-pool-a
    min_nodes: 1
    max_nodes: 10
    taint_upper_capacity_threshold_percent: 40
    taint_lower_capacity_threshold_percent: 10
    scale_up_threshold_percent: 70
    slow_node_removal_rate: 1
    fast_node_removal_rate: 2
    soft_delete_grace_period: 1m
    hard_delete_grace_period: 10m
    scale_up_cool_down_period: 2m
  - name: pool-b
    label_key: customer
    label_value: batch
    dry_mode: true
"#;

#[test]
fn test_unmarshal_preserves_document_order() {
    let groups = unmarshal_node_groups(TWO_GROUPS.as_bytes()).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "pool-a");
    assert_eq!(groups[1].name, "pool-b");

    let a = &groups[0];
    assert_eq!(a.min_nodes, 1);
    assert_eq!(a.max_nodes, 10);
    assert_eq!(a.soft_delete_grace_period, "1m");
    assert!(!a.dry_mode);

    // Missing fields default, they are the validator's business
    let b = &groups[1];
    assert!(b.dry_mode);
    assert_eq!(b.max_nodes, 0);
    assert_eq!(b.cloud_provider_group_name, "");
}

#[test]
fn test_unmarshal_empty_list() {
    let groups = unmarshal_node_groups("node_groups: []".as_bytes()).unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_unmarshal_accepts_json() {
    let json = r#"{"node_groups": [{"name": "pool-a", "min_nodes": 2}, {"name": "pool-c"}]}"#;
    let groups = unmarshal_node_groups(json.as_bytes()).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].min_nodes, 2);
    assert_eq!(groups[1].name, "pool-c");
}

#[test]
fn test_unmarshal_type_mismatch_fails() {
    let yaml = r#"
node_groups:
  - name: pool-a
    min_nodes: "a few"
"#;
    assert!(unmarshal_node_groups(yaml.as_bytes()).is_err());
}

#[test]
fn test_unmarshal_unknown_field_fails() {
    let yaml = r#"
node_groups:
  - name: pool-a
    max_node: 3
"#;
    assert!(unmarshal_node_groups(yaml.as_bytes()).is_err());
}

#[test]
fn test_unmarshal_missing_top_level_key_fails() {
    assert!(unmarshal_node_groups("".as_bytes()).is_err());
    assert!(unmarshal_node_groups("groups: []".as_bytes()).is_err());
}

#[test]
fn test_unmarshal_malformed_yaml_fails() {
    let yaml = "node_groups:\n  - name: [unterminated\n";
    let err = unmarshal_node_groups(yaml.as_bytes()).unwrap_err();
    assert!(err.to_string().starts_with("Failed to decode node group config"));
}

#[test]
fn test_decode_error_message_is_reported_once() {
    let yaml = "node_groups:\n  - name: [unterminated\n";
    let err = unmarshal_node_groups(yaml.as_bytes()).unwrap_err();
    let detail = err.to_string();

    assert!(std::error::Error::source(&err).is_none());

    let chain = format!("{:?}", anyhow::Error::from(LoadError::from(err)));
    assert_eq!(chain.matches(&detail).count(), 1, "{}", chain);
    assert!(!chain.contains("Caused by"));
}

#[test]
fn test_load_node_groups_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TWO_GROUPS.as_bytes()).unwrap();

    let groups = load_node_groups(file.path()).unwrap();
    assert_eq!(groups.len(), 2);
}

#[test]
fn test_load_node_groups_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_node_groups(&dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(LoadError::Open { .. })));
}

#[test]
fn test_load_node_groups_decode_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"node_groups: 12").unwrap();

    let result = load_node_groups(file.path());
    assert!(matches!(result, Err(LoadError::Decode(_))));
}

#[test]
fn test_effective_dry_mode_global_override_wins() {
    let spec = NodeGroupSpec {
        name: "pool-a".to_string(),
        dry_mode: false,
        ..Default::default()
    };
    assert!(!spec.effective_dry_mode(false));
    assert!(spec.effective_dry_mode(true));

    let dry = NodeGroupSpec {
        dry_mode: true,
        ..spec
    };
    assert!(dry.effective_dry_mode(false));
}

#[test]
fn test_label_selector() {
    let spec = NodeGroupSpec {
        label_key: "customer".to_string(),
        label_value: "shared".to_string(),
        ..Default::default()
    };
    assert_eq!(spec.label_selector(), "customer=shared");
}
