#![allow(clippy::unwrap_used)]

use super::*;

fn args(extra: &[&str]) -> Args {
    let mut argv = vec!["nodescaler", "--nodegroups", "/etc/nodescaler/nodegroups.yaml"];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap()
}

#[test]
fn test_defaults() {
    let settings = Settings::from_args(&args(&[])).unwrap();

    assert_eq!(settings.log_level, LogLevel::Info);
    assert_eq!(settings.address, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    assert_eq!(settings.scan_interval, Duration::from_secs(60));
    assert_eq!(settings.kubeconfig, None);
    assert!(!settings.dry_mode);
    assert_eq!(
        settings.nodegroups_path,
        PathBuf::from("/etc/nodescaler/nodegroups.yaml")
    );
}

#[test]
fn test_nodegroups_flag_is_required() {
    let result = Args::try_parse_from(["nodescaler", "--drymode"]);
    assert!(result.is_err(), "--nodegroups must be required");
}

#[test]
fn test_all_flags_parse() {
    let settings = Settings::from_args(&args(&[
        "-v",
        "5",
        "--address",
        "127.0.0.1:9090",
        "--scaninterval",
        "30s",
        "--kubeconfig",
        "/home/ops/.kube/config",
        "--drymode",
    ]))
    .unwrap();

    assert_eq!(settings.log_level, LogLevel::Debug);
    assert_eq!(settings.address.port(), 9090);
    assert_eq!(settings.scan_interval, Duration::from_secs(30));
    assert_eq!(settings.kubeconfig.as_deref(), Some("/home/ops/.kube/config"));
    assert!(settings.dry_mode);
}

#[test]
fn test_log_level_out_of_range_is_rejected() {
    for level in ["-1", "6", "42"] {
        let result = Settings::from_args(&args(&["--loglevel", level]));
        assert!(
            matches!(result, Err(ConfigError::InvalidLogLevel(_))),
            "level {} should be rejected",
            level
        );
    }
}

#[test]
fn test_log_level_checked_before_other_settings() {
    // Bad address and interval too, but the log level is reported
    let result = Settings::from_args(&args(&[
        "--loglevel",
        "9",
        "--address",
        "not an address",
        "--scaninterval",
        "never",
    ]));
    assert!(matches!(result, Err(ConfigError::InvalidLogLevel(9))));
}

#[test]
fn test_log_level_mapping() {
    let directives: Vec<&str> = (0..=5)
        .map(|l| LogLevel::from_level(l).unwrap().as_directive())
        .collect();
    assert_eq!(
        directives,
        vec!["error", "error", "error", "warn", "info", "debug"]
    );
}

#[test]
fn test_invalid_scan_interval() {
    let result = Settings::from_args(&args(&["--scaninterval", "0s"]));
    assert!(matches!(result, Err(ConfigError::InvalidScanInterval(_))));
}

#[test]
fn test_scan_interval_accepts_compound_and_fractional_values() {
    let cases = [
        ("1m30s", Duration::from_secs(90)),
        ("500ms", Duration::from_millis(500)),
        ("1.5h", Duration::from_secs(5400)),
        ("2m0s", Duration::from_secs(120)),
    ];
    for (value, expected) in cases {
        let settings = Settings::from_args(&args(&["--scaninterval", value])).unwrap();
        assert_eq!(settings.scan_interval, expected, "--scaninterval {}", value);
    }
}

#[test]
fn test_parse_listen_address_forms() {
    assert_eq!(
        parse_listen_address(":8080").unwrap(),
        "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
    );
    assert_eq!(
        parse_listen_address("[::1]:9000").unwrap(),
        "[::1]:9000".parse::<SocketAddr>().unwrap()
    );
    assert!(parse_listen_address("8080").is_err());
    assert!(parse_listen_address(":notaport").is_err());
}
