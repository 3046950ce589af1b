//! Command-line configuration
//!
//! `Args` is the raw clap surface; `Settings` is the validated, immutable
//! form the rest of the process consumes. Conversion checks the log level
//! first so a bad level aborts before any cluster or config file work.

mod duration;

pub use duration::parse_duration;

use clap::Parser;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default log level (info)
pub const DEFAULT_LOG_LEVEL: i64 = 4;

/// Default bind address for the metrics endpoint
pub const DEFAULT_ADDRESS: &str = ":8080";

/// Default period between control loop evaluations
pub const DEFAULT_SCAN_INTERVAL: &str = "60s";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level {0} provided. Must be between 0 (Critical) and 5 (Debug)")]
    InvalidLogLevel(i64),

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Invalid scan interval '{0}': must be a positive duration such as '30s', '1m30s' or '1h'")]
    InvalidScanInterval(String),
}

/// Node group autoscaler
#[derive(Parser, Debug, Clone)]
#[command(name = "nodescaler", version, about = "Scales Kubernetes node groups", long_about = None)]
pub struct Args {
    /// Logging level, 0 (panic) through 5 (debug). 4 for info, 5 for debug.
    #[arg(
        short = 'v',
        long = "loglevel",
        env = "NODESCALER_LOGLEVEL",
        default_value_t = DEFAULT_LOG_LEVEL,
        allow_negative_numbers = true
    )]
    pub loglevel: i64,

    /// Address to listen to for /metrics
    #[arg(long, env = "NODESCALER_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub address: String,

    /// How often the cluster is reevaluated for scale up or down
    #[arg(long = "scaninterval", env = "NODESCALER_SCAN_INTERVAL", default_value = DEFAULT_SCAN_INTERVAL)]
    pub scan_interval: String,

    /// Kubeconfig file location. When omitted the in-cluster config is used.
    #[arg(long, env = "NODESCALER_KUBECONFIG")]
    pub kubeconfig: Option<String>,

    /// Config file for node groups
    #[arg(long, env = "NODESCALER_NODEGROUPS")]
    pub nodegroups: PathBuf,

    /// Master dry mode switch. If set, forces dry mode on all node groups.
    #[arg(long, env = "NODESCALER_DRYMODE")]
    pub drymode: bool,
}

/// Numeric log levels 0-5
///
/// The three most severe levels all map onto `ERROR`, since tracing has no
/// panic/fatal distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Panic,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Convert a numeric level, rejecting anything outside 0..=5
    pub fn from_level(level: i64) -> Result<Self, ConfigError> {
        match level {
            0 => Ok(LogLevel::Panic),
            1 => Ok(LogLevel::Fatal),
            2 => Ok(LogLevel::Error),
            3 => Ok(LogLevel::Warn),
            4 => Ok(LogLevel::Info),
            5 => Ok(LogLevel::Debug),
            other => Err(ConfigError::InvalidLogLevel(other)),
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Panic | LogLevel::Fatal | LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Panic => "panic",
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warn => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Validated process settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: LogLevel,
    pub address: SocketAddr,
    pub scan_interval: Duration,
    pub kubeconfig: Option<String>,
    pub nodegroups_path: PathBuf,
    pub dry_mode: bool,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let log_level = LogLevel::from_level(args.loglevel)?;
        let address = parse_listen_address(&args.address)?;
        let scan_interval = parse_duration(&args.scan_interval)
            .ok_or_else(|| ConfigError::InvalidScanInterval(args.scan_interval.clone()))?;

        Ok(Settings {
            log_level,
            address,
            scan_interval,
            kubeconfig: args.kubeconfig.clone(),
            nodegroups_path: args.nodegroups.clone(),
            dry_mode: args.drymode,
        })
    }
}

/// Parse a listen address
///
/// Accepts `:8080` (all interfaces), `127.0.0.1:8080`, `[::1]:8080` and
/// resolvable `host:port` forms such as `localhost:8080`.
pub fn parse_listen_address(address: &str) -> Result<SocketAddr, ConfigError> {
    let trimmed = address.trim();
    let candidate = if trimmed.starts_with(':') {
        format!("0.0.0.0{}", trimmed)
    } else {
        trimmed.to_string()
    };

    if let Ok(addr) = candidate.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let invalid = |reason: String| ConfigError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    candidate
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("address did not resolve".to_string()))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
