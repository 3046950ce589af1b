pub mod driver;
pub mod scanner;

pub use driver::{Controller, CycleReport, RunOptions, SizeStatus};
pub use scanner::{ClusterScanner, KubeScanner, NodeGroupSnapshot, ScanError};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "driver_test.rs"]
mod driver_tests;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[path = "scanner_test.rs"]
mod scanner_tests;
