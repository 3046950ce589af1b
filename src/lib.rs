//! Node group autoscaler process core
//!
//! Turns a set of declarative node group definitions into a running,
//! gracefully terminable control process:
//! - `config` - command-line settings and their validation
//! - `nodegroup` - node group config loading and validation
//! - `k8s` - cluster client construction (in-cluster or kubeconfig)
//! - `controller` - the scan loop driven once per scan interval
//! - `server` - metrics endpoint, shutdown signal, and lifecycle coordination
//! - `bootstrap` - the strictly ordered startup sequence

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod k8s;
pub mod nodegroup;
pub mod server;
