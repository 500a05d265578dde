//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! - `config` - `QC_RELAY_*` environment overrides
//! - `container` - component wiring
//! - `demo` - dispute walkthrough driven by the binary

#![warn(missing_docs)]

pub mod config;
pub mod container;
pub mod demo;

pub use config::{load_config, load_config_from, RuntimeConfig, RuntimeConfigError};
pub use container::RelayNode;
pub use demo::DemoReport;
