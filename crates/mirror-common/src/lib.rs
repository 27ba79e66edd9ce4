//! # mirror-common
//!
//! Shared utilities for the mirrored store: configuration loading and
//! tracing setup.

pub mod config;
pub mod telemetry;

pub use config::{StoreConfig, StoreKind};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig};
