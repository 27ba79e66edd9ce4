//! Configuration structs

mod store_config;

pub use store_config::{ConfigError, StoreConfig, StoreKind};
