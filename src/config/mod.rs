//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, load_or_default, BackendSection, Config, ConfigError, LoggingSection,
    NewsSection, ProvisioningSection, HOST_ENV, MODEL_ENV,
};
