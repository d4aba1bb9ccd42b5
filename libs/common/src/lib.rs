//! Common support library for the CIM measurement tools
//!
//! - `config_loader`: layered `MeasureConfig` loading (defaults, files, env)
//! - `logging`: console and run-log bootstrap on top of `tracing`

pub mod config_loader;
pub mod logging;

pub use config_loader::{ConfigSources, LoggingConfig, MeasureConfig, ENV_PREFIX};
pub use logging::{init_with_config, LogConfig};
