//! Configuration loading for the measurement tools
//!
//! Priority (lowest to highest):
//! 1. Built-in defaults
//! 2. `config/cim-measure.{toml,yaml,json}` under the base directory
//! 3. An explicit file (`--config`)
//! 4. Environment variables prefixed `CIM_MEASURE_`, `__` separating
//!    nested keys (e.g. `CIM_MEASURE_LOGGING__LEVEL=debug`)

use cim_measurements::{RunOptions, SchemaContext, DEFAULT_CLASS_ORDER};
use cim_model::DatabaseType;
use errors::{CimError, CimResult};
use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CIM_MEASURE_";

/// File stem searched for in the `config/` directory
const CONFIG_STEM: &str = "cim-measure";

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Directory of the run log; no file is written when unset
    pub dir: Option<PathBuf>,
    /// Run log file name, `{YYYYMMDD}_cim-measure.log` when unset
    pub file_name: Option<String>,
    /// Write the run log as JSON lines
    pub json: bool,
    /// Log to the console
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            file_name: None,
            json: false,
            console: true,
        }
    }
}

/// Complete tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// CIM profile token (`rc4_2021`, `cimhub_2023`)
    pub profile: String,
    /// Model kind token (`feeder`, `busBranch`)
    pub model_kind: String,
    /// Database token; only `json` and `yaml` documents can be loaded
    pub database: String,
    /// Equipment classes to instrument, in processing order
    pub class_order: Vec<String>,
    /// Persisted identity map
    pub identity_file: PathBuf,
    /// Directory for exported graphs and catalogs
    pub output_dir: PathBuf,
    /// Reassign repeated object identifiers after synthesis
    pub dedupe_identifiers: bool,
    /// Structural measurement name -> stored name
    pub display_names: BTreeMap<String, String>,
    pub logging: LoggingConfig,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            profile: "cimhub_2023".to_string(),
            model_kind: "feeder".to_string(),
            database: "json".to_string(),
            class_order: DEFAULT_CLASS_ORDER.iter().map(|c| c.to_string()).collect(),
            identity_file: PathBuf::from("identity_map.json"),
            output_dir: PathBuf::from("output"),
            dedupe_identifiers: true,
            display_names: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MeasureConfig {
    /// Load from the working directory with an optional explicit file
    pub fn load(explicit: Option<&Path>) -> CimResult<Self> {
        ConfigSources::new(".").with_file(explicit).load()
    }

    /// Reject unknown tokens and malformed class orders
    pub fn validate(&self) -> CimResult<()> {
        self.schema_context()?;
        self.run_options()?;
        let database: DatabaseType = self.database.parse().map_err(CimError::from)?;
        database.ensure_loadable().map_err(CimError::from)?;
        if self.logging.level.trim().is_empty() {
            return Err(CimError::InvalidConfig {
                field: "logging.level".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn schema_context(&self) -> CimResult<SchemaContext> {
        let ctx = SchemaContext::from_tokens(&self.profile, &self.model_kind)?;
        Ok(ctx.with_display_names(self.display_names.clone()))
    }

    pub fn run_options(&self) -> CimResult<RunOptions> {
        let options = RunOptions {
            class_order: self.class_order.clone(),
            dedupe_identifiers: self.dedupe_identifiers,
        };
        options.validate()?;
        Ok(options)
    }
}

/// Where a configuration is assembled from
#[derive(Debug, Clone)]
pub struct ConfigSources {
    base_dir: PathBuf,
    explicit: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigSources {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            explicit: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_file(mut self, explicit: Option<&Path>) -> Self {
        self.explicit = explicit.map(Path::to_path_buf);
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Layered provider chain; unset keys fall back to the serde defaults
    pub fn figment(&self) -> CimResult<Figment> {
        let config_dir = self.base_dir.join("config");
        let mut figment = Figment::new()
            .merge(Toml::file(config_dir.join(format!("{}.toml", CONFIG_STEM))))
            .merge(Yaml::file(config_dir.join(format!("{}.yaml", CONFIG_STEM))))
            .merge(Json::file(config_dir.join(format!("{}.json", CONFIG_STEM))));

        if let Some(path) = &self.explicit {
            if !path.exists() {
                return Err(CimError::FileNotFound(path.display().to_string()));
            }
            let extension = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
            figment = match extension {
                "toml" => figment.merge(Toml::file(path)),
                "yaml" | "yml" => figment.merge(Yaml::file(path)),
                "json" => figment.merge(Json::file(path)),
                _ => {
                    return Err(CimError::invalid_argument(
                        "config",
                        format!("unsupported config file format: {}", path.display()),
                    ))
                },
            };
        }

        Ok(figment.merge(Env::prefixed(&self.env_prefix).split("__")))
    }

    /// Extract and validate
    pub fn load(&self) -> CimResult<MeasureConfig> {
        let config: MeasureConfig = self
            .figment()?
            .extract()
            .map_err(|e| CimError::Configuration(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        debug!(
            "Configuration: profile={} model_kind={} classes={}",
            config.profile,
            config.model_kind,
            config.class_order.len()
        );
        Ok(config)
    }
}
