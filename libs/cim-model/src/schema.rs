//! Schema tokens: CIM profile, model kind and backing database type

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CIM profile the graph was exported with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CimProfile {
    #[serde(rename = "rc4_2021")]
    Rc4_2021,
    #[default]
    #[serde(rename = "cimhub_2023")]
    CimHub2023,
}

impl CimProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            CimProfile::Rc4_2021 => "rc4_2021",
            CimProfile::CimHub2023 => "cimhub_2023",
        }
    }

    /// IEC 61970-301 edition the profile is based on
    pub fn iec61970_301(&self) -> u8 {
        match self {
            CimProfile::Rc4_2021 => 7,
            CimProfile::CimHub2023 => 8,
        }
    }

    /// Whether tank ends carry their phases as an ordered phase string
    pub fn uses_ordered_phases(&self) -> bool {
        matches!(self, CimProfile::CimHub2023)
    }
}

impl fmt::Display for CimProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CimProfile {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rc4_2021" => Ok(CimProfile::Rc4_2021),
            "cimhub_2023" => Ok(CimProfile::CimHub2023),
            _ => Err(ModelError::invalid_argument(
                "profile",
                format!("'{}' is not supported. Valid values: rc4_2021, cimhub_2023", s),
            )),
        }
    }
}

/// Shape of the network model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelKind {
    /// Distribution feeder with connectivity nodes
    #[default]
    #[serde(rename = "feeder")]
    Feeder,
    /// Transmission bus-branch model
    #[serde(rename = "busBranch")]
    BusBranch,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Feeder => "feeder",
            ModelKind::BusBranch => "busBranch",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "feeder" => Ok(ModelKind::Feeder),
            "busBranch" => Ok(ModelKind::BusBranch),
            _ => Err(ModelError::invalid_argument(
                "model kind",
                format!("'{}' is not supported. Valid values: feeder, busBranch", s),
            )),
        }
    }
}

/// Graph storage backend a model can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DatabaseType {
    Blazegraph,
    #[serde(rename = "GraphDB")]
    GraphDb,
    Neo4j,
    #[serde(rename = "xml")]
    Xml,
    #[default]
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "yaml")]
    Yaml,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Blazegraph => "Blazegraph",
            DatabaseType::GraphDb => "GraphDB",
            DatabaseType::Neo4j => "Neo4j",
            DatabaseType::Xml => "xml",
            DatabaseType::Json => "json",
            DatabaseType::Yaml => "yaml",
        }
    }

    /// Ensure the bundled document codec can read this backend
    pub fn ensure_loadable(&self) -> Result<()> {
        match self {
            DatabaseType::Json | DatabaseType::Yaml => Ok(()),
            other => Err(ModelError::invalid_argument(
                "database",
                format!("no driver for '{}'. Loadable backends: json, yaml", other),
            )),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Blazegraph" => Ok(DatabaseType::Blazegraph),
            "GraphDB" => Ok(DatabaseType::GraphDb),
            "Neo4j" => Ok(DatabaseType::Neo4j),
            "xml" => Ok(DatabaseType::Xml),
            "json" => Ok(DatabaseType::Json),
            "yaml" => Ok(DatabaseType::Yaml),
            _ => Err(ModelError::invalid_argument(
                "database",
                format!(
                    "'{}' is not supported. Valid values: Blazegraph, GraphDB, Neo4j, xml, json, yaml",
                    s
                ),
            )),
        }
    }
}
