//! CIM Model Library
//!
//! Power-network graph model used by the measurement synthesis engine.
//! This library provides the data model and its file codec without any
//! synthesis logic.

//! # Modules
//!
//! - `types`: phase codes, measurement types and kinds
//! - `schema`: CIM profile, model kind and database tokens
//! - `equipment`: equipment variants, terminals, nodes, containers
//! - `measurement`: analog and discrete measurement points
//! - `graph`: arena-backed graph with attach/detach of measurements
//! - `document`: JSON/YAML graph documents
//! - `validation`: input validation utilities
//!
//! # Example
//!
//! ```
//! use cim_model::{EquipmentKind, GraphModel, ModelInfo, ModelKind};
//!
//! let mut graph = GraphModel::new(ModelInfo {
//!     mrid: "F1".into(),
//!     name: "feeder".into(),
//!     kind: ModelKind::Feeder,
//! });
//! let bus = graph.add_node("N1", "650");
//! let load = graph.add_equipment("E1", "load1", EquipmentKind::EnergyConsumer { phases: vec![] });
//! graph.add_terminal(load, "T1", "load1_T1", 1, Some(bus)).unwrap();
//! assert_eq!(graph.equipment_of_class("EnergyConsumer").count(), 1);
//! ```

pub mod document;
pub mod equipment;
pub mod error;
pub mod graph;
pub mod measurement;
pub mod schema;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use document::{write_atomic, DocumentFormat, GraphDocument};
pub use equipment::{
    ConnectivityNode, Container, ContainerClass, Equipment, EquipmentId, EquipmentKind,
    EquipmentTag, NodeId, PowerElectronicsUnitKind, PowerTransformerEnd, SwitchClass,
    SwitchPhase, Terminal, TerminalId, TransformerTank, TransformerTankEnd,
};
pub use error::{ModelError, Result};
pub use graph::{GraphModel, ModelInfo, ObjectRef};
pub use measurement::Measurement;
pub use schema::{CimProfile, DatabaseType, ModelKind};
pub use types::{
    MeasurementKind, MeasurementType, OrderedPhaseCode, PhaseCode, SinglePhaseKind,
    DEFAULT_PHASES,
};
pub use validation::{parse_measurement_id, validate_model_key, validate_object_name};
