//! Graph document codec
//!
//! A `GraphDocument` is the file form of a [`GraphModel`]: plain records that
//! reference each other by mRID. Import resolves every reference into arena
//! handles; export walks the arenas in insertion order and sorts measurements
//! by name and identifier so repeated exports are byte-identical.

use crate::equipment::{
    ContainerClass, EquipmentId, EquipmentKind, PowerElectronicsUnitKind, PowerTransformerEnd,
    SwitchClass, SwitchPhase, TerminalId, TransformerTank, TransformerTankEnd,
};
use crate::error::{ModelError, Result};
use crate::graph::{GraphModel, ModelInfo};
use crate::measurement::Measurement;
use crate::schema::ModelKind;
use crate::types::{MeasurementKind, MeasurementType, OrderedPhaseCode, PhaseCode, SinglePhaseKind};
use crate::validation::{parse_measurement_id, validate_model_key, validate_object_name};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::debug;

// ============================================================================
// Records
// ============================================================================

/// File form of a network model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub model: ModelRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerRecord>,
    #[serde(default)]
    pub connectivity_nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub equipment: Vec<EquipmentRecord>,
    #[serde(default)]
    pub analogs: Vec<MeasurementRecord>,
    #[serde(default)]
    pub discretes: Vec<MeasurementRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub mrid: String,
    pub name: String,
    #[serde(default)]
    pub kind: ModelKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub mrid: String,
    pub name: String,
    pub class: ContainerClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub mrid: String,
    pub name: String,
}

/// Equipment record; the variant-specific fields are read according to `class`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub mrid: String,
    pub name: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<SinglePhaseKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub switch_phases: Vec<SwitchPhase>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<PowerElectronicsUnitKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transformer_ends: Vec<WindingEndRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tanks: Vec<TankRecord>,
    #[serde(default)]
    pub terminals: Vec<TerminalRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalRecord {
    pub mrid: String,
    pub name: String,
    pub sequence_number: u32,
    /// mRID of the connectivity node, absent when unconnected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity_node: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindingEndRecord {
    pub name: String,
    /// mRID of one of the transformer's own terminals
    pub terminal: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tap_changer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankRecord {
    pub name: String,
    #[serde(default)]
    pub ends: Vec<TankEndRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankEndRecord {
    pub name: String,
    pub terminal: String,
    #[serde(default = "no_phase")]
    pub phases: PhaseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_phases: Option<OrderedPhaseCode>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tap_changer: bool,
}

/// Analog or discrete record; the kind is given by the list it sits in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub mrid: String,
    pub name: String,
    pub measurement_type: MeasurementType,
    pub phases: PhaseCode,
    /// mRID of the owning equipment
    pub equipment: String,
    /// mRID of the owning terminal
    pub terminal: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn no_phase() -> PhaseCode {
    PhaseCode::None
}

// ============================================================================
// Format
// ============================================================================

/// On-disk encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            other => Err(ModelError::invalid_argument(
                "document format",
                format!(
                    "unsupported extension {:?} for {}. Expected .json, .yaml or .yml",
                    other.unwrap_or(""),
                    path.display()
                ),
            )),
        }
    }
}

/// Write a file through a temp file in the same directory and an atomic rename
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ============================================================================
// Reading and writing
// ============================================================================

impl GraphDocument {
    /// Read a document, choosing the decoder by extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let format = DocumentFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Io(format!("{}: {}", path.display(), e)))?;
        let parse_error = |error: String| ModelError::Parse {
            file: path.display().to_string(),
            error,
        };

        let document: GraphDocument = match format {
            DocumentFormat::Json => {
                serde_json::from_str(&text).map_err(|e| parse_error(e.to_string()))?
            },
            DocumentFormat::Yaml => {
                serde_yaml::from_str(&text).map_err(|e| parse_error(e.to_string()))?
            },
        };
        debug!(
            "Loaded graph document {} ({} equipment, {} nodes)",
            path.display(),
            document.equipment.len(),
            document.connectivity_nodes.len()
        );
        Ok(document)
    }

    pub fn to_text(&self, format: DocumentFormat) -> Result<String> {
        let mut text = match format {
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
            DocumentFormat::Yaml => serde_yaml::to_string(self)?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    /// Write the document atomically, choosing the encoder by extension
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let text = self.to_text(DocumentFormat::from_path(path)?)?;
        write_atomic(path, text.as_bytes())
            .map_err(|e| ModelError::Io(format!("{}: {}", path.display(), e)))?;
        debug!("Wrote graph document {}", path.display());
        Ok(())
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Resolve every mRID reference and build the graph arenas
    pub fn into_graph(self) -> Result<GraphModel> {
        validate_model_key(&self.model.mrid)?;
        let mut graph = GraphModel::new(ModelInfo {
            mrid: self.model.mrid,
            name: self.model.name,
            kind: self.model.kind,
        });

        for container in self.containers {
            graph.add_container(container.mrid, container.name, container.class);
        }

        let mut nodes = FxHashMap::default();
        for node in self.connectivity_nodes {
            if nodes.contains_key(&node.mrid) {
                return Err(ModelError::DuplicateMrid {
                    collection: "connectivity_nodes",
                    mrid: node.mrid,
                });
            }
            let id = graph.add_node(node.mrid.clone(), node.name);
            nodes.insert(node.mrid, id);
        }

        let mut equipment_ids = FxHashMap::default();
        let mut equipment_names = FxHashSet::default();
        let mut terminal_ids: FxHashMap<String, TerminalId> = FxHashMap::default();
        for record in self.equipment {
            validate_object_name(&record.class, &record.name)?;
            // Measurement names are built from class and name
            if !equipment_names.insert((record.class.clone(), record.name.clone())) {
                return Err(ModelError::validation(format!(
                    "{} name '{}' is used by more than one equipment",
                    record.class, record.name
                )));
            }
            if equipment_ids.contains_key(&record.mrid) {
                return Err(ModelError::DuplicateMrid {
                    collection: "equipment",
                    mrid: record.mrid,
                });
            }

            let placeholder = EquipmentKind::Other {
                class: record.class.clone(),
            };
            let id = graph.add_equipment(record.mrid.clone(), record.name.clone(), placeholder);
            equipment_ids.insert(record.mrid.clone(), id);

            let mut own_terminals = FxHashMap::default();
            for terminal in &record.terminals {
                if terminal_ids.contains_key(&terminal.mrid) {
                    return Err(ModelError::DuplicateMrid {
                        collection: "terminals",
                        mrid: terminal.mrid.clone(),
                    });
                }
                let node = match &terminal.connectivity_node {
                    Some(mrid) => Some(
                        *nodes
                            .get(mrid)
                            .ok_or_else(|| ModelError::reference("connectivity node", mrid))?,
                    ),
                    None => None,
                };
                let terminal_id = graph.add_terminal(
                    id,
                    terminal.mrid.clone(),
                    terminal.name.clone(),
                    terminal.sequence_number,
                    node,
                )?;
                terminal_ids.insert(terminal.mrid.clone(), terminal_id);
                own_terminals.insert(terminal.mrid.clone(), terminal_id);
            }

            let kind = record.to_kind(&own_terminals)?;
            graph.set_kind(id, kind)?;
        }

        for (records, kind) in [
            (self.analogs, MeasurementKind::Analog),
            (self.discretes, MeasurementKind::Discrete),
        ] {
            for record in records {
                let mrid = parse_measurement_id(&record.mrid)?;
                let equipment = *equipment_ids
                    .get(&record.equipment)
                    .ok_or_else(|| ModelError::reference("equipment", &record.equipment))?;
                let terminal = *terminal_ids
                    .get(&record.terminal)
                    .ok_or_else(|| ModelError::reference("terminal", &record.terminal))?;

                let measurement = Measurement {
                    mrid,
                    name: record.name,
                    kind,
                    measurement_type: record.measurement_type,
                    phases: record.phases,
                    equipment,
                    terminal,
                };
                graph.attach_measurement(measurement).map_err(|e| match e {
                    ModelError::IdentifierInUse(id) => ModelError::DuplicateMrid {
                        collection: "measurements",
                        mrid: id.to_string(),
                    },
                    other => other,
                })?;
            }
        }

        debug!(
            "Built graph {} ({} equipment, {} measurements)",
            graph.model_key(),
            graph.equipment_count(),
            graph.measurement_count()
        );
        Ok(graph)
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Snapshot a graph in deterministic order
    pub fn from_graph(graph: &GraphModel) -> Self {
        let model = graph.model();

        let containers = graph
            .containers()
            .iter()
            .map(|c| ContainerRecord {
                mrid: c.mrid.clone(),
                name: c.name.clone(),
                class: c.class,
            })
            .collect();

        let connectivity_nodes = graph
            .node_ids()
            .map(|id| {
                let node = graph.node(id);
                NodeRecord {
                    mrid: node.mrid.clone(),
                    name: node.name.clone(),
                }
            })
            .collect();

        let equipment = graph
            .equipment_ids()
            .map(|id| EquipmentRecord::from_equipment(graph, id))
            .collect();

        let mut measurements: Vec<&Measurement> = graph.measurements().collect();
        measurements.sort_by(|a, b| a.name.cmp(&b.name).then(a.mrid.cmp(&b.mrid)));

        let mut analogs = Vec::new();
        let mut discretes = Vec::new();
        for m in measurements {
            let record = MeasurementRecord {
                mrid: m.mrid.to_string(),
                name: m.name.clone(),
                measurement_type: m.measurement_type,
                phases: m.phases,
                equipment: graph.equipment(m.equipment).mrid.clone(),
                terminal: graph.terminal(m.terminal).mrid.clone(),
            };
            match m.kind {
                MeasurementKind::Analog => analogs.push(record),
                MeasurementKind::Discrete => discretes.push(record),
            }
        }

        GraphDocument {
            model: ModelRecord {
                mrid: model.mrid.clone(),
                name: model.name.clone(),
                kind: model.kind,
            },
            containers,
            connectivity_nodes,
            equipment,
            analogs,
            discretes,
        }
    }
}

impl EquipmentRecord {
    /// Build the equipment variant, resolving end terminals among the
    /// equipment's own terminals
    fn to_kind(&self, own_terminals: &FxHashMap<String, TerminalId>) -> Result<EquipmentKind> {
        let resolve = |mrid: &str| {
            own_terminals
                .get(mrid)
                .copied()
                .ok_or_else(|| ModelError::reference("transformer end terminal", mrid))
        };

        let kind = match self.class.as_str() {
            "ACLineSegment" => EquipmentKind::AcLineSegment {
                phases: self.phases.clone(),
            },
            "EnergyConsumer" => EquipmentKind::EnergyConsumer {
                phases: self.phases.clone(),
            },
            "PowerElectronicsConnection" => EquipmentKind::PowerElectronicsConnection {
                units: self.units.clone(),
                phases: self.phases.clone(),
            },
            "SynchronousMachine" => EquipmentKind::SynchronousMachine,
            "LinearShuntCompensator" => EquipmentKind::LinearShuntCompensator {
                phases: self.phases.clone(),
            },
            "PowerTransformer" => {
                let ends = self
                    .transformer_ends
                    .iter()
                    .map(|end| {
                        resolve(&end.terminal).map(|terminal| PowerTransformerEnd {
                            name: end.name.clone(),
                            terminal,
                            has_tap_changer: end.tap_changer,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let tanks = self
                    .tanks
                    .iter()
                    .map(|tank| {
                        tank.ends
                            .iter()
                            .map(|end| {
                                resolve(&end.terminal).map(|terminal| TransformerTankEnd {
                                    name: end.name.clone(),
                                    terminal,
                                    phases: end.phases,
                                    ordered_phases: end.ordered_phases.clone(),
                                    has_tap_changer: end.tap_changer,
                                })
                            })
                            .collect::<Result<Vec<_>>>()
                            .map(|ends| TransformerTank {
                                name: tank.name.clone(),
                                ends,
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                EquipmentKind::PowerTransformer { ends, tanks }
            },
            other => match other.parse::<SwitchClass>() {
                Ok(class) => EquipmentKind::Switch {
                    class,
                    phases: self.switch_phases.clone(),
                },
                Err(_) => EquipmentKind::Other {
                    class: other.to_string(),
                },
            },
        };
        Ok(kind)
    }

    fn from_equipment(graph: &GraphModel, id: EquipmentId) -> Self {
        let equipment = graph.equipment(id);
        let terminal_mrid = |terminal: TerminalId| graph.terminal(terminal).mrid.clone();

        let mut record = EquipmentRecord {
            mrid: equipment.mrid.clone(),
            name: equipment.name.clone(),
            class: equipment.class_name().to_string(),
            phases: Vec::new(),
            switch_phases: Vec::new(),
            units: Vec::new(),
            transformer_ends: Vec::new(),
            tanks: Vec::new(),
            terminals: equipment
                .terminals
                .iter()
                .map(|t| {
                    let terminal = graph.terminal(*t);
                    TerminalRecord {
                        mrid: terminal.mrid.clone(),
                        name: terminal.name.clone(),
                        sequence_number: terminal.sequence_number,
                        connectivity_node: terminal.node.map(|n| graph.node(n).mrid.clone()),
                    }
                })
                .collect(),
        };

        match &equipment.kind {
            EquipmentKind::AcLineSegment { phases }
            | EquipmentKind::EnergyConsumer { phases }
            | EquipmentKind::LinearShuntCompensator { phases } => {
                record.phases = phases.clone();
            },
            EquipmentKind::PowerElectronicsConnection { units, phases } => {
                record.units = units.clone();
                record.phases = phases.clone();
            },
            EquipmentKind::Switch { phases, .. } => {
                record.switch_phases = phases.clone();
            },
            EquipmentKind::PowerTransformer { ends, tanks } => {
                record.transformer_ends = ends
                    .iter()
                    .map(|end| WindingEndRecord {
                        name: end.name.clone(),
                        terminal: terminal_mrid(end.terminal),
                        tap_changer: end.has_tap_changer,
                    })
                    .collect();
                record.tanks = tanks
                    .iter()
                    .map(|tank| TankRecord {
                        name: tank.name.clone(),
                        ends: tank
                            .ends
                            .iter()
                            .map(|end| TankEndRecord {
                                name: end.name.clone(),
                                terminal: terminal_mrid(end.terminal),
                                phases: end.phases,
                                ordered_phases: end.ordered_phases.clone(),
                                tap_changer: end.has_tap_changer,
                            })
                            .collect(),
                    })
                    .collect();
            },
            EquipmentKind::SynchronousMachine | EquipmentKind::Other { .. } => {},
        }
        record
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::equipment::EquipmentTag;

    const FEEDER_JSON: &str = r#"{
        "model": { "mrid": "F1", "name": "ieee13", "kind": "feeder" },
        "containers": [ { "mrid": "R1", "name": "region", "class": "GeographicalRegion" } ],
        "connectivity_nodes": [
            { "mrid": "N1", "name": "650" },
            { "mrid": "N2", "name": "632" }
        ],
        "equipment": [
            {
                "mrid": "L1", "name": "650632", "class": "ACLineSegment",
                "phases": ["A", "B", "C"],
                "terminals": [
                    { "mrid": "T1", "name": "650632_T1", "sequence_number": 1, "connectivity_node": "N1" },
                    { "mrid": "T2", "name": "650632_T2", "sequence_number": 2, "connectivity_node": "N2" }
                ]
            },
            {
                "mrid": "X1", "name": "reg1", "class": "PowerTransformer",
                "tanks": [ { "name": "tank_a", "ends": [
                    { "name": "e1", "terminal": "T3", "phases": "A", "ordered_phases": "AN", "tap_changer": true },
                    { "name": "e2", "terminal": "T4", "phases": "A" }
                ] } ],
                "terminals": [
                    { "mrid": "T3", "name": "reg1_T1", "sequence_number": 1, "connectivity_node": "N1" },
                    { "mrid": "T4", "name": "reg1_T2", "sequence_number": 2 }
                ]
            },
            {
                "mrid": "S1", "name": "brk", "class": "Breaker",
                "switch_phases": [ { "phase_side1": "A", "phase_side2": "A" } ],
                "terminals": [ { "mrid": "T5", "name": "brk_T1", "sequence_number": 1, "connectivity_node": "N2" } ]
            }
        ],
        "analogs": [
            { "mrid": "_0DDA4A1B-3E5C-4D0A-9F1E-2C0A5B6E7F80", "name": "ACLineSegment_650632_PNV_1_A",
              "measurement_type": "PNV", "phases": "A", "equipment": "L1", "terminal": "T1" }
        ]
    }"#;

    fn parse(text: &str) -> GraphDocument {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_import_resolves_references() {
        let graph = parse(FEEDER_JSON).into_graph().unwrap();
        assert_eq!(graph.model_key(), "F1");
        assert_eq!(graph.equipment_count(), 3);
        assert_eq!(graph.measurement_count(), 1);

        let xf = graph.equipment_by_name("PowerTransformer", "reg1").unwrap();
        assert!(graph.equipment(xf).kind.has_tap_changer());

        let brk = graph.equipment_by_name("Breaker", "brk").unwrap();
        assert_eq!(graph.equipment(brk).kind.tag(), EquipmentTag::Switch);

        let line = graph.equipment_by_name("ACLineSegment", "650632").unwrap();
        let t1 = graph.equipment(line).terminals[0];
        let t3 = graph.equipment(xf).terminals[0];
        assert!(graph.share_node(t1, t3));
        assert_eq!(graph.equipment(line).measurements.len(), 1);
    }

    #[test]
    fn test_import_rejects_unknown_node() {
        let text = FEEDER_JSON.replace(
            "\"brk_T1\", \"sequence_number\": 1, \"connectivity_node\": \"N2\"",
            "\"brk_T1\", \"sequence_number\": 1, \"connectivity_node\": \"N9\"",
        );
        let err = parse(&text).into_graph().unwrap_err();
        assert_eq!(err, ModelError::reference("connectivity node", "N9"));
    }

    #[test]
    fn test_import_rejects_foreign_end_terminal() {
        let text = FEEDER_JSON.replace("\"terminal\": \"T4\"", "\"terminal\": \"T2\"");
        let err = parse(&text).into_graph().unwrap_err();
        assert!(matches!(err, ModelError::Reference { .. }));
    }

    #[test]
    fn test_import_rejects_duplicate_terminal() {
        let text = FEEDER_JSON.replace("\"mrid\": \"T5\"", "\"mrid\": \"T1\"");
        let err = parse(&text).into_graph().unwrap_err();
        assert!(matches!(err, ModelError::DuplicateMrid { collection: "terminals", .. }));
    }

    #[test]
    fn test_import_rejects_malformed_measurement_id() {
        let text = FEEDER_JSON.replace("_0DDA4A1B-3E5C-4D0A-9F1E-2C0A5B6E7F80", "meas-1");
        assert!(matches!(
            parse(&text).into_graph(),
            Err(ModelError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_export_is_canonical() {
        let graph = parse(FEEDER_JSON).into_graph().unwrap();
        let exported = GraphDocument::from_graph(&graph);
        assert_eq!(
            exported.analogs[0].mrid,
            "0dda4a1b-3e5c-4d0a-9f1e-2c0a5b6e7f80"
        );
        assert_eq!(exported.equipment[0].phases, vec![SinglePhaseKind::A, SinglePhaseKind::B, SinglePhaseKind::C]);
        assert!(exported.equipment[1].tanks[0].ends[0].tap_changer);

        // Re-importing the export gives the same export
        let again = GraphDocument::from_graph(&exported.clone().into_graph().unwrap());
        assert_eq!(again, exported);
    }

    #[test]
    fn test_write_and_read_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let document = parse(FEEDER_JSON);

        let json = dir.path().join("feeder.json");
        document.write_to(&json).unwrap();
        assert_eq!(GraphDocument::from_path(&json).unwrap(), document);

        let yaml = dir.path().join("nested").join("feeder.yml");
        document.write_to(&yaml).unwrap();
        assert_eq!(GraphDocument::from_path(&yaml).unwrap(), document);

        let text = std::fs::read_to_string(&json).unwrap();
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(DocumentFormat::from_path(Path::new("feeder.xml")).is_err());
        assert!(DocumentFormat::from_path(Path::new("feeder")).is_err());
    }
}
