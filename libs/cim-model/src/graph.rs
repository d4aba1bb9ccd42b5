//! In-memory network graph
//!
//! Equipment, terminals and connectivity nodes live in dense arenas and are
//! never removed, so their handles stay valid for the lifetime of the graph.
//! Measurements are keyed by identifier; equipment and terminals only hold
//! identifier lists that are kept in sync by [`GraphModel::attach_measurement`]
//! and [`GraphModel::detach_measurement`].

use crate::equipment::{
    ConnectivityNode, Container, ContainerClass, Equipment, EquipmentId, EquipmentKind, NodeId,
    Terminal, TerminalId,
};
use crate::error::{ModelError, Result};
use crate::measurement::Measurement;
use crate::schema::ModelKind;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Identity of the model a graph belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model mRID, also the key of the persisted identity map
    pub mrid: String,
    pub name: String,
    pub kind: ModelKind,
}

/// Reference to any object carrying an mRID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef {
    Container(usize),
    Node(NodeId),
    Equipment(EquipmentId),
    Terminal(TerminalId),
    Measurement(Uuid),
}

/// Network graph of one model
#[derive(Debug, Clone)]
pub struct GraphModel {
    model: ModelInfo,
    containers: Vec<Container>,
    nodes: Vec<ConnectivityNode>,
    equipment: Vec<Equipment>,
    terminals: Vec<Terminal>,
    measurements: BTreeMap<Uuid, Measurement>,
}

impl GraphModel {
    pub fn new(model: ModelInfo) -> Self {
        Self {
            model,
            containers: Vec::new(),
            nodes: Vec::new(),
            equipment: Vec::new(),
            terminals: Vec::new(),
            measurements: BTreeMap::new(),
        }
    }

    pub fn model(&self) -> &ModelInfo {
        &self.model
    }

    /// Key used for the persisted identity map
    pub fn model_key(&self) -> &str {
        &self.model.mrid
    }

    // ========================================================================
    // Construction
    // ========================================================================

    pub fn add_container(
        &mut self,
        mrid: impl Into<String>,
        name: impl Into<String>,
        class: ContainerClass,
    ) {
        self.containers.push(Container {
            mrid: mrid.into(),
            name: name.into(),
            class,
        });
    }

    pub fn add_node(&mut self, mrid: impl Into<String>, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ConnectivityNode {
            mrid: mrid.into(),
            name: name.into(),
            terminals: Vec::new(),
        });
        id
    }

    pub fn add_equipment(
        &mut self,
        mrid: impl Into<String>,
        name: impl Into<String>,
        kind: EquipmentKind,
    ) -> EquipmentId {
        let id = EquipmentId(self.equipment.len());
        self.equipment.push(Equipment {
            mrid: mrid.into(),
            name: name.into(),
            kind,
            terminals: Vec::new(),
            measurements: Vec::new(),
        });
        id
    }

    /// Replace the variant of an equipment
    ///
    /// Transformers reference their own terminals, so they are created with a
    /// placeholder kind and completed once the terminals exist.
    pub fn set_kind(&mut self, equipment: EquipmentId, kind: EquipmentKind) -> Result<()> {
        let terminals = &self.terminals;
        let owns = |terminal: TerminalId| {
            terminals
                .get(terminal.0)
                .is_some_and(|t| t.equipment == equipment)
        };
        if let EquipmentKind::PowerTransformer { ends, tanks } = &kind {
            let foreign = ends
                .iter()
                .map(|end| end.terminal)
                .chain(tanks.iter().flat_map(|t| t.ends.iter().map(|end| end.terminal)))
                .find(|terminal| !owns(*terminal));
            if let Some(terminal) = foreign {
                return Err(ModelError::inconsistent(format!(
                    "transformer end references terminal {} not owned by equipment {}",
                    terminal.0, equipment.0
                )));
            }
        }
        let slot = self
            .equipment
            .get_mut(equipment.0)
            .ok_or_else(|| ModelError::inconsistent(format!("unknown equipment {}", equipment.0)))?;
        slot.kind = kind;
        Ok(())
    }

    pub fn add_terminal(
        &mut self,
        equipment: EquipmentId,
        mrid: impl Into<String>,
        name: impl Into<String>,
        sequence_number: u32,
        node: Option<NodeId>,
    ) -> Result<TerminalId> {
        if equipment.0 >= self.equipment.len() {
            return Err(ModelError::inconsistent(format!(
                "unknown equipment {}",
                equipment.0
            )));
        }
        if let Some(node) = node {
            if node.0 >= self.nodes.len() {
                return Err(ModelError::inconsistent(format!(
                    "unknown connectivity node {}",
                    node.0
                )));
            }
        }

        let id = TerminalId(self.terminals.len());
        self.terminals.push(Terminal {
            mrid: mrid.into(),
            name: name.into(),
            sequence_number,
            equipment,
            node,
            measurements: Vec::new(),
        });
        self.equipment[equipment.0].terminals.push(id);
        if let Some(node) = node {
            self.nodes[node.0].terminals.push(id);
        }
        Ok(id)
    }

    // ========================================================================
    // Lookup and traversal
    // ========================================================================

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn equipment(&self, id: EquipmentId) -> &Equipment {
        &self.equipment[id.0]
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.0]
    }

    pub fn node(&self, id: NodeId) -> &ConnectivityNode {
        &self.nodes[id.0]
    }

    pub fn measurement(&self, id: &Uuid) -> Option<&Measurement> {
        self.measurements.get(id)
    }

    pub fn contains_measurement(&self, id: &Uuid) -> bool {
        self.measurements.contains_key(id)
    }

    /// Equipment handles in insertion order
    pub fn equipment_ids(&self) -> impl Iterator<Item = EquipmentId> + '_ {
        (0..self.equipment.len()).map(EquipmentId)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn terminal_ids(&self) -> impl Iterator<Item = TerminalId> + '_ {
        (0..self.terminals.len()).map(TerminalId)
    }

    /// Equipment of one CIM class, in insertion order
    pub fn equipment_of_class<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = EquipmentId> + 'a {
        self.equipment_ids()
            .filter(move |id| self.equipment[id.0].class_name() == class_name)
    }

    pub fn equipment_by_name(&self, class_name: &str, name: &str) -> Option<EquipmentId> {
        self.equipment_of_class(class_name)
            .find(|id| self.equipment[id.0].name == name)
    }

    pub fn equipment_count(&self) -> usize {
        self.equipment.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Measurements ordered by identifier
    pub fn measurements(&self) -> impl Iterator<Item = &Measurement> {
        self.measurements.values()
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }

    /// Connectivity node a terminal is attached to
    pub fn node_of(&self, terminal: TerminalId) -> Option<NodeId> {
        self.terminals[terminal.0].node
    }

    /// Whether two terminals sit on the same connectivity node
    pub fn share_node(&self, a: TerminalId, b: TerminalId) -> bool {
        match (self.node_of(a), self.node_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Measurements attached anywhere on a connectivity node
    pub fn measurements_at_node(&self, node: NodeId) -> impl Iterator<Item = &Measurement> {
        self.nodes[node.0]
            .terminals
            .iter()
            .flat_map(move |t| self.terminals[t.0].measurements.iter())
            .filter_map(move |id| self.measurements.get(id))
    }

    // ========================================================================
    // Measurement mutation
    // ========================================================================

    /// Insert a measurement and register it with its equipment and terminal
    pub fn attach_measurement(&mut self, measurement: Measurement) -> Result<()> {
        if self.measurements.contains_key(&measurement.mrid) {
            return Err(ModelError::IdentifierInUse(measurement.mrid));
        }
        let terminal = self.terminals.get(measurement.terminal.0).ok_or_else(|| {
            ModelError::inconsistent(format!("unknown terminal {}", measurement.terminal.0))
        })?;
        if terminal.equipment != measurement.equipment {
            return Err(ModelError::inconsistent(format!(
                "measurement {} placed on terminal {} of another equipment",
                measurement.name, terminal.mrid
            )));
        }

        let id = measurement.mrid;
        self.equipment[measurement.equipment.0].measurements.push(id);
        self.terminals[measurement.terminal.0].measurements.push(id);
        self.measurements.insert(id, measurement);
        Ok(())
    }

    /// Remove a measurement from the arena and both back-collections
    ///
    /// Returns `None` when the identifier is not present.
    pub fn detach_measurement(&mut self, id: &Uuid) -> Option<Measurement> {
        let measurement = self.measurements.remove(id)?;
        self.equipment[measurement.equipment.0]
            .measurements
            .retain(|m| m != id);
        self.terminals[measurement.terminal.0]
            .measurements
            .retain(|m| m != id);
        Some(measurement)
    }

    // ========================================================================
    // Identifier maintenance
    // ========================================================================

    /// Every object carrying an mRID with its class name, in a fixed order:
    /// containers, nodes, equipment, terminals, measurements
    pub fn objects(&self) -> Vec<(ObjectRef, String, String)> {
        let mut objects = Vec::new();
        for (index, container) in self.containers.iter().enumerate() {
            objects.push((
                ObjectRef::Container(index),
                container.class.as_str().to_string(),
                container.mrid.clone(),
            ));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            objects.push((
                ObjectRef::Node(NodeId(index)),
                "ConnectivityNode".to_string(),
                node.mrid.clone(),
            ));
        }
        for (index, equipment) in self.equipment.iter().enumerate() {
            objects.push((
                ObjectRef::Equipment(EquipmentId(index)),
                equipment.class_name().to_string(),
                equipment.mrid.clone(),
            ));
        }
        for (index, terminal) in self.terminals.iter().enumerate() {
            objects.push((
                ObjectRef::Terminal(TerminalId(index)),
                "Terminal".to_string(),
                terminal.mrid.clone(),
            ));
        }
        for measurement in self.measurements.values() {
            objects.push((
                ObjectRef::Measurement(measurement.mrid),
                measurement.kind.class_name().to_string(),
                measurement.mrid.to_string(),
            ));
        }
        objects
    }

    /// Name of the object behind a reference
    pub fn object_name(&self, object: ObjectRef) -> Option<&str> {
        match object {
            ObjectRef::Container(index) => self.containers.get(index).map(|c| c.name.as_str()),
            ObjectRef::Node(id) => self.nodes.get(id.0).map(|n| n.name.as_str()),
            ObjectRef::Equipment(id) => self.equipment.get(id.0).map(|e| e.name.as_str()),
            ObjectRef::Terminal(id) => self.terminals.get(id.0).map(|t| t.name.as_str()),
            ObjectRef::Measurement(id) => self.measurements.get(&id).map(|m| m.name.as_str()),
        }
    }

    /// Assign a new mRID to a non-measurement object
    pub fn set_object_mrid(&mut self, object: ObjectRef, mrid: String) -> Result<()> {
        let slot = match object {
            ObjectRef::Container(index) => self.containers.get_mut(index).map(|c| &mut c.mrid),
            ObjectRef::Node(id) => self.nodes.get_mut(id.0).map(|n| &mut n.mrid),
            ObjectRef::Equipment(id) => self.equipment.get_mut(id.0).map(|e| &mut e.mrid),
            ObjectRef::Terminal(id) => self.terminals.get_mut(id.0).map(|t| &mut t.mrid),
            ObjectRef::Measurement(id) => {
                return Err(ModelError::inconsistent(format!(
                    "measurement {} must be re-keyed, not renamed",
                    id
                )))
            },
        };
        let slot = slot.ok_or_else(|| ModelError::inconsistent("unknown object reference"))?;
        *slot = mrid;
        Ok(())
    }

    /// Move a measurement to a new identifier, keeping its position in both
    /// back-collections
    pub fn rekey_measurement(&mut self, old: &Uuid, new: Uuid) -> Result<()> {
        if self.measurements.contains_key(&new) {
            return Err(ModelError::IdentifierInUse(new));
        }
        let mut measurement = self
            .measurements
            .remove(old)
            .ok_or_else(|| ModelError::inconsistent(format!("unknown measurement {}", old)))?;
        measurement.mrid = new;

        for id in self.equipment[measurement.equipment.0]
            .measurements
            .iter_mut()
            .chain(self.terminals[measurement.terminal.0].measurements.iter_mut())
        {
            if *id == *old {
                *id = new;
            }
        }
        self.measurements.insert(new, measurement);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::equipment::{PowerTransformerEnd, SwitchClass};
    use crate::types::{MeasurementKind, MeasurementType, PhaseCode, SinglePhaseKind};

    fn feeder() -> GraphModel {
        GraphModel::new(ModelInfo {
            mrid: "F1".into(),
            name: "test_feeder".into(),
            kind: ModelKind::Feeder,
        })
    }

    fn pnv(graph: &GraphModel, equipment: EquipmentId, seq: usize, id: u128) -> Measurement {
        Measurement {
            mrid: Uuid::from_u128(id),
            name: format!("m{}", id),
            kind: MeasurementKind::Analog,
            measurement_type: MeasurementType::Voltage,
            phases: PhaseCode::A,
            equipment,
            terminal: graph.equipment(equipment).terminals[seq],
        }
    }

    #[test]
    fn test_enumerate_by_class_in_insertion_order() {
        let mut graph = feeder();
        let l2 = graph.add_equipment(
            "L2",
            "line2",
            EquipmentKind::AcLineSegment { phases: vec![] },
        );
        graph.add_equipment(
            "B1",
            "brk",
            EquipmentKind::Switch {
                class: SwitchClass::Breaker,
                phases: vec![],
            },
        );
        let l1 = graph.add_equipment(
            "L1",
            "line1",
            EquipmentKind::AcLineSegment {
                phases: vec![SinglePhaseKind::A],
            },
        );

        let lines: Vec<_> = graph.equipment_of_class("ACLineSegment").collect();
        assert_eq!(lines, vec![l2, l1]);
        assert_eq!(graph.equipment_of_class("Breaker").count(), 1);
        assert_eq!(graph.equipment_by_name("ACLineSegment", "line1"), Some(l1));
    }

    #[test]
    fn test_terminals_join_nodes() {
        let mut graph = feeder();
        let n1 = graph.add_node("N1", "bus1");
        let a = graph.add_equipment("L1", "a", EquipmentKind::AcLineSegment { phases: vec![] });
        let b = graph.add_equipment("L2", "b", EquipmentKind::AcLineSegment { phases: vec![] });
        let ta = graph.add_terminal(a, "T1", "a_T1", 1, Some(n1)).unwrap();
        let tb = graph.add_terminal(b, "T2", "b_T1", 1, Some(n1)).unwrap();
        let tc = graph.add_terminal(b, "T3", "b_T2", 2, None).unwrap();

        assert!(graph.share_node(ta, tb));
        assert!(!graph.share_node(tb, tc));
        assert_eq!(graph.node(n1).terminals, vec![ta, tb]);
        assert_eq!(graph.equipment(b).terminals, vec![tb, tc]);
        assert!(graph.add_terminal(EquipmentId(9), "T9", "x", 1, None).is_err());
    }

    #[test]
    fn test_attach_and_detach_keep_back_collections() {
        let mut graph = feeder();
        let n1 = graph.add_node("N1", "bus1");
        let eq = graph.add_equipment("L1", "a", EquipmentKind::AcLineSegment { phases: vec![] });
        graph.add_terminal(eq, "T1", "a_T1", 1, Some(n1)).unwrap();

        let m = pnv(&graph, eq, 0, 7);
        graph.attach_measurement(m.clone()).unwrap();
        assert_eq!(graph.equipment(eq).measurements, vec![m.mrid]);
        assert_eq!(graph.measurements_at_node(n1).count(), 1);

        let err = graph.attach_measurement(m.clone()).unwrap_err();
        assert_eq!(err, ModelError::IdentifierInUse(m.mrid));

        assert!(graph.detach_measurement(&m.mrid).is_some());
        assert!(graph.equipment(eq).measurements.is_empty());
        assert!(graph.terminal(graph.equipment(eq).terminals[0]).measurements.is_empty());
        assert!(graph.detach_measurement(&m.mrid).is_none());
    }

    #[test]
    fn test_attach_rejects_foreign_terminal() {
        let mut graph = feeder();
        let a = graph.add_equipment("L1", "a", EquipmentKind::AcLineSegment { phases: vec![] });
        let b = graph.add_equipment("L2", "b", EquipmentKind::AcLineSegment { phases: vec![] });
        graph.add_terminal(a, "T1", "a_T1", 1, None).unwrap();
        graph.add_terminal(b, "T2", "b_T1", 1, None).unwrap();

        let mut m = pnv(&graph, a, 0, 1);
        m.equipment = b;
        assert!(matches!(
            graph.attach_measurement(m),
            Err(ModelError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_set_kind_checks_end_terminals() {
        let mut graph = feeder();
        let xf = graph.add_equipment("X1", "xf", EquipmentKind::Other { class: "PowerTransformer".into() });
        let other = graph.add_equipment("L1", "a", EquipmentKind::AcLineSegment { phases: vec![] });
        let t1 = graph.add_terminal(xf, "T1", "xf_T1", 1, None).unwrap();
        let foreign = graph.add_terminal(other, "T2", "a_T1", 1, None).unwrap();

        let end = |terminal| PowerTransformerEnd {
            name: "end".into(),
            terminal,
            has_tap_changer: false,
        };
        assert!(graph
            .set_kind(
                xf,
                EquipmentKind::PowerTransformer {
                    ends: vec![end(t1), end(foreign)],
                    tanks: vec![],
                },
            )
            .is_err());
        graph
            .set_kind(
                xf,
                EquipmentKind::PowerTransformer {
                    ends: vec![end(t1)],
                    tanks: vec![],
                },
            )
            .unwrap();
        assert!(graph.equipment(xf).kind.is_transformer());
    }

    #[test]
    fn test_rekey_measurement() {
        let mut graph = feeder();
        let eq = graph.add_equipment("L1", "a", EquipmentKind::AcLineSegment { phases: vec![] });
        graph.add_terminal(eq, "T1", "a_T1", 1, None).unwrap();
        let m = pnv(&graph, eq, 0, 1);
        let old = m.mrid;
        graph.attach_measurement(m).unwrap();

        let new = Uuid::from_u128(2);
        graph.rekey_measurement(&old, new).unwrap();
        assert!(graph.measurement(&old).is_none());
        assert_eq!(graph.measurement(&new).unwrap().mrid, new);
        assert_eq!(graph.equipment(eq).measurements, vec![new]);
    }

    #[test]
    fn test_objects_in_fixed_order() {
        let mut graph = feeder();
        graph.add_container("R1", "region", ContainerClass::GeographicalRegion);
        graph.add_node("N1", "bus1");
        let eq = graph.add_equipment("L1", "a", EquipmentKind::AcLineSegment { phases: vec![] });
        graph.add_terminal(eq, "T1", "a_T1", 1, None).unwrap();

        let classes: Vec<_> = graph.objects().into_iter().map(|(_, c, _)| c).collect();
        assert_eq!(
            classes,
            vec!["GeographicalRegion", "ConnectivityNode", "ACLineSegment", "Terminal"]
        );

        graph
            .set_object_mrid(ObjectRef::Equipment(eq), "L1-renamed".into())
            .unwrap();
        assert_eq!(graph.equipment(eq).mrid, "L1-renamed");
        assert_eq!(graph.object_name(ObjectRef::Equipment(eq)), Some("a"));
    }
}
