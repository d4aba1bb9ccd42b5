//! Equipment, terminals, connectivity nodes and containers

use crate::error::{ModelError, Result};
use crate::types::{OrderedPhaseCode, PhaseCode, SinglePhaseKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Arena handles
// ============================================================================

/// Handle of an equipment in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EquipmentId(pub(crate) usize);

/// Handle of a terminal in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalId(pub(crate) usize);

/// Handle of a connectivity node in the graph arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl EquipmentId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl TerminalId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

// ============================================================================
// Equipment variants
// ============================================================================

/// Concrete switch classes sharing the switch strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchClass {
    Breaker,
    LoadBreakSwitch,
    Recloser,
    Fuse,
    Sectionaliser,
    Disconnector,
    Jumper,
    Switch,
    Cut,
}

impl SwitchClass {
    pub const ALL: [SwitchClass; 9] = [
        SwitchClass::Breaker,
        SwitchClass::LoadBreakSwitch,
        SwitchClass::Recloser,
        SwitchClass::Fuse,
        SwitchClass::Sectionaliser,
        SwitchClass::Disconnector,
        SwitchClass::Jumper,
        SwitchClass::Switch,
        SwitchClass::Cut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchClass::Breaker => "Breaker",
            SwitchClass::LoadBreakSwitch => "LoadBreakSwitch",
            SwitchClass::Recloser => "Recloser",
            SwitchClass::Fuse => "Fuse",
            SwitchClass::Sectionaliser => "Sectionaliser",
            SwitchClass::Disconnector => "Disconnector",
            SwitchClass::Jumper => "Jumper",
            SwitchClass::Switch => "Switch",
            SwitchClass::Cut => "Cut",
        }
    }
}

impl FromStr for SwitchClass {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        SwitchClass::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| ModelError::invalid_argument("switch class", s))
    }
}

/// Phase pairing of one switch pole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchPhase {
    pub phase_side1: SinglePhaseKind,
    pub phase_side2: SinglePhaseKind,
}

impl SwitchPhase {
    /// Phase seen from the terminal with the given sequence number
    pub fn side(&self, sequence_number: u32) -> SinglePhaseKind {
        if sequence_number == 2 {
            self.phase_side2
        } else {
            self.phase_side1
        }
    }
}

/// Kind of unit behind a power electronics connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerElectronicsUnitKind {
    Photovoltaic,
    Battery,
    Wind,
}

/// Balanced transformer winding end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerTransformerEnd {
    pub name: String,
    pub terminal: TerminalId,
    pub has_tap_changer: bool,
}

/// Single-phase (or unbalanced) transformer tank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerTank {
    pub name: String,
    pub ends: Vec<TransformerTankEnd>,
}

/// Winding end of a transformer tank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerTankEnd {
    pub name: String,
    pub terminal: TerminalId,
    pub phases: PhaseCode,
    pub ordered_phases: Option<OrderedPhaseCode>,
    pub has_tap_changer: bool,
}

/// Tagged equipment variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipmentKind {
    AcLineSegment {
        phases: Vec<SinglePhaseKind>,
    },
    Switch {
        class: SwitchClass,
        phases: Vec<SwitchPhase>,
    },
    EnergyConsumer {
        phases: Vec<SinglePhaseKind>,
    },
    PowerElectronicsConnection {
        units: Vec<PowerElectronicsUnitKind>,
        phases: Vec<SinglePhaseKind>,
    },
    SynchronousMachine,
    PowerTransformer {
        ends: Vec<PowerTransformerEnd>,
        tanks: Vec<TransformerTank>,
    },
    LinearShuntCompensator {
        phases: Vec<SinglePhaseKind>,
    },
    /// Any class without a synthesis strategy
    Other {
        class: String,
    },
}

/// Discriminant of [`EquipmentKind`], used as the strategy dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentTag {
    AcLineSegment,
    Switch,
    EnergyConsumer,
    PowerElectronicsConnection,
    SynchronousMachine,
    PowerTransformer,
    LinearShuntCompensator,
    Cut,
    Other,
}

impl EquipmentKind {
    /// CIM class name of the variant
    pub fn class_name(&self) -> &str {
        match self {
            EquipmentKind::AcLineSegment { .. } => "ACLineSegment",
            EquipmentKind::Switch { class, .. } => class.as_str(),
            EquipmentKind::EnergyConsumer { .. } => "EnergyConsumer",
            EquipmentKind::PowerElectronicsConnection { .. } => "PowerElectronicsConnection",
            EquipmentKind::SynchronousMachine => "SynchronousMachine",
            EquipmentKind::PowerTransformer { .. } => "PowerTransformer",
            EquipmentKind::LinearShuntCompensator { .. } => "LinearShuntCompensator",
            EquipmentKind::Other { class } => class,
        }
    }

    pub fn tag(&self) -> EquipmentTag {
        match self {
            EquipmentKind::AcLineSegment { .. } => EquipmentTag::AcLineSegment,
            EquipmentKind::Switch {
                class: SwitchClass::Cut,
                ..
            } => EquipmentTag::Cut,
            EquipmentKind::Switch { .. } => EquipmentTag::Switch,
            EquipmentKind::EnergyConsumer { .. } => EquipmentTag::EnergyConsumer,
            EquipmentKind::PowerElectronicsConnection { .. } => {
                EquipmentTag::PowerElectronicsConnection
            },
            EquipmentKind::SynchronousMachine => EquipmentTag::SynchronousMachine,
            EquipmentKind::PowerTransformer { .. } => EquipmentTag::PowerTransformer,
            EquipmentKind::LinearShuntCompensator { .. } => EquipmentTag::LinearShuntCompensator,
            EquipmentKind::Other { .. } => EquipmentTag::Other,
        }
    }

    /// Consumers, shunts and inverters
    pub fn is_load_like(&self) -> bool {
        matches!(
            self,
            EquipmentKind::EnergyConsumer { .. }
                | EquipmentKind::LinearShuntCompensator { .. }
                | EquipmentKind::PowerElectronicsConnection { .. }
        )
    }

    /// Consumers and inverters
    pub fn is_consumer_or_inverter(&self) -> bool {
        matches!(
            self,
            EquipmentKind::EnergyConsumer { .. } | EquipmentKind::PowerElectronicsConnection { .. }
        )
    }

    pub fn is_transformer(&self) -> bool {
        matches!(self, EquipmentKind::PowerTransformer { .. })
    }

    /// Transformer with at least one regulating end
    pub fn has_tap_changer(&self) -> bool {
        match self {
            EquipmentKind::PowerTransformer { ends, tanks } => {
                ends.iter().any(|end| end.has_tap_changer)
                    || tanks
                        .iter()
                        .flat_map(|tank| tank.ends.iter())
                        .any(|end| end.has_tap_changer)
            },
            _ => false,
        }
    }
}

// ============================================================================
// Graph objects
// ============================================================================

/// Conducting equipment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equipment {
    pub mrid: String,
    pub name: String,
    pub kind: EquipmentKind,
    /// Terminals in document order
    pub terminals: Vec<TerminalId>,
    /// Identifiers of attached measurements
    pub measurements: Vec<Uuid>,
}

impl Equipment {
    pub fn class_name(&self) -> &str {
        self.kind.class_name()
    }
}

/// Equipment connection point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub mrid: String,
    pub name: String,
    /// 1-based position on the owning equipment
    pub sequence_number: u32,
    pub equipment: EquipmentId,
    pub node: Option<NodeId>,
    pub measurements: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityNode {
    pub mrid: String,
    pub name: String,
    pub terminals: Vec<TerminalId>,
}

/// Container classes relevant to identifier ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerClass {
    GeographicalRegion,
    SubGeographicalRegion,
    Substation,
    Feeder,
    Other,
}

impl ContainerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerClass::GeographicalRegion => "GeographicalRegion",
            ContainerClass::SubGeographicalRegion => "SubGeographicalRegion",
            ContainerClass::Substation => "Substation",
            ContainerClass::Feeder => "Feeder",
            ContainerClass::Other => "Other",
        }
    }

    /// Regions and substations are shared between models and keep their mRID
    pub fn is_shared(&self) -> bool {
        matches!(
            self,
            ContainerClass::GeographicalRegion
                | ContainerClass::SubGeographicalRegion
                | ContainerClass::Substation
        )
    }
}

impl fmt::Display for ContainerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub mrid: String,
    pub name: String,
    pub class: ContainerClass,
}
