//! Measurement points attached to equipment terminals

use crate::equipment::{EquipmentId, TerminalId};
use crate::types::{MeasurementKind, MeasurementType, PhaseCode};
use uuid::Uuid;

/// Analog or discrete telemetry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub mrid: Uuid,
    pub name: String,
    pub kind: MeasurementKind,
    pub measurement_type: MeasurementType,
    pub phases: PhaseCode,
    pub equipment: EquipmentId,
    pub terminal: TerminalId,
}

impl Measurement {
    pub fn is_analog(&self) -> bool {
        self.kind == MeasurementKind::Analog
    }

    pub fn is_discrete(&self) -> bool {
        self.kind == MeasurementKind::Discrete
    }
}
