//! Measurement Synthesizer
//!
//! One strategy per equipment variant proposes the measurement points the
//! equipment should carry. Strategies are looked up by [`EquipmentTag`] in a
//! static dispatch table; supporting a new variant is a table entry plus a
//! strategy type.
//!
//! ```text
//! EquipmentKind ──tag()──▶ STRATEGIES ──▶ analogs() + discretes()
//!                                            │
//!                                            ▼
//!                                 Vec<CandidateMeasurement>
//! ```

mod inverter;
mod line;
mod load;
mod switch;
mod transformer;

use crate::context::SchemaContext;
use crate::error::{MeasurementError, Result};
use crate::types::CandidateMeasurement;
use cim_model::{
    Equipment, EquipmentId, EquipmentTag, GraphModel, MeasurementType, PhaseCode,
    SinglePhaseKind, TerminalId, DEFAULT_PHASES,
};

pub use inverter::InverterStrategy;
pub use line::LineStrategy;
pub use load::{ConsumerStrategy, MachineStrategy, ShuntStrategy};
pub use switch::SwitchStrategy;
pub use transformer::TransformerStrategy;

/// Proposes measurement points for one equipment variant
pub trait SynthesisStrategy {
    /// Analog candidates
    fn analogs(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>>;

    /// Discrete candidates (none unless the variant has positions)
    fn discretes(
        &self,
        _ctx: &SchemaContext,
        _graph: &GraphModel,
        _equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        Ok(Vec::new())
    }
}

/// Dispatch table; `Cut` and `Other` have no entry
static STRATEGIES: &[(EquipmentTag, &(dyn SynthesisStrategy + Sync))] = &[
    (EquipmentTag::AcLineSegment, &LineStrategy),
    (EquipmentTag::Switch, &SwitchStrategy),
    (EquipmentTag::EnergyConsumer, &ConsumerStrategy),
    (EquipmentTag::PowerElectronicsConnection, &InverterStrategy),
    (EquipmentTag::SynchronousMachine, &MachineStrategy),
    (EquipmentTag::PowerTransformer, &TransformerStrategy),
    (EquipmentTag::LinearShuntCompensator, &ShuntStrategy),
];

pub fn strategy_for(tag: EquipmentTag) -> Option<&'static (dyn SynthesisStrategy + Sync)> {
    STRATEGIES
        .iter()
        .find(|(entry, _)| *entry == tag)
        .map(|(_, strategy)| *strategy)
}

/// All candidates for one equipment, analogs first
pub fn propose(
    ctx: &SchemaContext,
    graph: &GraphModel,
    equipment: EquipmentId,
) -> Result<Vec<CandidateMeasurement>> {
    let equipment = graph.equipment(equipment);
    let strategy = strategy_for(equipment.kind.tag()).ok_or_else(|| {
        MeasurementError::UnhandledEquipmentVariant {
            class: equipment.class_name().to_string(),
            name: equipment.name.clone(),
        }
    })?;

    let mut candidates = strategy.analogs(ctx, graph, equipment)?;
    candidates.extend(strategy.discretes(ctx, graph, equipment)?);
    Ok(candidates)
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Types synthesized for everything except switches
pub(crate) const VOLTAGE_AND_POWER: [MeasurementType; 2] =
    [MeasurementType::Voltage, MeasurementType::Power];

/// Declared phases, or A, B, C when none are declared
pub(crate) fn declared_or_default(phases: &[SinglePhaseKind]) -> Vec<PhaseCode> {
    if phases.is_empty() {
        DEFAULT_PHASES.to_vec()
    } else {
        phases.iter().map(|p| p.to_phase_code()).collect()
    }
}

/// Terminals of an equipment with their sequence numbers
pub(crate) fn terminals_of(graph: &GraphModel, equipment: &Equipment) -> Vec<(TerminalId, u32)> {
    equipment
        .terminals
        .iter()
        .map(|&t| (t, graph.terminal(t).sequence_number))
        .collect()
}

/// Candidate collector that applies the naming convention
pub(crate) struct Proposal<'a> {
    ctx: &'a SchemaContext,
    equipment: &'a Equipment,
    candidates: Vec<CandidateMeasurement>,
}

impl<'a> Proposal<'a> {
    pub(crate) fn new(ctx: &'a SchemaContext, equipment: &'a Equipment) -> Self {
        Self {
            ctx,
            equipment,
            candidates: Vec::new(),
        }
    }

    /// `{Class}_{Equipment}_{type}_{seq}_{phase}`
    pub(crate) fn push(
        &mut self,
        measurement_type: MeasurementType,
        phases: PhaseCode,
        terminal: TerminalId,
        sequence_number: u32,
    ) {
        let name = format!(
            "{}_{}_{}_{}_{}",
            self.equipment.class_name(),
            self.equipment.name,
            measurement_type,
            sequence_number,
            phases
        );
        self.push_named(name, measurement_type, phases, terminal);
    }

    pub(crate) fn push_named(
        &mut self,
        name: String,
        measurement_type: MeasurementType,
        phases: PhaseCode,
        terminal: TerminalId,
    ) {
        let display_name = self.ctx.display_name(&name).map(str::to_string);
        self.candidates.push(CandidateMeasurement {
            kind: measurement_type.kind(),
            measurement_type,
            phases,
            terminal,
            name,
            display_name,
        });
    }

    pub(crate) fn finish(self) -> Vec<CandidateMeasurement> {
        self.candidates
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::CandidateMeasurement;
    use cim_model::{EquipmentId, EquipmentKind, GraphModel, MeasurementType, ModelInfo, ModelKind};

    /// Names of the candidates of one type, in proposal order
    pub fn names_of(candidates: &[CandidateMeasurement], measurement_type: MeasurementType) -> Vec<&str> {
        candidates
            .iter()
            .filter(|c| c.measurement_type == measurement_type)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn graph() -> GraphModel {
        GraphModel::new(ModelInfo {
            mrid: "F1".into(),
            name: "feeder".into(),
            kind: ModelKind::Feeder,
        })
    }

    /// Equipment with `terminals` unconnected terminals numbered from 1
    pub fn with_terminals(
        graph: &mut GraphModel,
        name: &str,
        kind: EquipmentKind,
        terminals: u32,
    ) -> EquipmentId {
        let id = graph.add_equipment(format!("{}_mrid", name), name, kind);
        for seq in 1..=terminals {
            graph
                .add_terminal(id, format!("{}_T{}", name, seq), format!("{}_T{}", name, seq), seq, None)
                .unwrap_or_else(|e| panic!("terminal: {}", e));
        }
        id
    }
}
