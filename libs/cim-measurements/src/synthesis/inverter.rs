//! PowerElectronicsConnection strategy

use super::{declared_or_default, terminals_of, Proposal, SynthesisStrategy, VOLTAGE_AND_POWER};
use crate::context::SchemaContext;
use crate::error::Result;
use crate::types::CandidateMeasurement;
use cim_model::{
    Equipment, EquipmentKind, GraphModel, MeasurementType, PhaseCode, PowerElectronicsUnitKind,
};
use tracing::warn;

/// Voltage and power per unit; batteries add a state-of-charge point
///
/// Each unit proposes its own set, so a connection with a PV and a battery
/// unit proposes the voltage and power points twice and the second set is
/// rejected as duplicates.
pub struct InverterStrategy;

impl SynthesisStrategy for InverterStrategy {
    fn analogs(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        let (units, phases) = match &equipment.kind {
            EquipmentKind::PowerElectronicsConnection { units, phases } => {
                (units, declared_or_default(phases))
            },
            _ => return Ok(Vec::new()),
        };
        let terminals = terminals_of(graph, equipment);
        let mut proposal = Proposal::new(ctx, equipment);

        for unit in units {
            if *unit == PowerElectronicsUnitKind::Wind {
                warn!(
                    "Wind unit on {} '{}' has no measurement rules, skipped",
                    equipment.class_name(),
                    equipment.name
                );
                continue;
            }

            for &phase in &phases {
                for measurement_type in VOLTAGE_AND_POWER {
                    for &(terminal, seq) in &terminals {
                        proposal.push(measurement_type, phase, terminal, seq);
                    }
                }
            }

            if *unit == PowerElectronicsUnitKind::Battery {
                // State of charge belongs to the unit, not a terminal: every
                // terminal yields the same name and only the first survives
                for &(terminal, _) in &terminals {
                    let name = format!("{}_{}_SoC", equipment.class_name(), equipment.name);
                    proposal.push_named(
                        name,
                        MeasurementType::StateOfCharge,
                        PhaseCode::None,
                        terminal,
                    );
                }
            }
        }
        Ok(proposal.finish())
    }
}
