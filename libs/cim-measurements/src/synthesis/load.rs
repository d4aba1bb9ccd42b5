//! Consumers, shunt compensators and synchronous machines
//!
//! All three get voltage and power on every terminal; shunts also get a
//! position point per phase.

use super::{declared_or_default, terminals_of, Proposal, SynthesisStrategy, VOLTAGE_AND_POWER};
use crate::context::SchemaContext;
use crate::error::Result;
use crate::types::CandidateMeasurement;
use cim_model::{
    Equipment, EquipmentKind, GraphModel, MeasurementType, PhaseCode, DEFAULT_PHASES,
};

pub struct ConsumerStrategy;

pub struct ShuntStrategy;

/// Transmission-level machines are always three-phase
pub struct MachineStrategy;

/// PNV and VA per phase on every terminal
fn voltage_and_power(
    ctx: &SchemaContext,
    graph: &GraphModel,
    equipment: &Equipment,
    phases: Vec<PhaseCode>,
) -> Vec<CandidateMeasurement> {
    let terminals = terminals_of(graph, equipment);
    let mut proposal = Proposal::new(ctx, equipment);
    for phase in phases {
        for measurement_type in VOLTAGE_AND_POWER {
            for &(terminal, seq) in &terminals {
                proposal.push(measurement_type, phase, terminal, seq);
            }
        }
    }
    proposal.finish()
}

impl SynthesisStrategy for ConsumerStrategy {
    fn analogs(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        let phases = match &equipment.kind {
            EquipmentKind::EnergyConsumer { phases } => declared_or_default(phases),
            _ => return Ok(Vec::new()),
        };
        Ok(voltage_and_power(ctx, graph, equipment, phases))
    }
}

impl SynthesisStrategy for ShuntStrategy {
    fn analogs(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        let phases = match &equipment.kind {
            EquipmentKind::LinearShuntCompensator { phases } => declared_or_default(phases),
            _ => return Ok(Vec::new()),
        };
        Ok(voltage_and_power(ctx, graph, equipment, phases))
    }

    fn discretes(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        let phases = match &equipment.kind {
            EquipmentKind::LinearShuntCompensator { phases } => declared_or_default(phases),
            _ => return Ok(Vec::new()),
        };
        let terminals = terminals_of(graph, equipment);
        let mut proposal = Proposal::new(ctx, equipment);
        for phase in phases {
            for &(terminal, seq) in &terminals {
                proposal.push(MeasurementType::Position, phase, terminal, seq);
            }
        }
        Ok(proposal.finish())
    }
}

impl SynthesisStrategy for MachineStrategy {
    fn analogs(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        Ok(voltage_and_power(ctx, graph, equipment, DEFAULT_PHASES.to_vec()))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::super::fixtures::{graph, names_of, with_terminals};
    use super::*;
    use cim_model::{MeasurementKind, SinglePhaseKind};

    #[test]
    fn test_three_phase_consumer_yields_six_analogs() {
        let mut graph = graph();
        let load = with_terminals(
            &mut graph,
            "load1",
            EquipmentKind::EnergyConsumer { phases: vec![] },
            1,
        );
        let ctx = SchemaContext::default();
        let analogs = ConsumerStrategy.analogs(&ctx, &graph, graph.equipment(load)).unwrap();

        assert_eq!(analogs.len(), 6);
        assert!(analogs.iter().all(|c| c.kind == MeasurementKind::Analog));
        assert_eq!(
            names_of(&analogs, MeasurementType::Power),
            vec![
                "EnergyConsumer_load1_VA_1_A",
                "EnergyConsumer_load1_VA_1_B",
                "EnergyConsumer_load1_VA_1_C"
            ]
        );
        assert!(ConsumerStrategy
            .discretes(&ctx, &graph, graph.equipment(load))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_split_phase_consumer() {
        let mut graph = graph();
        let load = with_terminals(
            &mut graph,
            "house",
            EquipmentKind::EnergyConsumer {
                phases: vec![SinglePhaseKind::S1, SinglePhaseKind::S2],
            },
            1,
        );
        let analogs = ConsumerStrategy
            .analogs(&SchemaContext::default(), &graph, graph.equipment(load))
            .unwrap();
        assert_eq!(
            names_of(&analogs, MeasurementType::Voltage),
            vec!["EnergyConsumer_house_PNV_1_s1", "EnergyConsumer_house_PNV_1_s2"]
        );
    }

    #[test]
    fn test_shunt_positions_on_every_terminal() {
        let mut graph = graph();
        let cap = with_terminals(
            &mut graph,
            "cap1",
            EquipmentKind::LinearShuntCompensator {
                phases: vec![SinglePhaseKind::A],
            },
            2,
        );
        let discretes = ShuntStrategy
            .discretes(&SchemaContext::default(), &graph, graph.equipment(cap))
            .unwrap();
        assert_eq!(
            discretes.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["LinearShuntCompensator_cap1_Pos_1_A", "LinearShuntCompensator_cap1_Pos_2_A"]
        );
    }

    #[test]
    fn test_machine_three_phase_on_every_terminal() {
        let mut graph = graph();
        let machine = with_terminals(&mut graph, "gen", EquipmentKind::SynchronousMachine, 2);
        let analogs = MachineStrategy
            .analogs(&SchemaContext::default(), &graph, graph.equipment(machine))
            .unwrap();
        assert_eq!(analogs.len(), 12);
        assert_eq!(analogs[0].name, "SynchronousMachine_gen_PNV_1_A");
        assert_eq!(analogs[1].name, "SynchronousMachine_gen_PNV_2_A");
    }
}
