//! Switch family strategy (breakers, reclosers, fuses, ...)
//!
//! `Cut` shares the switch variant but has no dispatch entry.

use super::{terminals_of, Proposal, SynthesisStrategy};
use crate::context::SchemaContext;
use crate::error::Result;
use crate::types::CandidateMeasurement;
use cim_model::{
    Equipment, EquipmentKind, GraphModel, MeasurementType, PhaseCode, SwitchPhase, DEFAULT_PHASES,
};

const SWITCH_TYPES: [MeasurementType; 2] = [MeasurementType::Current, MeasurementType::Voltage];

/// Current at side 1, voltage at every side, position at side 1
pub struct SwitchStrategy;

/// Phase seen at a terminal: the pole's side for declared poles, else the
/// default phase itself
fn phase_at(pole: Option<&SwitchPhase>, default: PhaseCode, sequence_number: u32) -> PhaseCode {
    match pole {
        Some(pole) => pole.side(sequence_number).to_phase_code(),
        None => default,
    }
}

/// Declared poles, or one pseudo-pole per default phase
fn poles(equipment: &Equipment) -> Vec<(Option<&SwitchPhase>, PhaseCode)> {
    match &equipment.kind {
        EquipmentKind::Switch { phases, .. } if !phases.is_empty() => {
            phases.iter().map(|p| (Some(p), PhaseCode::None)).collect()
        },
        _ => DEFAULT_PHASES.iter().map(|p| (None, *p)).collect(),
    }
}

impl SynthesisStrategy for SwitchStrategy {
    fn analogs(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        let terminals = terminals_of(graph, equipment);
        let mut proposal = Proposal::new(ctx, equipment);

        for (pole, default) in poles(equipment) {
            for measurement_type in SWITCH_TYPES {
                for &(terminal, seq) in &terminals {
                    if measurement_type == MeasurementType::Current && seq != 1 {
                        continue;
                    }
                    proposal.push(measurement_type, phase_at(pole, default, seq), terminal, seq);
                }
            }
        }
        Ok(proposal.finish())
    }

    fn discretes(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        let terminals = terminals_of(graph, equipment);
        let mut proposal = Proposal::new(ctx, equipment);

        for (pole, default) in poles(equipment) {
            for &(terminal, seq) in terminals.iter().filter(|(_, seq)| *seq == 1) {
                proposal.push(
                    MeasurementType::Position,
                    phase_at(pole, default, seq),
                    terminal,
                    seq,
                );
            }
        }
        Ok(proposal.finish())
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::super::fixtures::{graph, names_of, with_terminals};
    use super::*;
    use cim_model::{MeasurementKind, SinglePhaseKind, SwitchClass};

    #[test]
    fn test_three_phase_breaker() {
        let mut graph = graph();
        let brk = with_terminals(
            &mut graph,
            "brk1",
            EquipmentKind::Switch {
                class: SwitchClass::Breaker,
                phases: vec![],
            },
            2,
        );
        let ctx = SchemaContext::default();
        let analogs = SwitchStrategy.analogs(&ctx, &graph, graph.equipment(brk)).unwrap();

        assert_eq!(
            names_of(&analogs, MeasurementType::Current),
            vec!["Breaker_brk1_A_1_A", "Breaker_brk1_A_1_B", "Breaker_brk1_A_1_C"]
        );
        assert_eq!(names_of(&analogs, MeasurementType::Voltage).len(), 6);
        assert!(names_of(&analogs, MeasurementType::Power).is_empty());

        let discretes = SwitchStrategy.discretes(&ctx, &graph, graph.equipment(brk)).unwrap();
        assert_eq!(
            discretes.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Breaker_brk1_Pos_1_A", "Breaker_brk1_Pos_1_B", "Breaker_brk1_Pos_1_C"]
        );
        assert!(discretes.iter().all(|c| c.kind == MeasurementKind::Discrete));
    }

    #[test]
    fn test_declared_poles_use_terminal_side() {
        let mut graph = graph();
        let fuse = with_terminals(
            &mut graph,
            "f1",
            EquipmentKind::Switch {
                class: SwitchClass::Fuse,
                phases: vec![SwitchPhase {
                    phase_side1: SinglePhaseKind::A,
                    phase_side2: SinglePhaseKind::S1,
                }],
            },
            2,
        );
        let ctx = SchemaContext::default();
        let analogs = SwitchStrategy.analogs(&ctx, &graph, graph.equipment(fuse)).unwrap();

        assert_eq!(
            analogs.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Fuse_f1_A_1_A", "Fuse_f1_PNV_1_A", "Fuse_f1_PNV_2_s1"]
        );
        assert_eq!(analogs[2].phases, PhaseCode::S1);
    }
}
