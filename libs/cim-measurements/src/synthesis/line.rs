//! ACLineSegment strategy

use super::{declared_or_default, terminals_of, Proposal, SynthesisStrategy, VOLTAGE_AND_POWER};
use crate::context::SchemaContext;
use crate::error::Result;
use crate::types::CandidateMeasurement;
use cim_model::{Equipment, EquipmentKind, GraphModel, PhaseCode};

/// Voltage and power at the sending end of a line
pub struct LineStrategy;

impl SynthesisStrategy for LineStrategy {
    fn analogs(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        let phases = match &equipment.kind {
            EquipmentKind::AcLineSegment { phases } => declared_or_default(phases),
            _ => return Ok(Vec::new()),
        };
        let terminals = terminals_of(graph, equipment);

        let mut proposal = Proposal::new(ctx, equipment);
        for phase in phases.into_iter().filter(|p| *p != PhaseCode::N) {
            for measurement_type in VOLTAGE_AND_POWER {
                for &(terminal, seq) in terminals.iter().filter(|(_, seq)| *seq == 1) {
                    proposal.push(measurement_type, phase, terminal, seq);
                }
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
    use cim_model::{MeasurementType, SinglePhaseKind};

    #[test]
    fn test_declared_phases_skip_neutral() {
        let mut graph = graph();
        let line = with_terminals(
            &mut graph,
            "l1",
            EquipmentKind::AcLineSegment {
                phases: vec![SinglePhaseKind::C, SinglePhaseKind::N],
            },
            2,
        );
        let candidates = LineStrategy
            .analogs(&SchemaContext::default(), &graph, graph.equipment(line))
            .unwrap();

        assert_eq!(
            candidates.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["ACLineSegment_l1_PNV_1_C", "ACLineSegment_l1_VA_1_C"]
        );
    }

    #[test]
    fn test_default_phases_at_sending_end_only() {
        let mut graph = graph();
        let line = with_terminals(
            &mut graph,
            "l2",
            EquipmentKind::AcLineSegment { phases: vec![] },
            2,
        );
        let candidates = LineStrategy
            .analogs(&SchemaContext::default(), &graph, graph.equipment(line))
            .unwrap();

        assert_eq!(candidates.len(), 6);
        assert_eq!(
            names_of(&candidates, MeasurementType::Voltage),
            vec!["ACLineSegment_l2_PNV_1_A", "ACLineSegment_l2_PNV_1_B", "ACLineSegment_l2_PNV_1_C"]
        );
        assert!(LineStrategy
            .discretes(&SchemaContext::default(), &graph, graph.equipment(line))
            .unwrap()
            .is_empty());
    }
}
