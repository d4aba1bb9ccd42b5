//! PowerTransformer strategy
//!
//! Tank ends (unbalanced banks) take their phases from the end's phase label;
//! winding ends (balanced transformers) are always three-phase. Regulating
//! ends also get tap position points named after their ratio tap changer.

use super::{terminals_of, Proposal, SynthesisStrategy, VOLTAGE_AND_POWER};
use crate::context::SchemaContext;
use crate::error::{MeasurementError, Result};
use crate::types::CandidateMeasurement;
use cim_model::{
    Equipment, EquipmentKind, GraphModel, MeasurementType, OrderedPhaseCode, PhaseCode,
    TerminalId, DEFAULT_PHASES,
};
use tracing::info;

/// Conductor letters a tank-end label may carry
const TANK_LETTERS: [(char, PhaseCode); 3] =
    [('A', PhaseCode::A), ('B', PhaseCode::B), ('C', PhaseCode::C)];

pub struct TransformerStrategy;

impl SynthesisStrategy for TransformerStrategy {
    fn analogs(
        &self,
        ctx: &SchemaContext,
        graph: &GraphModel,
        equipment: &Equipment,
    ) -> Result<Vec<CandidateMeasurement>> {
        let EquipmentKind::PowerTransformer { ends, tanks } = &equipment.kind else {
            return Ok(Vec::new());
        };
        let mut proposal = Proposal::new(ctx, equipment);

        for end in tanks.iter().flat_map(|tank| tank.ends.iter()) {
            let label = ctx.tank_end_phase_label(end);
            let seq = graph.terminal(end.terminal).sequence_number;
            for measurement_type in VOLTAGE_AND_POWER {
                if measurement_type == MeasurementType::Power && seq != 1 {
                    continue;
                }
                for (letter, phase) in TANK_LETTERS {
                    if label.contains(letter) {
                        proposal.push(measurement_type, phase, end.terminal, seq);
                    }
                }
            }
        }

        for end in ends {
            let seq = graph.terminal(end.terminal).sequence_number;
            for phase in DEFAULT_PHASES {
                for measurement_type in VOLTAGE_AND_POWER {
                    if measurement_type == MeasurementType::Power && seq != 1 {
                        continue;
                    }
                    proposal.push(measurement_type, phase, end.terminal, seq);
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
        let EquipmentKind::PowerTransformer { ends, tanks } = &equipment.kind else {
            return Ok(Vec::new());
        };
        let at_first_terminal = |terminal: TerminalId| {
            terminals_of(graph, equipment)
                .iter()
                .any(|&(t, seq)| t == terminal && seq == 1)
        };
        let mut proposal = Proposal::new(ctx, equipment);

        for end in ends
            .iter()
            .filter(|end| end.has_tap_changer && at_first_terminal(end.terminal))
        {
            let seq = graph.terminal(end.terminal).sequence_number;
            for phase in DEFAULT_PHASES {
                proposal.push_named(
                    tap_changer_name(equipment, seq, phase.as_str()),
                    MeasurementType::Position,
                    phase,
                    end.terminal,
                );
            }
        }

        for end in tanks
            .iter()
            .flat_map(|tank| tank.ends.iter())
            .filter(|end| end.has_tap_changer && at_first_terminal(end.terminal))
        {
            let seq = graph.terminal(end.terminal).sequence_number;
            let unusable = |reason: String| {
                MeasurementError::synthesis(
                    equipment.class_name(),
                    &equipment.name,
                    format!("tap changer end {} {}", end.name, reason),
                )
            };
            let label = match &end.ordered_phases {
                Some(ordered) => ordered.clone(),
                None => OrderedPhaseCode::parse(end.phases.as_str())
                    .map_err(|e| unusable(e.to_string()))?,
            };

            if !label.is_single_phase_wye() {
                info!(
                    "Non-wye regulator on {} '{}', end {} has phases {}",
                    equipment.class_name(),
                    equipment.name,
                    end.name,
                    label
                );
            }

            let phase: PhaseCode = label.without_neutral().parse().map_err(|_| {
                unusable(format!("phases '{}' do not reduce to a phase code", label))
            })?;
            proposal.push_named(
                tap_changer_name(equipment, seq, phase.as_str()),
                MeasurementType::Position,
                phase,
                end.terminal,
            );
        }

        Ok(proposal.finish())
    }
}

fn tap_changer_name(equipment: &Equipment, sequence_number: u32, phase: &str) -> String {
    format!(
        "RatioTapChanger_{}_Pos_{}_{}",
        equipment.name, sequence_number, phase
    )
}
