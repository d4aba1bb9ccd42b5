//! Equivalence Rules
//!
//! Decides when a proposed measurement duplicates one already in the graph,
//! and sweeps measurements that are wrong or redundant after synthesis.

use crate::mutator;
use crate::types::{CandidateMeasurement, CleanupSummary};
use cim_model::{
    EquipmentId, GraphModel, Measurement, MeasurementKind, MeasurementType, NodeId, PhaseCode,
    TerminalId,
};
use rustc_hash::FxHashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Which equivalence rule an existing measurement matched
#[derive(Debug, Clone, Copy)]
pub enum DuplicateMatch<'g> {
    /// Same kind, type, phase, equipment and terminal
    SameTerminal(&'g Measurement),
    /// Voltage of the same phase already taken on the connectivity node
    SharedNode(&'g Measurement),
}

impl<'g> DuplicateMatch<'g> {
    pub fn measurement(&self) -> &'g Measurement {
        match self {
            DuplicateMatch::SameTerminal(m) | DuplicateMatch::SharedNode(m) => m,
        }
    }

    pub fn is_node_level(&self) -> bool {
        matches!(self, DuplicateMatch::SharedNode(_))
    }
}

/// Existing measurement equivalent to a candidate, if any
///
/// Two measurements are equivalent when they share kind, type, phase,
/// equipment and terminal. Analog voltages are also unique per connectivity
/// node: a voltage on equipment that is not load-like duplicates any voltage
/// of the same phase on the same node, unless that one belongs to a consumer
/// or inverter.
pub fn find_duplicate<'g>(
    graph: &'g GraphModel,
    equipment: EquipmentId,
    candidate: &CandidateMeasurement,
) -> Option<DuplicateMatch<'g>> {
    let owner = graph.equipment(equipment);
    let same_terminal = owner
        .measurements
        .iter()
        .filter_map(|id| graph.measurement(id))
        .find(|m| {
            m.kind == candidate.kind
                && m.measurement_type == candidate.measurement_type
                && m.phases == candidate.phases
                && m.terminal == candidate.terminal
        });
    if let Some(existing) = same_terminal {
        return Some(DuplicateMatch::SameTerminal(existing));
    }

    if candidate.kind != MeasurementKind::Analog
        || candidate.measurement_type != MeasurementType::Voltage
        || owner.kind.is_load_like()
    {
        return None;
    }

    let node = graph.node_of(candidate.terminal)?;
    graph
        .measurements_at_node(node)
        .find(|m| {
            m.is_analog()
                && m.measurement_type == MeasurementType::Voltage
                && m.phases == candidate.phases
                && !graph.equipment(m.equipment).kind.is_consumer_or_inverter()
                && graph.share_node(m.terminal, candidate.terminal)
        })
        .map(DuplicateMatch::SharedNode)
}

/// Transformer current or power on a split secondary or away from the first
/// terminal
pub fn is_erroneous(graph: &GraphModel, measurement: &Measurement) -> bool {
    if !graph.equipment(measurement.equipment).kind.is_transformer() {
        return false;
    }
    if !matches!(
        measurement.measurement_type,
        MeasurementType::Current | MeasurementType::Power
    ) {
        return false;
    }
    measurement.phases.is_split_secondary()
        || graph.terminal(measurement.terminal).sequence_number != 1
}

/// Where a measurement sits for duplicate detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Location {
    Node(NodeId),
    Terminal(TerminalId),
}

type DuplicateKey = (MeasurementKind, MeasurementType, PhaseCode, EquipmentId, Location);

fn duplicate_key(graph: &GraphModel, measurement: &Measurement) -> DuplicateKey {
    let location = graph
        .node_of(measurement.terminal)
        .map(Location::Node)
        .unwrap_or(Location::Terminal(measurement.terminal));
    (
        measurement.kind,
        measurement.measurement_type,
        measurement.phases,
        measurement.equipment,
        location,
    )
}

/// Remove erroneous and duplicate measurements
///
/// Measurements are visited ordered by name, then identifier, so the first
/// of a duplicate group by that order survives.
pub fn cleanup_sweep(graph: &mut GraphModel) -> CleanupSummary {
    let mut ordered: Vec<&Measurement> = graph.measurements().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.mrid.cmp(&b.mrid)));

    let mut summary = CleanupSummary::default();
    let mut seen: FxHashSet<DuplicateKey> = FxHashSet::default();
    let mut erroneous: Vec<(Uuid, String)> = Vec::new();
    let mut duplicates: Vec<(Uuid, String)> = Vec::new();

    for measurement in ordered {
        if is_erroneous(graph, measurement) {
            erroneous.push((measurement.mrid, measurement.name.clone()));
        } else if !seen.insert(duplicate_key(graph, measurement)) {
            duplicates.push((measurement.mrid, measurement.name.clone()));
        }
    }

    for (id, name) in erroneous {
        if mutator::detach(graph, &id) {
            info!("Removed erroneous measurement {} ({})", name, id);
            summary.removed_erroneous.push(id);
        }
    }
    for (id, name) in duplicates {
        if mutator::detach(graph, &id) {
            info!("Removed duplicate measurement {} ({})", name, id);
            summary.removed_duplicates.push(id);
        }
    }

    debug!(
        "Cleanup removed {} erroneous and {} duplicate measurements",
        summary.removed_erroneous.len(),
        summary.removed_duplicates.len()
    );
    summary
}
