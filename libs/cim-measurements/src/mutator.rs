//! Graph Mutator
//!
//! The only place the engine inserts or removes measurements. Both
//! back-collections (equipment and terminal) are updated with the arena.

use crate::error::Result;
use crate::types::AttachOutcome;
use cim_model::{GraphModel, Measurement, ModelError};
use tracing::{debug, trace};
use uuid::Uuid;

/// Attach a measurement to its equipment and terminal
///
/// An identifier that already names a measurement is reported as
/// [`AttachOutcome::IdentifierInUse`]; the graph is left untouched.
pub fn attach(graph: &mut GraphModel, measurement: Measurement) -> Result<AttachOutcome> {
    let id = measurement.mrid;
    let name = measurement.name.clone();
    match graph.attach_measurement(measurement) {
        Ok(()) => {
            trace!("Attached {} ({})", name, id);
            Ok(AttachOutcome::Attached)
        },
        Err(ModelError::IdentifierInUse(_)) => {
            debug!("Identifier {} already in use, {} not attached", id, name);
            Ok(AttachOutcome::IdentifierInUse)
        },
        Err(e) => Err(e.into()),
    }
}

/// Remove a measurement; `false` when it was not present
pub fn detach(graph: &mut GraphModel, id: &Uuid) -> bool {
    graph.detach_measurement(id).is_some()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::error::MeasurementError;
    use cim_model::{
        EquipmentKind, MeasurementKind, MeasurementType, ModelInfo, ModelKind, PhaseCode,
    };

    fn setup() -> (GraphModel, Measurement) {
        let mut graph = GraphModel::new(ModelInfo {
            mrid: "F1".into(),
            name: "feeder".into(),
            kind: ModelKind::Feeder,
        });
        let machine = graph.add_equipment("G1", "gen1", EquipmentKind::SynchronousMachine);
        let terminal = graph.add_terminal(machine, "G1_T1", "gen1_T1", 1, None).unwrap();
        let measurement = Measurement {
            mrid: Uuid::from_u128(7),
            name: "SynchronousMachine_gen1_PNV_1_A".into(),
            kind: MeasurementKind::Analog,
            measurement_type: MeasurementType::Voltage,
            phases: PhaseCode::A,
            equipment: machine,
            terminal,
        };
        (graph, measurement)
    }

    #[test]
    fn test_attach_and_detach() {
        let (mut graph, measurement) = setup();
        let equipment = measurement.equipment;
        let terminal = measurement.terminal;

        assert_eq!(attach(&mut graph, measurement.clone()).unwrap(), AttachOutcome::Attached);
        assert_eq!(graph.equipment(equipment).measurements, vec![measurement.mrid]);
        assert_eq!(graph.terminal(terminal).measurements, vec![measurement.mrid]);

        assert!(detach(&mut graph, &measurement.mrid));
        assert!(graph.equipment(equipment).measurements.is_empty());
        assert!(graph.terminal(terminal).measurements.is_empty());
        assert!(!detach(&mut graph, &measurement.mrid));
    }

    #[test]
    fn test_identifier_in_use_is_an_outcome() {
        let (mut graph, measurement) = setup();
        attach(&mut graph, measurement.clone()).unwrap();

        let mut clash = measurement.clone();
        clash.name = "other".into();
        assert_eq!(attach(&mut graph, clash).unwrap(), AttachOutcome::IdentifierInUse);
        assert_eq!(graph.measurement_count(), 1);
        assert_eq!(graph.measurement(&measurement.mrid).unwrap().name, measurement.name);
    }

    #[test]
    fn test_foreign_terminal_is_an_error() {
        let (mut graph, measurement) = setup();
        let other = graph.add_equipment("G2", "gen2", EquipmentKind::SynchronousMachine);
        let mut misplaced = measurement;
        misplaced.equipment = other;
        assert!(matches!(
            attach(&mut graph, misplaced),
            Err(MeasurementError::Model(ModelError::Inconsistent(_)))
        ));
    }
}
