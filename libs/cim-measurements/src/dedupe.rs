//! Identifier de-duplication
//!
//! Graphs assembled from several sources can carry the same mRID on more
//! than one object. After synthesis every repeated identifier except the
//! first (in [`GraphModel::objects`] order) is replaced with a value derived
//! from the old one. Regions, subregions and substations are shared between
//! feeders and keep their identifiers.

use crate::error::Result;
use crate::identity::{derive_with_retry, IdentityRegistrar};
use crate::types::ReassignedIdentifier;
use cim_model::{parse_measurement_id, GraphModel, ObjectRef};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

/// Comparison key of an mRID; UUID spellings (case, leading `_`) collapse
fn identifier_key(mrid: &str) -> String {
    parse_measurement_id(mrid)
        .map(|id| id.to_string())
        .unwrap_or_else(|_| mrid.to_string())
}

/// Reassign every repeated mRID in the graph
///
/// Replacement measurement identifiers are rebound in the registrar so the
/// persisted map follows the graph.
pub fn dedupe_identifiers(
    graph: &mut GraphModel,
    registrar: &mut IdentityRegistrar,
) -> Result<Vec<ReassignedIdentifier>> {
    let objects = graph.objects();
    let mut known: FxHashSet<String> = objects
        .iter()
        .map(|(_, _, mrid)| identifier_key(mrid))
        .collect();
    let mut first_class: FxHashMap<String, String> = FxHashMap::default();
    let mut reassigned = Vec::new();

    for (object, class, mrid) in objects {
        let key = identifier_key(&mrid);
        let Some(original_class) = first_class.get(&key).cloned() else {
            first_class.insert(key, class);
            continue;
        };

        if let ObjectRef::Container(index) = object {
            if graph
                .containers()
                .get(index)
                .is_some_and(|c| c.class.is_shared())
            {
                debug!("Shared container {} keeps identifier {}", class, mrid);
                continue;
            }
        }

        let registrar_ref = &*registrar;
        let new_id = derive_with_retry(&mrid, |candidate| {
            known.contains(&candidate.to_string()) || registrar_ref.is_issued(candidate)
        })?;
        known.insert(new_id.to_string());

        let name = graph.object_name(object).unwrap_or_default().to_string();
        let new_mrid = match object {
            ObjectRef::Measurement(old) => {
                graph.rekey_measurement(&old, new_id)?;
                registrar.rebind(graph.model_key(), &old, new_id);
                new_id.to_string()
            },
            _ => {
                registrar.reserve(new_id);
                let upper = new_id.to_string().to_uppercase();
                graph.set_object_mrid(object, upper.clone())?;
                upper
            },
        };

        info!(
            "Duplicate identifier {} on {} '{}' (first used by {}), reassigned to {}",
            mrid, class, name, original_class, new_mrid
        );
        reassigned.push(ReassignedIdentifier {
            class,
            name,
            old: mrid,
            new: new_mrid,
        });
    }

    Ok(reassigned)
}

/// Whether any two non-shared objects still carry the same identifier
pub fn has_duplicate_identifiers(graph: &GraphModel) -> bool {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    graph.objects().into_iter().any(|(object, _, mrid)| {
        let shared = matches!(object, ObjectRef::Container(index)
            if graph.containers().get(index).is_some_and(|c| c.class.is_shared()));
        !seen.insert(identifier_key(&mrid)) && !shared
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use cim_model::{
        ContainerClass, EquipmentKind, Measurement, MeasurementKind, MeasurementType, ModelInfo,
        ModelKind, PhaseCode,
    };
    use uuid::Uuid;

    const SHARED: &str = "_A1B2C3D4-0000-4000-8000-000000000001";

    fn graph() -> GraphModel {
        GraphModel::new(ModelInfo {
            mrid: "F1".into(),
            name: "feeder".into(),
            kind: ModelKind::Feeder,
        })
    }

    #[test]
    fn test_repeated_mrid_is_reassigned() {
        let mut graph = graph();
        let first = graph.add_equipment(SHARED, "load1", EquipmentKind::EnergyConsumer { phases: vec![] });
        let second = graph.add_equipment(
            SHARED.to_lowercase(),
            "load2",
            EquipmentKind::EnergyConsumer { phases: vec![] },
        );
        let mut registrar = IdentityRegistrar::new();

        let reassigned = dedupe_identifiers(&mut graph, &mut registrar).unwrap();
        assert_eq!(reassigned.len(), 1);
        assert_eq!(reassigned[0].name, "load2");
        assert_eq!(reassigned[0].class, "EnergyConsumer");
        assert_eq!(graph.equipment(first).mrid, SHARED);

        let new_mrid = &graph.equipment(second).mrid;
        assert_eq!(new_mrid, &reassigned[0].new);
        assert_eq!(new_mrid, &new_mrid.to_uppercase());
        assert!(registrar.is_issued(&Uuid::parse_str(new_mrid).unwrap()));
        assert!(!has_duplicate_identifiers(&graph));
    }

    #[test]
    fn test_reassignment_is_deterministic() {
        let build = || {
            let mut graph = graph();
            graph.add_node("N1", "n1");
            graph.add_node("N1", "n2");
            graph
        };
        let mut a = build();
        let mut b = build();
        let ra = dedupe_identifiers(&mut a, &mut IdentityRegistrar::new()).unwrap();
        let rb = dedupe_identifiers(&mut b, &mut IdentityRegistrar::new()).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra[0].old, "N1");
    }

    #[test]
    fn test_shared_containers_keep_identifier() {
        let mut graph = graph();
        graph.add_container("R1", "region", ContainerClass::GeographicalRegion);
        graph.add_container("R1", "region", ContainerClass::GeographicalRegion);
        graph.add_container("S1", "sub", ContainerClass::Substation);
        graph.add_container("S1", "sub", ContainerClass::Substation);

        let reassigned = dedupe_identifiers(&mut graph, &mut IdentityRegistrar::new()).unwrap();
        assert!(reassigned.is_empty());
        assert!(!has_duplicate_identifiers(&graph));

        graph.add_container("S1", "feeder", ContainerClass::Feeder);
        assert!(has_duplicate_identifiers(&graph));
    }

    #[test]
    fn test_measurement_clash_rekeys_and_rebinds() {
        let mut graph = graph();
        let mut registrar = IdentityRegistrar::new();
        let id = registrar
            .get_identifier("F1", "Analog", "SynchronousMachine_gen1_PNV_1_A")
            .unwrap();

        // An equipment already uses the identifier the measurement received
        graph.add_equipment(id.to_string(), "gen0", EquipmentKind::SynchronousMachine);
        let machine = graph.add_equipment("G1", "gen1", EquipmentKind::SynchronousMachine);
        let terminal = graph.add_terminal(machine, "G1_T1", "gen1_T1", 1, None).unwrap();
        graph
            .attach_measurement(Measurement {
                mrid: id,
                name: "SynchronousMachine_gen1_PNV_1_A".into(),
                kind: MeasurementKind::Analog,
                measurement_type: MeasurementType::Voltage,
                phases: PhaseCode::A,
                equipment: machine,
                terminal,
            })
            .unwrap();

        let reassigned = dedupe_identifiers(&mut graph, &mut registrar).unwrap();
        assert_eq!(reassigned.len(), 1);
        assert_eq!(reassigned[0].class, "Analog");

        let new_id = Uuid::parse_str(&reassigned[0].new).unwrap();
        assert!(!graph.contains_measurement(&id));
        assert!(graph.contains_measurement(&new_id));
        assert_eq!(graph.equipment(machine).measurements, vec![new_id]);
        assert_eq!(
            registrar.lookup("F1", "Analog", "SynchronousMachine_gen1_PNV_1_A"),
            Some(new_id)
        );
    }
}
