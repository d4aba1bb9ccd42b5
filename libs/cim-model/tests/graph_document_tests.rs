//! Graph document integration tests
//!
//! Load bus-branch and feeder documents from disk and check that the graph
//! built from them survives an export round trip.

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable

use cim_model::{
    DatabaseType, EquipmentKind, GraphDocument, ModelError, ModelKind, PowerElectronicsUnitKind,
};
use serde_json::json;

fn bus_branch_document() -> GraphDocument {
    serde_json::from_value(json!({
        "model": { "mrid": "_BB14", "name": "ieee14", "kind": "busBranch" },
        "containers": [
            { "mrid": "SUB1", "name": "substation", "class": "Substation" }
        ],
        "connectivity_nodes": [
            { "mrid": "B1", "name": "bus1" },
            { "mrid": "B2", "name": "bus2" }
        ],
        "equipment": [
            {
                "mrid": "G1", "name": "gen1", "class": "SynchronousMachine",
                "terminals": [
                    { "mrid": "G1_T1", "name": "gen1_T1", "sequence_number": 1, "connectivity_node": "B1" }
                ]
            },
            {
                "mrid": "BAT1", "name": "bat1", "class": "PowerElectronicsConnection",
                "units": ["Battery"],
                "phases": ["A", "B", "C"],
                "terminals": [
                    { "mrid": "BAT1_T1", "name": "bat1_T1", "sequence_number": 1, "connectivity_node": "B2" }
                ]
            },
            {
                "mrid": "SC1", "name": "sc1", "class": "SeriesCompensator",
                "terminals": [
                    { "mrid": "SC1_T1", "name": "sc1_T1", "sequence_number": 1, "connectivity_node": "B1" },
                    { "mrid": "SC1_T2", "name": "sc1_T2", "sequence_number": 2, "connectivity_node": "B2" }
                ]
            }
        ],
        "discretes": [
            {
                "mrid": "1c7e9a52-0f4d-4b7a-8d3e-5a6b7c8d9e0f",
                "name": "SeriesCompensator_sc1_Pos_1_A",
                "measurement_type": "Pos",
                "phases": "A",
                "equipment": "SC1",
                "terminal": "SC1_T1"
            }
        ]
    }))
    .unwrap()
}

#[test]
fn test_bus_branch_document_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ieee14.yaml");
    bus_branch_document().write_to(&path).unwrap();

    let graph = GraphDocument::from_path(&path)
        .unwrap()
        .into_graph()
        .unwrap();
    assert_eq!(graph.model().kind, ModelKind::BusBranch);
    assert_eq!(graph.model_key(), "_BB14");
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.measurement_count(), 1);

    let bat = graph
        .equipment_by_name("PowerElectronicsConnection", "bat1")
        .unwrap();
    match &graph.equipment(bat).kind {
        EquipmentKind::PowerElectronicsConnection { units, phases } => {
            assert_eq!(units, &vec![PowerElectronicsUnitKind::Battery]);
            assert_eq!(phases.len(), 3);
        },
        other => panic!("unexpected kind {:?}", other),
    }

    let sc = graph.equipment_by_name("SeriesCompensator", "sc1").unwrap();
    assert!(matches!(
        graph.equipment(sc).kind,
        EquipmentKind::Other { .. }
    ));
    assert_eq!(graph.equipment(sc).measurements.len(), 1);
}

#[test]
fn test_export_round_trip_is_stable() {
    let graph = bus_branch_document().into_graph().unwrap();
    let first = GraphDocument::from_graph(&graph);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ieee14.json");
    first.write_to(&path).unwrap();
    let first_text = std::fs::read_to_string(&path).unwrap();

    let reloaded = GraphDocument::from_path(&path).unwrap().into_graph().unwrap();
    GraphDocument::from_graph(&reloaded).write_to(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), first_text);
}

#[test]
fn test_measurement_on_unknown_terminal_is_rejected() {
    let mut document = bus_branch_document();
    document.discretes[0].terminal = "SC1_T9".to_string();
    assert_eq!(
        document.into_graph().unwrap_err(),
        ModelError::reference("terminal", "SC1_T9")
    );
}

#[test]
fn test_duplicate_measurement_is_rejected() {
    let mut document = bus_branch_document();
    let mut copy = document.discretes[0].clone();
    copy.mrid = copy.mrid.to_uppercase();
    document.discretes.push(copy);
    assert!(matches!(
        document.into_graph(),
        Err(ModelError::DuplicateMrid {
            collection: "measurements",
            ..
        })
    ));
}

#[test]
fn test_repeated_equipment_name_is_rejected() {
    let mut document = bus_branch_document();
    let mut copy = document.equipment[0].clone();
    copy.mrid = "G2".to_string();
    copy.terminals[0].mrid = "G2_T1".to_string();
    document.equipment.push(copy);

    let err = document.into_graph().unwrap_err();
    assert!(matches!(err, ModelError::Validation(_)));
    assert!(err.to_string().contains("SynchronousMachine name 'gen1'"));

    // The same name under another class is a different measurement prefix
    let mut document = bus_branch_document();
    document.equipment[2].name = "gen1".to_string();
    let graph = document.into_graph().unwrap();
    assert!(graph.equipment_by_name("SeriesCompensator", "gen1").is_some());
}

#[test]
fn test_only_document_backends_load() {
    for token in ["json", "yaml"] {
        let database: DatabaseType = token.parse().unwrap();
        assert!(database.ensure_loadable().is_ok());
    }
    for token in ["Blazegraph", "GraphDB", "Neo4j", "xml"] {
        let database: DatabaseType = token.parse().unwrap();
        let err = database.ensure_loadable().unwrap_err();
        assert!(err.to_string().contains("no driver"));
    }
    assert!("Oracle".parse::<DatabaseType>().is_err());
}
