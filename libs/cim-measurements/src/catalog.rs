//! Cataloger
//!
//! Read-only summary of the measurements in a graph, grouped by measurement
//! type and then by the class of the owning equipment. Transformers with a
//! regulating end are reported under `RatioTapChanger`.

use cim_model::{GraphModel, MeasurementKind};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Reporting class for regulating transformers
pub const TAP_CHANGER_CLASS: &str = "RatioTapChanger";

/// Counts for one measurement type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub count: usize,
    /// reporting class -> count
    pub classes: BTreeMap<String, usize>,
}

/// Measurement counts of one graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub count: usize,
    pub analog: usize,
    pub discrete: usize,
    /// measurement type token -> counts
    pub types: BTreeMap<String, TypeCount>,
}

/// Row of the flat catalog export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub measurement_type: String,
    pub class: String,
    pub count: usize,
}

impl Catalog {
    /// `(type, class, count)` rows in key order
    pub fn rows(&self) -> Vec<CatalogRow> {
        self.types
            .iter()
            .flat_map(|(measurement_type, counts)| {
                counts.classes.iter().map(move |(class, count)| CatalogRow {
                    measurement_type: measurement_type.clone(),
                    class: class.clone(),
                    count: *count,
                })
            })
            .collect()
    }

    /// Count for one type and reporting class
    pub fn get(&self, measurement_type: &str, class: &str) -> usize {
        self.types
            .get(measurement_type)
            .and_then(|counts| counts.classes.get(class))
            .copied()
            .unwrap_or(0)
    }
}

/// Count every measurement in the graph
pub fn catalog(graph: &GraphModel) -> Catalog {
    let mut catalog = Catalog::default();
    for measurement in graph.measurements() {
        let equipment = graph.equipment(measurement.equipment);
        let class = if equipment.kind.has_tap_changer() {
            TAP_CHANGER_CLASS
        } else {
            equipment.class_name()
        };

        catalog.count += 1;
        match measurement.kind {
            MeasurementKind::Analog => catalog.analog += 1,
            MeasurementKind::Discrete => catalog.discrete += 1,
        }
        let counts = catalog
            .types
            .entry(measurement.measurement_type.as_str().to_string())
            .or_default();
        counts.count += 1;
        *counts.classes.entry(class.to_string()).or_insert(0) += 1;
    }
    catalog
}

/// Emit the catalog as a pretty JSON diagnostic
pub fn log_summary(model_key: &str, catalog: &Catalog) {
    match serde_json::to_string_pretty(catalog) {
        Ok(json) => info!("Measurements of {}: {}", model_key, json),
        Err(e) => info!(
            "Measurements of {}: {} (summary not serializable: {})",
            model_key, catalog.count, e
        ),
    }
}
