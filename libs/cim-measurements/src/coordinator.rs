//! Run Coordinator
//!
//! Drives one synthesis pass over a model:
//!
//! ```text
//! reserve existing ids
//!   └─▶ per class (configured order)
//!         └─▶ per uninstrumented equipment (document order)
//!               propose ─▶ duplicate check ─▶ identify ─▶ attach
//!   └─▶ cleanup sweep ─▶ identifier dedupe ─▶ catalog
//! ```
//!
//! Loading and persisting the identity map wrap the pass in
//! [`RunCoordinator::run_models`].

use crate::catalog::{catalog, log_summary};
use crate::context::SchemaContext;
use crate::dedupe::dedupe_identifiers;
use crate::equivalence::{cleanup_sweep, find_duplicate};
use crate::error::{MeasurementError, Result};
use crate::identity::IdentityRegistrar;
use crate::mutator;
use crate::synthesis::propose;
use crate::types::{AttachOutcome, EquipmentFailure, RunReport, UnhandledVariant};
use cim_model::{EquipmentId, GraphModel, Measurement, SwitchClass};
use errors::{CimErrorTrait, ErrorInfo};
use rustc_hash::FxHashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Class processing order used when none is configured
pub const DEFAULT_CLASS_ORDER: [&str; 9] = [
    "LinearShuntCompensator",
    "EnergyConsumer",
    "SynchronousMachine",
    "PowerElectronicsConnection",
    "PowerTransformer",
    "ACLineSegment",
    "LoadBreakSwitch",
    "Breaker",
    "Recloser",
];

/// Classes that have a synthesis strategy
fn is_synthesized_class(class_name: &str) -> bool {
    matches!(
        class_name,
        "ACLineSegment"
            | "EnergyConsumer"
            | "PowerElectronicsConnection"
            | "SynchronousMachine"
            | "PowerTransformer"
            | "LinearShuntCompensator"
    ) || class_name
        .parse::<SwitchClass>()
        .is_ok_and(|class| class != SwitchClass::Cut)
}

/// Run-level options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Equipment classes to instrument, in processing order
    pub class_order: Vec<String>,
    /// Reassign repeated object identifiers after synthesis
    pub dedupe_identifiers: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            class_order: DEFAULT_CLASS_ORDER.iter().map(|c| c.to_string()).collect(),
            dedupe_identifiers: true,
        }
    }
}

impl RunOptions {
    pub fn validate(&self) -> Result<()> {
        if self.class_order.is_empty() {
            return Err(MeasurementError::invalid_argument(
                "class_order",
                "at least one equipment class is required",
            ));
        }
        let mut seen = FxHashSet::default();
        for class in &self.class_order {
            if class.is_empty() {
                return Err(MeasurementError::invalid_argument(
                    "class_order",
                    "class names cannot be empty",
                ));
            }
            if !seen.insert(class.as_str()) {
                return Err(MeasurementError::invalid_argument(
                    "class_order",
                    format!("class '{}' is listed more than once", class),
                ));
            }
        }
        Ok(())
    }
}

/// Synthesis driver for one schema context
#[derive(Debug, Clone)]
pub struct RunCoordinator {
    ctx: SchemaContext,
    options: RunOptions,
}

impl RunCoordinator {
    pub fn new(ctx: SchemaContext, options: RunOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { ctx, options })
    }

    pub fn context(&self) -> &SchemaContext {
        &self.ctx
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Instrument one model
    ///
    /// Per-equipment synthesis failures are recorded in the report; identity
    /// and graph consistency errors abort the run.
    pub fn run_model(
        &self,
        graph: &mut GraphModel,
        registrar: &mut IdentityRegistrar,
    ) -> Result<RunReport> {
        let model_key = graph.model_key().to_string();
        let mut report = RunReport::new(&model_key);
        info!("Creating measurements for model {}", model_key);

        let existing: Vec<_> = graph.measurements().map(|m| m.mrid).collect();
        for id in existing {
            registrar.reserve(id);
        }

        for class_name in &self.options.class_order {
            if !is_synthesized_class(class_name) {
                warn!("No synthesis strategy for class {}", class_name);
            }
            let equipment: Vec<EquipmentId> = graph.equipment_of_class(class_name).collect();
            debug!("{} {} equipment to visit", equipment.len(), class_name);
            for id in equipment {
                self.instrument(graph, registrar, id, &mut report)?;
            }
        }

        let cleanup = cleanup_sweep(graph);
        report.removed_erroneous = cleanup.removed_erroneous.len();
        report.removed_duplicates = cleanup.removed_duplicates.len();

        if self.options.dedupe_identifiers {
            report.reassigned_identifiers = dedupe_identifiers(graph, registrar)?;
        }

        report.catalog = catalog(graph);
        log_summary(&model_key, &report.catalog);
        info!(
            "Finished model {}: {} created, {} rejected, {} removed",
            model_key,
            report.created(),
            report.rejected_duplicates,
            report.removed_erroneous + report.removed_duplicates
        );
        Ok(report)
    }

    /// Load the identity map, instrument every model in turn and persist
    /// the map after each one
    pub fn run_models(
        &self,
        graphs: &mut [GraphModel],
        identity_path: &Path,
    ) -> Result<Vec<RunReport>> {
        let mut registrar = IdentityRegistrar::load(identity_path)?;
        let mut reports = Vec::with_capacity(graphs.len());
        for graph in graphs.iter_mut() {
            reports.push(self.run_model(graph, &mut registrar)?);
            registrar.persist(identity_path)?;
        }
        Ok(reports)
    }

    fn instrument(
        &self,
        graph: &mut GraphModel,
        registrar: &mut IdentityRegistrar,
        id: EquipmentId,
        report: &mut RunReport,
    ) -> Result<()> {
        let equipment = graph.equipment(id);
        let class = equipment.class_name().to_string();
        let name = equipment.name.clone();
        if !equipment.measurements.is_empty() {
            debug!("{} '{}' already instrumented", class, name);
            report.skipped_instrumented += 1;
            return Ok(());
        }

        let candidates = match propose(&self.ctx, graph, id) {
            Ok(candidates) => candidates,
            Err(MeasurementError::UnhandledEquipmentVariant { class, name }) => {
                warn!("No synthesis strategy for {} '{}', skipped", class, name);
                report.unhandled.push(UnhandledVariant { class, name });
                return Ok(());
            },
            Err(e) if !e.is_fatal() => {
                warn!("{}, skipped", e);
                report.failures.push(EquipmentFailure {
                    class,
                    name,
                    error: ErrorInfo::from_error(&e),
                });
                return Ok(());
            },
            Err(e) => return Err(e),
        };

        let model_key = graph.model_key().to_string();
        for candidate in candidates {
            if let Some(found) = find_duplicate(graph, id, &candidate) {
                let existing = found.measurement();
                if found.is_node_level() {
                    info!(
                        "Node-level duplicate voltage {} on {} '{}', node already measured by {} ({})",
                        candidate.name, class, name, existing.name, existing.mrid
                    );
                } else {
                    info!(
                        "Duplicate or redundant measurement {} on {} '{}', matches {} ({})",
                        candidate.name, class, name, existing.name, existing.mrid
                    );
                }
                report.rejected_duplicates += 1;
                continue;
            }

            let mrid =
                registrar.get_identifier(&model_key, candidate.kind.class_name(), &candidate.name)?;
            let measurement = Measurement {
                mrid,
                name: candidate.stored_name().to_string(),
                kind: candidate.kind,
                measurement_type: candidate.measurement_type,
                phases: candidate.phases,
                equipment: id,
                terminal: candidate.terminal,
            };
            match mutator::attach(graph, measurement)? {
                AttachOutcome::Attached => report.record_created(candidate.kind),
                AttachOutcome::IdentifierInUse => {
                    info!(
                        "Measurement {} on {} '{}' resolves to identifier {} already in the graph",
                        candidate.name, class, name, mrid
                    );
                    report.rejected_duplicates += 1;
                },
            }
        }
        Ok(())
    }
}
