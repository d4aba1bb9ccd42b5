//! Engine data types: candidates, outcomes and run reports

use crate::catalog::Catalog;
use cim_model::{MeasurementKind, MeasurementType, PhaseCode, TerminalId};
use errors::ErrorInfo;
use serde::Serialize;
use uuid::Uuid;

/// Measurement proposed by a synthesis strategy, before naming and identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMeasurement {
    pub kind: MeasurementKind,
    pub measurement_type: MeasurementType,
    pub phases: PhaseCode,
    pub terminal: TerminalId,
    /// Structural name, also the identity seed
    pub name: String,
    /// Configured display override for the stored name
    pub display_name: Option<String>,
}

impl CandidateMeasurement {
    /// Name stored on the measurement
    pub fn stored_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Result of offering a measurement to the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    /// The identifier already names a measurement in the graph
    IdentifierInUse,
}

/// Equipment skipped because no strategy handles its variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnhandledVariant {
    pub class: String,
    pub name: String,
}

/// Equipment whose synthesis failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipmentFailure {
    pub class: String,
    pub name: String,
    pub error: ErrorInfo,
}

/// Object whose duplicated mRID was replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReassignedIdentifier {
    pub class: String,
    pub name: String,
    pub old: String,
    pub new: String,
}

/// Measurements removed by the cleanup sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub removed_erroneous: Vec<Uuid>,
    pub removed_duplicates: Vec<Uuid>,
}

/// Outcome of one model run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub model_key: String,
    pub created_analog: usize,
    pub created_discrete: usize,
    /// Candidates rejected by the duplicate check or an identifier clash
    pub rejected_duplicates: usize,
    pub removed_erroneous: usize,
    pub removed_duplicates: usize,
    /// Equipment skipped because it already carried measurements
    pub skipped_instrumented: usize,
    pub unhandled: Vec<UnhandledVariant>,
    pub failures: Vec<EquipmentFailure>,
    pub reassigned_identifiers: Vec<ReassignedIdentifier>,
    pub catalog: Catalog,
}

impl RunReport {
    pub fn new(model_key: impl Into<String>) -> Self {
        Self {
            model_key: model_key.into(),
            ..Default::default()
        }
    }

    pub fn created(&self) -> usize {
        self.created_analog + self.created_discrete
    }

    pub fn record_created(&mut self, kind: MeasurementKind) {
        match kind {
            MeasurementKind::Analog => self.created_analog += 1,
            MeasurementKind::Discrete => self.created_discrete += 1,
        }
    }
}
