//! CIM Measurements - Measurement Synthesis Engine
//!
//! Instruments a power-network graph with Analog and Discrete measurement
//! points:
//! - Synthesis strategies per equipment variant
//! - Deterministic, persisted identifier assignment
//! - Duplicate and erroneous measurement detection
//! - Catalog of the resulting measurements
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Coordinator │────▶│  Synthesis   │────▶│ Equivalence  │
//! │ (per class) │     │ (strategies) │     │ (duplicates) │
//! └─────────────┘     └──────────────┘     └──────────────┘
//!        │                                        │
//!        ▼                                        ▼
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Registrar  │     │   Catalog    │◀────│   Mutator    │
//! │ (identity)  │     │  (summary)   │     │ (attach/det) │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

pub mod catalog;
mod context;
mod coordinator;
pub mod dedupe;
pub mod equivalence;
mod error;
pub mod identity;
pub mod mutator;
pub mod synthesis;
pub mod types;

// Re-export public API
pub use catalog::{catalog, Catalog, CatalogRow, TypeCount, TAP_CHANGER_CLASS};
pub use context::SchemaContext;
pub use coordinator::{RunCoordinator, RunOptions, DEFAULT_CLASS_ORDER};
pub use dedupe::dedupe_identifiers;
pub use equivalence::{cleanup_sweep, find_duplicate, is_erroneous, DuplicateMatch};
pub use error::{MeasurementError, Result};
pub use identity::{derive_identifier, IdentityRegistrar, MAX_DERIVATION_ATTEMPTS};
pub use synthesis::{propose, SynthesisStrategy};

// Re-export engine types for convenience
pub use types::{
    AttachOutcome, CandidateMeasurement, CleanupSummary, EquipmentFailure, ReassignedIdentifier,
    RunReport, UnhandledVariant,
};
