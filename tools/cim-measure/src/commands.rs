//! Subcommand implementations

use crate::output;
use anyhow::{Context, Result};
use cim_measurements::{catalog as count_measurements, IdentityRegistrar, RunCoordinator};
use cim_model::{DatabaseType, GraphDocument, GraphModel, MeasurementKind};
use colored::Colorize;
use common::{init_with_config, LogConfig, MeasureConfig};
use errors::CimError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Load and validate the configuration, then install logging
pub fn load_config(explicit: Option<&Path>, verbose: bool) -> Result<MeasureConfig> {
    let config = MeasureConfig::load(explicit).context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let log_config = LogConfig {
        level: if verbose {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        },
        log_dir: config.logging.dir.clone(),
        file_name: config.logging.file_name.clone(),
        enable_json: config.logging.json,
        console: config.logging.console,
        ..LogConfig::default()
    };
    init_with_config(&log_config).context("initializing logging")?;
    debug!("Configuration: {:?}", config);
    Ok(config)
}

fn load_graph(path: &Path) -> Result<GraphModel> {
    let document = GraphDocument::from_path(path)
        .with_context(|| format!("reading graph document {}", path.display()))?;
    let graph = document
        .into_graph()
        .with_context(|| format!("resolving graph document {}", path.display()))?;
    Ok(graph)
}

// ============================================================================
// run
// ============================================================================

pub fn run(config: &MeasureConfig, files: &[PathBuf], catalog_csv: Option<&Path>) -> Result<()> {
    let database: DatabaseType = config.database.parse().map_err(CimError::from)?;
    database.ensure_loadable().map_err(CimError::from)?;

    let mut graphs = files
        .iter()
        .map(|path| load_graph(path))
        .collect::<Result<Vec<_>>>()?;
    info!("Loaded {} graph document(s)", graphs.len());

    let coordinator = RunCoordinator::new(config.schema_context()?, config.run_options()?)
        .context("preparing run")?;
    let reports = coordinator
        .run_models(&mut graphs, &config.identity_file)
        .context("synthesizing measurements")?;

    for ((path, graph), report) in files.iter().zip(&graphs).zip(&reports) {
        let target = output::export_path(&config.output_dir, path)?;
        GraphDocument::from_graph(graph)
            .write_to(&target)
            .with_context(|| format!("exporting {}", target.display()))?;
        output::print_report(report, &target);
    }

    if let Some(csv_path) = catalog_csv {
        output::write_catalog_csv(csv_path, &reports)
            .with_context(|| format!("writing catalog {}", csv_path.display()))?;
        println!("{} {}", "Catalog written to".green(), csv_path.display());
    }

    println!(
        "{} {}",
        "Identity map:".bold(),
        config.identity_file.display()
    );
    Ok(())
}

// ============================================================================
// catalog
// ============================================================================

pub fn catalog(file: &Path, json: bool) -> Result<()> {
    let graph = load_graph(file)?;
    let catalog = count_measurements(&graph);
    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
    } else {
        output::print_catalog(graph.model_key(), &catalog);
    }
    Ok(())
}

// ============================================================================
// identify
// ============================================================================

fn parse_kind(class: &str) -> Result<MeasurementKind> {
    match class {
        "Analog" => Ok(MeasurementKind::Analog),
        "Discrete" => Ok(MeasurementKind::Discrete),
        other => Err(CimError::invalid_argument(
            "class",
            format!("'{}'. Valid values: Analog, Discrete", other),
        )
        .into()),
    }
}

/// The identity map is read but never written
pub fn identify(config: &MeasureConfig, model: &str, class: &str, name: &str) -> Result<()> {
    let kind = parse_kind(class)?;
    let mut registrar = IdentityRegistrar::load(&config.identity_file)
        .context("loading identity map")?;

    let stored = registrar.lookup(model, kind.class_name(), name).is_some();
    let id = registrar.get_identifier(model, kind.class_name(), name)?;
    let source = if stored {
        "stored".green()
    } else {
        "new".yellow()
    };
    println!("{} ({})", id, source);
    Ok(())
}
