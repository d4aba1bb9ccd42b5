//! Console summaries and file exports

use anyhow::{anyhow, Result};
use cim_measurements::{Catalog, RunReport};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Exported graph path: the input file name under the output directory
pub fn export_path(output_dir: &Path, input: &Path) -> Result<PathBuf> {
    let file_name = input
        .file_name()
        .ok_or_else(|| anyhow!("{} has no file name", input.display()))?;
    Ok(output_dir.join(file_name))
}

pub fn print_report(report: &RunReport, exported: &Path) {
    println!();
    println!("{} {}", "Model".bold(), report.model_key.bright_blue().bold());
    println!(
        "  {:<22} {} analog, {} discrete",
        "created:",
        report.created_analog.to_string().green(),
        report.created_discrete.to_string().green()
    );
    println!(
        "  {:<22} {}",
        "rejected duplicates:",
        report.rejected_duplicates
    );
    println!(
        "  {:<22} {} erroneous, {} duplicate",
        "removed:", report.removed_erroneous, report.removed_duplicates
    );
    if report.skipped_instrumented > 0 {
        println!(
            "  {:<22} {}",
            "already instrumented:", report.skipped_instrumented
        );
    }
    for skipped in &report.unhandled {
        println!(
            "  {} no strategy for {} '{}'",
            "skipped".yellow(),
            skipped.class,
            skipped.name
        );
    }
    for failure in &report.failures {
        println!(
            "  {} {} '{}': {}",
            "failed".red(),
            failure.class,
            failure.name,
            failure.error.message
        );
    }
    for reassigned in &report.reassigned_identifiers {
        println!(
            "  {} {} '{}' {} -> {}",
            "reassigned".cyan(),
            reassigned.class,
            reassigned.name,
            reassigned.old,
            reassigned.new
        );
    }
    println!(
        "  {:<22} {} measurements",
        "total:",
        report.catalog.count.to_string().bold()
    );
    println!("  {:<22} {}", "exported:", exported.display());
}

pub fn print_catalog(model_key: &str, catalog: &Catalog) {
    println!("{} {}", "Model".bold(), model_key.bright_blue().bold());
    println!(
        "  {} measurements ({} analog, {} discrete)",
        catalog.count.to_string().bold(),
        catalog.analog,
        catalog.discrete
    );
    for row in catalog.rows() {
        println!(
            "  {:<5} {:<28} {}",
            row.measurement_type, row.class, row.count
        );
    }
}

/// One `model,type,class,count` row per catalog entry of every report
pub fn write_catalog_csv(path: &Path, reports: &[RunReport]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["model", "measurement_type", "class", "count"])?;
    for report in reports {
        for row in report.catalog.rows() {
            wtr.write_record([
                report.model_key.as_str(),
                row.measurement_type.as_str(),
                row.class.as_str(),
                row.count.to_string().as_str(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use cim_measurements::TypeCount;
    use std::collections::BTreeMap;

    fn report(model_key: &str) -> RunReport {
        let mut classes = BTreeMap::new();
        classes.insert("EnergyConsumer".to_string(), 3);
        classes.insert("ACLineSegment".to_string(), 6);
        let mut types = BTreeMap::new();
        types.insert("PNV".to_string(), TypeCount { count: 9, classes });

        let mut report = RunReport::new(model_key);
        report.catalog = Catalog {
            count: 9,
            analog: 9,
            discrete: 0,
            types,
        };
        report
    }

    #[test]
    fn test_export_path_keeps_file_name() {
        let path = export_path(Path::new("out"), Path::new("models/ieee13.yaml")).unwrap();
        assert_eq!(path, PathBuf::from("out/ieee13.yaml"));
        assert!(export_path(Path::new("out"), Path::new("/")).is_err());
    }

    #[test]
    fn test_catalog_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        write_catalog_csv(&path, &[report("F1"), report("F2")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "model,measurement_type,class,count");
        assert_eq!(lines[1], "F1,PNV,ACLineSegment,6");
        assert_eq!(lines[2], "F1,PNV,EnergyConsumer,3");
        assert_eq!(lines.len(), 5);
    }
}
