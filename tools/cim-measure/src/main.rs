//! cim-measure - measurement synthesis for CIM distribution models
//!
//! Loads graph documents, adds the standard Analog and Discrete
//! measurements to every supported equipment class, and writes the
//! instrumented graphs back out next to a persisted identity map.

mod commands;
mod output;

use anyhow::Result;
use cim_measurements::MeasurementError;
use cim_model::ModelError;
use clap::{Parser, Subcommand};
use colored::Colorize;
use errors::{CimError, CimErrorTrait};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cim-measure")]
#[command(about = "Synthesize CIM measurements with stable identifiers")]
#[command(long_about = "Synthesize CIM measurements with stable identifiers

Commands:
  run       Instrument graph documents and export them
  catalog   Count the measurements of a graph document
  identify  Show the identifier a measurement key receives

Examples:
  cim-measure run models/ieee13.json              # Instrument one feeder
  cim-measure run a.json b.yaml --catalog-csv c.csv
  cim-measure catalog output/ieee13.json --json
  cim-measure identify --model F1 --class Analog --name EnergyConsumer_load1_PNV_1_A")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (default: config/cim-measure.{toml,yaml,json})
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Instrument graph documents and export them to the output directory
    Run {
        /// Graph documents (.json, .yaml or .yml), processed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also write the combined catalog as CSV
        #[arg(long = "catalog-csv")]
        catalog_csv: Option<PathBuf>,
    },

    /// Summarize the measurements of a graph document without changing it
    Catalog {
        /// Graph document
        file: PathBuf,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the identifier a measurement key would receive
    Identify {
        /// Model (feeder) mRID
        #[arg(long)]
        model: String,

        /// Measurement class: Analog or Discrete
        #[arg(long)]
        class: String,

        /// Structural measurement name
        #[arg(long)]
        name: String,
    },
}

/// Exit code of the deepest classified error in the chain
fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CimError>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<MeasurementError>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<ModelError>() {
            return e.exit_code();
        }
    }
    1
}

fn execute(cli: Cli) -> Result<()> {
    let config = commands::load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Run { files, catalog_csv } => {
            commands::run(&config, &files, catalog_csv.as_deref())
        },
        Commands::Catalog { file, json } => commands::catalog(&file, json),
        Commands::Identify { model, class, name } => {
            commands::identify(&config, &model, &class, &name)
        },
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = execute(cli) {
        eprintln!("{} {:#}", "ERROR".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}
