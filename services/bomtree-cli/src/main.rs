//! bomtree CLI
//!
//! Resolve a folder or workbook of BOM tables and print the tree, a DOT graph,
//! aggregated quantities, the purchase summary or the diagnostics.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use bomtree_utils::{init_logging, AppConfig, BomError, BomLoader, ErrorReport, FlattenOptions};
use clap::{Parser, ValueEnum};
use tracing::info;

mod render;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Folder of table files, or a single workbook
    source: PathBuf,

    /// What to produce
    #[clap(value_enum, default_value_t = Action::Tree)]
    action: Action,

    /// Start from this assembly or part instead of the root
    #[clap(long)]
    node: Option<String>,

    /// Write to this file instead of stdout
    #[clap(long, short)]
    output: Option<PathBuf>,

    /// JSON instead of text or CSV
    #[clap(long)]
    json: bool,

    /// Configuration file layered over the defaults
    #[clap(long)]
    config: Option<PathBuf>,

    /// Name of the master parts list file (without extension)
    #[clap(long)]
    parts_file: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    /// Indented tree
    Tree,
    /// Graphviz DOT graph
    Dot,
    /// Total quantity of every part
    Aggregate,
    /// Aggregated parts joined with the catalog, with purchase figures
    Summary,
    /// List diagnostics only
    Check,
}

fn main() {
    let args = Args::parse();
    let json = args.json;

    if let Err(err) = run(args) {
        let report = json.then(|| serde_json::to_string(&error_report(&err)));
        match report {
            Some(Ok(report)) => eprintln!("{}", report),
            _ => eprintln!("Error: {:#}", err),
        }
        let code = err.downcast_ref::<BomError>().map_or(1, BomError::exit_code);
        std::process::exit(code);
    }
}

/// Machine-readable failure; errors from outside the BOM pipeline get a generic code.
fn error_report(err: &anyhow::Error) -> ErrorReport {
    match err.downcast_ref::<BomError>() {
        Some(bom_error) => {
            let mut report = ErrorReport::from(bom_error);
            report.error = format!("{:#}", err);
            report
        }
        None => ErrorReport {
            error: format!("{:#}", err),
            code: "ERROR".to_string(),
            details: None,
        },
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(Some(path.as_path()))
            .map_err(|e| BomError::configuration(e.to_string()))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            eprintln!("Failed to load configuration ({}), using defaults", e);
            AppConfig::default()
        }),
    };
    if let Some(parts_file) = args.parts_file {
        config.bom.parts_file_name = parts_file;
    }

    init_logging(&config.logging)?;
    info!(source = %args.source.display(), action = ?args.action, "Starting bomtree");

    let tree = BomLoader::new(config.bom.clone())
        .load(&args.source)?
        .resolve()?;
    let start = match &args.node {
        Some(identifier) => tree.require(identifier)?,
        None => tree.root(),
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    match args.action {
        Action::Tree => render::write_tree(&tree, start, &mut out)?,
        Action::Dot => render::write_dot(&tree, start, &mut out)?,
        Action::Aggregate => {
            let totals = tree.aggregate(start);
            if args.json {
                serde_json::to_writer_pretty(&mut out, &totals)?;
                writeln!(out)?;
            } else {
                render::write_totals_csv(&totals, &mut out)?;
            }
        }
        Action::Summary => {
            let table = tree.flatten(start, &FlattenOptions::from(&config.bom));
            if args.json {
                serde_json::to_writer_pretty(&mut out, &table)?;
                writeln!(out)?;
            } else {
                render::write_summary_csv(&table, &mut out)?;
            }
        }
        Action::Check => {
            if args.json {
                serde_json::to_writer_pretty(&mut out, tree.diagnostics())?;
                writeln!(out)?;
            } else {
                render::write_diagnostics(tree.diagnostics(), &mut out)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}
