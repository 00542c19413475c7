//! Dumps information on a `$2k` export, such as where its sections are and how
//! many entities could be extracted from it.

#![allow(clippy::needless_return)] // i'll never forgive rust for this

use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use log::{LevelFilter, info, error};
use s2k::prelude::*;

#[derive(Parser)]
#[command(author, version)]
struct Cli {
  /// Also send the model into an in-memory target and report what happened.
  #[arg(short = 'n', long)]
  dry_run: bool,
  /// Length unit for the dry run.
  #[arg(short, long, value_enum, default_value_t = LengthUnit::Meter)]
  length: LengthUnit,
  /// Force unit for the dry run.
  #[arg(short, long, value_enum, default_value_t = ForceUnit::KiloNewton)]
  force: ForceUnit,
  /// Output extra/debug info while parsing.
  #[arg(short, long)]
  verbose: bool,
  /// File path (set to "-" to read from standard input).
  file: PathBuf
}

const INDENT: &str = "  ";

fn main() -> io::Result<()> {
  // init cli stuff
  let args = Cli::parse();
  let log_level = if args.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };
  env_logger::builder().filter_level(log_level).init();
  // parse the file
  let mut model: Model = if args.file.as_os_str().eq_ignore_ascii_case("-") {
    let mut bytes = Vec::new();
    io::stdin().read_to_end(&mut bytes)?;
    Model::from_text(&String::from_utf8_lossy(&bytes))
  } else if args.file.is_file() {
    if let Some(bn) = args.file.file_name() {
      if let Some(sbn) = bn.to_str() {
        info!("Parsing {}...", sbn);
      }
    } else {
      info!("Parsing...");
    }
    Model::from_file(&args.file)
  } else {
    error!("Provided path either does not exist or is not a file!");
    std::process::exit(1);
  };
  info!("Done parsing.");
  // print section info
  if model.sections.is_empty() {
    info!("No known sections were found.");
  } else {
    info!("Sections found:");
    for (label, line) in model.sections.found() {
      info!("{}- Line {}: {}", INDENT, line, label);
    }
  }
  // print entity info
  info!("Extracted:");
  info!("{}- {} joints", INDENT, model.nodes.len());
  for kind in ConnectivityKind::all() {
    info!(
      "{}- {} {}s",
      INDENT,
      model.connectivity(*kind).len(),
      kind.small_name()
    );
  }
  info!("{}- {} joint restraints", INDENT, model.restraints.len());
  // dry run
  if args.dry_run {
    let units = ModelUnits { length: args.length, force: args.force };
    info!("Dry run into an empty model ({})...", units);
    let mut target = MemoryModel::new(units);
    let mut node_map = NodeIdMap::new();
    let report = transfer(&mut model, &mut target, &mut node_map);
    info!("{}- {} nodes created", INDENT, report.nodes);
    info!("{}- {} members created", INDENT, report.members);
    info!(
      "{}- {} support types assigned to {} nodes",
      INDENT,
      report.support_kinds,
      report.supports
    );
    if report.unmapped_members > 0 || report.unmapped_restraints > 0 {
      info!(
        "{}- skipped {} members and {} restraints on unknown joints",
        INDENT,
        report.unmapped_members,
        report.unmapped_restraints
      );
    }
    if report.failures > 0 {
      info!("{}- {} operations failed", INDENT, report.failures);
    }
  }
  return Ok(());
}
