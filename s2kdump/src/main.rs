//! Dumps the model extracted from a `$2k` export into a JSON.

#![allow(clippy::needless_return)] // i'll never forgive rust for this

use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use log::{LevelFilter, error};
use s2k::model::Model;

#[derive(Parser)]
#[command(author, version)]
struct Cli {
  /// Write compact JSON instead of pretty-printing it.
  #[arg(short, long)]
  compact: bool,
  /// Output extra/debug info while parsing.
  #[arg(short, long)]
  verbose: bool,
  /// File path (set to "-" to read from standard input).
  file: PathBuf
}

fn main() -> io::Result<()> {
  let args = Cli::parse();
  let log_level = if args.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Warn
  };
  env_logger::builder().filter_level(log_level).init();
  let model = if args.file.as_os_str().eq_ignore_ascii_case("-") {
    let mut bytes = Vec::new();
    io::stdin().read_to_end(&mut bytes)?;
    Model::from_text(&String::from_utf8_lossy(&bytes))
  } else if args.file.is_file() {
    Model::from_file(&args.file)
  } else {
    error!("Provided path either does not exist or is not a file!");
    std::process::exit(1);
  };
  let mut out = BufWriter::new(io::stdout());
  if args.compact {
    serde_json::to_writer(&mut out, &model)?;
  } else {
    serde_json::to_writer_pretty(&mut out, &model)?;
  }
  writeln!(out)?;
  return Ok(());
}
