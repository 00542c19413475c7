//! This module implements the record decoders for the sections we extract, and
//! the driver that feeds them lines.
//!
//! Every decoder gets fed one line at a time, starting right after a section
//! header, until it says it's done. Lines that start a record but fail to
//! decode are skipped; nothing in here ever aborts a whole extraction.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, error, info, warn};

use crate::entities::*;
use crate::geometry::Dof;
use crate::util::*;

/// A start line of 1 means the section wasn't found. No header can sit on
/// line 0, so 1 is never a real "one past the header" line.
pub const SENTINEL_START: usize = 1;

/// What went wrong decoding a single record line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordDecodeError {
  /// The token after a label didn't parse.
  BadToken {
    /// The label.
    label: &'static str,
    /// The offending token.
    token: String
  }
}

impl Display for RecordDecodeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::BadToken { label, token } => write!(
        f,
        "bad value \"{}\" after \"{}\"",
        token,
        label
      )
    };
  }
}

impl Error for RecordDecodeError {}

/// A decoder might respond this when fed a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineResponse {
  /// The line produced a record.
  Data,
  /// The line was ignored (no record, but not an error either).
  Useless,
  /// The line looked like a record but couldn't be decoded.
  Skipped(RecordDecodeError),
  /// The section is over.
  Done
}

impl LineResponse {
  /// Returns true if the response should be reported.
  pub const fn abnormal(&self) -> bool {
    return matches!(self, Self::Skipped(_));
  }
}

/// All record decoders must implement this trait.
pub trait RecordDecoder {
  /// The type of record this decoder produces.
  type Record;

  /// A short name for the records, for log messages.
  fn name(&self) -> &'static str;

  /// Consumes a raw line (as read, no normalisation done).
  fn consume(&mut self, line: &str) -> LineResponse;

  /// Finishes up and returns the records.
  fn finish(self) -> Vec<Self::Record>;
}

/// Feeds a decoder with lines from a reader, starting at a (1-based) line.
/// Lines are decoded lossily, so only an I/O error cuts the run short.
pub fn run_decoder<R: BufRead, D: RecordDecoder>(
  reader: R,
  start_line: usize,
  mut decoder: D
) -> Vec<D::Record> {
  if start_line == SENTINEL_START {
    debug!("No {} section, nothing to extract.", decoder.name());
    return Vec::new();
  }
  for (i, line) in lossy_lines(reader).enumerate() {
    let lineno = i + 1;
    if lineno < start_line {
      // still fast-forwarding, but a read error here ends it all the same
      if let Err(e) = line {
        error!("Read error on line {}, stopping: {}", lineno, e);
        break;
      }
      continue;
    }
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        error!("Read error on line {}, stopping: {}", lineno, e);
        break;
      }
    };
    match decoder.consume(&line) {
      LineResponse::Done => {
        debug!("The {} section ended on line {}.", decoder.name(), lineno);
        break;
      },
      resp if resp.abnormal() => warn!(
        "Got abnormal response {:?} from the {} decoder on line {}: {}",
        resp,
        decoder.name(),
        lineno,
        line.trim()
      ),
      _ => {}
    }
  }
  let name = decoder.name();
  let records = decoder.finish();
  info!(
    "Extracted {} {} records starting from line {}.",
    records.len(),
    name,
    start_line
  );
  return records;
}

/// Opens a file for an extractor, logging a failure.
fn open_for(path: &Path, what: &str) -> Option<BufReader<File>> {
  return match File::open(path) {
    Ok(f) => Some(BufReader::new(f)),
    Err(e) => {
      error!(
        "Could not open {} for {} extraction: {}",
        path.display(),
        what,
        e
      );
      None
    }
  };
}

/// Decodes joint lines into nodes.
#[derive(Debug, Default)]
pub struct NodeDecoder {
  /// The nodes so far, in file order.
  nodes: Vec<Node>
}

impl NodeDecoder {
  /// Instantiates a new decoder.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Decodes a normalised line. Returns None if it has no usable ID.
  fn decode(line: &str) -> Result<Option<Node>, RecordDecodeError> {
    let id: SourceId = decode_field(line, "Joint=")?.unwrap_or(0);
    let x: f64 = decode_field(line, "XorR=")?.unwrap_or(0.0);
    let y: f64 = decode_field(line, " Y=")?.unwrap_or(0.0);
    let z: f64 = decode_field(line, " Z=")?.unwrap_or(0.0);
    if id == 0 {
      return Ok(None);
    }
    return Ok(Some(Node::new(id, x, y, z)));
  }
}

impl RecordDecoder for NodeDecoder {
  type Record = Node;

  fn name(&self) -> &'static str {
    return "joint";
  }

  fn consume(&mut self, line: &str) -> LineResponse {
    if line.is_empty() {
      return LineResponse::Done;
    }
    let line = normalise_line(line);
    if is_blank(&line) {
      return LineResponse::Done;
    }
    return match Self::decode(&line) {
      Ok(Some(node)) => {
        self.nodes.push(node);
        LineResponse::Data
      },
      Ok(None) => LineResponse::Useless,
      Err(e) => LineResponse::Skipped(e)
    };
  }

  fn finish(self) -> Vec<Node> {
    return self.nodes;
  }
}

/// Decodes frame or cable connectivity lines.
#[derive(Debug)]
pub struct ConnectivityDecoder<'v> {
  /// Which kind of record we're after.
  kind: ConnectivityKind,
  /// Known joint IDs. If present and non-empty, records referencing anything
  /// else get dropped.
  valid: Option<&'v BTreeSet<SourceId>>,
  /// The records so far, in file order.
  records: Vec<Connectivity>
}

impl<'v> ConnectivityDecoder<'v> {
  /// Instantiates a new decoder.
  pub fn new(
    kind: ConnectivityKind,
    valid: Option<&'v BTreeSet<SourceId>>
  ) -> Self {
    return Self { kind, valid, records: Vec::new() };
  }

  /// Decodes a normalised line. Returns None if any ID is missing or zero.
  fn decode(
    &self,
    line: &str
  ) -> Result<Option<Connectivity>, RecordDecodeError> {
    let id: SourceId = decode_field(line, self.kind.marker())?.unwrap_or(0);
    let start: SourceId = decode_field(line, "JointI=")?.unwrap_or(0);
    let end: SourceId = decode_field(line, "JointJ=")?.unwrap_or(0);
    if id == 0 || start == 0 || end == 0 {
      return Ok(None);
    }
    return Ok(Some(Connectivity::new(self.kind, id, start, end)));
  }

  /// Checks both endpoints against the known joints.
  fn endpoints_known(&self, rec: &Connectivity) -> bool {
    return match self.valid {
      Some(ids) if !ids.is_empty() => {
        ids.contains(&rec.start) && ids.contains(&rec.end)
      },
      _ => true
    };
  }
}

impl RecordDecoder for ConnectivityDecoder<'_> {
  type Record = Connectivity;

  fn name(&self) -> &'static str {
    return self.kind.small_name();
  }

  fn consume(&mut self, line: &str) -> LineResponse {
    // a line without our marker ends the section, even if it's garbage that
    // a skip would have tolerated
    if line.is_empty() || !line.contains(self.kind.marker()) {
      return LineResponse::Done;
    }
    let line = normalise_line(line);
    return match self.decode(&line) {
      Ok(Some(rec)) if self.endpoints_known(&rec) => {
        self.records.push(rec);
        LineResponse::Data
      },
      Ok(Some(rec)) => {
        debug!("Dropping {}: unknown joint.", rec);
        LineResponse::Useless
      },
      Ok(None) => LineResponse::Useless,
      Err(e) => LineResponse::Skipped(e)
    };
  }

  fn finish(self) -> Vec<Connectivity> {
    return self.records;
  }
}

/// Decodes joint restraint lines. Later lines for a joint replace earlier ones.
#[derive(Debug, Default)]
pub struct RestraintDecoder {
  /// The restraints so far, by joint.
  restraints: BTreeMap<SourceId, JointRestraint>
}

impl RestraintDecoder {
  /// Instantiates a new decoder.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Decodes a normalised line. Returns None without a positive joint ID.
  fn decode(line: &str) -> Result<Option<JointRestraint>, RecordDecodeError> {
    let node: SourceId = decode_field(line, "Joint=")?.unwrap_or(0);
    if node <= 0 {
      return Ok(None);
    }
    let mut flags = RestraintFlags::default();
    for dof in Dof::all() {
      flags.set(*dof, decode_flag(line, dof.marker()));
    }
    return Ok(Some(JointRestraint { node, flags }));
  }
}

impl RecordDecoder for RestraintDecoder {
  type Record = JointRestraint;

  fn name(&self) -> &'static str {
    return "joint restraint";
  }

  fn consume(&mut self, line: &str) -> LineResponse {
    if line.is_empty() {
      return LineResponse::Done;
    }
    let line = normalise_line(line);
    if is_blank(&line) {
      return LineResponse::Useless;
    }
    return match Self::decode(&line) {
      Ok(Some(r)) => {
        if self.restraints.insert(r.node, r).is_some() {
          debug!("Joint {} restrained again, keeping the last one.", r.node);
        }
        LineResponse::Data
      },
      Ok(None) => LineResponse::Useless,
      Err(e) => LineResponse::Skipped(e)
    };
  }

  fn finish(self) -> Vec<JointRestraint> {
    return self.restraints.into_values().collect();
  }
}

/// Extracts nodes from a reader, starting at a line.
pub fn extract_nodes<R: BufRead>(reader: R, start_line: usize) -> Vec<Node> {
  return run_decoder(reader, start_line, NodeDecoder::new());
}

/// Extracts nodes from a file, starting at a line. An unreadable file yields
/// no nodes.
pub fn extract_nodes_from_file<P: AsRef<Path>>(
  path: P,
  start_line: usize
) -> Vec<Node> {
  return match open_for(path.as_ref(), "joint") {
    Some(r) => extract_nodes(r, start_line),
    None => Vec::new()
  };
}

/// Extracts frame or cable records from a reader, starting at a line. If a
/// non-empty set of joint IDs is passed, records referencing joints outside it
/// are dropped.
pub fn extract_connectivity<R: BufRead>(
  reader: R,
  start_line: usize,
  kind: ConnectivityKind,
  valid: Option<&BTreeSet<SourceId>>
) -> Vec<Connectivity> {
  return run_decoder(reader, start_line, ConnectivityDecoder::new(kind, valid));
}

/// Extracts frame or cable records from a file. An unreadable file yields no
/// records.
pub fn extract_connectivity_from_file<P: AsRef<Path>>(
  path: P,
  start_line: usize,
  kind: ConnectivityKind,
  valid: Option<&BTreeSet<SourceId>>
) -> Vec<Connectivity> {
  return match open_for(path.as_ref(), kind.small_name()) {
    Some(r) => extract_connectivity(r, start_line, kind, valid),
    None => Vec::new()
  };
}

/// Extracts frames (beams) from a file.
pub fn extract_frames_from_file<P: AsRef<Path>>(
  path: P,
  start_line: usize,
  valid: Option<&BTreeSet<SourceId>>
) -> Vec<Connectivity> {
  return extract_connectivity_from_file(
    path,
    start_line,
    ConnectivityKind::Frame,
    valid
  );
}

/// Extracts cables from a file.
pub fn extract_cables_from_file<P: AsRef<Path>>(
  path: P,
  start_line: usize,
  valid: Option<&BTreeSet<SourceId>>
) -> Vec<Connectivity> {
  return extract_connectivity_from_file(
    path,
    start_line,
    ConnectivityKind::Cable,
    valid
  );
}

/// Extracts joint restraints from a reader, one per joint, sorted by joint.
pub fn extract_restraints<R: BufRead>(
  reader: R,
  start_line: usize
) -> Vec<JointRestraint> {
  return run_decoder(reader, start_line, RestraintDecoder::new());
}

/// Extracts joint restraints from a file. An unreadable file yields none.
pub fn extract_restraints_from_file<P: AsRef<Path>>(
  path: P,
  start_line: usize
) -> Vec<JointRestraint> {
  return match open_for(path.as_ref(), "joint restraint") {
    Some(r) => extract_restraints(r, start_line),
    None => Vec::new()
  };
}
