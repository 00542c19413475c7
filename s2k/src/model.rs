//! This module implements the structure of a whole extracted model, and the
//! routines that run the locator and every extractor over one export.

use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::decoders::*;
use crate::entities::*;
use crate::sections::*;

/// This is what we get out of one export.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Model {
  /// The name of the file, if it came from one.
  pub filename: Option<String>,
  /// Where the sections were found.
  pub sections: SectionOffsets,
  /// The joints, in file order.
  pub nodes: Vec<Node>,
  /// The frames, in file order.
  pub frames: Vec<Connectivity>,
  /// The cables, in file order.
  pub cables: Vec<Connectivity>,
  /// The joint restraints, one per joint, sorted by joint.
  pub restraints: Vec<JointRestraint>
}

impl Model {
  /// Extracts everything from a file. Each extractor reads the file on its
  /// own; frames and cables are filtered against the joints found.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
    let p = path.as_ref();
    let sections = locate_sections_in_file(p);
    let nodes = extract_nodes_from_file(
      p,
      sections.start_of(SectionLabel::JointCoordinates)
    );
    let ids = node_id_set(&nodes);
    let frames = extract_frames_from_file(
      p,
      sections.start_of(SectionLabel::FrameConnectivity),
      Some(&ids)
    );
    let cables = extract_cables_from_file(
      p,
      sections.start_of(SectionLabel::CableConnectivity),
      Some(&ids)
    );
    let restraints = extract_restraints_from_file(
      p,
      sections.start_of(SectionLabel::JointRestraints)
    );
    let model = Self {
      filename: p.file_name().and_then(|s| s.to_str()).map(String::from),
      sections,
      nodes,
      frames,
      cables,
      restraints
    };
    model.log_summary();
    return model;
  }

  /// Extracts everything from an export already in memory.
  pub fn from_text(text: &str) -> Self {
    let reader = || Cursor::new(text.as_bytes());
    let sections = locate_sections(reader());
    let nodes = extract_nodes(
      reader(),
      sections.start_of(SectionLabel::JointCoordinates)
    );
    let ids = node_id_set(&nodes);
    let frames = extract_connectivity(
      reader(),
      sections.start_of(SectionLabel::FrameConnectivity),
      ConnectivityKind::Frame,
      Some(&ids)
    );
    let cables = extract_connectivity(
      reader(),
      sections.start_of(SectionLabel::CableConnectivity),
      ConnectivityKind::Cable,
      Some(&ids)
    );
    let restraints = extract_restraints(
      reader(),
      sections.start_of(SectionLabel::JointRestraints)
    );
    let model = Self {
      filename: None,
      sections,
      nodes,
      frames,
      cables,
      restraints
    };
    model.log_summary();
    return model;
  }

  /// Returns the IDs of every joint.
  pub fn node_ids(&self) -> BTreeSet<SourceId> {
    return node_id_set(&self.nodes);
  }

  /// Returns the records of one connectivity kind.
  pub fn connectivity(&self, kind: ConnectivityKind) -> &[Connectivity] {
    return match kind {
      ConnectivityKind::Frame => &self.frames,
      ConnectivityKind::Cable => &self.cables,
    };
  }

  /// Iterates over frames and then cables.
  pub fn members(&self) -> impl Iterator<Item = &Connectivity> {
    return self.frames.iter().chain(self.cables.iter());
  }

  /// Returns true if nothing was extracted at all.
  pub fn is_empty(&self) -> bool {
    return self.nodes.is_empty()
      && self.frames.is_empty()
      && self.cables.is_empty()
      && self.restraints.is_empty();
  }

  /// Logs how many of each entity there are.
  fn log_summary(&self) {
    info!(
      "Model has {} joints, {} frames, {} cables and {} restraints.",
      self.nodes.len(),
      self.frames.len(),
      self.cables.len(),
      self.restraints.len()
    );
  }
}

/// Collects the IDs of some nodes.
fn node_id_set(nodes: &[Node]) -> BTreeSet<SourceId> {
  return nodes.iter().map(|n| n.id).collect();
}
