//! This module implements sending an extracted model into a target model
//! through whatever implements `ModelBuilder`.
//!
//! Joints get created first, and the IDs the target gives them are recorded in
//! a `NodeIdMap` the caller owns. Members and supports are then created in
//! terms of those IDs. A failure on one entity never stops the others.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::entities::*;
use crate::model::Model;
use crate::units::ModelUnits;

/// Maps joint IDs in the export to node IDs in the target model.
pub type NodeIdMap = BTreeMap<SourceId, usize>;

/// A support definition, as the target model understands them.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum SupportKind {
  /// Every DOF restrained.
  Fixed,
  /// Fixed except for some released DOFs.
  FixedBut {
    /// The DOFs left free.
    releases: RestraintFlags
  }
}

impl From<RestraintFlags> for SupportKind {
  fn from(flags: RestraintFlags) -> Self {
    if flags.is_fixed() {
      return Self::Fixed;
    }
    return Self::FixedBut {
      releases: RestraintFlags(flags.0.map(|r| !r))
    };
  }
}

impl Display for SupportKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::Fixed => write!(f, "FIXED"),
      Self::FixedBut { releases } => write!(f, "FIXED BUT {}", releases),
    };
  }
}

/// Something that can build a structural model: the target of a transfer.
pub trait ModelBuilder {
  /// The error a single operation can fail with.
  type Error: Display;

  /// Creates a node and returns the ID the target gave it.
  fn create_node(&mut self, node: &Node) -> Result<usize, Self::Error>;

  /// Creates a frame or cable between two target nodes and returns its ID.
  fn create_member(
    &mut self,
    member: &Connectivity,
    start: usize,
    end: usize
  ) -> Result<usize, Self::Error>;

  /// Defines a support and returns its ID.
  fn create_support(
    &mut self,
    kind: SupportKind
  ) -> Result<usize, Self::Error>;

  /// Assigns a support definition to a target node.
  fn assign_support(
    &mut self,
    support: usize,
    node: usize
  ) -> Result<(), Self::Error>;
}

/// Counts of what a transfer did.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq
)]
pub struct TransferReport {
  /// Nodes created.
  pub nodes: usize,
  /// Frames and cables created.
  pub members: usize,
  /// Members skipped for referencing joints that weren't created.
  pub unmapped_members: usize,
  /// Distinct support definitions created.
  pub support_kinds: usize,
  /// Supports assigned to nodes.
  pub supports: usize,
  /// Restraints skipped for referencing joints that weren't created.
  pub unmapped_restraints: usize,
  /// Operations the builder refused.
  pub failures: usize
}

/// Sends a whole model to a builder. Target IDs get written back into the
/// model's entities and node IDs into the map.
pub fn transfer<B: ModelBuilder>(
  model: &mut Model,
  builder: &mut B,
  node_map: &mut NodeIdMap
) -> TransferReport {
  let mut report = TransferReport::default();
  create_nodes(&mut model.nodes, builder, node_map, &mut report);
  create_members(&mut model.frames, builder, node_map, &mut report);
  create_members(&mut model.cables, builder, node_map, &mut report);
  create_supports(&model.restraints, builder, node_map, &mut report);
  info!(
    "Transferred {} nodes, {} members and {} supports ({} failures).",
    report.nodes,
    report.members,
    report.supports,
    report.failures
  );
  return report;
}

/// Creates nodes and records their target IDs.
fn create_nodes<B: ModelBuilder>(
  nodes: &mut [Node],
  builder: &mut B,
  node_map: &mut NodeIdMap,
  report: &mut TransferReport
) {
  for node in nodes.iter_mut() {
    match builder.create_node(node) {
      Ok(tid) => {
        node.target_id = Some(tid);
        if let Some(old) = node_map.insert(node.id, tid) {
          warn!("Joint {} created twice, node {} orphaned.", node.id, old);
        }
        report.nodes += 1;
      },
      Err(e) => {
        warn!("Could not create {}: {}", node, e);
        report.failures += 1;
      }
    }
  }
}

/// Creates frames or cables between already-created nodes.
fn create_members<B: ModelBuilder>(
  members: &mut [Connectivity],
  builder: &mut B,
  node_map: &NodeIdMap,
  report: &mut TransferReport
) {
  for member in members.iter_mut() {
    let (start, end) = match (
      node_map.get(&member.start),
      node_map.get(&member.end)
    ) {
      (Some(s), Some(e)) => (*s, *e),
      _ => {
        warn!("Skipping {}: joint not in the node map.", member);
        report.unmapped_members += 1;
        continue;
      }
    };
    match builder.create_member(member, start, end) {
      Ok(tid) => {
        member.target_id = Some(tid);
        report.members += 1;
      },
      Err(e) => {
        warn!("Could not create {}: {}", member, e);
        report.failures += 1;
      }
    }
  }
}

/// Creates one support definition per distinct restraint pattern and assigns
/// them to nodes.
fn create_supports<B: ModelBuilder>(
  restraints: &[JointRestraint],
  builder: &mut B,
  node_map: &NodeIdMap,
  report: &mut TransferReport
) {
  let mut definitions: BTreeMap<RestraintFlags, usize> = BTreeMap::new();
  for restraint in restraints {
    let node = match node_map.get(&restraint.node) {
      Some(n) => *n,
      None => {
        warn!("Joint {} not found in node map.", restraint.node);
        report.unmapped_restraints += 1;
        continue;
      }
    };
    if restraint.is_free() {
      debug!("Joint {} has no restraints, no support.", restraint.node);
      continue;
    }
    let support = match definitions.get(&restraint.flags).copied() {
      Some(s) => s,
      None => match builder.create_support(restraint.flags.into()) {
        Ok(s) => {
          definitions.insert(restraint.flags, s);
          report.support_kinds += 1;
          s
        },
        Err(e) => {
          warn!(
            "Could not define support {}: {}",
            SupportKind::from(restraint.flags),
            e
          );
          report.failures += 1;
          continue;
        }
      }
    };
    match builder.assign_support(support, node) {
      Ok(()) => report.supports += 1,
      Err(e) => {
        warn!("Could not assign support to node {}: {}", node, e);
        report.failures += 1;
      }
    }
  }
}

/// Errors from the in-memory model.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryModelError {
  /// A member referenced a node that doesn't exist.
  UnknownNode(usize),
  /// An assignment referenced a support that doesn't exist.
  UnknownSupport(usize),
  /// A member starts and ends on the same node.
  ZeroLengthMember(usize)
}

impl Display for MemoryModelError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::UnknownNode(n) => write!(f, "no node {}", n),
      Self::UnknownSupport(s) => write!(f, "no support {}", s),
      Self::ZeroLengthMember(n) => {
        write!(f, "member starts and ends on node {}", n)
      },
    };
  }
}

impl Error for MemoryModelError {}

/// A member as stored by the in-memory model.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryMember {
  /// Frame or cable.
  pub kind: ConnectivityKind,
  /// The ID in the export.
  pub source_id: SourceId,
  /// Start node.
  pub start: usize,
  /// End node.
  pub end: usize
}

/// A target model that just keeps everything in memory. Node and member IDs
/// are handed out sequentially from 1.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryModel {
  /// The units the model is in.
  pub units: ModelUnits,
  /// The nodes, by ID.
  pub nodes: BTreeMap<usize, Vector3<f64>>,
  /// The members, by ID.
  pub members: BTreeMap<usize, MemoryMember>,
  /// The support definitions; a support's ID is its index.
  pub supports: Vec<SupportKind>,
  /// Support assignments, node to support.
  pub assignments: BTreeMap<usize, usize>
}

impl MemoryModel {
  /// Creates an empty model in some units.
  pub fn new(units: ModelUnits) -> Self {
    return Self { units, ..Default::default() };
  }

  /// Returns the support assigned to a node, if any.
  pub fn support_of(&self, node: usize) -> Option<SupportKind> {
    let s = self.assignments.get(&node)?;
    return self.supports.get(*s).copied();
  }
}

impl ModelBuilder for MemoryModel {
  type Error = MemoryModelError;

  fn create_node(&mut self, node: &Node) -> Result<usize, Self::Error> {
    let id = self.nodes.len() + 1;
    self.nodes.insert(id, node.coords);
    return Ok(id);
  }

  fn create_member(
    &mut self,
    member: &Connectivity,
    start: usize,
    end: usize
  ) -> Result<usize, Self::Error> {
    for n in [start, end] {
      if !self.nodes.contains_key(&n) {
        return Err(MemoryModelError::UnknownNode(n));
      }
    }
    if start == end {
      return Err(MemoryModelError::ZeroLengthMember(start));
    }
    let id = self.members.len() + 1;
    self.members.insert(id, MemoryMember {
      kind: member.kind,
      source_id: member.id,
      start,
      end
    });
    return Ok(id);
  }

  fn create_support(
    &mut self,
    kind: SupportKind
  ) -> Result<usize, Self::Error> {
    self.supports.push(kind);
    return Ok(self.supports.len() - 1);
  }

  fn assign_support(
    &mut self,
    support: usize,
    node: usize
  ) -> Result<(), Self::Error> {
    if support >= self.supports.len() {
      return Err(MemoryModelError::UnknownSupport(support));
    }
    if !self.nodes.contains_key(&node) {
      return Err(MemoryModelError::UnknownNode(node));
    }
    self.assignments.insert(node, support);
    return Ok(());
  }
}
