//! This module defines the entities we extract from an export: joints (nodes),
//! frame and cable connectivity, and joint restraints.

use std::fmt::Display;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::{Dof, SIXDOF};

/// An identifier as written in the export.
pub type SourceId = i64;

/// A joint of the model.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Node {
  /// The ID of the joint in the export. Never zero.
  pub id: SourceId,
  /// The coordinates (X or R, Y, Z).
  pub coords: Vector3<f64>,
  /// The ID the target model gave this node, once it's been created there.
  pub target_id: Option<usize>
}

impl Node {
  /// Creates a node that hasn't been sent anywhere yet.
  pub fn new(id: SourceId, x: f64, y: f64, z: f64) -> Self {
    return Self {
      id,
      coords: Vector3::new(x, y, z),
      target_id: None
    };
  }
}

impl Display for Node {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(
      f,
      "JOINT {} ({}, {}, {})",
      self.id,
      self.coords.x,
      self.coords.y,
      self.coords.z
    );
  }
}

/// The kinds of two-node connectivity records we know.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum ConnectivityKind {
  /// A frame (beam) element.
  Frame,
  /// A cable element.
  Cable
}

impl ConnectivityKind {
  /// Returns both kinds.
  pub const fn all() -> &'static [Self] {
    return &[Self::Frame, Self::Cable];
  }

  /// Returns the marker that starts a record of this kind.
  pub const fn marker(&self) -> &'static str {
    return match self {
      Self::Frame => "Frame=",
      Self::Cable => "Cable=",
    };
  }

  /// Returns the lowercase name of the kind.
  pub const fn small_name(&self) -> &'static str {
    return match self {
      Self::Frame => "frame",
      Self::Cable => "cable",
    };
  }

  /// Returns the all-caps name of the kind.
  pub const fn name(&self) -> &'static str {
    return match self {
      Self::Frame => "FRAME",
      Self::Cable => "CABLE",
    };
  }
}

impl Display for ConnectivityKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}

/// A frame or cable spanning two joints.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connectivity {
  /// Frame or cable.
  pub kind: ConnectivityKind,
  /// The ID of the element in the export.
  pub id: SourceId,
  /// The start joint (JointI).
  pub start: SourceId,
  /// The end joint (JointJ).
  pub end: SourceId,
  /// The ID the target model gave this member, once it's been created there.
  pub target_id: Option<usize>
}

impl Connectivity {
  /// Creates a record that hasn't been sent anywhere yet.
  pub fn new(
    kind: ConnectivityKind,
    id: SourceId,
    start: SourceId,
    end: SourceId
  ) -> Self {
    return Self { kind, id, start, end, target_id: None };
  }
}

impl Display for Connectivity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(
      f,
      "{} {} ({} -> {})",
      self.kind,
      self.id,
      self.start,
      self.end
    );
  }
}

/// Which of the six DOFs of a joint are restrained.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq,
  PartialOrd, Ord, Hash, derive_more::From
)]
pub struct RestraintFlags(pub [bool; SIXDOF]);

impl RestraintFlags {
  /// Is a DOF restrained?
  pub const fn get(&self, dof: Dof) -> bool {
    return self.0[dof.index()];
  }

  /// Sets a DOF's restraint.
  pub fn set(&mut self, dof: Dof, restrained: bool) {
    self.0[dof.index()] = restrained;
  }

  /// All six restrained.
  pub fn is_fixed(&self) -> bool {
    return self.0.iter().all(|r| *r);
  }

  /// Nothing restrained.
  pub fn is_free(&self) -> bool {
    return self.0.iter().all(|r| !*r);
  }
}

impl Display for RestraintFlags {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.is_free() {
      return write!(f, "FREE");
    }
    let restrained = Dof::all()
      .iter()
      .filter(|d| self.get(**d))
      .map(|d| d.label())
      .collect::<Vec<_>>();
    return write!(f, "{}", restrained.join(" "));
  }
}

/// The restraints assigned to a joint.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JointRestraint {
  /// The joint's ID in the export.
  pub node: SourceId,
  /// The restrained DOFs.
  pub flags: RestraintFlags
}

impl JointRestraint {
  /// Is a DOF restrained?
  pub const fn is_restrained(&self, dof: Dof) -> bool {
    return self.flags.get(dof);
  }

  /// All six restrained.
  pub fn is_fixed(&self) -> bool {
    return self.flags.is_fixed();
  }

  /// Nothing restrained.
  pub fn is_free(&self) -> bool {
    return self.flags.is_free();
  }
}
