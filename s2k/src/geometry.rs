//! This module defines basic geometric concepts to understand restraints in a
//! structural model.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Stupid constant so the code is more readable.
pub const SIXDOF: usize = 6;

/// The two types of degree of freedom.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq
)]
pub enum DofType {
  /// Translational DOF.
  Translational,
  /// Rotational DOF.
  Rotational
}

impl DofType {
  /// Returns the letter an export uses for this DOF type.
  pub const fn letter(&self) -> char {
    return match self {
      DofType::Translational => 'U',
      DofType::Rotational => 'R',
    };
  }
}

impl Display for DofType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.letter());
  }
}

/// The three axes.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq
)]
pub enum Axis {
  /// The X axis.
  X,
  /// The Y axis.
  Y,
  /// The Z axis.
  Z,
}

impl TryFrom<usize> for Axis {
  type Error = ();

  fn try_from(value: usize) -> Result<Self, Self::Error> {
    return Ok(match value {
      1 => Self::X,
      2 => Self::Y,
      3 => Self::Z,
      _ => return Err(())
    });
  }
}

impl Axis {
  /// Returns this axis' number 1-3.
  pub const fn number(&self) -> usize {
    return match self {
      Axis::X => 1,
      Axis::Y => 2,
      Axis::Z => 3,
    };
  }
}

/// One of the six degrees of freedom of a joint.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq
)]
pub struct Dof {
  /// The type of DOF (translational or rotational).
  pub dof_type: DofType,
  /// The axis of the DOF (X/Y/Z).
  pub axis: Axis
}

/// All six DOFs, in the order exports list them.
const ALL_DOFS: [Dof; SIXDOF] = [
  Dof { dof_type: DofType::Translational, axis: Axis::X },
  Dof { dof_type: DofType::Translational, axis: Axis::Y },
  Dof { dof_type: DofType::Translational, axis: Axis::Z },
  Dof { dof_type: DofType::Rotational, axis: Axis::X },
  Dof { dof_type: DofType::Rotational, axis: Axis::Y },
  Dof { dof_type: DofType::Rotational, axis: Axis::Z },
];

impl Dof {
  /// Returns all six DOFs in canonical order (U1 through R3).
  pub const fn all() -> &'static [Self; SIXDOF] {
    return &ALL_DOFS;
  }

  /// Returns the 0-5 index of this DOF within a six-element array.
  pub const fn index(&self) -> usize {
    let added = match self.dof_type {
      DofType::Translational => 0,
      DofType::Rotational => 3
    };
    return self.axis.number() - 1 + added;
  }

  /// Returns the label an export uses for this DOF, such as "U1" or "R3".
  pub const fn label(&self) -> &'static str {
    return match (self.dof_type, self.axis) {
      (DofType::Translational, Axis::X) => "U1",
      (DofType::Translational, Axis::Y) => "U2",
      (DofType::Translational, Axis::Z) => "U3",
      (DofType::Rotational, Axis::X) => "R1",
      (DofType::Rotational, Axis::Y) => "R2",
      (DofType::Rotational, Axis::Z) => "R3",
    };
  }

  /// Returns the `Label=` marker for this DOF in a restraint line.
  pub const fn marker(&self) -> &'static str {
    return match (self.dof_type, self.axis) {
      (DofType::Translational, Axis::X) => "U1=",
      (DofType::Translational, Axis::Y) => "U2=",
      (DofType::Translational, Axis::Z) => "U3=",
      (DofType::Rotational, Axis::X) => "R1=",
      (DofType::Rotational, Axis::Y) => "R2=",
      (DofType::Rotational, Axis::Z) => "R3=",
    };
  }
}

impl Display for Dof {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.label());
  }
}

impl From<Dof> for usize {
  fn from(value: Dof) -> Self {
    return value.index() + 1;
  }
}

impl TryFrom<usize> for Dof {
  type Error = ();

  fn try_from(value: usize) -> Result<Self, Self::Error> {
    if !(1..=SIXDOF).contains(&value) {
      return Err(());
    }
    let dof_type = if value > 3 {
      DofType::Rotational
    } else {
      DofType::Translational
    };
    let axis = Axis::try_from((value - 1) % 3 + 1)?;
    return Ok(Self { dof_type, axis });
  }
}
