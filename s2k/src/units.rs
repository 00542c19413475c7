//! This module implements the unit systems a target model can be created in,
//! with the integer codes the target application knows them by.

use std::error::Error;
use std::fmt::Display;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A unit code out of the 0-7 range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnitCodeError {
  /// What kind of unit we tried.
  pub kind: &'static str,
  /// The bad code.
  pub code: usize
}

impl Display for UnitCodeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(
      f,
      "no {} unit with code {} (valid: 0-7)",
      self.kind,
      self.code
    );
  }
}

impl Error for UnitCodeError {}

/// Generates a unit enum with codes, names, and conversions.
macro_rules! gen_units {
  (
    $desc:literal,
    $kind:literal,
    $tname:ident,
    [
      $(($vn:ident, $code:literal, $nm:literal),)*
    ]
  ) => {
    #[doc = $desc]
    #[derive(
      Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd,
      Ord, ValueEnum
    )]
    #[clap(rename_all = "lower")]
    #[allow(missing_docs)]
    pub enum $tname {
      $($vn,)*
    }

    impl $tname {
      /// Returns all units of this kind, in code order.
      pub const fn all() -> &'static [Self] {
        return &[$(Self::$vn,)*];
      }

      /// Returns the code the target application uses.
      pub const fn code(&self) -> usize {
        return match self {
          $(Self::$vn => $code,)*
        };
      }

      /// Returns the human-readable name.
      pub const fn name(&self) -> &'static str {
        return match self {
          $(Self::$vn => $nm,)*
        };
      }
    }

    impl TryFrom<usize> for $tname {
      type Error = UnitCodeError;

      fn try_from(code: usize) -> Result<Self, Self::Error> {
        return match code {
          $($code => Ok(Self::$vn),)*
          _ => Err(UnitCodeError { kind: $kind, code })
        };
      }
    }

    impl From<$tname> for usize {
      fn from(value: $tname) -> Self {
        return value.code();
      }
    }

    impl Display for $tname {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.name());
      }
    }
  };
}

gen_units!(
  "Length units.",
  "length",
  LengthUnit,
  [
    (Inch, 0, "Inch"),
    (Feet, 1, "Feet"),
    (UsFeet, 2, "Feet (US)"),
    (Centimeter, 3, "Centimeter"),
    (Meter, 4, "Meter"),
    (Millimeter, 5, "Millimeter"),
    (Decimeter, 6, "Decimeter"),
    (Kilometer, 7, "Kilometer"),
  ]
);

gen_units!(
  "Force units.",
  "force",
  ForceUnit,
  [
    (Kilopound, 0, "Kilopound"),
    (Pound, 1, "Pound"),
    (Kilogram, 2, "Kilogram"),
    (MetricTon, 3, "Metric Ton"),
    (Newton, 4, "Newton"),
    (KiloNewton, 5, "Kilo Newton"),
    (MegaNewton, 6, "Mega Newton"),
    (DecaNewton, 7, "DecaNewton"),
  ]
);

impl Default for LengthUnit {
  fn default() -> Self {
    return Self::Meter;
  }
}

impl Default for ForceUnit {
  fn default() -> Self {
    return Self::KiloNewton;
  }
}

/// The units a target model is created in.
#[derive(
  Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq
)]
pub struct ModelUnits {
  /// Length unit.
  pub length: LengthUnit,
  /// Force unit.
  pub force: ForceUnit
}

impl Display for ModelUnits {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{} / {}", self.length, self.force);
  }
}
