//! This module implements the list of known sections of a `$2k` export and
//! the locator that finds the line each of them starts on.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::util::{lossy_lines, normalise_line};

/// The header that marks the end of everything we care about.
pub const TERMINAL_MARKER: &str = "OPTIONS - COLORS - OUTPUT";

/// Generates the SectionLabel enum and the SectionOffsets table with one
/// field per label.
macro_rules! gen_sections {
  (
    $(
      {
        $desc:literal,
        $lname:ident,
        $field:ident,
        $header:expr
      },
    )*
  ) => {
    /// This contains all the sections the locator knows about, in the order
    /// they're tested against a line.
    #[derive(
      Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd,
      Ord
    )]
    #[non_exhaustive]
    pub enum SectionLabel {
      $(
        #[doc = $desc]
        $lname,
      )*
    }

    impl SectionLabel {
      /// Returns all known section labels, in matching order.
      pub const fn all() -> &'static [Self] {
        return &[ $(Self::$lname,)* ];
      }

      /// Returns a description of the section.
      pub const fn desc(&self) -> &'static str {
        return match self {
          $(Self::$lname => $desc,)*
        };
      }

      /// Returns the header substring that signals the section, if there is
      /// one. Some table slots are kept without a header.
      pub const fn header(&self) -> Option<&'static str> {
        return match self {
          $(Self::$lname => $header,)*
        };
      }
    }

    /// The line numbers (counted from 1) where each section header was first
    /// seen. Zero means the section was never found.
    #[derive(
      Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq
    )]
    pub struct SectionOffsets {
      $(
        #[doc = $desc]
        pub $field: usize,
      )*
    }

    impl SectionOffsets {
      /// Returns the offset for a label.
      pub const fn get(&self, label: SectionLabel) -> usize {
        return match label {
          $(SectionLabel::$lname => self.$field,)*
        };
      }

      /// Mutable access to the field behind a label.
      fn slot(&mut self, label: SectionLabel) -> &mut usize {
        return match label {
          $(SectionLabel::$lname => &mut self.$field,)*
        };
      }
    }
  };
}

gen_sections!(
  {
    "Joint coordinates",
    JointCoordinates,
    joints,
    Some("JOINT COORDINATES")
  },
  {
    "Joint restraint assignments",
    JointRestraints,
    supports,
    Some("JOINT RESTRAINT ASSIGNMENTS")
  },
  {
    "Joint force loads",
    JointForces,
    joint_forces,
    Some("JOINT LOADS - FORCE")
  },
  {
    "Frame connectivity",
    FrameConnectivity,
    frames,
    Some("CONNECTIVITY - FRAME")
  },
  {
    "Area (plate) connectivity",
    AreaConnectivity,
    areas,
    Some("CONNECTIVITY - AREA")
  },
  {
    "Cable connectivity",
    CableConnectivity,
    cables,
    Some("CONNECTIVITY - CABLE")
  },
  {
    "Frame point loads",
    FramePointLoads,
    frame_point_loads,
    Some("FRAME LOADS - POINT")
  },
  {
    "Frame distributed loads",
    FrameDistributedLoads,
    frame_distributed_loads,
    Some("FRAME LOADS - DISTRIBUTED")
  },
  {
    "Frame open structure wind loads",
    FrameWindLoads,
    frame_wind_loads,
    Some("FRAME LOADS - OPEN STRUCTURE WIND")
  },
  {
    "Frame section assignments",
    FrameSections,
    frame_sections,
    Some("FRAME SECTION ASSIGNMENTS")
  },
  {
    "Area section assignments",
    AreaSections,
    area_sections,
    Some("AREA SECTION ASSIGNMENTS")
  },
  {
    "Area uniform loads",
    AreaUniformLoads,
    area_uniform_loads,
    Some("AREA LOADS - UNIFORM")
  },
  {
    "Frame releases",
    FrameReleases,
    frame_releases,
    None
  },
  {
    "Concentrated loads",
    ConcentratedLoads,
    concentrated_loads,
    None
  },
);

impl Display for SectionLabel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.desc());
  }
}

impl SectionOffsets {
  /// Records a line for a label unless one was already recorded. Returns
  /// whether the write happened.
  pub fn set_once(&mut self, label: SectionLabel, line: usize) -> bool {
    let slot = self.slot(label);
    if *slot != 0 {
      return false;
    }
    *slot = line;
    return true;
  }

  /// Returns the line an extractor should start on, i.e. one past the
  /// header. For an absent section that's the sentinel 1.
  pub const fn start_of(&self, label: SectionLabel) -> usize {
    return self.get(label) + 1;
  }

  /// Returns whether a section was found.
  pub const fn has(&self, label: SectionLabel) -> bool {
    return self.get(label) != 0;
  }

  /// Iterates over the sections that were found, with their lines.
  pub fn found(&self) -> impl Iterator<Item = (SectionLabel, usize)> + '_ {
    return SectionLabel::all()
      .iter()
      .copied()
      .map(|l| (l, self.get(l)))
      .filter(|(_, line)| *line != 0);
  }

  /// Returns true if no section was found at all.
  pub fn is_empty(&self) -> bool {
    return self.found().next().is_none();
  }
}

/// Checks if a line is a known section header.
fn detect_header(line: &str) -> Option<SectionLabel> {
  return SectionLabel::all()
    .iter()
    .copied()
    .find(|l| l.header().is_some_and(|h| line.contains(h)));
}

/// Scans lines from a reader and records where each known section begins,
/// stopping at the terminal marker. Lines that aren't valid UTF-8 are scanned
/// lossily; an I/O error ends the scan early, keeping whatever was found
/// before it.
pub fn locate_sections<R: BufRead>(reader: R) -> SectionOffsets {
  let mut offsets = SectionOffsets::default();
  for (i, line) in lossy_lines(reader).enumerate() {
    let lineno = i + 1;
    let line = match line {
      Ok(l) => normalise_line(&l),
      Err(e) => {
        error!("Read error on line {}, stopping: {}", lineno, e);
        break;
      }
    };
    if line.contains(TERMINAL_MARKER) {
      debug!("Hit the terminal marker on line {}, stopping.", lineno);
      break;
    }
    if let Some(label) = detect_header(&line) {
      if offsets.set_once(label, lineno) {
        debug!("Found \"{}\" on line {}.", label, lineno);
      } else {
        warn!(
          "Repeated \"{}\" header on line {}, keeping line {}.",
          label,
          lineno,
          offsets.get(label)
        );
      }
    }
  }
  return offsets;
}

/// Utility function -- opens a file and locates its sections. An unreadable
/// file means no sections.
pub fn locate_sections_in_file<P: AsRef<Path>>(path: P) -> SectionOffsets {
  return match File::open(path.as_ref()) {
    Ok(f) => locate_sections(BufReader::new(f)),
    Err(e) => {
      error!("Could not open {}: {}", path.as_ref().display(), e);
      SectionOffsets::default()
    }
  };
}
