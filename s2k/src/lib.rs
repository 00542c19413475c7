//! This library implements types and functions to extract a structural model
//! from the `$2k` text exports written by SAP2000.
//!
//! It was created with the main intent being the conversion of such models
//! into other structural analysis programs: joints, frames, cables and joint
//! restraints are read out of the export and can then be sent into any target
//! that implements `ModelBuilder`.
//!
//! Extraction is best-effort. Exports in the wild are large and carry plenty
//! of sections we don't understand, so a malformed line costs one record and
//! never the whole file.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::needless_return)]

pub mod decoders;
pub mod entities;
pub mod geometry;
pub mod model;
pub mod sections;
pub mod transfer;
pub mod units;
pub mod util;

/// Imports the most relevant exports from the library.
pub mod prelude {
  pub use super::decoders::*;
  pub use super::entities::*;
  pub use super::geometry::*;
  pub use super::model::*;
  pub use super::sections::*;
  pub use super::transfer::*;
  pub use super::units::*;
}

#[cfg(test)]
mod tests;
