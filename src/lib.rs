//! Planarization of integer-grid polygons.
//!
//! The input is a set of possibly self-intersecting, possibly overlapping
//! polygons whose boundaries are given as y-monotone chains ([`Stroke`]s) on
//! a 32-bit integer grid. [`process`] runs a sweep-line pass that resolves
//! every edge crossing, snaps the results back onto the grid, evaluates a
//! pluggable [`WindRule`] per boundary segment, and returns an
//! intersection-free planar subdivision as a new [`Polygon`].
//!
//! ```rust
//! use planarize::{BooleanOperation, FillStyle, Point, Polygon};
//!
//! let a = Polygon::from_path(0.05, FillStyle::SOLID, &[
//!   Point::new(0, 0), Point::new(10, 0), Point::new(10, 10), Point::new(0, 10),
//! ]);
//! let b = Polygon::from_path(0.05, FillStyle::SOLID, &[
//!   Point::new(5, 5), Point::new(15, 5), Point::new(15, 15), Point::new(5, 15),
//! ]);
//! let merged = BooleanOperation::Union.apply(&a, &b).unwrap();
//! assert!(merged.check());
//! ```

mod active;
mod boolean;
pub mod data;
mod process;
mod queue;
mod segment;
pub mod wind;
mod writer;
mod xrow;

pub use boolean::BooleanOperation;
pub use data::point::Point;
pub use data::polygon::{Dir, FillStyle, Polygon, Stroke};
pub use process::{process, process_with, Options};
pub use wind::{WindContext, WindRule, WindState};
pub use writer::{PolyWriter, StrokeWriter};

/// Input constraint violations reported by [`Polygon::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  /// A stroke has fewer than two points.
  InsufficientPoints,
  /// Consecutive stroke points decrease in y; the caller must split the
  /// chain at the reversal.
  DirectionReversal,
  /// `gridsize` is zero, negative, or not finite.
  DegenerateGrid,
}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Error::InsufficientPoints => write!(f, "stroke has fewer than two points"),
      Error::DirectionReversal => write!(f, "stroke is not monotone in y"),
      Error::DegenerateGrid => write!(f, "gridsize is not a positive finite number"),
    }
  }
}

impl std::error::Error for Error {}
