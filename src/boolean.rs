use crate::data::polygon::Polygon;
use crate::process::process;
use crate::wind::{Difference, Intersect, Union, WindContext};
use crate::Error;

/// Set operations between two polygons, built on the sweep engine.
///
/// Inputs may self-intersect and overlap arbitrarily; they are planarized on
/// the way. The polygon passed first is "polygon 0", which is what
/// [`BooleanOperation::Difference`] subtracts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperation {
  Union,
  Intersection,
  Difference,
}

impl BooleanOperation {
  pub fn apply(self, a: &Polygon, b: &Polygon) -> Result<Polygon, Error> {
    a.validate()?;
    b.validate()?;
    let context = WindContext::new(2);
    let input = [a, b];
    Ok(match self {
      BooleanOperation::Union => process(&input, &Union, &context),
      BooleanOperation::Intersection => process(&input, &Intersect, &context),
      BooleanOperation::Difference => process(&input, &Difference, &context),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::point::Point;
  use crate::data::polygon::FillStyle;

  fn square(x: i32, y: i32, size: i32) -> Polygon {
    Polygon::from_path(
      1.0,
      FillStyle::SOLID,
      &[
        Point::new(x, y),
        Point::new(x + size, y),
        Point::new(x + size, y + size),
        Point::new(x, y + size),
      ],
    )
  }

  #[test]
  fn union_of_disjoint_squares_keeps_both() {
    let a = square(0, 0, 4);
    let b = square(10, 0, 4);
    let out = BooleanOperation::Union.apply(&a, &b).unwrap();
    assert!(out.check());
    assert_eq!(out.num_edges(), 8);
  }

  #[test]
  fn intersection_of_disjoint_squares_is_empty() {
    let a = square(0, 0, 4);
    let b = square(10, 0, 4);
    let out = BooleanOperation::Intersection.apply(&a, &b).unwrap();
    assert!(out.strokes.is_empty());
  }

  #[test]
  fn difference_with_disjoint_subtrahend_is_identity() {
    let a = square(0, 0, 4);
    let b = square(10, 0, 4);
    let out = BooleanOperation::Difference.apply(&a, &b).unwrap();
    assert!(out.check());
    assert_eq!(out.num_edges(), 4);
  }

  #[test]
  fn rejects_invalid_input() {
    let a = square(0, 0, 4);
    let bad = Polygon::new(0.0);
    let result = BooleanOperation::Union.apply(&a, &bad);
    assert!(matches!(result, Err(Error::DegenerateGrid)));
  }
}
