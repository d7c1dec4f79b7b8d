use crate::data::point::Point;
use crate::data::polygon::{Dir, FillStyle, Polygon, Stroke};

/// Sink for the edges emitted during a sweep.
///
/// The engine emits every output edge as a `moveto`/`lineto` pair;
/// implementations are free to reassemble them however they like.
pub trait PolyWriter {
  fn set_gridsize(&mut self, gridsize: f64);
  fn moveto(&mut self, p: Point);
  fn lineto(&mut self, p: Point);
  fn finish(&mut self) -> Polygon;
}

/// The default writer: a `moveto` continuing the previous `lineto` extends
/// the open stroke instead of starting a new one.
///
/// Intermediate vertices are kept even when they are collinear: snapping
/// deliberately drives shared vertices into neighboring strokes, and melting
/// them away would reopen the cracks it closed.
#[derive(Debug, Default)]
pub struct StrokeWriter {
  gridsize: f64,
  strokes: Vec<Stroke>,
  current: Vec<Point>,
}

impl StrokeWriter {
  pub fn new() -> StrokeWriter {
    StrokeWriter::default()
  }

  fn flush(&mut self) {
    if self.current.len() >= 2 {
      self.strokes.push(Stroke {
        dir: Dir::Up,
        fs: FillStyle::SOLID,
        points: std::mem::take(&mut self.current),
      });
    } else {
      self.current.clear();
    }
  }
}

impl PolyWriter for StrokeWriter {
  fn set_gridsize(&mut self, gridsize: f64) {
    self.gridsize = gridsize;
  }

  fn moveto(&mut self, p: Point) {
    if self.current.last() != Some(&p) {
      self.flush();
      self.current.push(p);
    }
  }

  fn lineto(&mut self, q: Point) {
    debug_assert!(!self.current.is_empty(), "lineto without moveto");
    self.current.push(q);
  }

  fn finish(&mut self) -> Polygon {
    self.flush();
    Polygon {
      gridsize: self.gridsize,
      strokes: std::mem::take(&mut self.strokes),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
  }

  #[test]
  fn chains_continuing_moveto() {
    let mut w = StrokeWriter::new();
    w.set_gridsize(1.0);
    w.moveto(p(0, 0));
    w.lineto(p(2, 3));
    w.moveto(p(2, 3));
    w.lineto(p(1, 7));
    let poly = w.finish();
    assert_eq!(poly.strokes.len(), 1);
    assert_eq!(poly.strokes[0].points, vec![p(0, 0), p(2, 3), p(1, 7)]);
  }

  #[test]
  fn keeps_collinear_snap_vertices() {
    let mut w = StrokeWriter::new();
    w.set_gridsize(1.0);
    w.moveto(p(0, 0));
    w.lineto(p(1, 1));
    w.moveto(p(1, 1));
    w.lineto(p(3, 3));
    let poly = w.finish();
    assert_eq!(poly.strokes[0].points, vec![p(0, 0), p(1, 1), p(3, 3)]);
  }

  #[test]
  fn breaks_at_disconnected_moveto() {
    let mut w = StrokeWriter::new();
    w.set_gridsize(0.5);
    w.moveto(p(0, 0));
    w.lineto(p(0, 4));
    w.moveto(p(9, 9));
    w.lineto(p(9, 12));
    let poly = w.finish();
    assert_eq!(poly.gridsize, 0.5);
    assert_eq!(poly.strokes.len(), 2);
  }

  #[test]
  fn lonely_moveto_produces_nothing() {
    let mut w = StrokeWriter::new();
    w.moveto(p(5, 5));
    let poly = w.finish();
    assert!(poly.strokes.is_empty());
  }
}
