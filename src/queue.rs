use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::data::point::Point;
use crate::segment::SegId;

/// Event kinds in ascending processing priority at equal y: crossings are
/// handled before endings (a segment about to end still gets a chance to
/// tear up its neighbors), endings before starts (so starting segments are
/// inserted into a consistent active list), and horizontals come last (their
/// only purpose is to produce snapping coordinates for the segments that
/// still exist in the scanline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum EventKind {
  Cross,
  End,
  Start,
  Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Event {
  pub kind: EventKind,
  pub p: Point,
  pub s1: SegId,
  /// Second participant of a crossing.
  pub s2: Option<SegId>,
}

impl Ord for Event {
  fn cmp(&self, other: &Event) -> std::cmp::Ordering {
    self
      .p
      .y
      .cmp(&other.p.y)
      .then(self.kind.cmp(&other.kind))
      // the remaining fields only make the order total
      .then(self.p.x.cmp(&other.p.x))
      .then(self.s1.cmp(&other.s1))
      .then(self.s2.cmp(&other.s2))
  }
}

impl PartialOrd for Event {
  fn partial_cmp(&self, other: &Event) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

/// Min-heap of sweep events, keyed by `(p.y, kind)`.
#[derive(Default)]
pub(crate) struct EventQueue {
  heap: BinaryHeap<Reverse<Event>>,
}

impl EventQueue {
  pub fn new() -> EventQueue {
    EventQueue::default()
  }

  pub fn put(&mut self, e: Event) {
    self.heap.push(Reverse(e));
  }

  pub fn pop(&mut self) -> Option<Event> {
    self.heap.pop().map(|Reverse(e)| e)
  }

  /// Pop the next event only if it still lies on scanline `y`.
  pub fn pop_at(&mut self, y: i32) -> Option<Event> {
    if self.heap.peek().is_some_and(|Reverse(e)| e.p.y == y) {
      self.pop()
    } else {
      None
    }
  }

  pub fn peek(&self) -> Option<&Event> {
    self.heap.peek().map(|Reverse(e)| e)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ev(kind: EventKind, x: i32, y: i32) -> Event {
    Event {
      kind,
      p: Point::new(x, y),
      s1: SegId(0),
      s2: None,
    }
  }

  #[test]
  fn orders_by_scanline_then_kind() {
    let mut q = EventQueue::new();
    q.put(ev(EventKind::Start, 0, 5));
    q.put(ev(EventKind::Horizontal, 0, 3));
    q.put(ev(EventKind::Start, 9, 3));
    q.put(ev(EventKind::Cross, 4, 3));
    q.put(ev(EventKind::End, 1, 3));

    let kinds: Vec<_> = std::iter::from_fn(|| q.pop()).map(|e| (e.p.y, e.kind)).collect();
    assert_eq!(
      kinds,
      vec![
        (3, EventKind::Cross),
        (3, EventKind::End),
        (3, EventKind::Start),
        (3, EventKind::Horizontal),
        (5, EventKind::Start),
      ]
    );
  }

  #[test]
  fn pop_at_stops_at_scanline_boundary() {
    let mut q = EventQueue::new();
    q.put(ev(EventKind::Start, 0, 1));
    q.put(ev(EventKind::Start, 0, 2));
    assert!(q.pop_at(0).is_none());
    let first = q.pop().unwrap();
    assert_eq!(first.p.y, 1);
    assert!(q.pop_at(1).is_none());
    assert_eq!(q.pop_at(2).unwrap().p.y, 2);
    assert!(q.peek().is_none());
  }
}
