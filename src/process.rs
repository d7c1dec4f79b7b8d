//! The sweep driver.
//!
//! One call to [`process`] owns an event queue seeded with the first edge of
//! every input stroke, an active list, a per-scanline snap-coordinate row and
//! a writer sink. Events are consumed in batches sharing a scanline; each
//! batch mutates the active list, collects snap coordinates, drives snap
//! points into the segments passing through them, re-evaluates windings over
//! the disturbed range and emits output edges. A second, much simpler sweep
//! reconstructs the horizontal boundary edges the main pass suppressed.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use claims::debug_assert_ok;
use log::{debug, trace};

use crate::active::ActiveList;
use crate::data::point::Point;
use crate::data::polygon::{Dir, FillStyle, Polygon, Stroke};
use crate::queue::{Event, EventKind, EventQueue};
use crate::segment::{div_ceil, Arena, SegId, Segment};
use crate::wind::{WindContext, WindRule};
use crate::writer::{PolyWriter, StrokeWriter};
use crate::xrow::{SnapBox, XRow};

/// Processing options.
///
/// `paranoid` enables the heavyweight integrity checks: active-list order
/// verification per scanline, full-range winding re-evaluation, and
/// cross-checking that every segment involved in an intersection received a
/// snap point. Violations abort, like every internal invariant violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
  pub paranoid: bool,
}

/// Resolve all crossings among `input` and keep the boundaries the wind rule
/// selects. `polygon_nr`, as seen by the rule, is the index into `input`.
///
/// All inputs must satisfy [`Polygon::validate`] and share one `gridsize`;
/// either a valid polygon is returned or the call aborts (after writing a
/// crash dump of the input).
pub fn process<R: WindRule>(input: &[&Polygon], rule: &R, context: &WindContext) -> Polygon {
  process_with(input, rule, context, &Options::default())
}

/// [`process`] with explicit [`Options`].
pub fn process_with<R: WindRule>(
  input: &[&Polygon],
  rule: &R,
  context: &WindContext,
  options: &Options,
) -> Polygon {
  run(input, rule, context, options).0
}

#[derive(Debug, Default, Clone, Copy)]
struct Stats {
  crossings_scheduled: usize,
  crossings_performed: usize,
}

fn run<R: WindRule>(
  input: &[&Polygon],
  rule: &R,
  context: &WindContext,
  options: &Options,
) -> (Polygon, Stats) {
  assert!(!input.is_empty(), "nothing to process");
  let gridsize = input[0].gridsize;
  assert!(
    gridsize.is_finite() && gridsize > 0.0,
    "degenerate gridsize {gridsize}"
  );
  for poly in input {
    debug_assert_ok!(poly.validate());
    assert_eq!(poly.gridsize, gridsize, "inputs disagree on gridsize");
  }

  let _dumper = CrashDumper { input };

  let mut status = Status {
    input,
    rule,
    context,
    paranoid: options.paranoid,
    y: 0,
    arena: Arena::new(),
    active: ActiveList::new(),
    queue: EventQueue::new(),
    xrow: XRow::new(),
    ending: Vec::new(),
    writer: StrokeWriter::new(),
    stats: Stats::default(),
    checks: Checks::default(),
  };
  status.writer.set_gridsize(gridsize);

  for (polygon_nr, poly) in input.iter().enumerate() {
    for stroke_idx in 0..poly.strokes.len() {
      status.advance_stroke(polygon_nr, stroke_idx, 0);
    }
  }

  let mut prev_y = None;
  while let Some(first) = status.queue.pop() {
    status.y = first.p.y;
    if let Some(prev) = prev_y {
      debug_assert!(prev <= status.y);
    }
    prev_y = Some(status.y);
    debug!("--- scanline {} ---", status.y);
    if status.paranoid {
      status.active.verify(&status.arena, status.y.saturating_sub(1));
      status.checks.intersecting.clear();
      status.checks.with_point.clear();
    }

    status.xrow.clear();
    let mut event = Some(first);
    while let Some(e) = event {
      status.xrow.add(e.p.x);
      status.apply(e);
      event = status.queue.pop_at(status.y);
    }

    status.xrow.sort();
    let mut range = SegRange::default();
    status.snap_positive(&mut range);
    status.snap_negative(&mut range);
    status.snap_ending();
    status.recalculate_windings(&mut range);
    if status.paranoid {
      status.check_scanline();
    }
  }

  let stats = status.stats;
  debug!(
    "{} segments, {} crossings scheduled, {} performed",
    status.arena.len(),
    stats.crossings_scheduled,
    stats.crossings_performed
  );
  let mut out = status.writer.finish();
  drop(status);

  // the main pass suppressed horizontal edges; put them back
  add_horizontals(&mut out, options.paranoid);
  (out, stats)
}

#[derive(Default)]
struct Checks {
  /// Crossing pairs scheduled and not yet resolved or dropped.
  seen_crossings: HashSet<(SegId, SegId)>,
  /// Segments that took part in an exchange on this scanline.
  intersecting: HashSet<SegId>,
  /// Segments that received a snap point on this scanline.
  with_point: HashSet<SegId>,
}

/// Conservative bracket of the active segments whose windings a scanline
/// may have disturbed.
#[derive(Default)]
struct SegRange {
  segmin: Option<SegId>,
  segmax: Option<SegId>,
}

impl SegRange {
  fn test_min(&mut self, seg: Option<SegId>, arena: &Arena, y: i32) {
    if let Some(s) = seg {
      // the x position at the *end* of the scanline decides, not the start
      // coordinate or the intersection coordinate
      match self.segmin {
        None => self.segmin = Some(s),
        Some(m) => {
          if Segment::xpos_cmp(&arena[s], &arena[m], y) == Ordering::Less {
            self.segmin = Some(s);
          }
        }
      }
    }
  }

  fn test_max(&mut self, seg: Option<SegId>, arena: &Arena, y: i32) {
    if let Some(s) = seg {
      match self.segmax {
        None => self.segmax = Some(s),
        Some(m) => {
          if Segment::xpos_cmp(&arena[s], &arena[m], y) == Ordering::Greater {
            self.segmax = Some(s);
          }
        }
      }
    }
  }
}

struct Status<'a, R> {
  input: &'a [&'a Polygon],
  rule: &'a R,
  context: &'a WindContext,
  paranoid: bool,
  y: i32,
  arena: Arena,
  active: ActiveList,
  queue: EventQueue,
  xrow: XRow,
  /// Segments retired from the active list on this scanline; they still
  /// need snapping before they can be forgotten.
  ending: Vec<SegId>,
  writer: StrokeWriter,
  stats: Stats,
  checks: Checks,
}

impl<R: WindRule> Status<'_, R> {
  /// Turn the stroke edge at `pos` into a segment and enqueue its opening
  /// event. Called once per stroke at startup and again each time a segment
  /// of the stroke retires.
  fn advance_stroke(&mut self, polygon_nr: usize, stroke_idx: usize, pos: usize) {
    let stroke = &self.input[polygon_nr].strokes[stroke_idx];
    if pos + 1 >= stroke.points.len() {
      return;
    }
    let a = stroke.points[pos];
    let b = stroke.points[pos + 1];
    debug_assert!(a.y <= b.y);
    let id = self
      .arena
      .alloc(a, b, stroke.fs, stroke.dir, polygon_nr, stroke_idx, pos + 1);
    let kind = if a.y == b.y {
      EventKind::Horizontal
    } else {
      EventKind::Start
    };
    trace!(
      "{} ({},{}) -> ({},{}) queued as {:?}",
      id,
      a.x,
      a.y,
      b.x,
      b.y,
      kind
    );
    self.queue.put(Event {
      kind,
      p: self.arena[id].a,
      s1: id,
      s2: None,
    });
  }

  fn apply(&mut self, e: Event) {
    match e.kind {
      EventKind::Horizontal => {
        let s = e.s1;
        trace!("horizontal {} at y={}", s, e.p.y);
        self.intersect_with_horizontal(s);
        let seg = &self.arena[s];
        let (polygon_nr, stroke, pos) = (seg.polygon_nr, seg.stroke, seg.stroke_pos);
        self.advance_stroke(polygon_nr, stroke, pos);
      }
      EventKind::End => {
        let s = e.s1;
        trace!("{} ends at ({},{})", s, e.p.x, e.p.y);
        if self.paranoid {
          self.checks.intersecting.remove(&s);
          self.checks.with_point.remove(&s);
        }
        let left = self.arena[s].left;
        let right = self.arena[s].right;
        self.active.delete(&mut self.arena, s);
        if let (Some(l), Some(r)) = (left, right) {
          self.schedule_crossing(l, r);
        }
        self.ending.push(s);
        let seg = &self.arena[s];
        let (polygon_nr, stroke, pos) = (seg.polygon_nr, seg.stroke, seg.stroke_pos);
        self.advance_stroke(polygon_nr, stroke, pos);
      }
      EventKind::Start => {
        let s = e.s1;
        trace!("{} starts at ({},{})", s, e.p.x, e.p.y);
        debug_assert_eq!(e.p, self.arena[s].a);
        self.active.insert(&mut self.arena, s);
        let left = self.arena[s].left;
        let right = self.arena[s].right;
        if let Some(l) = left {
          self.schedule_crossing(l, s);
        }
        if let Some(r) = right {
          self.schedule_crossing(s, r);
        }
        assert!(self.arena[s].b.y > self.y);
        self.queue.put(Event {
          kind: EventKind::End,
          p: self.arena[s].b,
          s1: s,
          s2: None,
        });
      }
      EventKind::Cross => {
        let s1 = e.s1;
        let s2 = e.s2.expect("crossing without second segment");
        if self.arena[s1].right == Some(s2) {
          debug_assert_eq!(self.arena[s2].left, Some(s1));
          self.exchange_two(s1, s2);
        } else {
          // there are segments in between by now; the crossing will be
          // rescheduled once the obstacles clear
          trace!("ignoring crossing {} x {}: not adjacent", s1, s2);
          debug_assert_ne!(self.arena[s2].left, Some(s1));
          let del1 = remove_partner(&mut self.arena[s1].scheduled, s2);
          let del2 = remove_partner(&mut self.arena[s2].scheduled, s1);
          assert!(del1 && del2, "dropped crossing was never scheduled");
          if self.paranoid {
            assert!(self.checks.seen_crossings.remove(&(s1, s2)));
          }
        }
      }
    }
  }

  /// Decide whether adjacent segments `s1` (left) and `s2` (right) cross
  /// above the sweep line, and if so enqueue the crossing.
  fn schedule_crossing(&mut self, s1: SegId, s2: SegId) {
    debug_assert_ne!(s1, s2);
    debug_assert_eq!(self.arena[s1].right, Some(s2));
    debug_assert_eq!(self.arena[s2].left, Some(s1));

    let a = &self.arena[s1];
    let b = &self.arena[s2];
    if a.maxx <= b.minx {
      // bounding boxes don't intersect
      return;
    }
    if a.scheduled.contains(&s2) {
      return;
    }

    let det = a.delta.x as i128 * b.delta.y as i128 - a.delta.y as i128 * b.delta.x as i128;
    if det == 0 {
      if a.k == b.k {
        trace!("{} and {} lie exactly on top of each other", s1, s2);
      }
      // parallel or coincident: no crossing either way
      return;
    }

    let asign2 = b.line_eq(a.a);
    let bsign2 = b.line_eq(a.b);
    if (asign2 < 0 && bsign2 < 0) || (asign2 > 0 && bsign2 > 0) {
      // s1 lies entirely on one side of s2
      return;
    }
    if asign2 == 0 || bsign2 == 0 {
      // single-point touch at an endpoint of s1
      return;
    }
    let asign1 = a.line_eq(b.a);
    let bsign1 = a.line_eq(b.b);
    if (asign1 < 0 && bsign1 < 0) || (asign1 > 0 && bsign1 > 0) {
      return;
    }
    if asign1 == 0 || bsign1 == 0 {
      return;
    }

    let la = a.k;
    let lb = b.k;
    let px = div_ceil(-la * b.delta.x as i128 + lb * a.delta.x as i128, det);
    let py = div_ceil(lb * a.delta.y as i128 - la * b.delta.y as i128, det);
    let p = Point::new(px as i32, py as i32);

    assert!(p.y >= self.y, "crossing {} x {} above the sweep line", s1, s2);
    debug_assert!(p.x >= a.minx && p.x <= a.maxx);
    debug_assert!(p.x >= b.minx && p.x <= b.maxx);
    trace!("schedule crossing {} x {} at ({},{})", s1, s2, p.x, p.y);

    if self.paranoid {
      assert!(
        self.checks.seen_crossings.insert((s1, s2)),
        "crossing scheduled twice"
      );
    }

    // both sides remember the partner: the pair may switch places and still
    // needs the fast lookup afterwards
    self.arena[s1].scheduled.push(s2);
    self.arena[s2].scheduled.push(s1);
    self.stats.crossings_scheduled += 1;
    self.queue.put(Event {
      kind: EventKind::Cross,
      p,
      s1,
      s2: Some(s2),
    });
  }

  fn exchange_two(&mut self, s1: SegId, s2: SegId) {
    if self.paranoid {
      self.checks.intersecting.insert(s1);
      self.checks.intersecting.insert(s2);
    }
    self.active.swap(&mut self.arena, s1, s2);
    self.stats.crossings_performed += 1;
    let left = self.arena[s2].left;
    let right = self.arena[s1].right;
    if let Some(l) = left {
      self.schedule_crossing(l, s2);
    }
    if let Some(r) = right {
      self.schedule_crossing(s1, r);
    }
  }

  /// A horizontal segment never enters the active list; instead it projects
  /// every active segment it spans onto the snap row, so the snap pass
  /// drives a point into each of them exactly where the horizontal runs.
  fn intersect_with_horizontal(&mut self, h: SegId) {
    let ha = self.arena[h].a;
    let hb = self.arena[h].b;
    let left = self.active.find_point(&self.arena, ha);
    let right = self.active.find_point(&self.arena, hb);

    // not strictly necessary, the event added it already
    self.xrow.add(ha.x);

    let Some(right) = right else {
      debug_assert!(left.is_none());
      return;
    };
    let mut cursor = match left {
      Some(l) => self.arena[l].right,
      None => self.active.leftmost(),
    };
    let stop = self.arena[right].right;
    while cursor != stop {
      let s = cursor.expect("horizontal span walked off the active list");
      let x = self.arena[s].xpos_int(self.y);
      trace!("...projects {} at ({},{})", s, x, self.y);
      debug_assert!(x >= ha.x && x <= hb.x);
      self.xrow.add(x);
      cursor = self.arena[s].right;
    }
  }

  /// Append `pos -> p` to the output (horizontal steps are withheld; the
  /// horizontal pass reconstructs them) and advance the segment's position.
  fn insert_point_into_segment(&mut self, s: SegId, p: Point) {
    assert_ne!(self.arena[s].pos, p, "segment snapped to its own position");
    if self.paranoid {
      assert!(self.arena[s].fs_out_ok);
      self.checks.with_point.insert(s);
    }
    let seg = &self.arena[s];
    if seg.fs_out.is_some() {
      trace!("{} receives point ({},{}) (drawing)", s, p.x, p.y);
      if seg.pos.y != p.y {
        let from = seg.pos;
        self.writer.moveto(from);
        self.writer.lineto(p);
      }
    } else {
      trace!("{} receives point ({},{}) (omitting)", s, p.x, p.y);
    }
    self.arena[s].pos = p;
  }

  /*
     positively sloped segments, walked left to right from each snap x:
        \+     \ +
  ------ I      \I
        -I\----  I
         I \   --I\---
         I  \    I \  -------
         +   \   +  \
  */
  fn snap_positive(&mut self, range: &mut SegRange) {
    let mut first: Option<SegId> = None;
    let mut last: Option<SegId> = None;
    for i in 0..self.xrow.len() {
      let bx = SnapBox::new(self.xrow.get(i), self.y);
      let found = self.active.find(&self.arena, bx.left2, bx.left2);
      let mut cursor = match found {
        Some(s) => self.arena[s].right,
        None => self.active.leftmost(),
      };
      while let Some(s) = cursor {
        if self.arena[s].a.y == self.y {
          // started on this scanline: mark it, but its position stays put
          self.arena[s].changed = true;
          last = Some(s);
          first = first.or(Some(s));
        } else if self.arena[s].delta.x <= 0 {
          // the other pass handles negative slopes
        } else {
          last = Some(s);
          first = first.or(Some(s));
          let d1 = self.arena[s].line_eq(bx.right1);
          let d2 = self.arena[s].line_eq(bx.right2);
          if d1 < 0 || d2 <= 0 {
            self.arena[s].changed = true;
            self.insert_point_into_segment(s, bx.right2);
          }
          // no early exit: the list is ordered at the bottom of the
          // scanline, anything further right may still reach into the box
        }
        cursor = self.arena[s].right;
      }
    }
    range.test_min(first, &self.arena, self.y);
    range.test_max(last, &self.arena, self.y);
  }

  /*
     negatively sloped segments, walked right to left:
     |   +   /|  +  /    /
     |   I  / |  I /    /
     |   I /  |  I/    /
     |   I/   |  I    /
     |   I    | /I   /
     |  /+    |/ +  /
  */
  fn snap_negative(&mut self, range: &mut SegRange) {
    let mut first: Option<SegId> = None;
    let mut last: Option<SegId> = None;
    for i in (0..self.xrow.len()).rev() {
      let bx = SnapBox::new(self.xrow.get(i), self.y);
      let mut cursor = self.active.find(&self.arena, bx.right2, bx.right2);
      while let Some(s) = cursor {
        if self.arena[s].a.y == self.y {
          self.arena[s].changed = true;
          last = Some(s);
          first = first.or(Some(s));
        } else if self.arena[s].delta.x > 0 {
          // handled by the positive pass
        } else {
          last = Some(s);
          first = first.or(Some(s));
          let d1 = self.arena[s].line_eq(bx.left1);
          let d2 = self.arena[s].line_eq(bx.left2);
          if d1 > 0 || d2 > 0 {
            self.arena[s].changed = true;
            self.insert_point_into_segment(s, bx.right2);
          }
        }
        cursor = self.arena[s].left;
      }
    }
    range.test_min(last, &self.arena, self.y);
    range.test_max(first, &self.arena, self.y);
  }

  /// Segments that ended on this scanline left the active list when their
  /// event was applied (crossings still had to happen next to them), so the
  /// sloped passes above never saw them; snap them against the full row of
  /// boxes instead. An intersection right above a nearly horizontal ending
  /// segment would otherwise snap *below* it.
  fn snap_ending(&mut self) {
    let ending = std::mem::take(&mut self.ending);
    for s in ending {
      debug_assert_eq!(self.arena[s].b.y, self.y);

      if self.xrow.len() == 1 {
        debug_assert_eq!(self.arena[s].b.x, self.xrow.get(0));
        let p = Point::new(self.xrow.get(0), self.y);
        self.insert_point_into_segment(s, p);
        continue;
      }

      let n = self.xrow.len();
      let mut order: Vec<usize> = (0..n).collect();
      if self.arena[s].delta.x < 0 {
        order.reverse();
      }
      let mut found = false;
      for i in order {
        let bx = SnapBox::new(self.xrow.get(i), self.y);
        let d0 = self.arena[s].line_eq(bx.left1);
        let d1 = self.arena[s].line_eq(bx.left2);
        let d2 = self.arena[s].line_eq(bx.right1);
        let d3 = self.arena[s].line_eq(bx.right2);
        let misses = (d0 <= 0 && d1 <= 0 && d2 <= 0 && d3 < 0)
          || (d0 >= 0 && d1 >= 0 && d2 >= 0 && d3 > 0);
        if !misses {
          self.insert_point_into_segment(s, bx.right2);
          found = true;
          break;
        }
      }
      // the segment's own end point is part of the row
      assert!(found, "ending segment missed every snap box");
    }
  }

  /// Re-evaluate windings across the disturbed range. The range is first
  /// widened across neighbors sharing an x position on this scanline, since
  /// the sloped passes cannot tell which of those is the outermost.
  fn recalculate_windings(&mut self, range: &mut SegRange) {
    if let Some(mut min) = range.segmin {
      while let Some(l) = self.arena[min].left {
        if Segment::xpos_cmp(&self.arena[min], &self.arena[l], self.y) == Ordering::Equal {
          min = l;
        } else {
          break;
        }
      }
      range.segmin = Some(min);
    }
    if let Some(mut max) = range.segmax {
      while let Some(r) = self.arena[max].right {
        if Segment::xpos_cmp(&self.arena[max], &self.arena[r], self.y) == Ordering::Equal {
          max = r;
        } else {
          break;
        }
      }
      range.segmax = Some(max);
    }

    if self.paranoid {
      // nothing outside the bracket may be marked
      let mut cursor = self.active.leftmost();
      while cursor != range.segmin {
        let s = cursor.expect("range minimum not on the active list");
        assert!(!self.arena[s].changed);
        cursor = self.arena[s].right;
      }
      let mut cursor = self.active.rightmost(&self.arena);
      while cursor != range.segmax {
        let s = cursor.expect("range maximum not on the active list");
        assert!(!self.arena[s].changed);
        cursor = self.arena[s].left;
      }
    }

    let (mut cursor, stop) = if self.paranoid {
      // evaluate everything so stale windings have nowhere to hide
      (self.active.leftmost(), None)
    } else {
      match (range.segmin, range.segmax) {
        (Some(min), Some(max)) => (Some(min), self.arena[max].right),
        _ => return,
      }
    };

    while cursor != stop {
      let Some(s) = cursor else { break };
      if self.arena[s].changed || self.paranoid {
        let wind = match self.arena[s].left {
          Some(l) => self.arena[l].wind,
          None => self.rule.start(self.context),
        };
        let seg = &self.arena[s];
        let next = self
          .rule
          .add(self.context, wind, seg.fs, seg.dir, seg.polygon_nr);
        let fs_out = self.rule.diff(&wind, &next);
        trace!(
          "{} {:?}/{}/{} {}",
          s,
          seg.dir,
          next.wind_nr,
          if next.is_filled { "fill" } else { "nofill" },
          if fs_out.is_some() { "draw" } else { "omit" }
        );
        let seg = &mut self.arena[s];
        assert!(
          seg.changed || seg.fs_out == fs_out,
          "winding changed outside the marked range"
        );
        seg.wind = next;
        seg.fs_out = fs_out;
        seg.changed = false;
        seg.fs_out_ok = true;
      }
      cursor = self.arena[s].right;
    }
  }

  /// Every segment that exchanged places on this scanline must have received
  /// a snap point, unless it already sits on its end point.
  fn check_scanline(&self) {
    for &s in &self.checks.intersecting {
      let seg = &self.arena[s];
      assert!(
        seg.pos == seg.b || self.checks.with_point.contains(&s),
        "{} intersected in scanline {} but received no point",
        s,
        self.y
      );
    }
  }
}

fn remove_partner(scheduled: &mut Vec<SegId>, partner: SegId) -> bool {
  match scheduled.iter().position(|&p| p == partner) {
    Some(idx) => {
      scheduled.swap_remove(idx);
      true
    }
    None => false,
  }
}

/// Event of the horizontal reconstruction pass, ordered left to right within
/// a scanline regardless of type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HorizontalEvent {
  p: Point,
  end: bool,
  s: SegId,
}

impl Ord for HorizontalEvent {
  fn cmp(&self, other: &Self) -> Ordering {
    (self.p.y, self.p.x, self.end, self.s).cmp(&(other.p.y, other.p.x, other.end, other.s))
  }
}

impl PartialOrd for HorizontalEvent {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

type HorizontalQueue = BinaryHeap<Reverse<HorizontalEvent>>;

fn enqueue_output_edge(arena: &mut Arena, queue: &mut HorizontalQueue, poly: &Polygon, stroke_idx: usize, pos: usize) {
  let stroke = &poly.strokes[stroke_idx];
  if pos + 1 >= stroke.points.len() {
    return;
  }
  let a = stroke.points[pos];
  let b = stroke.points[pos + 1];
  // the main pass never emits horizontal edges
  debug_assert!(a.y < b.y);
  let id = arena.alloc(a, b, stroke.fs, stroke.dir, 0, stroke_idx, pos + 1);
  queue.push(Reverse(HorizontalEvent {
    p: a,
    end: false,
    s: id,
  }));
}

/// Reconstruct the horizontal boundary edges of the output.
///
/// ```text
///    |..|        |...........|                 |           |
///    |..|        |...........|                 |           |
///    |..+        +        +..|                 +--+     +--+
///    |...........|        |..|                    |     |
///    |...........|        |..|                    |     |
/// ```
///
/// Walking each scanline left to right, fill toggles at every stroke
/// endpoint; wherever the gap between two events is filled, a horizontal
/// edge is missing and gets emitted. The toggling is even/odd no matter
/// which rule produced the polygon: the main-pass output is already
/// canonical.
fn add_horizontals(poly: &mut Polygon, paranoid: bool) {
  let mut arena = Arena::new();
  let mut active = ActiveList::new();
  let mut queue: HorizontalQueue = BinaryHeap::new();
  let mut emitted: Vec<Stroke> = Vec::new();

  for stroke_idx in 0..poly.strokes.len() {
    enqueue_output_edge(&mut arena, &mut queue, poly, stroke_idx, 0);
  }

  while let Some(Reverse(first)) = queue.pop() {
    let y = first.p.y;
    let mut x = 0;
    let mut fill = false;
    if paranoid {
      active.verify(&arena, y.saturating_sub(1));
    }

    let mut event = Some(first);
    while let Some(e) = event {
      if fill && x != e.p.x {
        assert!(x < e.p.x);
        trace!("horizontal edge ({},{}) -> ({},{})", x, y, e.p.x, y);
        if paranoid {
          // the gap may not slice through anything still active
          let stop = active.find_point(&arena, Point::new(x, y));
          let mut cursor = active.find_point(&arena, Point::new(e.p.x, y));
          while cursor != stop {
            let s = cursor.expect("horizontal gap walked off the active list");
            assert!(arena[s].a.y == y || arena[s].b.y == y);
            cursor = arena[s].left;
          }
        }
        emitted.push(Stroke {
          dir: Dir::Up,
          fs: FillStyle::SOLID,
          points: vec![Point::new(x, y), Point::new(e.p.x, y)],
        });
      }

      let s = e.s;
      if e.end {
        active.delete(&mut arena, s);
        let (stroke_idx, pos) = (arena[s].stroke, arena[s].stroke_pos);
        enqueue_output_edge(&mut arena, &mut queue, poly, stroke_idx, pos);
      } else {
        debug_assert_eq!(e.p, arena[s].a);
        active.insert(&mut arena, s);
        queue.push(Reverse(HorizontalEvent {
          p: arena[s].b,
          end: true,
          s,
        }));
      }

      x = e.p.x;
      fill = !fill;

      event = match queue.peek() {
        Some(Reverse(next)) if next.p.y == y => queue.pop().map(|Reverse(e)| e),
        _ => None,
      };
    }
    assert!(!fill, "fill bleeds past the last event of scanline {y}");
  }

  poly.strokes.extend(emitted);
}

/// Writes the offending input to a content-addressed PostScript file when a
/// processing call panics, then lets the panic continue.
struct CrashDumper<'a> {
  input: &'a [&'a Polygon],
}

impl Drop for CrashDumper<'_> {
  fn drop(&mut self) {
    if !std::thread::panicking() {
      return;
    }
    let mut md5 = md5::Context::new();
    for poly in self.input {
      for stroke in &poly.strokes {
        for p in &stroke.points {
          md5.consume(p.x.to_le_bytes());
          md5.consume(p.y.to_le_bytes());
        }
      }
    }
    let filename = format!("{:x}.ps", md5.compute());
    let dump = Polygon {
      gridsize: self.input[0].gridsize,
      strokes: self
        .input
        .iter()
        .flat_map(|poly| poly.strokes.iter().cloned())
        .collect(),
    };
    if dump.save_to_path(&filename).is_ok() {
      eprintln!("saving debug file \"{filename}\" to the current directory");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::wind::{EvenOdd, NonZero};

  fn path(gridsize: f64, pts: &[(i32, i32)]) -> Polygon {
    let pts: Vec<Point> = pts.iter().map(|&(x, y)| Point::new(x, y)).collect();
    Polygon::from_path(gridsize, FillStyle::SOLID, &pts)
  }

  fn run_one<R: WindRule>(poly: &Polygon, rule: &R) -> (Polygon, Stats) {
    let ctx = WindContext::new(1);
    let opts = Options { paranoid: true };
    run(&[poly], rule, &ctx, &opts)
  }

  #[test]
  fn bowtie_needs_exactly_one_crossing() {
    let poly = path(1.0, &[(0, 0), (10, 10), (10, 0), (0, 10)]);
    let (out, stats) = run_one(&poly, &EvenOdd);
    assert_eq!(stats.crossings_scheduled, 1);
    assert_eq!(stats.crossings_performed, 1);
    assert!(out.check());
  }

  #[test]
  fn coincident_edges_schedule_no_crossing() {
    let mut poly = Polygon::new(1.0);
    for _ in 0..2 {
      poly.strokes.push(Stroke {
        dir: Dir::Up,
        fs: FillStyle::SOLID,
        points: vec![Point::new(0, 0), Point::new(10, 10)],
      });
    }
    let (out, stats) = run_one(&poly, &EvenOdd);
    assert_eq!(stats.crossings_scheduled, 0);
    // both coincident edges toggle the fill, so both survive
    assert_eq!(out.num_edges(), 2);
  }

  #[test]
  fn parallel_edges_schedule_no_crossing() {
    let mut poly = Polygon::new(1.0);
    for x in [0, 1] {
      poly.strokes.push(Stroke {
        dir: Dir::Up,
        fs: FillStyle::SOLID,
        points: vec![Point::new(x, 0), Point::new(x + 10, 10)],
      });
    }
    let (_, stats) = run_one(&poly, &EvenOdd);
    assert_eq!(stats.crossings_scheduled, 0);
  }

  #[test]
  fn endpoint_touch_schedules_no_crossing() {
    // a sliver of b ends exactly on the long diagonal of a: a T junction
    let a = path(1.0, &[(0, 0), (10, 10), (20, 0)]);
    let b = path(1.0, &[(5, 0), (6, 0), (5, 5)]);
    let ctx = WindContext::new(2);
    let opts = Options { paranoid: true };
    let (out, stats) = run(&[&a, &b], &EvenOdd, &ctx, &opts);
    assert_eq!(stats.crossings_scheduled, 0);
    // ... but the touch point still snaps a vertex into the diagonal
    let diagonal = out
      .strokes
      .iter()
      .find(|s| s.points.contains(&Point::new(0, 0)) && s.points.len() > 1 && s.points[1].y > 0)
      .expect("diagonal missing from output");
    assert!(diagonal.points.contains(&Point::new(5, 5)));
    assert!(out.check());
  }

  #[test]
  fn empty_polygon_comes_back_empty() {
    let poly = Polygon::new(2.0);
    let (out, stats) = run_one(&poly, &NonZero);
    assert!(out.strokes.is_empty());
    assert_eq!(out.gridsize, 2.0);
    assert_eq!(stats.crossings_scheduled, 0);
  }

  #[test]
  fn crossing_point_rounds_up() {
    // crossing at (4.5, 4.5) must snap to (5,5), never below the scanline
    let mut poly = Polygon::new(1.0);
    poly.strokes.push(Stroke {
      dir: Dir::Up,
      fs: FillStyle::SOLID,
      points: vec![Point::new(0, 0), Point::new(9, 9)],
    });
    poly.strokes.push(Stroke {
      dir: Dir::Up,
      fs: FillStyle::SOLID,
      points: vec![Point::new(9, 0), Point::new(0, 9)],
    });
    let ctx = WindContext::new(1);
    let (out, stats) = run(&[&poly], &EvenOdd, &ctx, &Options { paranoid: true });
    assert_eq!(stats.crossings_performed, 1);
    let snapped: Vec<Point> = out
      .strokes
      .iter()
      .flat_map(|s| s.points.iter().copied())
      .filter(|p| p.y == 5)
      .collect();
    assert!(snapped.contains(&Point::new(5, 5)));
  }
}
