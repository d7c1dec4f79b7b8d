//! The active list: all non-horizontal segments currently crossing the sweep
//! line, ordered by their x-intercept with it.
//!
//! The level-0 chain is doubly linked through the segment records themselves
//! (`Segment::left` / `Segment::right`), which gives O(1) neighbor access and
//! O(1) swap of adjacent segments. A skiplist tower on top of the chain makes
//! `find`, `insert` and `delete` O(log n) expected.
//!
//! Ordering never stores coordinates: every comparison asks on which side of
//! a segment's carrying line a probe point lies. Probes are points of the
//! current scanline, so the answers agree with the x-intercept order as long
//! as crossings are swapped when their event is reached, which is exactly
//! what the sweep driver does.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::data::point::Point;
use crate::segment::{Arena, SegId, Segment};

const MAX_HEIGHT: usize = 12;

pub(crate) struct ActiveList {
  /// Successor of the head sentinel per level; `head[0]` is the leftmost
  /// active segment.
  head: [Option<SegId>; MAX_HEIGHT],
  /// Levels 1.. of each segment's tower, indexed by serial number.
  towers: Vec<Tower>,
  rng: SmallRng,
  len: usize,
}

#[derive(Clone, Default)]
struct Tower {
  next: Vec<Option<SegId>>,
  /// `None` is the head sentinel.
  prev: Vec<Option<SegId>>,
}

/// `true` when the probe line orders at or to the right of `seg`: the probe
/// start decides, ties fall to the probe end (slope), and a probe collinear
/// with the segment orders to the right so that later arrivals insert after
/// earlier ones.
fn probe_at_or_right_of(seg: &Segment, p1: Point, p2: Point) -> bool {
  let mut d = seg.line_eq(p1);
  if d == 0 {
    d = seg.line_eq(p2);
    if d == 0 {
      return true;
    }
  }
  d < 0
}

impl ActiveList {
  pub fn new() -> ActiveList {
    ActiveList {
      head: [None; MAX_HEIGHT],
      towers: Vec::new(),
      rng: SmallRng::seed_from_u64(0x51ee_7115),
      len: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  fn next_at(&self, arena: &Arena, node: Option<SegId>, level: usize) -> Option<SegId> {
    match node {
      None => self.head[level],
      Some(id) if level == 0 => arena[id].right,
      Some(id) => self.towers[id.index()].next[level - 1],
    }
  }

  /// The rightmost segment ordering at or left of the probe line through
  /// `p1` and `p2`, or `None` when the probe is left of the whole list.
  pub fn find(&self, arena: &Arena, p1: Point, p2: Point) -> Option<SegId> {
    let mut node: Option<SegId> = None;
    for level in (0..MAX_HEIGHT).rev() {
      while let Some(n) = self.next_at(arena, node, level) {
        if probe_at_or_right_of(&arena[n], p1, p2) {
          node = Some(n);
        } else {
          break;
        }
      }
    }
    node
  }

  pub fn find_point(&self, arena: &Arena, p: Point) -> Option<SegId> {
    self.find(arena, p, p)
  }

  pub fn leftmost(&self) -> Option<SegId> {
    self.head[0]
  }

  pub fn rightmost(&self, arena: &Arena) -> Option<SegId> {
    let mut node: Option<SegId> = None;
    for level in (0..MAX_HEIGHT).rev() {
      while let Some(n) = self.next_at(arena, node, level) {
        node = Some(n);
      }
    }
    node
  }

  fn ensure_tower(&mut self, id: SegId) {
    if self.towers.len() <= id.index() {
      self.towers.resize(id.index() + 1, Tower::default());
    }
  }

  /// Insert `id` at the position given by its own endpoints.
  pub fn insert(&mut self, arena: &mut Arena, id: SegId) {
    let (a, b) = (arena[id].a, arena[id].b);
    self.ensure_tower(id);

    let mut preds: [Option<SegId>; MAX_HEIGHT] = [None; MAX_HEIGHT];
    let mut node: Option<SegId> = None;
    for level in (0..MAX_HEIGHT).rev() {
      while let Some(n) = self.next_at(arena, node, level) {
        if probe_at_or_right_of(&arena[n], a, b) {
          node = Some(n);
        } else {
          break;
        }
      }
      preds[level] = node;
    }

    // level 0, threaded through the segment records
    let pred = preds[0];
    let succ = self.next_at(arena, pred, 0);
    arena[id].left = pred;
    arena[id].right = succ;
    match pred {
      None => self.head[0] = Some(id),
      Some(p) => arena[p].right = Some(id),
    }
    if let Some(s) = succ {
      arena[s].left = Some(id);
    }

    // tower levels
    let mut height = 1;
    while height < MAX_HEIGHT && self.rng.gen::<bool>() {
      height += 1;
    }
    self.towers[id.index()].next.clear();
    self.towers[id.index()].prev.clear();
    for level in 1..height {
      let pred = preds[level];
      let succ = self.next_at(arena, pred, level);
      let tower = &mut self.towers[id.index()];
      tower.next.push(succ);
      tower.prev.push(pred);
      match pred {
        None => self.head[level] = Some(id),
        Some(p) => self.towers[p.index()].next[level - 1] = Some(id),
      }
      if let Some(s) = succ {
        self.towers[s.index()].prev[level - 1] = Some(id);
      }
    }

    self.len += 1;
  }

  pub fn delete(&mut self, arena: &mut Arena, id: SegId) {
    let left = arena[id].left;
    let right = arena[id].right;
    match left {
      None => self.head[0] = right,
      Some(l) => arena[l].right = right,
    }
    if let Some(r) = right {
      arena[r].left = left;
    }
    arena[id].left = None;
    arena[id].right = None;

    let tower = std::mem::take(&mut self.towers[id.index()]);
    for (i, (&next, &prev)) in tower.next.iter().zip(tower.prev.iter()).enumerate() {
      let level = i + 1;
      match prev {
        None => self.head[level] = next,
        Some(p) => self.towers[p.index()].next[i] = next,
      }
      if let Some(n) = next {
        self.towers[n.index()].prev[i] = prev;
      }
    }

    self.len -= 1;
  }

  /// Exchange two adjacent segments, `s1` being the left one.
  pub fn swap(&mut self, arena: &mut Arena, s1: SegId, s2: SegId) {
    debug_assert_eq!(arena[s1].right, Some(s2));
    debug_assert_eq!(arena[s2].left, Some(s1));

    let left = arena[s1].left;
    let right = arena[s2].right;
    match left {
      None => self.head[0] = Some(s2),
      Some(l) => arena[l].right = Some(s2),
    }
    arena[s2].left = left;
    arena[s2].right = Some(s1);
    arena[s1].left = Some(s2);
    arena[s1].right = right;
    if let Some(r) = right {
      arena[r].left = Some(s1);
    }

    // Tower levels where both segments appear: being adjacent at level 0,
    // they are adjacent there as well. Levels carrying only one of the two
    // keep their links; order above level 0 is unaffected by an adjacent
    // exchange.
    let shared = self.towers[s1.index()]
      .next
      .len()
      .min(self.towers[s2.index()].next.len());
    for i in 0..shared {
      let level = i + 1;
      debug_assert_eq!(self.towers[s1.index()].next[i], Some(s2));
      let prev = self.towers[s1.index()].prev[i];
      let next = self.towers[s2.index()].next[i];
      match prev {
        None => self.head[level] = Some(s2),
        Some(p) => self.towers[p.index()].next[i] = Some(s2),
      }
      self.towers[s2.index()].prev[i] = prev;
      self.towers[s2.index()].next[i] = Some(s1);
      self.towers[s1.index()].prev[i] = Some(s2);
      self.towers[s1.index()].next[i] = next;
      if let Some(n) = next {
        self.towers[n.index()].prev[i] = Some(s1);
      }
    }
  }

  /// Verify that consecutive segments are ordered by x-intercept at `y`.
  pub fn verify(&self, arena: &Arena, y: i32) {
    let mut cursor = self.head[0];
    let mut count = 0;
    while let Some(id) = cursor {
      count += 1;
      let next = arena[id].right;
      if let Some(n) = next {
        assert_ne!(
          Segment::xpos_cmp(&arena[id], &arena[n], y),
          std::cmp::Ordering::Greater,
          "active list out of order at y={}: {} (x={}) right of {} (x={})",
          y,
          arena[id].nr,
          arena[id].xpos(y),
          arena[n].nr,
          arena[n].xpos(y),
        );
        assert_eq!(arena[n].left, Some(id));
      }
      cursor = next;
    }
    assert_eq!(count, self.len);
  }
}
