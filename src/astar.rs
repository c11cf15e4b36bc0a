//! Open/closed set bookkeeping for the bidirectional-edge-weighted A*
//! search, with decrease-key support and deterministic tie-breaks.
//!
//! Grounded on `original_source/src/mrvg/graph.py` (`AStarSets`,
//! `PathfindingNode`); the priority-queue mechanics (negate-for-min-first,
//! manual better-`g` gate before pushing) are lifted from this crate's own
//! pre-existing `graph.rs::Graph::pathfind`.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use noisy_float::types::{n64, N64};
use priority_queue::PriorityQueue;

use crate::geometry::{Point, PointKey};

/// One expanded or frontier node of the search.
#[derive(Debug)]
pub struct PathNode {
	pub point: Point,
	pub g: f64,
	pub h: f64,
	pub previous: Option<Rc<PathNode>>,
}

impl PathNode {
	pub fn f(&self) -> f64 {
		self.g + self.h
	}

	pub fn root(point: Point, h: f64) -> Rc<Self> {
		Rc::new(Self { point, g: 0.0, h, previous: None })
	}
}

/// `(-f, g, point, insertion order)`: greatest priority pops first, so
/// smallest `f` wins; ties prefer the larger `g` ("prefer longer-explored"),
/// then canonical point order, then insertion order.
type Priority = (N64, N64, (N64, N64), u64);

fn priority(n: &PathNode, seq: u64) -> Priority {
	(n64(-n.f()), n64(n.g), (n64(n.point.0), n64(n.point.1)), seq)
}

/// Open/closed sets for one `find_path` invocation.
pub struct OpenSet {
	by_point: HashMap<PointKey, Rc<PathNode>>,
	queue: PriorityQueue<PointKey, Priority>,
	closed: HashSet<PointKey>,
	seq: u64,
}

impl OpenSet {
	pub fn new() -> Self {
		Self { by_point: HashMap::new(), queue: PriorityQueue::new(), closed: HashSet::new(), seq: 0 }
	}

	/// Opens (or relaxes) `candidate`. Discards it if an existing open
	/// record for the same point already has an equal-or-better `g`.
	pub fn open(&mut self, candidate: PathNode) {
		let key = PointKey::from(candidate.point);
		if let Some(existing) = self.by_point.get(&key) {
			if candidate.g >= existing.g {
				return;
			}
		}
		self.seq += 1;
		let prio = priority(&candidate, self.seq);
		let rc = Rc::new(candidate);
		self.by_point.insert(key, rc);
		self.queue.push(key, prio);
	}

	/// Marks `point` closed without ever opening it (used to seed the start
	/// point itself, which is never a frontier candidate).
	pub fn close_point(&mut self, point: Point) {
		self.closed.insert(PointKey::from(point));
	}

	pub fn is_closed(&self, point: Point) -> bool {
		self.closed.contains(&PointKey::from(point))
	}

	pub fn is_empty(&self) -> bool {
		self.queue.is_empty()
	}

	/// Pops and closes the open record with smallest `f` (ties as above).
	pub fn pop_best(&mut self) -> Option<Rc<PathNode>> {
		let (key, _) = self.queue.pop()?;
		let node = self.by_point.remove(&key).expect("queue and map stay in sync");
		self.closed.insert(key);
		Some(node)
	}
}

/// Reconstructs `[start, ..., end]` by following `previous` links back from
/// `last`, consuming no adjacent duplicates.
pub fn reconstruct_path(last: Rc<PathNode>, end: Point) -> Vec<Point> {
	let mut points = vec![end];
	let mut current = if last.point == end { last.previous.clone() } else { Some(last) };
	while let Some(n) = current {
		if points.last() != Some(&n.point) {
			points.push(n.point);
		}
		current = n.previous.clone();
	}
	points.reverse();
	points
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn worse_g_is_discarded() {
		let mut open = OpenSet::new();
		open.open(PathNode { point: (1.0, 1.0), g: 5.0, h: 0.0, previous: None });
		open.open(PathNode { point: (1.0, 1.0), g: 7.0, h: 0.0, previous: None });
		let best = open.pop_best().unwrap();
		assert_eq!(best.g, 5.0);
	}

	#[test]
	fn better_g_replaces_existing() {
		let mut open = OpenSet::new();
		open.open(PathNode { point: (1.0, 1.0), g: 7.0, h: 0.0, previous: None });
		open.open(PathNode { point: (1.0, 1.0), g: 3.0, h: 0.0, previous: None });
		let best = open.pop_best().unwrap();
		assert_eq!(best.g, 3.0);
		assert!(open.is_empty());
	}

	#[test]
	fn smallest_f_pops_first() {
		let mut open = OpenSet::new();
		open.open(PathNode { point: (0.0, 0.0), g: 10.0, h: 0.0, previous: None });
		open.open(PathNode { point: (1.0, 0.0), g: 1.0, h: 1.0, previous: None });
		let best = open.pop_best().unwrap();
		assert_eq!(best.point, (1.0, 0.0));
	}

	#[test]
	fn reconstructs_start_to_end_without_adjacent_duplicates() {
		let root = PathNode::root((0.0, 0.0), 0.0);
		let mid = Rc::new(PathNode { point: (1.0, 1.0), g: 1.0, h: 0.0, previous: Some(root) });
		let path = reconstruct_path(mid, (2.0, 2.0));
		assert_eq!(path, vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
	}
}
