//! Reduced-visibility-graph vertex bookkeeping: which obstacles touch a
//! node and how, and its weighted bidirectional connections.
//!
//! Grounded on `original_source/src/mrvg/node.py` (`EncompassingObstacles`,
//! `Connections`, `Node`). Connections are keyed by `NodeHandle`, a stable
//! arena index, rather than by node reference.

use std::collections::{HashMap, HashSet};

use crate::geometry::Point;
use crate::polygon::Polygon;

/// A stable handle into `Graph`'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) u32);

/// Tracks, for one node, which obstacles touch it and how: as a convex
/// vertex, or "concavely" (interior, edge interior, or a non-convex
/// vertex). A node with any concave touch is permanently unusable for
/// pathfinding (invariant I2).
#[derive(Debug, Clone, Default)]
pub struct EncompassingObstacles {
	convex: HashSet<Polygon>,
	all: HashSet<Polygon>,
	concave_count: u32,
}

impl EncompassingObstacles {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a touch by `obstacle`. Returns `true` iff this is the touch
	/// that makes the node concave (a first concave touch).
	pub fn add(&mut self, obstacle: Polygon, is_convex: bool) -> bool {
		self.all.insert(obstacle.clone());
		if is_convex {
			self.convex.insert(obstacle);
			false
		} else {
			let became_concave = self.concave_count == 0;
			self.concave_count += 1;
			became_concave
		}
	}

	/// Whether `obstacle` has already registered a touch of any kind here.
	pub fn touches(&self, obstacle: &Polygon) -> bool {
		self.all.contains(obstacle)
	}

	/// The obstacles for which this node is a convex vertex.
	pub fn convex(&self) -> &HashSet<Polygon> {
		&self.convex
	}

	pub fn any_concave(&self) -> bool {
		self.concave_count > 0
	}
}

/// A point that is, or once was, a convex vertex of some obstacle.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
	pub position: Point,
	pub encompassing: EncompassingObstacles,
	/// `neighbour handle -> euclidean distance`, kept symmetric (I1).
	pub connections: HashMap<NodeHandle, f64>,
}

impl NodeData {
	pub fn new(position: Point) -> Self {
		Self { position, encompassing: EncompassingObstacles::new(), connections: HashMap::new() }
	}

	pub fn concave(&self) -> bool {
		self.encompassing.any_concave()
	}
}

/// Read-only view of one node, for the inspection surface used by
/// debugging/visualization. No stability guarantees across versions.
#[derive(Debug, Clone)]
pub struct NodeView {
	pub handle: NodeHandle,
	pub position: Point,
	pub concave: bool,
	pub neighbours: Vec<(NodeHandle, f64)>,
}
