//! The incremental reduced visibility graph: obstacle insertion and
//! shortest-path queries, serialized behind a single mutation lock.
//!
//! Grounded on `original_source/src/mrvg/graph.py` (`Graph`, `AStarSets`,
//! `PathfindingNode`) for the algorithm; the arena-of-nodes-plus-handles
//! shape and the single-lock-guarded state come from this crate's own
//! pre-existing `graph.rs::Graph` (a generic graph over lightweight node
//! ids), generalized from a road-network domain to this one's
//! convex-vertex domain.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Mutex;

use indexmap::IndexSet;

use crate::astar::{reconstruct_path, OpenSet, PathNode};
use crate::geometry::{dist, Point, PointKey};
use crate::node::{NodeData, NodeHandle, NodeView};
use crate::polygon::Polygon;
use crate::quadtree::{ObstacleIndex, QuadtreeConfig};
use crate::raycast::RaycastResult;

struct GraphInner {
	obstacles: IndexSet<Polygon>,
	nodes: Vec<NodeData>,
	node_index: HashMap<PointKey, NodeHandle>,
	spatial: ObstacleIndex,
}

impl GraphInner {
	fn new(quadtree: QuadtreeConfig) -> Self {
		Self {
			obstacles: IndexSet::new(),
			nodes: Vec::new(),
			node_index: HashMap::new(),
			spatial: ObstacleIndex::with_config(quadtree),
		}
	}

	fn get_or_create_node(&mut self, p: Point) -> (NodeHandle, bool) {
		let key = PointKey::from(p);
		if let Some(&h) = self.node_index.get(&key) {
			return (h, false);
		}
		let h = NodeHandle(self.nodes.len() as u32);
		self.nodes.push(NodeData::new(p));
		self.node_index.insert(key, h);
		(h, true)
	}

	fn node(&self, h: NodeHandle) -> &NodeData {
		&self.nodes[h.0 as usize]
	}

	fn node_mut(&mut self, h: NodeHandle) -> &mut NodeData {
		&mut self.nodes[h.0 as usize]
	}

	fn link(&mut self, a: NodeHandle, b: NodeHandle, weight: f64) {
		self.node_mut(a).connections.insert(b, weight);
		self.node_mut(b).connections.insert(a, weight);
	}

	fn sever_pair(&mut self, a: NodeHandle, b: NodeHandle) {
		self.node_mut(a).connections.remove(&b);
		self.node_mut(b).connections.remove(&a);
	}

	fn sever_all(&mut self, a: NodeHandle) {
		let neighbours: Vec<NodeHandle> = self.node(a).connections.keys().copied().collect();
		for b in neighbours {
			self.node_mut(b).connections.remove(&a);
		}
		self.node_mut(a).connections.clear();
	}

	/// Obstacles already in the graph whose area contains `p` (candidates
	/// from the spatial index, exactly verified — the index may over-report,
	/// never under-report).
	fn obstacles_containing(&self, p: Point) -> Vec<Polygon> {
		self.spatial
			.candidates_at_point(p.0, p.1)
			.into_iter()
			.filter(|o| o.includes_point(p.0, p.1))
			.collect()
	}

	/// Raycasts the segment `(x0,y0)-(x1,y1)` against every obstacle in the
	/// graph, optionally checking `prioritise` first.
	fn raycast(&self, x0: f64, y0: f64, x1: f64, y1: f64, prioritise: Option<&Polygon>) -> RaycastResult {
		let mut result = RaycastResult::new();
		let origin = (x0, y0);
		let direction = (x1 - x0, y1 - y0);

		if let Some(p) = prioritise {
			p.raycast(origin, direction, &mut result);
			if result.blocked() {
				return result;
			}
		}

		for o in self.spatial.candidates_on_segment(x0, y0, x1 - x0, y1 - y0) {
			if Some(&o) == prioritise {
				continue;
			}
			o.raycast(origin, direction, &mut result);
			if result.blocked() {
				break;
			}
		}
		result
	}

	/// The four-phase incremental update: convex-vertex nodes, concavity
	/// sweep, edge pruning, new-node linking.
	fn add_obstacle(&mut self, obstacle: Polygon) {
		assert!(!self.obstacles.contains(&obstacle), "this obstacle is already in the graph");
		log::trace!("add_obstacle: phase A (convex-vertex nodes)");

		let mut created_convex_nodes: Vec<NodeHandle> = Vec::new();

		for v in obstacle.vertices() {
			if !v.convex {
				continue;
			}
			let (handle, created) = self.get_or_create_node(v.position());
			if created {
				for o in self.obstacles_containing(v.position()) {
					self.node_mut(handle).encompassing.add(o, false);
				}
			}
			// A convex touch never itself flips concavity; any severing here
			// is a no-op for a brand-new node (it has no connections yet).
			let became_concave = self.node_mut(handle).encompassing.add(obstacle.clone(), true);
			if became_concave {
				self.sever_all(handle);
			}
			if created && !self.node(handle).concave() {
				created_convex_nodes.push(handle);
			}
		}

		let handles: Vec<NodeHandle> = (0..self.nodes.len() as u32).map(NodeHandle).collect();

		log::trace!("add_obstacle: phase B (concavity sweep)");
		for &h in &handles {
			if self.node(h).encompassing.touches(&obstacle) {
				continue;
			}
			let p = self.node(h).position;
			if !obstacle.includes_point(p.0, p.1) {
				continue;
			}
			let became_concave = self.node_mut(h).encompassing.add(obstacle.clone(), false);
			if became_concave {
				self.sever_all(h);
			}
		}

		log::trace!("add_obstacle: phase C (edge pruning)");
		for &h in &handles {
			if self.node(h).concave() {
				continue;
			}
			let n_pos = self.node(h).position;
			let n_is_convex_of_o = self.node(h).encompassing.convex().contains(&obstacle);
			let neighbours: Vec<NodeHandle> = self.node(h).connections.keys().copied().collect();
			for m in neighbours {
				let m_pos = self.node(m).position;
				let (dx, dy) = (m_pos.0 - n_pos.0, m_pos.1 - n_pos.1);
				if n_is_convex_of_o && obstacle.vertex_vector_direction_too_narrow(n_pos, dx, dy) {
					self.sever_pair(h, m);
					continue;
				}
				if self.raycast(n_pos.0, n_pos.1, m_pos.0, m_pos.1, Some(&obstacle)).blocked() {
					self.sever_pair(h, m);
				}
			}
		}

		log::trace!("add_obstacle: phase D (new-node linking)");
		for &n in &created_convex_nodes {
			let n_pos = self.node(n).position;
			let n_convex: Vec<Polygon> = self.node(n).encompassing.convex().iter().cloned().collect();
			for &m in &handles {
				if m == n || self.node(m).concave() || self.node(n).connections.contains_key(&m) {
					continue;
				}
				let m_pos = self.node(m).position;
				let (dx, dy) = (m_pos.0 - n_pos.0, m_pos.1 - n_pos.1);
				if n_convex.iter().any(|o| o.vertex_vector_direction_too_narrow(n_pos, dx, dy)) {
					continue;
				}
				let m_convex: Vec<Polygon> = self.node(m).encompassing.convex().iter().cloned().collect();
				let (idx, idy) = (n_pos.0 - m_pos.0, n_pos.1 - m_pos.1);
				if m_convex.iter().any(|o| o.vertex_vector_direction_too_narrow(m_pos, idx, idy)) {
					continue;
				}
				if self.raycast(n_pos.0, n_pos.1, m_pos.0, m_pos.1, Some(&obstacle)).blocked() {
					continue;
				}
				self.link(n, m, dist(n_pos, m_pos));
			}
		}

		self.spatial.insert(obstacle.clone());
		self.obstacles.insert(obstacle);
		log::debug!("add_obstacle: committed, {} obstacles total", self.obstacles.len());
	}

	fn find_path(&self, start: Point, end: Point) -> Option<Vec<Point>> {
		if !self.raycast(start.0, start.1, end.0, end.1, None).blocked() {
			log::trace!("find_path: direct visibility");
			return Some(vec![start, end]);
		}

		let start_handle = self.node_index.get(&PointKey::from(start)).copied();
		let end_handle = self.node_index.get(&PointKey::from(end)).copied();
		let h_to_end = |p: Point| dist(p, end);

		let root = PathNode::root(start, h_to_end(start));
		let mut open = OpenSet::new();

		match start_handle {
			Some(sh) if !self.node(sh).concave() => {
				open.close_point(start);
				for (&nh, &w) in self.node(sh).connections.iter() {
					let np = self.node(nh).position;
					open.open(PathNode { point: np, g: w, h: h_to_end(np), previous: Some(root.clone()) });
				}
			}
			_ => {
				for node in &self.nodes {
					if node.connections.is_empty() {
						continue;
					}
					if !self.raycast(start.0, start.1, node.position.0, node.position.1, None).blocked() {
						let np = node.position;
						open.open(PathNode { point: np, g: dist(start, np), h: h_to_end(np), previous: Some(root.clone()) });
					}
				}
			}
		}

		let mut terminal: Option<Rc<PathNode>> = None;
		while let Some(current) = open.pop_best() {
			if current.point == end {
				terminal = Some(current);
				break;
			}
			if end_handle.is_none() && !self.raycast(current.point.0, current.point.1, end.0, end.1, None).blocked() {
				terminal = Some(current);
				break;
			}
			let handle = match self.node_index.get(&PointKey::from(current.point)) {
				Some(&h) => h,
				None => continue,
			};
			for (&nh, &w) in self.node(handle).connections.iter() {
				let np = self.node(nh).position;
				if open.is_closed(np) {
					continue;
				}
				open.open(PathNode { point: np, g: current.g + w, h: h_to_end(np), previous: Some(current.clone()) });
			}
		}

		terminal.map(|t| reconstruct_path(t, end))
	}

	fn inspect(&self) -> Vec<NodeView> {
		(0..self.nodes.len() as u32)
			.map(|i| {
				let h = NodeHandle(i);
				let n = self.node(h);
				NodeView {
					handle: h,
					position: n.position,
					concave: n.concave(),
					neighbours: n.connections.iter().map(|(&h, &w)| (h, w)).collect(),
				}
			})
			.collect()
	}
}

/// A mutable reduced visibility graph over polygonal obstacles.
///
/// All mutation (`add_obstacle`) and all queries (`raycast`, `find_path`,
/// `obstacles`, `inspect`) are serialized behind one exclusive lock: no
/// caller ever observes a partially-updated graph.
pub struct Graph {
	inner: Mutex<GraphInner>,
}

impl Graph {
	/// Builds a graph seeded with `initial_obstacles`, inserted one at a time.
	pub fn new(initial_obstacles: impl IntoIterator<Item = Polygon>) -> Self {
		Self::with_config(initial_obstacles, QuadtreeConfig::default())
	}

	/// As [`Graph::new`], but with explicit tuning for the spatial accelerator.
	pub fn with_config(initial_obstacles: impl IntoIterator<Item = Polygon>, quadtree: QuadtreeConfig) -> Self {
		let g = Self { inner: Mutex::new(GraphInner::new(quadtree)) };
		for o in initial_obstacles {
			g.add_obstacle(o);
		}
		g
	}

	/// Inserts `obstacle`.
	///
	/// # Panics
	/// Panics if this exact `Polygon` (by identity) is already present.
	pub fn add_obstacle(&self, obstacle: Polygon) {
		self.inner.lock().unwrap().add_obstacle(obstacle);
	}

	/// A snapshot of the obstacles currently in the graph, in insertion order.
	pub fn obstacles(&self) -> Vec<Polygon> {
		self.inner.lock().unwrap().obstacles.iter().cloned().collect()
	}

	/// Raycasts the segment `(x0,y0)-(x1,y1)` against every obstacle,
	/// optionally evaluating `prioritise` first.
	pub fn raycast(&self, x0: f64, y0: f64, x1: f64, y1: f64, prioritise: Option<&Polygon>) -> RaycastResult {
		self.inner.lock().unwrap().raycast(x0, y0, x1, y1, prioritise)
	}

	/// Finds a shortest obstacle-avoiding path from `start` to `end`, or
	/// `None` if none exists.
	pub fn find_path(&self, start: Point, end: Point) -> Option<Vec<Point>> {
		self.inner.lock().unwrap().find_path(start, end)
	}

	/// A read-only snapshot of every node's coordinates, concavity, and
	/// neighbours, for debugging/visualization; no stability guarantees
	/// across versions.
	pub fn inspect(&self) -> Vec<NodeView> {
		self.inner.lock().unwrap().inspect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::polygon::Rectangle;

	#[test]
	fn empty_graph_direct_line() {
		let g = Graph::new(vec![]);
		let path = g.find_path((0.0, 0.0), (1.0, 1.0)).unwrap();
		assert_eq!(path, vec![(0.0, 0.0), (1.0, 1.0)]);
		// P8: a returned [s, e] path must actually be unblocked.
		let r = g.raycast(0.0, 0.0, 1.0, 1.0, None);
		assert!(r.free() || r.grazed());
	}

	#[test]
	fn direct_visibility_skips_distant_obstacle() {
		let g = Graph::new(vec![Rectangle::new(10.0, 10.0, 11.0, 11.0)]);
		let path = g.find_path((0.0, 0.0), (1.0, 0.0)).unwrap();
		assert_eq!(path, vec![(0.0, 0.0), (1.0, 0.0)]);
		// P8: a returned [s, e] path must actually be unblocked.
		let r = g.raycast(0.0, 0.0, 1.0, 0.0, None);
		assert!(r.free() || r.grazed());
	}

	#[test]
	fn duplicate_obstacle_insertion_panics() {
		let rect = Rectangle::new(0.0, 0.0, 1.0, 1.0);
		let g = Graph::new(vec![]);
		g.add_obstacle(rect.clone());
		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| g.add_obstacle(rect)));
		assert!(result.is_err());
	}

	#[test]
	fn one_blocker_detour_routes_around() {
		let g = Graph::new(vec![Rectangle::new(1.0, -1.0, 2.0, 1.0)]);
		let path = g.find_path((0.0, 0.0), (3.0, 0.0)).unwrap();
		assert_eq!(*path.first().unwrap(), (0.0, 0.0));
		assert_eq!(*path.last().unwrap(), (3.0, 0.0));
		assert!(path.len() >= 3);

		let length: f64 = path.windows(2).map(|w| dist(w[0], w[1])).sum();
		let via_top = dist((0.0, 0.0), (1.0, 1.0)) + dist((1.0, 1.0), (2.0, 1.0)) + dist((2.0, 1.0), (3.0, 0.0));
		let via_bottom = dist((0.0, 0.0), (1.0, -1.0)) + dist((1.0, -1.0), (2.0, -1.0)) + dist((2.0, -1.0), (3.0, 0.0));
		assert!((length - via_top).abs() < 1e-6 || (length - via_bottom).abs() < 1e-6);
	}

	#[test]
	fn concave_l_corner_is_isolated() {
		let g = Graph::new(vec![Rectangle::new(0.0, 0.0, 3.0, 1.0), Rectangle::new(0.0, 1.0, 1.0, 3.0)]);
		let corner = g.inspect().into_iter().find(|n| n.position == (1.0, 1.0)).unwrap();
		assert!(corner.concave);
		assert!(corner.neighbours.is_empty());
	}

	#[test]
	fn plus_sign_path_uses_only_convex_vertices() {
		let g = Graph::new(vec![Rectangle::new(-5.0, -1.0, 5.0, 1.0), Rectangle::new(-1.0, -5.0, 1.0, 5.0)]);
		let path = g.find_path((-2.0, -2.0), (2.0, 2.0)).unwrap();
		assert!(path.len() >= 3);
		let convex_points: std::collections::HashSet<_> =
			g.obstacles().iter().flat_map(|o| o.vertices().iter().filter(|v| v.convex).map(|v| v.position())).collect();
		for wp in &path[1..path.len() - 1] {
			assert!(convex_points.contains(wp), "waypoint {:?} is not a convex obstacle vertex", wp);
		}
	}

	#[test]
	fn grid_of_obstacles_leaves_far_rectangle_convex_and_connected() {
		use itertools::iproduct;

		let g = Graph::new(vec![]);
		for (x, y) in iproduct!(0..5, 0..5) {
			let (cx, cy) = (x as f64, y as f64);
			g.add_obstacle(Rectangle::new(cx - 0.25, cy - 0.25, cx + 0.25, cy + 0.25));
		}
		g.add_obstacle(Rectangle::new(9.0, 9.0, 10.0, 10.0));

		let far_corners: Vec<_> = g.inspect().into_iter().filter(|n| n.position.0 >= 9.0 && n.position.1 >= 9.0).collect();
		assert_eq!(far_corners.len(), 4);
		for c in &far_corners {
			assert!(!c.concave);
		}
	}

	#[test]
	fn raycast_is_order_independent() {
		let a = Rectangle::new(1.0, -1.0, 2.0, 1.0);
		let b = Rectangle::new(3.0, -1.0, 4.0, 1.0);
		let ga = Graph::new(vec![a.clone(), b.clone()]);
		let gb = Graph::new(vec![b, a]);
		let ra = ga.raycast(0.0, 0.0, 5.0, 0.0, None);
		let rb = gb.raycast(0.0, 0.0, 5.0, 0.0, None);
		assert_eq!(ra.blocked(), rb.blocked());
	}
}
