//! Polygon geometric kernel: convexity baking, point containment, and the
//! segmented raycast against a single polygon's perimeter.
//!
//! Grounded on `original_source/src/mrvg/shapes.py` (`Polygon`, `Rectangle`,
//! vertex baking) and `bounding_box.py` (`AABB`).

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::geometry::{cross, Point, PointKey};
use crate::raycast::RaycastResult;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
	pub left: f64,
	pub bottom: f64,
	pub right: f64,
	pub top: f64,
}

impl Aabb {
	pub fn from_points(points: &[Point]) -> Self {
		if points.is_empty() {
			return Aabb { left: 0.0, bottom: 0.0, right: 1.0, top: 1.0 };
		}
		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for &(x, y) in points {
			min_x = min_x.min(x);
			min_y = min_y.min(y);
			max_x = max_x.max(x);
			max_y = max_y.max(y);
		}
		Aabb { left: min_x, bottom: min_y, right: max_x, top: max_y }
	}

	pub fn contains_point(&self, x: f64, y: f64) -> bool {
		self.left <= x && x <= self.right && self.bottom <= y && y <= self.top
	}

	/// Liang-Barsky style segment/box overlap test; true even when merely touching.
	pub fn intersects_segment(&self, ox: f64, oy: f64, dx: f64, dy: f64) -> bool {
		let (mut u1, mut u2) = (0.0f64, 1.0f64);
		for (p, q) in [
			(-dx, ox - self.left),
			(dx, self.right - ox),
			(-dy, oy - self.bottom),
			(dy, self.top - oy),
		] {
			if p == 0.0 {
				if q < 0.0 {
					return false;
				}
				continue;
			}
			let t = q / p;
			if p < 0.0 {
				if t > u1 {
					u1 = t;
				}
			} else if t < u2 {
				u2 = t;
			}
		}
		u1 <= u2 && u1 <= 1.0 && u2 >= 0.0
	}
}

/// A single baked polygon vertex.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
	pub x: f64,
	pub y: f64,
	/// `true` iff the interior angle at this vertex is less than 180 degrees.
	pub convex: bool,
	/// Vector from the previous vertex to this one.
	pub vec_from_prev: Point,
	/// Vector from this vertex to the next one.
	pub vec_to_next: Point,
}

impl Vertex {
	pub fn position(&self) -> Point {
		(self.x, self.y)
	}
}

struct PolygonInner {
	vertices: Vec<Vertex>,
	vertex_index: HashMap<PointKey, usize>,
	bounds: Aabb,
	/// Present only for polygons constructed via `Rectangle::new`; enables
	/// the axis-aligned fast path for `includes_point`.
	axis_aligned: Option<Aabb>,
}

/// An ordered ring of >= 3 vertices in counter-clockwise orientation.
///
/// Cheap to `Clone` (an `Arc` handle). Two polygons built from identical
/// vertex lists are still distinct: equality and hashing are by object
/// identity, not by value, matching
/// `original_source/src/mrvg/shapes.py::Polygon.__eq__`/`__hash__`.
#[derive(Clone)]
pub struct Polygon(Arc<PolygonInner>);

impl PartialEq for Polygon {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for Polygon {}

impl Hash for Polygon {
	fn hash<H: Hasher>(&self, state: &mut H) {
		(Arc::as_ptr(&self.0) as usize).hash(state);
	}
}

impl std::fmt::Debug for Polygon {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Polygon[")?;
		for (i, v) in self.0.vertices.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "({}, {})", v.x, v.y)?;
		}
		write!(f, "]")
	}
}

fn bake_vertices(ccw_vertices: &[Point]) -> Vec<Vertex> {
	let n = ccw_vertices.len();
	if n < 2 {
		return ccw_vertices
			.iter()
			.map(|&(x, y)| Vertex { x, y, convex: true, vec_from_prev: (0.0, 0.0), vec_to_next: (0.0, 0.0) })
			.collect();
	}
	(0..n)
		.map(|i| {
			let (vx, vy) = ccw_vertices[i];
			let (px, py) = ccw_vertices[(i + n - 1) % n];
			let (nx, ny) = ccw_vertices[(i + 1) % n];
			let pv = (vx - px, vy - py);
			let vn = (nx - vx, ny - vy);
			let convex = cross(pv, vn) > 0.0;
			Vertex { x: vx, y: vy, convex, vec_from_prev: pv, vec_to_next: vn }
		})
		.collect()
}

/// Twice the signed area of the vertex ring (shoelace sum); positive iff
/// wound counter-clockwise.
fn signed_area_x2(points: &[Point]) -> f64 {
	let n = points.len();
	let mut sum = 0.0;
	for i in 0..n {
		let (x0, y0) = points[i];
		let (x1, y1) = points[(i + 1) % n];
		sum += x0 * y1 - x1 * y0;
	}
	sum
}

impl Polygon {
	/// Constructs a polygon from a counter-clockwise vertex ring.
	///
	/// Fewer than 3 vertices, or a ring that isn't wound counter-clockwise
	/// (non-positive signed area), is a contract violation.
	pub fn new(ccw_vertices: Vec<Point>) -> Self {
		assert!(ccw_vertices.len() >= 3, "a polygon needs at least 3 vertices");
		assert!(signed_area_x2(&ccw_vertices) > 0.0, "vertex ring must be wound counter-clockwise");
		Self::from_vertices(ccw_vertices, None)
	}

	fn from_vertices(ccw_vertices: Vec<Point>, axis_aligned: Option<Aabb>) -> Self {
		let bounds = Aabb::from_points(&ccw_vertices);
		let vertices = bake_vertices(&ccw_vertices);
		let mut vertex_index = HashMap::with_capacity(vertices.len());
		for (i, v) in vertices.iter().enumerate() {
			vertex_index.insert(PointKey::from(v.position()), i);
		}
		Polygon(Arc::new(PolygonInner { vertices, vertex_index, bounds, axis_aligned }))
	}

	pub fn vertices(&self) -> &[Vertex] {
		&self.0.vertices
	}

	pub fn bounds(&self) -> Aabb {
		self.0.bounds
	}

	/// Looks up the baked vertex sitting at exactly `(x, y)`.
	fn vertex_at(&self, x: f64, y: f64) -> Option<&Vertex> {
		self.0.vertex_index.get(&PointKey::from((x, y))).map(|&i| &self.0.vertices[i])
	}

	/// Even-odd point-in-polygon test (axis-aligned fast path for rectangles).
	pub fn includes_point(&self, x: f64, y: f64) -> bool {
		if let Some(aabb) = self.0.axis_aligned {
			return aabb.contains_point(x, y);
		}
		if !self.0.bounds.contains_point(x, y) {
			return false;
		}
		let vs = &self.0.vertices;
		let n = vs.len();
		let mut inside = false;
		let mut j = n - 1;
		for i in 0..n {
			let (xi, yi) = (vs[i].x, vs[i].y);
			let (xj, yj) = (vs[j].x, vs[j].y);
			let crosses_y = (yi > y) != (yj > y);
			if crosses_y {
				let x_at_y = xi + (y - yi) / (yj - yi) * (xj - xi);
				if x < x_at_y {
					inside = !inside;
				}
			}
			j = i;
		}
		inside
	}

	/// Is direction `(dx, dy)` strictly inside the interior angle at convex
	/// vertex `v` (which must belong to this polygon)?
	/// zero product ("parallel to an edge") is *not* too narrow.
	pub fn vertex_vector_direction_too_narrow(&self, v: Point, dx: f64, dy: f64) -> bool {
		let vert = self.vertex_at(v.0, v.1).expect("vertex must belong to this polygon");
		let a = vert.vec_from_prev;
		let c = vert.vec_to_next;
		let a_cross_b = cross(a, (dx, dy));
		let c_cross_b = cross((dx, dy), c);
		a_cross_b * c_cross_b < 0.0
	}

	/// Raycasts `(origin, direction)` against every edge of this polygon,
	/// folding grazes into `result`. Short-circuits as soon as a full cross
	/// is found.
	pub fn raycast(&self, origin: Point, direction: Point, result: &mut RaycastResult) {
		for v in &self.0.vertices {
			use crate::geometry::{intersect_ray_segment, SegmentHit};
			match intersect_ray_segment(origin, direction, v.position(), v.vec_to_next) {
				SegmentHit::None => continue,
				SegmentHit::Blocked => {
					result.block();
					return;
				}
				SegmentHit::Graze(seg) => {
					if result.add_segment(seg) {
						return;
					}
				}
			}
		}
	}
}

/// Convenience constructor for an axis-aligned rectangle, equivalent to the
/// 4-vertex CCW polygon `(left,bottom) (right,bottom) (right,top) (left,top)`.
pub struct Rectangle;

impl Rectangle {
	pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Polygon {
		Polygon::from_vertices(
			vec![(left, bottom), (right, bottom), (right, top), (left, top)],
			Some(Aabb { left, bottom, right, top }),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn distinct_polygons_with_same_vertices_are_not_equal() {
		let a = Rectangle::new(0.0, 0.0, 1.0, 1.0);
		let b = Rectangle::new(0.0, 0.0, 1.0, 1.0);
		assert_ne!(a, b);
		assert_eq!(a, a.clone());
	}

	#[test]
	fn ccw_square_vertices_are_all_convex() {
		let p = Polygon::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
		assert!(p.vertices().iter().all(|v| v.convex));
	}

	#[test]
	fn clockwise_winding_is_a_contract_violation() {
		// same square as above, wound the wrong way
		let vertices = vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
		let result = std::panic::catch_unwind(|| Polygon::new(vertices));
		assert!(result.is_err(), "clockwise winding must panic");
	}

	#[test]
	fn fewer_than_three_vertices_is_a_contract_violation() {
		let result = std::panic::catch_unwind(|| Polygon::new(vec![(0.0, 0.0), (1.0, 0.0)]));
		assert!(result.is_err(), "fewer than 3 vertices must panic");
	}

	#[test]
	fn l_shape_has_one_concave_vertex() {
		// CCW L: (0,0) (2,0) (2,1) (1,1) (1,2) (0,2)
		let p = Polygon::new(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0)]);
		let concave: Vec<_> = p.vertices().iter().filter(|v| !v.convex).collect();
		assert_eq!(concave.len(), 1);
		assert_eq!((concave[0].x, concave[0].y), (1.0, 1.0));
	}

	#[test]
	fn rectangle_includes_point_is_axis_aligned() {
		let r = Rectangle::new(0.0, 0.0, 2.0, 2.0);
		assert!(r.includes_point(1.0, 1.0));
		assert!(r.includes_point(0.0, 0.0));
		assert!(!r.includes_point(3.0, 1.0));
	}

	#[test]
	fn narrow_direction_into_right_angle_corner() {
		let r = Rectangle::new(0.0, 0.0, 1.0, 1.0);
		// vertex (1,0): inbound from (0,0), outbound to (1,1); interior angle
		// points up-and-left from this corner.
		assert!(r.vertex_vector_direction_too_narrow((1.0, 0.0), -1.0, 1.0));
		assert!(!r.vertex_vector_direction_too_narrow((1.0, 0.0), 1.0, 1.0));
	}

	#[test]
	fn parallel_to_edge_is_not_too_narrow() {
		let r = Rectangle::new(0.0, 0.0, 1.0, 1.0);
		// direction along the outbound edge itself from (1,0) to (1,1)
		assert!(!r.vertex_vector_direction_too_narrow((1.0, 0.0), 0.0, 1.0));
	}
}
