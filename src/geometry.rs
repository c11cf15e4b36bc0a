//! 2D vector arithmetic and the segmented raycast primitive.
//!
//! Grounded on `original_source/src/mrvg/shapes.py` (`_cross_product`,
//! `_vec_subtract`, `_raycast_segment`, `_colinear_segments_overlapping_region`).

use crate::raycast::{RaycastSegment, Side};

/// A point, or a free vector, in the plane.
pub type Point = (f64, f64);

/// Bit-exact key for a `Point`, usable in `HashMap`/`HashSet` (`f64` itself
/// is neither `Hash` nor `Eq`). Two points are the same key iff they have
/// identical bit patterns, which is exactly what invariant I4 ("unique node
/// per coordinate pair") requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointKey(u64, u64);

impl From<Point> for PointKey {
	fn from(p: Point) -> Self {
		PointKey(p.0.to_bits(), p.1.to_bits())
	}
}

/// `a - b`
#[inline]
pub fn sub(a: Point, b: Point) -> Point {
	(a.0 - b.0, a.1 - b.1)
}

/// 2D cross product `a.x*b.y - a.y*b.x`.
#[inline]
pub fn cross(a: Point, b: Point) -> f64 {
	a.0 * b.1 - a.1 * b.0
}

/// Euclidean distance between two points.
#[inline]
pub fn dist(a: Point, b: Point) -> f64 {
	let (dx, dy) = sub(a, b);
	(dx * dx + dy * dy).sqrt()
}

/// Outcome of intersecting ray `R(r) = r_o + r*r_d, r in [0,1]` against
/// target `T(t) = t_o + t*t_d, t in [0,1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentHit {
	/// No intersection at all.
	None,
	/// A full cross: the ray passes strictly through the target's interior.
	Blocked,
	/// The ray merely grazes the target, along the given ray-parameter sub-interval.
	Graze(RaycastSegment),
}

/// Intersects ray `(r_o, r_d)` against target segment `(t_o, t_d)`, both
/// parameterised over `[0, 1]`.
pub fn intersect_ray_segment(r_o: Point, r_d: Point, t_o: Point, t_d: Point) -> SegmentHit {
	let c = cross(r_d, t_d);
	let delta = sub(t_o, r_o);

	if c == 0.0 {
		// parallel
		if cross(delta, r_d) != 0.0 {
			return SegmentHit::None; // parallel, not colinear
		}
		return match colinear_overlap(r_o, r_d, t_o, t_d) {
			Some(seg) => SegmentHit::Graze(seg),
			None => SegmentHit::None,
		};
	}

	let r_t = cross(delta, t_d) / c;
	if !(r_t > 0.0 && r_t < 1.0) {
		return SegmentHit::None;
	}

	let t_t = cross(delta, r_d) / c;
	if t_t > 0.0 && t_t < 1.0 {
		return SegmentHit::Blocked;
	}
	if t_t == 0.0 {
		let side = if c > 0.0 { Side::Right } else { Side::Left };
		return SegmentHit::Graze((r_t, r_t, side));
	}
	if t_t == 1.0 {
		let side = if c > 0.0 { Side::Left } else { Side::Right };
		return SegmentHit::Graze((r_t, r_t, side));
	}
	SegmentHit::None
}

/// Overlap interval of two colinear segments, along whichever axis of `r_d`
/// is non-degenerate. `None` if the segments don't overlap within `[0, 1]`.
fn colinear_overlap(r_o: Point, r_d: Point, t_o: Point, t_d: Point) -> Option<RaycastSegment> {
	let axis = if r_d.0.abs() > r_d.1.abs() { 0 } else { 1 };
	let (r_d_axis, r_o_axis, t_o_axis, t_d_axis) = if axis == 0 {
		(r_d.0, r_o.0, t_o.0, t_d.0)
	} else {
		(r_d.1, r_o.1, t_o.1, t_d.1)
	};
	if r_d_axis == 0.0 {
		return None;
	}

	let k = t_d_axis / r_d_axis;
	let r_i = (t_o_axis - r_o_axis) / r_d_axis;
	let r_f = r_i + k;

	let (r_i, r_f, side) = if k < 0.0 {
		(r_f, r_i, Side::Left)
	} else {
		(r_i, r_f, Side::Right)
	};

	if r_i > 1.0 || r_f < 0.0 {
		return None;
	}
	Some((r_i.max(0.0), r_f.min(1.0), side))
}
