//! Accumulates grazing segments from multiple obstacles into a single
//! blocked/grazed/free verdict.
//!
//! Grounded on `original_source/src/mrvg/shapes.py`'s `RaycastResult`.

/// Which side of the ray a grazing touch occurred on.
///
/// Two grazes on the same side along overlapping ray-parameter ranges mean
/// the ray passes a polygon entirely on one side; two grazes on opposite
/// sides mean the ray actually crossed through (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
	Left,
	Right,
}

/// `(start, stop, side)`: a ray-parameter sub-interval (in `[0, 1]`) along
/// which the ray grazes a polygon edge without crossing its interior.
pub type RaycastSegment = (f64, f64, Side);

/// Accumulates grazing segments across possibly-many obstacles and
/// collapses them into a `blocked` / `grazed` / `free` verdict.
#[derive(Debug, Clone, Default)]
pub struct RaycastResult {
	/// `None` once the ray has been proven blocked; otherwise the sorted,
	/// disjoint list of grazing segments seen so far.
	segments: Option<Vec<RaycastSegment>>,
}

impl RaycastResult {
	pub fn new() -> Self {
		Self { segments: Some(Vec::new()) }
	}

	/// Marks the result as unconditionally blocked (a full cross was seen).
	pub fn block(&mut self) {
		self.segments = None;
	}

	/// Folds in a grazing segment. Returns `true` if this causes the result
	/// to become blocked (a different-side overlap was found).
	///
	/// Only merges with existing segments starting at or before `segment`'s
	/// own start; an existing segment starting strictly after but still
	/// overlapping `segment`'s span is left unmerged (matches
	/// `original_source/src/mrvg/shapes.py`'s `RaycastResult.add_segment`).
	pub fn add_segment(&mut self, segment: RaycastSegment) -> bool {
		let segments = match &mut self.segments {
			None => return true,
			Some(s) => s,
		};

		let (start, mut stop, side) = segment;
		let i = segments.partition_point(|&(s, _, _)| s < start);

		let mut i = i;
		while i < segments.len() {
			let (p_start, p_stop, p_side) = segments[i];
			if p_start > start {
				break;
			}
			if p_side != side {
				self.segments = None;
				return true;
			}
			stop = stop.max(p_stop);
			segments.remove(i);
		}
		segments.insert(i, (start, stop, side));
		false
	}

	/// A full cross was found, or two opposite-side grazes overlapped.
	pub fn blocked(&self) -> bool {
		self.segments.is_none()
	}

	/// Not blocked, but at least one grazing touch was recorded.
	pub fn grazed(&self) -> bool {
		matches!(&self.segments, Some(s) if !s.is_empty())
	}

	/// Neither blocked nor grazed: the ray is entirely clear.
	pub fn free(&self) -> bool {
		matches!(&self.segments, Some(s) if s.is_empty())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_free() {
		let r = RaycastResult::new();
		assert!(r.free());
		assert!(!r.grazed());
		assert!(!r.blocked());
	}

	#[test]
	fn same_side_grazes_merge() {
		let mut r = RaycastResult::new();
		assert!(!r.add_segment((0.1, 0.2, Side::Left)));
		assert!(!r.add_segment((0.15, 0.3, Side::Left)));
		assert!(r.grazed());
		assert!(!r.blocked());
	}

	#[test]
	fn opposite_side_overlap_blocks() {
		let mut r = RaycastResult::new();
		assert!(!r.add_segment((0.1, 0.2, Side::Left)));
		assert!(r.add_segment((0.15, 0.3, Side::Right)));
		assert!(r.blocked());
	}

	#[test]
	fn disjoint_grazes_stay_grazed() {
		let mut r = RaycastResult::new();
		assert!(!r.add_segment((0.1, 0.2, Side::Left)));
		assert!(!r.add_segment((0.5, 0.6, Side::Right)));
		assert!(r.grazed());
		assert!(!r.blocked());
	}

	#[test]
	fn once_blocked_stays_blocked() {
		let mut r = RaycastResult::new();
		r.block();
		assert!(r.add_segment((0.0, 1.0, Side::Left)));
		assert!(r.blocked());
	}
}
