//! A mutable reduced visibility graph over polygonal obstacles, with
//! incremental obstacle insertion and A* shortest-path queries.
//!
//! An obstacle is inserted once, never removed or moved; the graph updates
//! its visibility edges incrementally rather than rebuilding from scratch,
//! so a [`Graph`] stays cheap to query as obstacles accumulate. All state
//! lives behind a single lock (see [`Graph`]'s docs), so a `Graph` can be
//! shared across threads without further synchronization.
//!
//! ```
//! use mrvg::{Graph, Rectangle};
//!
//! let graph = Graph::new(vec![Rectangle::new(1.0, -1.0, 2.0, 1.0)]);
//! let path = graph.find_path((0.0, 0.0), (3.0, 0.0)).expect("a detour exists");
//! assert_eq!(path[0], (0.0, 0.0));
//! assert_eq!(*path.last().unwrap(), (3.0, 0.0));
//! ```

mod astar;
mod geometry;
mod graph;
mod node;
mod polygon;
mod quadtree;
mod raycast;

pub use geometry::Point;
pub use graph::Graph;
pub use node::{NodeHandle, NodeView};
pub use polygon::{Polygon, Rectangle, Vertex};
pub use quadtree::QuadtreeConfig;
pub use raycast::{RaycastResult, Side};
