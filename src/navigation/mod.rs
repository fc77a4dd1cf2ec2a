//! Grid navigation: terrain cost, A* planning, direct-line checks and
//! waypoint following

pub mod direct_path;
pub mod pathfinding;
pub mod route;
pub mod terrain_cost;

pub use direct_path::{is_direct_path_safe, line_cells};
pub use pathfinding::{Path, PathPlanner};
pub use route::{ActiveRoute, RouteStep};
pub use terrain_cost::{is_passable, TerrainCostModel};
