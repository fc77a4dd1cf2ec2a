pub mod grid;
pub mod sparse_hash;

pub use grid::{GridBounds, GridCoord, TerrainClass, TerrainGrid};
pub use sparse_hash::SparseHashGrid;
