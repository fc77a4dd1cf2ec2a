//! Tile grid and terrain classification

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::world::TerrainMap;

/// Integer cell coordinate (column, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    pub col: i32,
    pub row: i32,
}

impl GridCoord {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Cell containing a world position
    #[inline]
    pub fn from_world(pos: Vec2, tile_size: f32) -> Self {
        Self {
            col: (pos.x / tile_size).floor() as i32,
            row: (pos.y / tile_size).floor() as i32,
        }
    }

    /// World position of the cell center
    #[inline]
    pub fn center(&self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.col as f32 + 0.5) * tile_size,
            (self.row as f32 + 0.5) * tile_size,
        )
    }

    #[inline]
    pub fn offset(&self, dc: i32, dr: i32) -> Self {
        Self { col: self.col + dc, row: self.row + dr }
    }

    #[inline]
    pub fn manhattan(&self, other: &Self) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

/// Map extent in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub cols: i32,
    pub rows: i32,
}

impl GridBounds {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self { cols, rows }
    }

    #[inline]
    pub fn contains(&self, cell: GridCoord) -> bool {
        cell.col >= 0 && cell.row >= 0 && cell.col < self.cols && cell.row < self.rows
    }

    /// Flat row-major index, None when out of bounds
    #[inline]
    pub fn index_of(&self, cell: GridCoord) -> Option<usize> {
        if self.contains(cell) {
            Some((cell.row * self.cols + cell.col) as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn coord_of(&self, index: usize) -> GridCoord {
        let cols = self.cols.max(1) as usize;
        GridCoord::new((index % cols) as i32, (index / cols) as i32)
    }

    pub fn cell_count(&self) -> usize {
        (self.cols.max(0) as usize) * (self.rows.max(0) as usize)
    }
}

/// Terrain classification of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainClass {
    #[default]
    Walkable,
    /// Lava and similar: blocks ground units and taxes nearby cells
    Hazardous,
    /// Walls and rocks: blocks ground units, no proximity tax
    Impassable,
    /// Mud and sand: ground units cross at a multiplied step cost
    Slow,
}

impl TerrainClass {
    pub fn is_hazard(&self) -> bool {
        matches!(self, TerrainClass::Hazardous)
    }
}

/// Dense terrain storage, one class per cell
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    bounds: GridBounds,
    tile_size: f32,
    cells: Vec<TerrainClass>,
}

impl TerrainGrid {
    /// All-walkable grid
    pub fn new(cols: i32, rows: i32, tile_size: f32) -> Self {
        let bounds = GridBounds::new(cols, rows);
        Self {
            bounds,
            tile_size,
            cells: vec![TerrainClass::Walkable; bounds.cell_count()],
        }
    }

    /// Build from text rows: `.` walkable, `~` hazardous, `#` impassable,
    /// `%` slow
    ///
    /// Short rows are padded with walkable cells.
    pub fn from_rows(rows: &[&str], tile_size: f32) -> Self {
        let cols = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        let mut grid = Self::new(cols, rows.len() as i32, tile_size);
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let class = match ch {
                    '~' => TerrainClass::Hazardous,
                    '#' => TerrainClass::Impassable,
                    '%' => TerrainClass::Slow,
                    _ => TerrainClass::Walkable,
                };
                grid.set(GridCoord::new(c as i32, r as i32), class);
            }
        }
        grid
    }

    #[inline]
    pub fn get(&self, cell: GridCoord) -> Option<TerrainClass> {
        self.bounds.index_of(cell).map(|i| self.cells[i])
    }

    /// Out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, cell: GridCoord, class: TerrainClass) {
        if let Some(i) = self.bounds.index_of(cell) {
            self.cells[i] = class;
        }
    }

    /// Fill an inclusive rectangle
    pub fn fill(&mut self, from: GridCoord, to: GridCoord, class: TerrainClass) {
        for row in from.row.min(to.row)..=from.row.max(to.row) {
            for col in from.col.min(to.col)..=from.col.max(to.col) {
                self.set(GridCoord::new(col, row), class);
            }
        }
    }

    pub fn hazard_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_hazard()).count()
    }
}

impl TerrainMap for TerrainGrid {
    fn classify(&self, cell: GridCoord) -> TerrainClass {
        self.get(cell).unwrap_or(TerrainClass::Impassable)
    }

    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn bounds(&self) -> GridBounds {
        self.bounds
    }
}
