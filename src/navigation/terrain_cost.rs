//! Passability and hazard proximity cost

use crate::core::config::NavigationConfig;
use crate::core::types::MovementProfile;
use crate::spatial::grid::{GridCoord, TerrainClass};
use crate::world::TerrainMap;

/// Offsets with Manhattan distance 1, then 2
const PROXIMITY_OFFSETS: [(i32, i32, u8); 12] = [
    (0, -1, 1),
    (1, 0, 1),
    (0, 1, 1),
    (-1, 0, 1),
    (0, -2, 2),
    (1, -1, 2),
    (2, 0, 2),
    (1, 1, 2),
    (0, 2, 2),
    (-1, 1, 2),
    (-2, 0, 2),
    (-1, -1, 2),
];

/// Whether a unit with this profile may stand in `cell`
#[inline]
pub fn is_passable(terrain: &dyn TerrainMap, cell: GridCoord, movement: MovementProfile) -> bool {
    if !terrain.in_bounds(cell) {
        return false;
    }
    match movement {
        MovementProfile::Flying => true,
        MovementProfile::Ground => {
            matches!(terrain.classify(cell), TerrainClass::Walkable | TerrainClass::Slow)
        }
    }
}

/// Extra movement cost for slow ground and cells near hazardous terrain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainCostModel {
    /// Penalty per hazard at Manhattan distance 1
    pub adjacent_penalty: f32,
    /// Penalty per hazard at Manhattan distance 2
    pub near_penalty: f32,
    /// Step cost multiplier for entering slow ground, at least 1
    pub slow_multiplier: f32,
}

impl TerrainCostModel {
    pub fn new(adjacent_penalty: f32, near_penalty: f32, slow_multiplier: f32) -> Self {
        Self { adjacent_penalty, near_penalty, slow_multiplier }
    }

    pub fn from_config(config: &NavigationConfig) -> Self {
        Self::new(
            config.hazard_penalty_adjacent,
            config.hazard_penalty_near,
            config.slow_terrain_cost,
        )
    }

    /// Factor applied to the base step cost of entering `cell`
    #[inline]
    pub fn step_multiplier(
        &self,
        terrain: &dyn TerrainMap,
        cell: GridCoord,
        movement: MovementProfile,
    ) -> f32 {
        match (movement, terrain.classify(cell)) {
            (MovementProfile::Ground, TerrainClass::Slow) => self.slow_multiplier,
            _ => 1.0,
        }
    }

    /// Additive penalty for entering `cell`; the cell itself is not counted
    pub fn proximity_penalty(&self, terrain: &dyn TerrainMap, cell: GridCoord) -> f32 {
        PROXIMITY_OFFSETS
            .iter()
            .filter_map(|&(dc, dr, dist)| {
                let probe = cell.offset(dc, dr);
                if !terrain.in_bounds(probe) || !terrain.classify(probe).is_hazard() {
                    return None;
                }
                Some(if dist == 1 { self.adjacent_penalty } else { self.near_penalty })
            })
            .sum()
    }

    /// Penalty as paid by a unit with this profile; flyers pay nothing
    #[inline]
    pub fn penalty_for(
        &self,
        terrain: &dyn TerrainMap,
        cell: GridCoord,
        movement: MovementProfile,
    ) -> f32 {
        match movement {
            MovementProfile::Flying => 0.0,
            MovementProfile::Ground => self.proximity_penalty(terrain, cell),
        }
    }
}
