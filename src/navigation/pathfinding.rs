//! A* pathfinding over the tile grid
//!
//! Nodes live in a flat arena indexed by cell id, with parents stored as
//! indices. The arena is stamped with a generation counter so a planner
//! can be reused across requests without clearing it.
//!
//! Frontier order is ascending f, then ascending h, then insertion order.
//! Neighbors are expanded N, E, S, W, then NE, SE, SW, NW. Together these
//! make every plan a pure function of its inputs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::core::config::{NavigationConfig, NeighborMode};
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{MovementProfile, Vec2};
use crate::navigation::terrain_cost::{is_passable, TerrainCostModel};
use crate::spatial::grid::GridCoord;
use crate::world::TerrainMap;

const CARDINAL_STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONAL_STEPS: [(i32, i32); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

/// Planned route
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Cells from start to goal, both included
    pub cells: Vec<GridCoord>,
    /// Cell centers to walk through, start cell excluded
    pub waypoints: Vec<Vec2>,
    /// Total traversal cost (g of the goal)
    pub cost: f32,
}

impl Path {
    pub fn goal(&self) -> Option<GridCoord> {
        self.cells.last().copied()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct ArenaNode {
    g: f32,
    parent: Option<usize>,
    closed: bool,
    generation: u32,
}

impl Default for ArenaNode {
    fn default() -> Self {
        Self {
            g: f32::INFINITY,
            parent: None,
            closed: false,
            generation: 0,
        }
    }
}

/// Reusable node storage, one slot per grid cell
#[derive(Debug, Default)]
struct SearchArena {
    nodes: Vec<ArenaNode>,
    generation: u32,
}

impl SearchArena {
    fn begin(&mut self, cell_count: usize) {
        if self.nodes.len() != cell_count {
            self.nodes.clear();
            self.nodes.resize(cell_count, ArenaNode::default());
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: stale stamps could alias, wipe everything
            self.nodes.iter_mut().for_each(|n| *n = ArenaNode::default());
            self.generation = 1;
        }
    }

    #[inline]
    fn get(&self, index: usize) -> ArenaNode {
        let node = self.nodes[index];
        if node.generation == self.generation {
            node
        } else {
            ArenaNode { generation: self.generation, ..ArenaNode::default() }
        }
    }

    #[inline]
    fn set(&mut self, index: usize, mut node: ArenaNode) {
        node.generation = self.generation;
        self.nodes[index] = node;
    }
}

/// Frontier entry; reversed ordering turns BinaryHeap into a min-heap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: OrderedFloat<f32>,
    h: OrderedFloat<f32>,
    seq: u64,
    g: OrderedFloat<f32>,
    index: usize,
}

impl OpenEntry {
    fn key(&self) -> (OrderedFloat<f32>, OrderedFloat<f32>, u64) {
        (self.f, self.h, self.seq)
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* planner with a reusable arena
#[derive(Debug)]
pub struct PathPlanner {
    config: NavigationConfig,
    cost_model: TerrainCostModel,
    arena: SearchArena,
    frontier: BinaryHeap<OpenEntry>,
    /// Neighbor offsets with their base cost; only the first `step_count` are live
    steps: [(i32, i32, f32); 8],
    step_count: usize,
    last_expansions: usize,
}

impl PathPlanner {
    pub fn new(config: NavigationConfig) -> Self {
        let mut steps = [(0, 0, 0.0); 8];
        for (slot, &(dc, dr)) in steps.iter_mut().zip(CARDINAL_STEPS.iter()) {
            *slot = (dc, dr, config.cardinal_cost);
        }
        for (slot, &(dc, dr)) in steps[4..].iter_mut().zip(DIAGONAL_STEPS.iter()) {
            *slot = (dc, dr, config.diagonal_cost);
        }
        let step_count = match config.neighbor_mode {
            NeighborMode::Cardinal => 4,
            NeighborMode::Octile => 8,
        };
        Self {
            cost_model: TerrainCostModel::from_config(&config),
            config,
            steps,
            step_count,
            arena: SearchArena::default(),
            frontier: BinaryHeap::new(),
            last_expansions: 0,
        }
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Nodes expanded by the most recent request
    pub fn last_expansions(&self) -> usize {
        self.last_expansions
    }

    /// Admissible, consistent estimate of remaining cost
    ///
    /// Cardinal mode is plain Manhattan distance. Octile mode replaces
    /// pairs of orthogonal steps with diagonal ones where it is cheaper,
    /// so it never exceeds the true cost when diagonals are allowed.
    pub fn heuristic(&self, from: GridCoord, to: GridCoord) -> f32 {
        let dx = (from.col - to.col).abs() as f32;
        let dy = (from.row - to.row).abs() as f32;
        let c = self.config.cardinal_cost;
        match self.config.neighbor_mode {
            NeighborMode::Cardinal => (dx + dy) * c,
            NeighborMode::Octile => {
                let d = self.config.diagonal_cost.min(2.0 * c);
                let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
                hi * c + lo * (d - c)
            }
        }
    }

    /// Plan between two world positions
    pub fn plan(
        &mut self,
        terrain: &dyn TerrainMap,
        start: Vec2,
        goal: Vec2,
        movement: MovementProfile,
    ) -> Result<Path> {
        let tile = terrain.tile_size();
        self.plan_cells(
            terrain,
            GridCoord::from_world(start, tile),
            GridCoord::from_world(goal, tile),
            movement,
        )
    }

    /// Plan between two cells
    ///
    /// An impassable goal is swapped for the nearest passable cell within
    /// `goal_search_radius`. The start cell is always expandable so a unit
    /// standing on bad ground can still walk off it.
    pub fn plan_cells(
        &mut self,
        terrain: &dyn TerrainMap,
        start: GridCoord,
        goal: GridCoord,
        movement: MovementProfile,
    ) -> Result<Path> {
        self.last_expansions = 0;
        let bounds = terrain.bounds();
        let no_path = SkirmishError::NoPathFound { from: start, to: goal };

        let Some(start_idx) = bounds.index_of(start) else {
            return Err(no_path);
        };
        let target = if is_passable(terrain, goal, movement) {
            goal
        } else {
            match self.nearest_passable(terrain, goal, movement) {
                Some(cell) => {
                    debug!(?goal, substitute = ?cell, "goal impassable, using nearest passable cell");
                    cell
                }
                None => return Err(no_path),
            }
        };
        let Some(goal_idx) = bounds.index_of(target) else {
            return Err(no_path);
        };

        if start_idx == goal_idx {
            return Ok(Path { cells: vec![start], waypoints: Vec::new(), cost: 0.0 });
        }

        self.arena.begin(bounds.cell_count());
        self.frontier.clear();
        let mut seq: u64 = 0;

        self.arena.set(start_idx, ArenaNode { g: 0.0, ..ArenaNode::default() });
        let h0 = self.heuristic(start, target);
        self.frontier.push(OpenEntry {
            f: OrderedFloat(h0),
            h: OrderedFloat(h0),
            seq,
            g: OrderedFloat(0.0),
            index: start_idx,
        });

        while let Some(entry) = self.frontier.pop() {
            let mut node = self.arena.get(entry.index);
            if node.closed || entry.g.0 > node.g {
                continue;
            }

            if entry.index == goal_idx {
                let path = self.reconstruct(terrain, goal_idx, node.g);
                debug!(
                    ?start,
                    goal = ?target,
                    cost = path.cost,
                    steps = path.waypoints.len(),
                    expansions = self.last_expansions,
                    "path found"
                );
                return Ok(path);
            }

            node.closed = true;
            self.arena.set(entry.index, node);
            self.last_expansions += 1;
            if self.last_expansions > self.config.max_expansions {
                debug!(?start, goal = ?target, "expansion budget exhausted");
                return Err(no_path);
            }

            let current = bounds.coord_of(entry.index);
            let steps = self.steps;
            for &(dc, dr, step_cost) in &steps[..self.step_count] {
                let next = current.offset(dc, dr);
                if !is_passable(terrain, next, movement) {
                    continue;
                }
                if dc != 0
                    && dr != 0
                    && !(is_passable(terrain, current.offset(dc, 0), movement)
                        && is_passable(terrain, current.offset(0, dr), movement))
                {
                    // No cutting corners past blocked cells
                    continue;
                }
                let Some(next_idx) = bounds.index_of(next) else {
                    continue;
                };
                let neighbor = self.arena.get(next_idx);
                if neighbor.closed {
                    continue;
                }

                let tentative = node.g
                    + step_cost * self.cost_model.step_multiplier(terrain, next, movement)
                    + self.cost_model.penalty_for(terrain, next, movement);
                if tentative < neighbor.g {
                    self.arena.set(
                        next_idx,
                        ArenaNode { g: tentative, parent: Some(entry.index), ..neighbor },
                    );
                    let h = self.heuristic(next, target);
                    seq += 1;
                    self.frontier.push(OpenEntry {
                        f: OrderedFloat(tentative + h),
                        h: OrderedFloat(h),
                        seq,
                        g: OrderedFloat(tentative),
                        index: next_idx,
                    });
                }
            }
        }

        trace!(?start, goal = ?target, "frontier exhausted");
        Err(no_path)
    }

    /// Sum of step, slow ground and proximity costs along a cell sequence
    pub fn path_cost(
        &self,
        terrain: &dyn TerrainMap,
        cells: &[GridCoord],
        movement: MovementProfile,
    ) -> f32 {
        cells
            .windows(2)
            .map(|pair| {
                let diagonal = pair[0].col != pair[1].col && pair[0].row != pair[1].row;
                let step = if diagonal { self.config.diagonal_cost } else { self.config.cardinal_cost };
                step * self.cost_model.step_multiplier(terrain, pair[1], movement)
                    + self.cost_model.penalty_for(terrain, pair[1], movement)
            })
            .sum()
    }

    /// Ring search around `center`, columns left to right, then rows top
    /// to bottom within each column
    fn nearest_passable(
        &self,
        terrain: &dyn TerrainMap,
        center: GridCoord,
        movement: MovementProfile,
    ) -> Option<GridCoord> {
        let radius = self.config.goal_search_radius as i32;
        for r in 1..=radius {
            for dc in -r..=r {
                for dr in -r..=r {
                    if dc.abs().max(dr.abs()) != r {
                        continue;
                    }
                    let cell = center.offset(dc, dr);
                    if is_passable(terrain, cell, movement) {
                        return Some(cell);
                    }
                }
            }
        }
        None
    }

    fn reconstruct(&self, terrain: &dyn TerrainMap, goal_idx: usize, cost: f32) -> Path {
        let bounds = terrain.bounds();
        let tile = terrain.tile_size();
        let mut cells = Vec::new();
        let mut cursor = Some(goal_idx);
        while let Some(idx) = cursor {
            cells.push(bounds.coord_of(idx));
            cursor = self.arena.get(idx).parent;
        }
        cells.reverse();
        let waypoints = cells.iter().skip(1).map(|c| c.center(tile)).collect();
        Path { cells, waypoints, cost }
    }
}
