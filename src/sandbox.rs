//! Minimal host world for exercising the engine end to end
//!
//! Stands in for the real simulation: stores units, applies intents with
//! constant-speed movement and damage over time, and hands the engine a
//! fresh snapshot each tick.

use rand::Rng;
use serde::Serialize;

use crate::core::types::{EntityId, TeamId, TimestampMs, UnitArchetype, Vec2};
use crate::navigation::terrain_cost::is_passable;
use crate::spatial::grid::{GridCoord, TerrainClass, TerrainGrid};
use crate::world::{CombatSnapshot, EntityView, Intent, TerrainMap};

/// Per-archetype stats for sandbox units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    pub health: f32,
    /// Tiles
    pub attack_range: f32,
    /// World units per second
    pub speed: f32,
    pub damage_per_second: f32,
}

impl UnitStats {
    pub fn for_archetype(archetype: UnitArchetype) -> Self {
        match archetype {
            UnitArchetype::HeavyMelee => Self { health: 120.0, attack_range: 1.0, speed: 60.0, damage_per_second: 14.0 },
            UnitArchetype::Ranged => Self { health: 60.0, attack_range: 5.0, speed: 70.0, damage_per_second: 8.0 },
            UnitArchetype::AerialSiege => Self { health: 90.0, attack_range: 6.0, speed: 50.0, damage_per_second: 12.0 },
            UnitArchetype::Stronghold => Self { health: 600.0, attack_range: 0.0, speed: 0.0, damage_per_second: 0.0 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SandboxUnit {
    pub view: EntityView,
    pub stats: UnitStats,
    pub move_goal: Option<Vec2>,
    pub target: Option<EntityId>,
}

impl SandboxUnit {
    pub fn is_alive(&self) -> bool {
        self.view.health > 0.0
    }
}

/// Result of a finished or timed-out skirmish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Victory(TeamId),
    Draw,
    Undecided,
}

pub struct Sandbox {
    terrain: TerrainGrid,
    units: Vec<SandboxUnit>,
    now: TimestampMs,
    next_id: u64,
}

impl Sandbox {
    pub fn new(terrain: TerrainGrid) -> Self {
        Self {
            terrain,
            units: Vec::new(),
            now: 0,
            next_id: 1,
        }
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    pub fn now(&self) -> TimestampMs {
        self.now
    }

    pub fn spawn(&mut self, team: TeamId, archetype: UnitArchetype, position: Vec2) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let stats = UnitStats::for_archetype(archetype);
        self.units.push(SandboxUnit {
            view: EntityView {
                id,
                team,
                archetype,
                position,
                health: stats.health,
                attack_range: stats.attack_range,
            },
            stats,
            move_goal: None,
            target: None,
        });
        id
    }

    pub fn unit(&self, id: EntityId) -> Option<&SandboxUnit> {
        self.units.iter().find(|u| u.view.id == id)
    }

    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut SandboxUnit> {
        self.units.iter_mut().find(|u| u.view.id == id)
    }

    pub fn kill(&mut self, id: EntityId) {
        if let Some(unit) = self.unit_mut(id) {
            unit.view.health = 0.0;
        }
    }

    pub fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot::capture(self.units.iter().map(|u| u.view))
    }

    /// Live units that take decisions (everything but strongholds)
    pub fn agents(&self) -> Vec<EntityId> {
        self.units
            .iter()
            .filter(|u| u.is_alive() && !u.view.archetype.is_structure())
            .map(|u| u.view.id)
            .collect()
    }

    pub fn alive_units(&self, team: TeamId) -> usize {
        self.units
            .iter()
            .filter(|u| u.is_alive() && u.view.team == team && !u.view.archetype.is_structure())
            .count()
    }

    pub fn apply(&mut self, intents: &[(EntityId, Intent)]) {
        for (agent, intent) in intents {
            let Some(unit) = self.unit_mut(*agent) else {
                continue;
            };
            if !unit.is_alive() {
                continue;
            }
            match intent {
                Intent::MoveToward(point) => unit.move_goal = Some(*point),
                Intent::HoldPosition => unit.move_goal = None,
                Intent::Attack(target) => unit.target = Some(*target),
            }
        }
    }

    /// Advance movement and combat by `dt_ms`
    pub fn step(&mut self, dt_ms: u64) {
        let dt = dt_ms as f32 / 1000.0;
        let tile = self.terrain.tile_size();

        for i in 0..self.units.len() {
            let unit = &self.units[i];
            if !unit.is_alive() {
                continue;
            }
            let Some(goal) = unit.move_goal else {
                continue;
            };
            let next = unit.view.position.step_toward(goal, unit.stats.speed * dt);
            let movement = unit.view.archetype.movement();
            let cell = GridCoord::from_world(next, tile);
            let unit = &mut self.units[i];
            if is_passable(&self.terrain, cell, movement) {
                unit.view.position = next;
                if next == goal {
                    unit.move_goal = None;
                }
            } else {
                unit.move_goal = None;
            }
        }

        let mut damage: Vec<(EntityId, f32)> = Vec::new();
        for unit in self.units.iter().filter(|u| u.is_alive()) {
            let Some(target_id) = unit.target else {
                continue;
            };
            let Some(target) = self.unit(target_id).filter(|t| t.is_alive()) else {
                continue;
            };
            let reach = unit.stats.attack_range * tile * 1.5;
            if unit.view.position.distance(&target.view.position) <= reach {
                damage.push((target_id, unit.stats.damage_per_second * dt));
            }
        }
        for (id, amount) in damage {
            if let Some(unit) = self.unit_mut(id) {
                unit.view.health = (unit.view.health - amount).max(0.0);
            }
        }

        self.now += dt_ms;
    }

    /// A team wins by destroying the other stronghold or every enemy unit
    pub fn outcome(&self) -> Outcome {
        let teams = [TeamId(1), TeamId(2)];
        let standing: Vec<bool> = teams
            .iter()
            .map(|&team| {
                let base_alive = self.units.iter().any(|u| {
                    u.view.team == team && u.view.archetype.is_structure() && u.is_alive()
                });
                let has_base = self
                    .units
                    .iter()
                    .any(|u| u.view.team == team && u.view.archetype.is_structure());
                (base_alive || !has_base) && self.alive_units(team) > 0
            })
            .collect();
        match (standing[0], standing[1]) {
            (true, false) => Outcome::Victory(teams[0]),
            (false, true) => Outcome::Victory(teams[1]),
            (false, false) => Outcome::Draw,
            (true, true) => Outcome::Undecided,
        }
    }
}

/// Two-team map with hazard pools, strongholds in opposite corners and
/// mixed squads next to each stronghold
pub fn random_skirmish<R: Rng>(
    rng: &mut R,
    cols: i32,
    rows: i32,
    tile: f32,
    units_per_team: usize,
) -> Sandbox {
    let mut terrain = TerrainGrid::new(cols, rows, tile);

    let pools = rng.gen_range(2..=5);
    for _ in 0..pools {
        let c = rng.gen_range(cols / 4..=(3 * cols / 4).max(cols / 4));
        let r = rng.gen_range(1..(rows - 1).max(2));
        let w = rng.gen_range(1..=3);
        let h = rng.gen_range(1..=4);
        terrain.fill(GridCoord::new(c, r), GridCoord::new(c + w, r + h), TerrainClass::Hazardous);
    }

    let mut sandbox = Sandbox::new(terrain);
    let corners = [
        (TeamId(1), GridCoord::new(3, 3)),
        (TeamId(2), GridCoord::new(cols - 4, rows - 4)),
    ];
    for (team, corner) in corners {
        // Home area is always clear ground
        sandbox.terrain.fill(corner.offset(-3, -3), corner.offset(3, 3), TerrainClass::Walkable);
        sandbox.spawn(team, UnitArchetype::Stronghold, corner.center(tile));

        for i in 0..units_per_team {
            let archetype = match i % 4 {
                0 => UnitArchetype::HeavyMelee,
                3 if i > 4 => UnitArchetype::AerialSiege,
                _ => UnitArchetype::Ranged,
            };
            let dc = rng.gen_range(-2..=2);
            let dr = rng.gen_range(-2..=2);
            let spread = tile / 4.0;
            let jitter = Vec2::new(rng.gen_range(-spread..spread), rng.gen_range(-spread..spread));
            let cell = corner.offset(dc, dr);
            sandbox.spawn(team, archetype, cell.center(tile) + jitter);
        }
    }
    sandbox
}
