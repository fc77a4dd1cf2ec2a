//! Collaborator surface between the tactical core and the host simulation
//!
//! The core never owns or mutates world state. It reads entities through
//! [`EntityIndex`], terrain through [`TerrainMap`], and hands every change
//! it wants back to the host as an [`Intent`] through an [`IntentSink`].

pub mod intent;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, TeamId, UnitArchetype, Vec2};
use crate::spatial::grid::{GridBounds, GridCoord, TerrainClass};

pub use intent::Intent;
pub use snapshot::CombatSnapshot;

/// Read-only view of one live entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub team: TeamId,
    pub archetype: UnitArchetype,
    pub position: Vec2,
    pub health: f32,
    /// Attack range in tiles
    pub attack_range: f32,
}

impl EntityView {
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(&point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamFilter {
    Any,
    Only(TeamId),
    Except(TeamId),
}

impl TeamFilter {
    pub fn matches(&self, team: TeamId) -> bool {
        match self {
            TeamFilter::Any => true,
            TeamFilter::Only(t) => *t == team,
            TeamFilter::Except(t) => *t != team,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchetypeFilter {
    Any,
    Only(UnitArchetype),
    /// Everything except strongholds
    Units,
}

impl ArchetypeFilter {
    pub fn matches(&self, archetype: UnitArchetype) -> bool {
        match self {
            ArchetypeFilter::Any => true,
            ArchetypeFilter::Only(a) => *a == archetype,
            ArchetypeFilter::Units => !archetype.is_structure(),
        }
    }
}

/// Entity filter by team, archetype and optional radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityQuery {
    pub team: TeamFilter,
    pub archetype: ArchetypeFilter,
    /// Inclusive radius around a point
    pub within: Option<(Vec2, f32)>,
}

impl EntityQuery {
    pub fn all() -> Self {
        Self {
            team: TeamFilter::Any,
            archetype: ArchetypeFilter::Any,
            within: None,
        }
    }

    pub fn allies_of(team: TeamId) -> Self {
        Self { team: TeamFilter::Only(team), ..Self::all() }
    }

    pub fn enemies_of(team: TeamId) -> Self {
        Self { team: TeamFilter::Except(team), ..Self::all() }
    }

    pub fn archetype(mut self, archetype: UnitArchetype) -> Self {
        self.archetype = ArchetypeFilter::Only(archetype);
        self
    }

    pub fn units_only(mut self) -> Self {
        self.archetype = ArchetypeFilter::Units;
        self
    }

    pub fn within(mut self, center: Vec2, radius: f32) -> Self {
        self.within = Some((center, radius));
        self
    }

    pub fn matches(&self, entity: &EntityView) -> bool {
        self.team.matches(entity.team)
            && self.archetype.matches(entity.archetype)
            && self
                .within
                .map_or(true, |(center, radius)| entity.distance_to(center) <= radius)
    }
}

/// Query surface over live entities
///
/// Lookups for entities that died or were removed return `None`; callers
/// re-resolve ids every cycle instead of holding views.
pub trait EntityIndex {
    /// All live entities matching the query, ordered by ascending id
    fn query(&self, query: &EntityQuery) -> Vec<EntityView>;

    fn get(&self, id: EntityId) -> Option<EntityView>;

    fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }
}

/// Read-only terrain surface
pub trait TerrainMap {
    /// Out-of-bounds cells must classify as impassable
    fn classify(&self, cell: GridCoord) -> TerrainClass;

    fn tile_size(&self) -> f32;

    fn bounds(&self) -> GridBounds;

    fn in_bounds(&self, cell: GridCoord) -> bool {
        self.bounds().contains(cell)
    }

    fn world_to_cell(&self, pos: Vec2) -> GridCoord {
        GridCoord::from_world(pos, self.tile_size())
    }

    /// Map extent in world units
    fn world_size(&self) -> Vec2 {
        let bounds = self.bounds();
        Vec2::new(bounds.cols as f32 * self.tile_size(), bounds.rows as f32 * self.tile_size())
    }
}

/// Receiver for movement and attack commands
pub trait IntentSink {
    fn submit(&mut self, agent: EntityId, intent: Intent);
}
