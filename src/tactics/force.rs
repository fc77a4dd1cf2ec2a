//! Weighted force comparison around an observer

use serde::{Deserialize, Serialize};

use crate::core::config::ForceConfig;
use crate::core::types::{TeamId, Vec2};
use crate::world::{EntityIndex, EntityQuery};

/// Aggregate combat power on each side
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceBalance {
    pub ally: f32,
    pub enemy: f32,
}

impl ForceBalance {
    /// Ally over enemy, with the enemy side floored at 1
    pub fn ratio(&self) -> f32 {
        self.ally / self.enemy.max(1.0)
    }
}

/// Tactical stance derived from the force ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Posture {
    Retreat,
    CautiousDefense,
    Engage,
    AggressivePush,
}

/// Step multiplier for an entity at `distance`; zero past the last band
pub fn distance_multiplier(distance: f32, config: &ForceConfig) -> f32 {
    config
        .distance_bands
        .iter()
        .find(|band| distance <= band.max_distance)
        .map_or(0.0, |band| band.multiplier)
}

/// Sum weighted power for both sides within `config.radius` of `position`
///
/// The observer is on `team` and counts toward the ally side if it is in
/// the index.
pub fn evaluate_forces(
    index: &dyn EntityIndex,
    position: Vec2,
    team: TeamId,
    config: &ForceConfig,
) -> ForceBalance {
    index
        .query(&EntityQuery::all().within(position, config.radius))
        .iter()
        .fold(ForceBalance::default(), |mut balance, entity| {
            let power = config.base_values.get(entity.archetype)
                * distance_multiplier(entity.distance_to(position), config);
            if entity.team == team {
                balance.ally += power;
            } else {
                balance.enemy += power;
            }
            balance
        })
}

pub fn select_posture(ratio: f32, config: &ForceConfig) -> Posture {
    if ratio < config.retreat_below {
        Posture::Retreat
    } else if ratio < config.cautious_below {
        Posture::CautiousDefense
    } else if ratio <= config.engage_up_to {
        Posture::Engage
    } else {
        Posture::AggressivePush
    }
}
