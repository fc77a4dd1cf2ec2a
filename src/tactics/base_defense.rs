//! Stronghold threat assessment and active defense

use crate::core::config::BaseDefenseConfig;
use crate::core::types::{TeamId, UnitArchetype, Vec2};
use crate::tactics::action::TacticalAction;
use crate::world::{EntityIndex, EntityQuery, EntityView};

/// Team stronghold; the lowest id wins if a team has several
pub fn find_stronghold(index: &dyn EntityIndex, team: TeamId) -> Option<EntityView> {
    index
        .query(&EntityQuery::allies_of(team).archetype(UnitArchetype::Stronghold))
        .into_iter()
        .min_by_key(|s| s.id)
}

/// First stronghold not owned by `team`
pub fn find_enemy_stronghold(index: &dyn EntityIndex, team: TeamId) -> Option<EntityView> {
    index
        .query(&EntityQuery::enemies_of(team).archetype(UnitArchetype::Stronghold))
        .into_iter()
        .min_by_key(|s| s.id)
}

/// Enemy units within the base-threat radius of the stronghold
pub fn count_base_attackers(
    index: &dyn EntityIndex,
    stronghold: &EntityView,
    config: &BaseDefenseConfig,
) -> usize {
    index
        .query(
            &EntityQuery::enemies_of(stronghold.team)
                .units_only()
                .within(stronghold.position, config.threat_radius),
        )
        .len()
}

/// Friendly units within the defender radius of the stronghold
pub fn count_current_defenders(
    index: &dyn EntityIndex,
    stronghold: &EntityView,
    config: &BaseDefenseConfig,
) -> usize {
    index
        .query(
            &EntityQuery::allies_of(stronghold.team)
                .units_only()
                .within(stronghold.position, config.defender_radius),
        )
        .len()
}

/// Step table lookup, capped at `max_defenders`
pub fn defenders_needed(attackers: usize, config: &BaseDefenseConfig) -> u32 {
    if attackers == 0 {
        return 0;
    }
    config
        .defender_steps
        .iter()
        .find(|step| attackers <= step.max_attackers as usize)
        .map_or(config.max_defenders, |step| step.defenders)
        .min(config.max_defenders)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseAssessment {
    pub stronghold: EntityView,
    pub attackers: usize,
    pub needed: u32,
    pub current: usize,
}

impl BaseAssessment {
    pub fn under_attack(&self) -> bool {
        self.attackers > 0
    }

    pub fn understaffed(&self) -> bool {
        self.current < self.needed as usize
    }

    /// The cascade sends this agent to defend
    pub fn needs_defender(&self) -> bool {
        self.under_attack() && self.understaffed()
    }
}

pub fn assess_base(
    index: &dyn EntityIndex,
    team: TeamId,
    config: &BaseDefenseConfig,
) -> Option<BaseAssessment> {
    let stronghold = find_stronghold(index, team)?;
    let attackers = count_base_attackers(index, &stronghold, config);
    Some(BaseAssessment {
        stronghold,
        attackers,
        needed: defenders_needed(attackers, config),
        current: count_current_defenders(index, &stronghold, config),
    })
}

/// Nearest enemy unit inside the perimeter that the observer can see
fn defense_target(
    index: &dyn EntityIndex,
    observer: &EntityView,
    base: Vec2,
    config: &BaseDefenseConfig,
) -> Option<EntityView> {
    index
        .query(
            &EntityQuery::enemies_of(observer.team)
                .units_only()
                .within(base, config.perimeter_radius),
        )
        .into_iter()
        .filter(|e| e.distance_to(observer.position) <= config.detection_radius)
        .min_by(|a, b| {
            a.distance_to(observer.position)
                .total_cmp(&b.distance_to(observer.position))
                .then(a.id.cmp(&b.id))
        })
}

/// Active defense of `stronghold` by `observer`
pub fn defend_base(
    index: &dyn EntityIndex,
    observer: &EntityView,
    stronghold: &EntityView,
    config: &BaseDefenseConfig,
) -> TacticalAction {
    let pos = observer.position;
    let base = stronghold.position;

    let Some(threat) = defense_target(index, observer, base, config) else {
        let from_base = pos.distance(&base);
        if from_base > config.return_distance {
            let dir = (pos - base).normalize();
            return TacticalAction::MoveTo(base + dir * config.idle_distance);
        }
        return TacticalAction::Hold;
    };

    let distance = threat.distance_to(pos);
    let reposition = if distance > config.optimal_range {
        let step = config.advance_step.min(distance - config.optimal_range);
        let next = pos.step_toward(threat.position, step);
        (next.distance(&base) <= config.leash_radius).then_some(next)
    } else if distance < config.optimal_range * config.too_close_fraction {
        let away = (base - threat.position).normalize();
        if away.length() > 0.0 {
            Some(pos + away * config.kite_step)
        } else {
            Some(pos.step_away(threat.position, config.kite_step))
        }
    } else {
        None
    };

    TacticalAction::Attack { target: threat.id, reposition }
}
