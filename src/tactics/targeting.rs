//! Target selection
//!
//! Two jobs: spot aerial siege units in a wide radius, and score enemies
//! around a protected ally. Every tie goes to the lower entity id.

use crate::core::config::TargetingConfig;
use crate::core::types::{EntityId, UnitArchetype, Vec2};
use crate::world::{EntityIndex, EntityQuery, EntityView};

/// Attack range in world units: tiles * unit_to_pixel * safety multiplier
pub fn effective_attack_range(attack_range: f32, config: &TargetingConfig) -> f32 {
    attack_range * config.unit_to_pixel * config.range_safety_multiplier
}

/// Nearest enemy aerial siege unit within the detection radius
pub fn detect_siege_threat(
    index: &dyn EntityIndex,
    observer: &EntityView,
    config: &TargetingConfig,
) -> Option<EntityView> {
    let query = EntityQuery::enemies_of(observer.team)
        .archetype(UnitArchetype::AerialSiege)
        .within(observer.position, config.siege_detection_radius);
    nearest(index.query(&query), observer.position)
}

/// score = base(type) + max(0, window - distance_to_ally) - distance_to_self / divisor
pub fn score_target(
    archetype: UnitArchetype,
    distance_to_ally: f32,
    distance_to_self: f32,
    config: &TargetingConfig,
) -> f32 {
    config.base_scores.get(archetype) + (config.proximity_window - distance_to_ally).max(0.0)
        - distance_to_self / config.distance_divisor
}

/// Scoring input for one enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub id: EntityId,
    pub archetype: UnitArchetype,
    pub distance_to_ally: f32,
    pub distance_to_self: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredTarget {
    pub id: EntityId,
    pub score: f32,
}

/// Highest score wins; candidates are visited in the given order and only
/// a strictly better score replaces the current best
pub fn pick_best(
    candidates: &[TargetCandidate],
    config: &TargetingConfig,
) -> Option<ScoredTarget> {
    let mut best: Option<ScoredTarget> = None;
    for c in candidates {
        let score = score_target(c.archetype, c.distance_to_ally, c.distance_to_self, config);
        if best.map_or(true, |b| score > b.score) {
            best = Some(ScoredTarget { id: c.id, score });
        }
    }
    best
}

/// Best enemy threatening the protected ally at `ally_position`
///
/// Eligible enemies are units within the defensive radius of the ally and
/// within the observer's effective attack range.
pub fn select_escort_target(
    index: &dyn EntityIndex,
    observer: &EntityView,
    ally_position: Vec2,
    config: &TargetingConfig,
) -> Option<ScoredTarget> {
    let reach = effective_attack_range(observer.attack_range, config);
    let mut enemies = index.query(
        &EntityQuery::enemies_of(observer.team)
            .units_only()
            .within(ally_position, config.defensive_radius),
    );
    enemies.sort_by_key(|e| e.id);

    let candidates: Vec<TargetCandidate> = enemies
        .iter()
        .filter(|e| e.distance_to(observer.position) <= reach)
        .map(|e| TargetCandidate {
            id: e.id,
            archetype: e.archetype,
            distance_to_ally: e.distance_to(ally_position),
            distance_to_self: e.distance_to(observer.position),
        })
        .collect();
    pick_best(&candidates, config)
}

fn class_rank(archetype: UnitArchetype) -> u8 {
    match archetype {
        UnitArchetype::AerialSiege => 0,
        UnitArchetype::Ranged => 1,
        UnitArchetype::HeavyMelee => 2,
        UnitArchetype::Stronghold => 3,
    }
}

/// Enemy units in effective range, most dangerous class first, nearest
/// within a class
pub fn prioritize_in_range(
    index: &dyn EntityIndex,
    observer: &EntityView,
    config: &TargetingConfig,
) -> Option<EntityView> {
    let reach = effective_attack_range(observer.attack_range, config);
    let enemies = index.query(
        &EntityQuery::enemies_of(observer.team)
            .units_only()
            .within(observer.position, reach),
    );
    enemies.into_iter().min_by(|a, b| {
        class_rank(a.archetype)
            .cmp(&class_rank(b.archetype))
            .then(a.distance_to(observer.position).total_cmp(&b.distance_to(observer.position)))
            .then(a.id.cmp(&b.id))
    })
}

/// Nearest enemy unit anywhere on the map
pub fn nearest_enemy_unit(index: &dyn EntityIndex, observer: &EntityView) -> Option<EntityView> {
    nearest(
        index.query(&EntityQuery::enemies_of(observer.team).units_only()),
        observer.position,
    )
}

/// Nearest by (distance, id)
pub fn nearest(entities: Vec<EntityView>, from: Vec2) -> Option<EntityView> {
    entities.into_iter().min_by(|a, b| {
        a.distance_to(from)
            .total_cmp(&b.distance_to(from))
            .then(a.id.cmp(&b.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TeamId;
    use crate::world::CombatSnapshot;

    fn unit(id: u64, team: u8, archetype: UnitArchetype, x: f32, y: f32) -> EntityView {
        EntityView {
            id: EntityId(id),
            team: TeamId(team),
            archetype,
            position: Vec2::new(x, y),
            health: 10.0,
            attack_range: 5.0,
        }
    }

    #[test]
    fn test_effective_range() {
        let cfg = TargetingConfig::default();
        assert!((effective_attack_range(5.0, &cfg) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_score_components() {
        let cfg = TargetingConfig::default();
        assert!((score_target(UnitArchetype::AerialSiege, 400.0, 300.0, &cfg) - 70.0).abs() < 1e-4);
        assert!((score_target(UnitArchetype::Ranged, 50.0, 150.0, &cfg) - 135.0).abs() < 1e-4);
        assert!((score_target(UnitArchetype::HeavyMelee, 100.0, 200.0, &cfg) - 60.0).abs() < 1e-4);
        assert!((score_target(UnitArchetype::Stronghold, 200.0, 0.0, &cfg)).abs() < 1e-4);
    }

    #[test]
    fn test_pick_best_ties_keep_first() {
        let cfg = TargetingConfig::default();
        let a = TargetCandidate {
            id: EntityId(4),
            archetype: UnitArchetype::Ranged,
            distance_to_ally: 50.0,
            distance_to_self: 100.0,
        };
        let b = TargetCandidate { id: EntityId(9), ..a };
        assert_eq!(pick_best(&[a, b], &cfg).map(|t| t.id), Some(EntityId(4)));
        assert!(pick_best(&[], &cfg).is_none());
    }

    #[test]
    fn test_detect_siege_nearest() {
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 2, UnitArchetype::AerialSiege, 500.0, 0.0),
            unit(3, 2, UnitArchetype::AerialSiege, 300.0, 0.0),
            unit(4, 2, UnitArchetype::AerialSiege, 700.0, 0.0),
            unit(5, 1, UnitArchetype::AerialSiege, 10.0, 0.0),
        ]);
        let found = detect_siege_threat(&snap, &observer, &TargetingConfig::default());
        assert_eq!(found.map(|e| e.id), Some(EntityId(3)));
    }

    #[test]
    fn test_detect_siege_ignores_out_of_radius() {
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 2, UnitArchetype::AerialSiege, 601.0, 0.0),
        ]);
        assert!(detect_siege_threat(&snap, &observer, &TargetingConfig::default()).is_none());
    }

    #[test]
    fn test_escort_target_requires_both_radii() {
        let cfg = TargetingConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let ally = Vec2::new(100.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            // Near ally, in range
            unit(2, 2, UnitArchetype::HeavyMelee, 150.0, 0.0),
            // Near ally but outside 180 effective range
            unit(3, 2, UnitArchetype::AerialSiege, 240.0, 0.0),
            // In range but 160 from ally
            unit(4, 2, UnitArchetype::Ranged, -60.0, 0.0),
        ]);
        let best = select_escort_target(&snap, &observer, ally, &cfg).expect("one eligible");
        assert_eq!(best.id, EntityId(2));
    }

    #[test]
    fn test_prioritize_in_range_by_class_then_distance() {
        let cfg = TargetingConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 2, UnitArchetype::HeavyMelee, 20.0, 0.0),
            unit(3, 2, UnitArchetype::Ranged, 150.0, 0.0),
            unit(4, 2, UnitArchetype::Ranged, 120.0, 0.0),
            unit(5, 2, UnitArchetype::Stronghold, 10.0, 0.0),
        ]);
        let pick = prioritize_in_range(&snap, &observer, &cfg);
        assert_eq!(pick.map(|e| e.id), Some(EntityId(4)));
    }

    #[test]
    fn test_nearest_enemy_unit_skips_structures() {
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 2, UnitArchetype::Stronghold, 50.0, 0.0),
            unit(3, 2, UnitArchetype::HeavyMelee, 900.0, 0.0),
        ]);
        assert_eq!(nearest_enemy_unit(&snap, &observer).map(|e| e.id), Some(EntityId(3)));
    }
}
