//! Posture behaviors: siege focus, retreat, cautious defense, engage, push

use crate::core::config::TacticsConfig;
use crate::core::types::Vec2;
use crate::tactics::action::TacticalAction;
use crate::tactics::base_defense::{defend_base, find_enemy_stronghold, find_stronghold};
use crate::tactics::targeting::{effective_attack_range, nearest_enemy_unit, prioritize_in_range};
use crate::world::{EntityIndex, EntityQuery, EntityView};

/// Attack `target`, closing to `approach_fraction` of effective range first
pub fn approach(observer: &EntityView, target: &EntityView, config: &TacticsConfig) -> TacticalAction {
    let stop_at = effective_attack_range(observer.attack_range, &config.targeting)
        * config.engine.approach_fraction;
    let distance = target.distance_to(observer.position);
    let reposition = (distance > stop_at)
        .then(|| observer.position.step_toward(target.position, distance - stop_at));
    TacticalAction::Attack { target: target.id, reposition }
}

/// Lock onto a siege unit and hold the approach distance from it
pub fn siege_focus(observer: &EntityView, siege: &EntityView, config: &TacticsConfig) -> TacticalAction {
    let optimal = effective_attack_range(observer.attack_range, &config.targeting)
        * config.engine.approach_fraction;
    let distance = siege.distance_to(observer.position);
    if distance < optimal * config.engine.siege_backoff_fraction {
        TacticalAction::Attack {
            target: siege.id,
            reposition: Some(observer.position.step_away(siege.position, optimal - distance)),
        }
    } else {
        approach(observer, siege, config)
    }
}

/// Fall back toward the friendly stronghold, defending once close
pub fn tactical_retreat(
    index: &dyn EntityIndex,
    observer: &EntityView,
    config: &TacticsConfig,
) -> TacticalAction {
    let Some(stronghold) = find_stronghold(index, observer.team) else {
        return TacticalAction::Hold;
    };
    let standoff = config.engine.retreat_standoff;
    if observer.distance_to(stronghold.position) > standoff {
        let dir = (observer.position - stronghold.position).normalize();
        TacticalAction::MoveTo(stronghold.position + dir * standoff)
    } else {
        defend_base(index, observer, &stronghold, &config.base_defense)
    }
}

/// Shoot what is already in range, otherwise pull back near the stronghold
pub fn cautious_defense(
    index: &dyn EntityIndex,
    observer: &EntityView,
    config: &TacticsConfig,
) -> TacticalAction {
    if let Some(target) = prioritize_in_range(index, observer, &config.targeting) {
        return TacticalAction::attack(target.id);
    }
    match find_stronghold(index, observer.team) {
        Some(stronghold)
            if observer.distance_to(stronghold.position) > config.base_defense.defender_radius =>
        {
            let dir = (observer.position - stronghold.position).normalize();
            TacticalAction::MoveTo(stronghold.position + dir * config.base_defense.idle_distance)
        }
        _ => TacticalAction::Hold,
    }
}

/// Fight enemies first, then the enemy stronghold
pub fn engage(index: &dyn EntityIndex, observer: &EntityView, config: &TacticsConfig) -> TacticalAction {
    if let Some(target) = prioritize_in_range(index, observer, &config.targeting) {
        return TacticalAction::attack(target.id);
    }
    if let Some(enemy) = nearest_enemy_unit(index, observer) {
        return approach(observer, &enemy, config);
    }
    match find_enemy_stronghold(index, observer.team) {
        Some(stronghold) => approach(observer, &stronghold, config),
        None => TacticalAction::Hold,
    }
}

/// Converge on the enemy stronghold when the push is on, else clear targets
pub fn aggressive_push(
    index: &dyn EntityIndex,
    observer: &EntityView,
    config: &TacticsConfig,
) -> TacticalAction {
    let stronghold = find_enemy_stronghold(index, observer.team);

    if let Some(base) = stronghold {
        let allies_pushing = index
            .query(
                &EntityQuery::allies_of(observer.team)
                    .units_only()
                    .within(base.position, config.engine.push_join_radius),
            )
            .iter()
            .any(|ally| ally.id != observer.id);
        if allies_pushing || observer.distance_to(base.position) <= config.engine.push_commit_radius {
            return approach(observer, &base, config);
        }
    }

    if let Some(target) = prioritize_in_range(index, observer, &config.targeting) {
        return TacticalAction::attack(target.id);
    }
    if let Some(base) = stronghold {
        return approach(observer, &base, config);
    }
    match nearest_enemy_unit(index, observer) {
        Some(enemy) => approach(observer, &enemy, config),
        None => TacticalAction::Hold,
    }
}

/// Keep a destination `margin` world units inside a `size` map
pub fn clamp_to_map(point: Vec2, size: Vec2, margin: f32) -> Vec2 {
    let clamp = |v: f32, max: f32| {
        if max <= 2.0 * margin {
            max / 2.0
        } else {
            v.clamp(margin, max - margin)
        }
    };
    Vec2::new(clamp(point.x, size.x), clamp(point.y, size.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EntityId, TeamId, UnitArchetype};
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

    // attack_range 5 => effective 180, approach distance 162

    #[test]
    fn test_approach_closes_to_fraction_of_range() {
        let cfg = TacticsConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let far = unit(2, 2, UnitArchetype::Ranged, 500.0, 0.0);
        match approach(&observer, &far, &cfg) {
            TacticalAction::Attack { target, reposition: Some(p) } => {
                assert_eq!(target, EntityId(2));
                assert!((p.x - 338.0).abs() < 1e-3);
            }
            other => panic!("unexpected {:?}", other),
        }

        let close = unit(2, 2, UnitArchetype::Ranged, 100.0, 0.0);
        assert_eq!(approach(&observer, &close, &cfg), TacticalAction::attack(EntityId(2)));
    }

    #[test]
    fn test_siege_focus_backs_off_when_too_close() {
        let cfg = TacticsConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let siege = unit(2, 2, UnitArchetype::AerialSiege, 50.0, 0.0);
        match siege_focus(&observer, &siege, &cfg) {
            TacticalAction::Attack { target, reposition: Some(p) } => {
                assert_eq!(target, EntityId(2));
                assert!((p.x + 112.0).abs() < 1e-3);
            }
            other => panic!("unexpected {:?}", other),
        }
        let good = unit(2, 2, UnitArchetype::AerialSiege, 120.0, 0.0);
        assert_eq!(siege_focus(&observer, &good, &cfg), TacticalAction::attack(EntityId(2)));
    }

    #[test]
    fn test_retreat_stops_short_of_stronghold() {
        let cfg = TacticsConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 500.0, 0.0);
        let snap = CombatSnapshot::capture(vec![observer, unit(9, 1, UnitArchetype::Stronghold, 0.0, 0.0)]);
        assert_eq!(
            tactical_retreat(&snap, &observer, &cfg),
            TacticalAction::MoveTo(Vec2::new(96.0, 0.0))
        );
    }

    #[test]
    fn test_retreat_without_stronghold_holds() {
        let cfg = TacticsConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 500.0, 0.0);
        let snap = CombatSnapshot::capture(vec![observer]);
        assert_eq!(tactical_retreat(&snap, &observer, &cfg), TacticalAction::Hold);
    }

    #[test]
    fn test_cautious_defense_pulls_back() {
        let cfg = TacticsConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 400.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(9, 1, UnitArchetype::Stronghold, 0.0, 0.0),
            unit(5, 2, UnitArchetype::Ranged, 0.0, 900.0),
        ]);
        assert_eq!(
            cautious_defense(&snap, &observer, &cfg),
            TacticalAction::MoveTo(Vec2::new(0.0, 120.0))
        );
    }

    #[test]
    fn test_engage_chases_nearest_enemy() {
        let cfg = TacticsConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(5, 2, UnitArchetype::HeavyMelee, 400.0, 0.0),
            unit(6, 2, UnitArchetype::Stronghold, 200.0, 0.0),
        ]);
        assert_eq!(engage(&snap, &observer, &cfg).target(), Some(EntityId(5)));
    }

    #[test]
    fn test_push_joins_allies_at_enemy_base() {
        let cfg = TacticsConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 1, UnitArchetype::Ranged, 850.0, 0.0),
            unit(6, 2, UnitArchetype::Stronghold, 1000.0, 0.0),
            unit(7, 2, UnitArchetype::HeavyMelee, 100.0, 0.0),
        ]);
        assert_eq!(aggressive_push(&snap, &observer, &cfg).target(), Some(EntityId(6)));
    }

    #[test]
    fn test_push_clears_targets_when_alone() {
        let cfg = TacticsConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(6, 2, UnitArchetype::Stronghold, 1000.0, 0.0),
            unit(7, 2, UnitArchetype::HeavyMelee, 100.0, 0.0),
        ]);
        assert_eq!(aggressive_push(&snap, &observer, &cfg), TacticalAction::attack(EntityId(7)));
    }

    #[test]
    fn test_clamp_to_map() {
        let size = Vec2::new(768.0, 768.0);
        assert_eq!(clamp_to_map(Vec2::new(-50.0, 900.0), size, 32.0), Vec2::new(32.0, 736.0));
        assert_eq!(clamp_to_map(Vec2::new(300.0, 300.0), size, 32.0), Vec2::new(300.0, 300.0));
    }
}
