//! Escort coordination around protected heavy-melee allies
//!
//! The binding is resolved from the snapshot on every call. Nothing here
//! reads a stored ally reference, so an ally that died or moved since the
//! last cycle can never leave the escort pointing at stale state. As long
//! as one protected ally lives, this returns an outcome and the escort
//! role is kept.
//!
//! Every escort of a team computes the same team-wide assignment from the
//! same snapshot and takes its own row, so escorts spread over the allies
//! that need them instead of all piling onto the nearest one.

use serde::{Deserialize, Serialize};

use crate::core::config::{EscortConfig, TargetingConfig};
use crate::core::types::{EntityId, UnitArchetype};
use crate::tactics::action::TacticalAction;
use crate::tactics::targeting::select_escort_target;
use crate::world::{EntityIndex, EntityQuery, EntityView};

/// Archetype the escort policy protects
pub const PROTECTED_ARCHETYPE: UnitArchetype = UnitArchetype::HeavyMelee;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscortPhase {
    /// No protected ally alive
    Unassigned,
    /// Bound ally is in combat
    Fighting,
    /// Keeping formation distance from the bound ally
    Formation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupportOutcome {
    pub phase: EscortPhase,
    pub ally: Option<EntityId>,
    pub action: TacticalAction,
}

impl SupportOutcome {
    fn unassigned() -> Self {
        Self {
            phase: EscortPhase::Unassigned,
            ally: None,
            action: TacticalAction::Hold,
        }
    }
}

/// Escort to protected ally binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscortAssignment {
    pub escort: EntityId,
    pub ally: EntityId,
    /// Bound during the combat pass
    pub fighting: bool,
}

/// Protected ally with its escort demand
#[derive(Debug, Clone, Copy)]
struct AllyDemand {
    ally: EntityView,
    enemies: usize,
    /// Escorts within the support radius right now
    supporters: usize,
    /// Escorts wanted while in combat
    needed: usize,
    assigned: usize,
}

impl AllyDemand {
    fn urgency(&self) -> usize {
        self.needed.saturating_sub(self.supporters) * 10 + self.enemies
    }
}

fn is_escort(view: &EntityView) -> bool {
    view.archetype != PROTECTED_ARCHETYPE && !view.archetype.is_structure()
}

/// Non-structure enemies within the threat radius of `ally`
pub fn enemies_near(index: &dyn EntityIndex, ally: &EntityView, config: &EscortConfig) -> usize {
    index
        .query(
            &EntityQuery::enemies_of(ally.team)
                .units_only()
                .within(ally.position, config.threat_radius),
        )
        .len()
}

/// Team-wide escort assignment, in escort order
///
/// Combat pass: allies in combat want `min(enemies + 1, max_supporters)`
/// escorts and are served by urgency (missing supporters times ten plus
/// enemy count, then lower id), each taking the nearest free escorts
/// within the influence radius. Formation pass: every escort still free
/// joins the ally with the fewest escorts while that count is below the
/// even share (at least one), nearest first; once every ally has its
/// share, it joins the nearest ally. All ties go to the lower id, so
/// both slices are expected in ascending id order.
pub fn assign_escorts(
    index: &dyn EntityIndex,
    escorts: &[EntityView],
    allies: &[EntityView],
    config: &EscortConfig,
) -> Vec<EscortAssignment> {
    if allies.is_empty() {
        return Vec::new();
    }
    let cap = config.max_supporters as usize;
    let mut demands: Vec<AllyDemand> = allies
        .iter()
        .map(|ally| {
            let enemies = enemies_near(index, ally, config);
            let supporters = escorts
                .iter()
                .filter(|e| e.distance_to(ally.position) <= config.support_radius)
                .count();
            let needed = if enemies > 0 { (enemies + 1).min(cap) } else { 0 };
            AllyDemand { ally: *ally, enemies, supporters, needed, assigned: 0 }
        })
        .collect();

    let mut bound: Vec<Option<(usize, bool)>> = vec![None; escorts.len()];

    let mut order: Vec<usize> = (0..demands.len()).filter(|&i| demands[i].needed > 0).collect();
    order.sort_by(|&a, &b| {
        demands[b]
            .urgency()
            .cmp(&demands[a].urgency())
            .then(demands[a].ally.id.cmp(&demands[b].ally.id))
    });
    for slot in order {
        let ally = demands[slot].ally;
        let mut candidates: Vec<usize> = (0..escorts.len())
            .filter(|&e| bound[e].is_none())
            .filter(|&e| escorts[e].distance_to(ally.position) <= config.influence_radius)
            .collect();
        candidates.sort_by(|&a, &b| {
            escorts[a]
                .distance_to(ally.position)
                .total_cmp(&escorts[b].distance_to(ally.position))
                .then(escorts[a].id.cmp(&escorts[b].id))
        });
        for e in candidates.into_iter().take(demands[slot].needed) {
            bound[e] = Some((slot, true));
            demands[slot].assigned += 1;
        }
    }

    let share = (escorts.len() / demands.len()).max(1);
    for e in 0..escorts.len() {
        if bound[e].is_some() {
            continue;
        }
        let from = escorts[e].position;
        let closer = |a: &AllyDemand, b: &AllyDemand| {
            a.ally
                .distance_to(from)
                .total_cmp(&b.ally.distance_to(from))
                .then(a.ally.id.cmp(&b.ally.id))
        };
        let below_share = (0..demands.len())
            .filter(|&i| demands[i].assigned < share)
            .min_by(|&a, &b| {
                demands[a]
                    .assigned
                    .cmp(&demands[b].assigned)
                    .then_with(|| closer(&demands[a], &demands[b]))
            });
        let slot = below_share
            .or_else(|| (0..demands.len()).min_by(|&a, &b| closer(&demands[a], &demands[b])));
        if let Some(slot) = slot {
            bound[e] = Some((slot, false));
            demands[slot].assigned += 1;
        }
    }

    escorts
        .iter()
        .zip(bound)
        .filter_map(|(escort, slot)| {
            slot.map(|(i, fighting)| EscortAssignment {
                escort: escort.id,
                ally: demands[i].ally.id,
                fighting,
            })
        })
        .collect()
}

/// Hold the ideal standoff from `ally` within the tolerance band
pub fn formation_step(observer: &EntityView, ally: &EntityView, config: &EscortConfig) -> TacticalAction {
    let distance = observer.distance_to(ally.position);
    if distance > config.ideal_distance + config.tolerance {
        let step = config.approach_step.min(distance - config.ideal_distance);
        TacticalAction::MoveTo(observer.position.step_toward(ally.position, step))
    } else if distance < config.ideal_distance - config.tolerance {
        TacticalAction::MoveTo(observer.position.step_away(ally.position, config.retreat_step))
    } else {
        TacticalAction::Hold
    }
}

/// One escort evaluation for `observer`
pub fn coordinate_support(
    index: &dyn EntityIndex,
    observer: &EntityView,
    escort: &EscortConfig,
    targeting: &TargetingConfig,
) -> SupportOutcome {
    let mut escorts: Vec<EntityView> = index
        .query(&EntityQuery::allies_of(observer.team).units_only())
        .into_iter()
        .filter(|e| is_escort(e) && e.id != observer.id)
        .collect();
    escorts.push(*observer);
    escorts.sort_by_key(|e| e.id);
    let allies: Vec<EntityView> = index
        .query(&EntityQuery::allies_of(observer.team).archetype(PROTECTED_ARCHETYPE))
        .into_iter()
        .filter(|ally| ally.id != observer.id)
        .collect();

    let assignment = assign_escorts(index, &escorts, &allies, escort)
        .into_iter()
        .find(|a| a.escort == observer.id);
    let Some(assignment) = assignment else {
        return SupportOutcome::unassigned();
    };
    let Some(ally) = allies.iter().find(|a| a.id == assignment.ally) else {
        return SupportOutcome::unassigned();
    };

    if assignment.fighting {
        let action = match select_escort_target(index, observer, ally.position, targeting) {
            Some(target) => TacticalAction::attack(target.id),
            None => formation_step(observer, ally, escort),
        };
        return SupportOutcome {
            phase: EscortPhase::Fighting,
            ally: Some(ally.id),
            action,
        };
    }

    SupportOutcome {
        phase: EscortPhase::Formation,
        ally: Some(ally.id),
        action: formation_step(observer, ally, escort),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{TeamId, Vec2};
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

    fn configs() -> (EscortConfig, TargetingConfig) {
        (EscortConfig::default(), TargetingConfig::default())
    }

    #[test]
    fn test_no_protected_ally_is_unassigned() {
        let (esc, tgt) = configs();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 2, UnitArchetype::HeavyMelee, 50.0, 0.0),
        ]);
        let outcome = coordinate_support(&snap, &observer, &esc, &tgt);
        assert_eq!(outcome.phase, EscortPhase::Unassigned);
        assert_eq!(outcome.ally, None);
    }

    #[test]
    fn test_formation_binds_nearest() {
        let (esc, tgt) = configs();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 1, UnitArchetype::HeavyMelee, 900.0, 0.0),
            unit(3, 1, UnitArchetype::HeavyMelee, 400.0, 0.0),
        ]);
        let outcome = coordinate_support(&snap, &observer, &esc, &tgt);
        assert_eq!(outcome.phase, EscortPhase::Formation);
        assert_eq!(outcome.ally, Some(EntityId(3)));
        // 400 away: step 50 toward the ally
        assert_eq!(outcome.action, TacticalAction::MoveTo(Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn test_formation_band() {
        let esc = EscortConfig::default();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);

        let far = unit(2, 1, UnitArchetype::HeavyMelee, 125.0, 0.0);
        // Approach never overshoots the ideal distance
        assert_eq!(formation_step(&observer, &far, &esc), TacticalAction::MoveTo(Vec2::new(35.0, 0.0)));

        let ok = unit(2, 1, UnitArchetype::HeavyMelee, 100.0, 0.0);
        assert_eq!(formation_step(&observer, &ok, &esc), TacticalAction::Hold);

        let close = unit(2, 1, UnitArchetype::HeavyMelee, 40.0, 0.0);
        assert_eq!(formation_step(&observer, &close, &esc), TacticalAction::MoveTo(Vec2::new(-30.0, 0.0)));
    }

    #[test]
    fn test_fighting_prefers_ally_in_combat() {
        let (esc, tgt) = configs();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            // Nearest ally, quiet
            unit(2, 1, UnitArchetype::HeavyMelee, 30.0, 0.0),
            // Farther ally with an enemy on it
            unit(3, 1, UnitArchetype::HeavyMelee, 0.0, 150.0),
            unit(4, 2, UnitArchetype::Ranged, 0.0, 170.0),
        ]);
        let outcome = coordinate_support(&snap, &observer, &esc, &tgt);
        assert_eq!(outcome.phase, EscortPhase::Fighting);
        assert_eq!(outcome.ally, Some(EntityId(3)));
        assert_eq!(outcome.action, TacticalAction::attack(EntityId(4)));
    }

    #[test]
    fn test_structures_do_not_put_ally_in_combat() {
        let (esc, tgt) = configs();
        let observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 1, UnitArchetype::HeavyMelee, 90.0, 0.0),
            unit(3, 2, UnitArchetype::Stronghold, 120.0, 0.0),
        ]);
        let outcome = coordinate_support(&snap, &observer, &esc, &tgt);
        assert_eq!(outcome.phase, EscortPhase::Formation);
    }

    #[test]
    fn test_fighting_without_reachable_target_keeps_position() {
        let (esc, tgt) = configs();
        let mut observer = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        observer.attack_range = 1.0; // 36 world units
        let snap = CombatSnapshot::capture(vec![
            observer,
            unit(2, 1, UnitArchetype::HeavyMelee, 180.0, 0.0),
            unit(3, 2, UnitArchetype::HeavyMelee, 250.0, 0.0),
        ]);
        let outcome = coordinate_support(&snap, &observer, &esc, &tgt);
        assert_eq!(outcome.phase, EscortPhase::Fighting);
        assert_eq!(outcome.action, TacticalAction::MoveTo(Vec2::new(50.0, 0.0)));
    }

    fn bindings(snap: &CombatSnapshot, escorts: &[EntityView]) -> Vec<(u64, Option<u64>)> {
        let (esc, tgt) = configs();
        escorts
            .iter()
            .map(|e| (e.id.0, coordinate_support(snap, e, &esc, &tgt).ally.map(|a| a.0)))
            .collect()
    }

    #[test]
    fn test_escorts_spread_over_allies_in_combat() {
        let escorts = [
            unit(1, 1, UnitArchetype::Ranged, 280.0, 320.0),
            unit(2, 1, UnitArchetype::Ranged, 290.0, 330.0),
            unit(3, 1, UnitArchetype::Ranged, 310.0, 330.0),
            unit(4, 1, UnitArchetype::Ranged, 320.0, 320.0),
        ];
        let mut entities = escorts.to_vec();
        entities.extend([
            // One enemy on brute 10, two on brute 11
            unit(10, 1, UnitArchetype::HeavyMelee, 300.0, 300.0),
            unit(20, 2, UnitArchetype::HeavyMelee, 240.0, 300.0),
            unit(11, 1, UnitArchetype::HeavyMelee, 450.0, 300.0),
            unit(21, 2, UnitArchetype::HeavyMelee, 450.0, 400.0),
            unit(22, 2, UnitArchetype::HeavyMelee, 480.0, 390.0),
        ]);
        let snap = CombatSnapshot::capture(entities);

        // Brute 11 is short one supporter and goes first with three slots,
        // brute 10 gets the escort that is left
        assert_eq!(
            bindings(&snap, &escorts),
            vec![(1, Some(10)), (2, Some(11)), (3, Some(11)), (4, Some(11))]
        );
        let (esc, tgt) = configs();
        for e in &escorts {
            assert_eq!(coordinate_support(&snap, e, &esc, &tgt).phase, EscortPhase::Fighting);
        }
    }

    #[test]
    fn test_supporter_cap_limits_combat_pass() {
        let mut esc = EscortConfig::default();
        esc.max_supporters = 1;
        let tgt = TargetingConfig::default();
        let first = unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0);
        let second = unit(2, 1, UnitArchetype::Ranged, 10.0, 0.0);
        let snap = CombatSnapshot::capture(vec![
            first,
            second,
            unit(3, 1, UnitArchetype::HeavyMelee, 100.0, 0.0),
            unit(4, 2, UnitArchetype::Ranged, 150.0, 0.0),
        ]);

        // Nearest escort fights, the other keeps formation on the same ally
        let near = coordinate_support(&snap, &second, &esc, &tgt);
        assert_eq!(near.phase, EscortPhase::Fighting);
        let far = coordinate_support(&snap, &first, &esc, &tgt);
        assert_eq!(far.phase, EscortPhase::Formation);
        assert_eq!(far.ally, Some(EntityId(3)));
    }

    #[test]
    fn test_quiet_allies_share_escorts() {
        let escorts = [
            unit(1, 1, UnitArchetype::Ranged, 0.0, 0.0),
            unit(2, 1, UnitArchetype::Ranged, 20.0, 0.0),
            unit(3, 1, UnitArchetype::AerialSiege, 40.0, 0.0),
        ];
        let mut entities = escorts.to_vec();
        entities.extend([
            unit(10, 1, UnitArchetype::HeavyMelee, 100.0, 0.0),
            unit(11, 1, UnitArchetype::HeavyMelee, 600.0, 0.0),
        ]);
        let snap = CombatSnapshot::capture(entities);

        // Share is one each: the unsupported far ally gets the second
        // escort, the third goes back to the nearest
        assert_eq!(
            bindings(&snap, &escorts),
            vec![(1, Some(10)), (2, Some(11)), (3, Some(10))]
        );
    }
}
