//! Decision engine integration tests

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_ai::core::types::{EntityId, TeamId, UnitArchetype, Vec2};
use skirmish_ai::core::{SkirmishError, TacticsConfig};
use skirmish_ai::sandbox::{random_skirmish, Sandbox};
use skirmish_ai::spatial::grid::TerrainGrid;
use skirmish_ai::tactics::targeting::{pick_best, TargetCandidate};
use skirmish_ai::tactics::{assess_base, DecisionEngine, DecisionKind, TacticalAction};
use skirmish_ai::world::{CombatSnapshot, EntityView, Intent};

fn unit(id: u64, team: u8, archetype: UnitArchetype, x: f32, y: f32) -> EntityView {
    EntityView {
        id: EntityId(id),
        team: TeamId(team),
        archetype,
        position: Vec2::new(x, y),
        health: 50.0,
        attack_range: 5.0,
    }
}

fn engine() -> DecisionEngine {
    DecisionEngine::new(TacticsConfig::default()).expect("default config is valid")
}

#[test]
fn test_escort_target_scoring_prefers_threat_near_ally() {
    let config = TacticsConfig::default();
    let candidates = [
        TargetCandidate {
            id: EntityId(1),
            archetype: UnitArchetype::AerialSiege,
            distance_to_ally: 400.0,
            distance_to_self: 300.0,
        },
        TargetCandidate {
            id: EntityId(2),
            archetype: UnitArchetype::Ranged,
            distance_to_ally: 50.0,
            distance_to_self: 150.0,
        },
        TargetCandidate {
            id: EntityId(3),
            archetype: UnitArchetype::HeavyMelee,
            distance_to_ally: 100.0,
            distance_to_self: 200.0,
        },
    ];

    let best = pick_best(&candidates, &config.targeting).expect("three candidates");
    assert_eq!(best.id, EntityId(2));
    assert!((best.score - 135.0).abs() < 1e-4);
}

#[test]
fn test_three_attackers_need_two_defenders() {
    let config = TacticsConfig::default();
    let snapshot = CombatSnapshot::capture(vec![
        unit(1, 1, UnitArchetype::Stronghold, 500.0, 500.0),
        unit(10, 2, UnitArchetype::HeavyMelee, 600.0, 500.0),
        unit(11, 2, UnitArchetype::Ranged, 500.0, 650.0),
        unit(12, 2, UnitArchetype::AerialSiege, 400.0, 420.0),
        unit(13, 2, UnitArchetype::Ranged, 900.0, 900.0),
    ]);
    let assessment = assess_base(&snapshot, TeamId(1), &config.base_defense).expect("stronghold");
    assert_eq!(assessment.attackers, 3);
    assert_eq!(assessment.needed, 2);
    assert!(assessment.needs_defender());
}

#[test]
fn test_siege_threat_beats_escort_duty() {
    let mut engine = engine();
    let terrain = TerrainGrid::new(40, 30, 32.0);
    let snapshot = CombatSnapshot::capture(vec![
        unit(1, 1, UnitArchetype::Ranged, 300.0, 300.0),
        unit(2, 1, UnitArchetype::HeavyMelee, 390.0, 300.0),
        unit(3, 2, UnitArchetype::HeavyMelee, 420.0, 300.0),
        unit(4, 2, UnitArchetype::AerialSiege, 300.0, 700.0),
    ]);
    let mut intents: Vec<(EntityId, Intent)> = Vec::new();

    let report = engine.tick(0, &[EntityId(1)], &snapshot, &terrain, &mut intents);
    let record = report.decision_for(EntityId(1)).expect("agent decided");
    assert_eq!(record.kind, DecisionKind::SiegeFocus);
    assert_eq!(record.action.target(), Some(EntityId(4)));
    assert!(intents.contains(&(EntityId(1), Intent::Attack(EntityId(4)))));
}

#[test]
fn test_escort_rebinds_after_ally_dies() {
    let mut engine = engine();
    let terrain = TerrainGrid::new(40, 30, 32.0);
    let agent = unit(1, 1, UnitArchetype::Ranged, 300.0, 300.0);
    let ally = unit(2, 1, UnitArchetype::HeavyMelee, 600.0, 300.0);
    let enemy = unit(9, 2, UnitArchetype::Ranged, 1200.0, 900.0);
    let mut intents: Vec<(EntityId, Intent)> = Vec::new();

    let alive = CombatSnapshot::capture(vec![agent, ally, enemy]);
    let report = engine.tick(0, &[agent.id], &alive, &terrain, &mut intents);
    assert_eq!(
        report.decision_for(agent.id).map(|r| r.kind),
        Some(DecisionKind::EscortFormation)
    );
    assert_eq!(engine.memory().get(agent.id).and_then(|m| m.escort), Some(ally.id));

    // Ally killed between cycles
    let mut fallen = ally;
    fallen.health = 0.0;
    let after = CombatSnapshot::capture(vec![agent, fallen, enemy]);
    intents.clear();
    let report = engine.tick(500, &[agent.id], &after, &terrain, &mut intents);

    let kind = report.decision_for(agent.id).map(|r| r.kind).expect("agent decided");
    assert!(!matches!(kind, DecisionKind::EscortFight | DecisionKind::EscortFormation));
    assert_eq!(engine.memory().get(agent.id).and_then(|m| m.escort), None);
}

#[test]
fn test_escort_switches_to_surviving_ally() {
    let mut engine = engine();
    let terrain = TerrainGrid::new(40, 30, 32.0);
    let agent = unit(1, 1, UnitArchetype::Ranged, 300.0, 300.0);
    let near = unit(2, 1, UnitArchetype::HeavyMelee, 400.0, 300.0);
    let far = unit(3, 1, UnitArchetype::HeavyMelee, 300.0, 700.0);
    let mut intents: Vec<(EntityId, Intent)> = Vec::new();

    let snapshot = CombatSnapshot::capture(vec![agent, near, far]);
    engine.tick(0, &[agent.id], &snapshot, &terrain, &mut intents);
    assert_eq!(engine.memory().get(agent.id).and_then(|m| m.escort), Some(near.id));

    let snapshot = CombatSnapshot::capture(vec![agent, far]);
    let report = engine.tick(500, &[agent.id], &snapshot, &terrain, &mut intents);
    assert_eq!(
        report.decision_for(agent.id).map(|r| r.kind),
        Some(DecisionKind::EscortFormation)
    );
    assert_eq!(engine.memory().get(agent.id).and_then(|m| m.escort), Some(far.id));
    // 400 away: one approach step toward the new ally
    assert_eq!(
        report.decision_for(agent.id).map(|r| r.action),
        Some(TacticalAction::MoveTo(Vec2::new(300.0, 350.0)))
    );
}

#[test]
fn test_escorts_cover_both_brutes_in_combat() {
    let mut engine = engine();
    let terrain = TerrainGrid::new(40, 30, 32.0);
    let escorts = [
        unit(1, 1, UnitArchetype::Ranged, 280.0, 320.0),
        unit(2, 1, UnitArchetype::Ranged, 290.0, 330.0),
        unit(3, 1, UnitArchetype::Ranged, 310.0, 330.0),
        unit(4, 1, UnitArchetype::Ranged, 320.0, 320.0),
    ];
    let brute_a = unit(10, 1, UnitArchetype::HeavyMelee, 300.0, 300.0);
    let brute_b = unit(11, 1, UnitArchetype::HeavyMelee, 450.0, 300.0);
    let mut entities = escorts.to_vec();
    entities.extend([
        brute_a,
        brute_b,
        unit(20, 2, UnitArchetype::HeavyMelee, 240.0, 300.0),
        unit(21, 2, UnitArchetype::HeavyMelee, 450.0, 400.0),
        unit(22, 2, UnitArchetype::HeavyMelee, 480.0, 390.0),
    ]);
    let snapshot = CombatSnapshot::capture(entities);
    let agents: Vec<EntityId> = escorts.iter().map(|e| e.id).collect();
    let mut intents: Vec<(EntityId, Intent)> = Vec::new();

    let report = engine.tick(0, &agents, &snapshot, &terrain, &mut intents);
    let bound: Vec<Option<EntityId>> = agents
        .iter()
        .map(|id| engine.memory().get(*id).and_then(|m| m.escort))
        .collect();
    assert!(bound.contains(&Some(brute_a.id)));
    assert!(bound.contains(&Some(brute_b.id)));
    assert_eq!(bound.iter().filter(|b| **b == Some(brute_b.id)).count(), 3);
    for id in &agents {
        assert_eq!(report.decision_for(*id).map(|r| r.kind), Some(DecisionKind::EscortFight));
    }
}

#[test]
fn test_profiles_load_from_disk() {
    let aggressive = TacticsConfig::load("data/tactics/aggressive.toml").expect("aggressive profile");
    assert_eq!(aggressive.engine.decision_interval_ms, 300);
    assert!(DecisionEngine::new(aggressive).is_ok());

    let missing = TacticsConfig::load("data/tactics/does_not_exist.toml");
    assert!(matches!(missing, Err(SkirmishError::Io(_))));
}

fn run_skirmish(seed: u64, ticks: u64) -> Vec<(EntityId, Vec2, f32)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let config = TacticsConfig::default();
    let mut sandbox: Sandbox = random_skirmish(&mut rng, 32, 24, config.navigation.tile_size, 6);
    let mut engine = DecisionEngine::new(config).expect("default config is valid");
    for _ in 0..ticks {
        let snapshot = sandbox.snapshot();
        let agents = sandbox.agents();
        let mut intents: Vec<(EntityId, Intent)> = Vec::new();
        engine.tick(sandbox.now(), &agents, &snapshot, sandbox.terrain(), &mut intents);
        sandbox.apply(&intents);
        sandbox.step(100);
    }
    sandbox
        .snapshot()
        .iter()
        .map(|e| (e.id, e.position, e.health))
        .collect()
}

#[test]
fn test_seeded_skirmish_is_reproducible() {
    let first = run_skirmish(42, 150);
    let second = run_skirmish(42, 150);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}
