//! Per-agent priority cascade
//!
//! Each tick every agent first advances along its active route. Agents
//! whose decision interval has elapsed then run the cascade; the first
//! rule that matches wins:
//!
//! 1. an active route is followed to the end
//! 2. a detected aerial siege unit is focused
//! 3. a protected ally is escorted
//! 4. an understaffed stronghold under attack is defended
//! 5. the force ratio picks retreat, cautious defense, engage or push
//!
//! The siege check runs again after rules 3-5 and overrides them.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::core::config::TacticsConfig;
use crate::core::error::{Result, SkirmishError};
use crate::core::types::{EntityId, TimestampMs, Vec2};
use crate::navigation::direct_path::is_direct_path_safe;
use crate::navigation::pathfinding::PathPlanner;
use crate::navigation::route::{ActiveRoute, RouteStep};
use crate::tactics::action::{Decision, DecisionKind, TacticalAction};
use crate::tactics::base_defense::{assess_base, defend_base};
use crate::tactics::behaviors::{
    aggressive_push, cautious_defense, clamp_to_map, engage, siege_focus, tactical_retreat,
};
use crate::tactics::force::{evaluate_forces, select_posture, Posture};
use crate::tactics::memory::MemoryStore;
use crate::tactics::support::{coordinate_support, EscortPhase, PROTECTED_ARCHETYPE};
use crate::tactics::targeting::detect_siege_threat;
use crate::world::{EntityIndex, EntityView, Intent, IntentSink, TerrainMap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub agent: EntityId,
    pub kind: DecisionKind,
    pub action: TacticalAction,
}

/// What happened during one engine tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub now: TimestampMs,
    pub decisions: Vec<DecisionRecord>,
    /// Agents that advanced along an existing route
    pub routes_followed: usize,
    pub paths_planned: usize,
    pub path_failures: usize,
    /// Memory entries dropped for dead agents
    pub pruned: usize,
}

impl TickReport {
    pub fn decision_for(&self, agent: EntityId) -> Option<&DecisionRecord> {
        self.decisions.iter().find(|d| d.agent == agent)
    }
}

pub struct DecisionEngine {
    config: TacticsConfig,
    planner: PathPlanner,
    memory: MemoryStore,
}

impl DecisionEngine {
    /// Fails on an invalid configuration
    pub fn new(config: TacticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            planner: PathPlanner::new(config.navigation.clone()),
            memory: MemoryStore::new(),
            config,
        })
    }

    pub fn config(&self) -> &TacticsConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Run one simulation tick for `agents`
    ///
    /// Ids that are no longer alive in `index` are skipped and their memory
    /// is dropped.
    pub fn tick(
        &mut self,
        now: TimestampMs,
        agents: &[EntityId],
        index: &dyn EntityIndex,
        terrain: &dyn TerrainMap,
        sink: &mut dyn IntentSink,
    ) -> TickReport {
        let mut report = TickReport { now, ..TickReport::default() };
        report.pruned = self.memory.prune(|id| index.is_alive(id));

        for &agent in agents {
            let Some(observer) = index.get(agent) else {
                continue;
            };
            if observer.archetype.is_structure() {
                continue;
            }
            self.tick_agent(now, &observer, index, terrain, sink, &mut report);
        }
        report
    }

    fn tick_agent(
        &mut self,
        now: TimestampMs,
        observer: &EntityView,
        index: &dyn EntityIndex,
        terrain: &dyn TerrainMap,
        sink: &mut dyn IntentSink,
        report: &mut TickReport,
    ) {
        self.follow_route(observer, sink, report);

        let memory = self.memory.entry(observer.id);
        if !memory.decision_due(now, self.config.engine.decision_interval_ms) {
            return;
        }
        memory.last_decision_ms = Some(now);
        memory.escort = memory.escort.filter(|ally| index.is_alive(*ally));

        let decision = self.decide(observer, index);
        debug!(agent = ?observer.id, kind = ?decision.kind, action = ?decision.action, "decision");
        report.decisions.push(DecisionRecord {
            agent: observer.id,
            kind: decision.kind,
            action: decision.action,
        });

        if decision.kind != DecisionKind::FollowPath {
            self.execute(observer, decision.action, terrain, sink, report);
        }
    }

    /// Run the cascade for one agent without issuing intents
    pub fn decide(&mut self, observer: &EntityView, index: &dyn EntityIndex) -> Decision {
        if let Some(route) = self.memory.get(observer.id).and_then(|m| m.route.as_ref()) {
            return Decision::new(DecisionKind::FollowPath, TacticalAction::MoveTo(route.destination()));
        }

        if let Some(siege) = self.siege_override(observer, index) {
            return siege;
        }

        let decision = self.cascade(observer, index);

        // Safety net: nothing chosen below may shadow a siege unit
        self.siege_override(observer, index).unwrap_or(decision)
    }

    /// Look up `agent` and run the cascade for it
    pub fn decide_for(&mut self, agent: EntityId, index: &dyn EntityIndex) -> Result<Decision> {
        let observer = index.get(agent).ok_or(SkirmishError::EntityNotFound(agent))?;
        Ok(self.decide(&observer, index))
    }

    fn siege_override(&self, observer: &EntityView, index: &dyn EntityIndex) -> Option<Decision> {
        detect_siege_threat(index, observer, &self.config.targeting).map(|siege| {
            Decision::new(DecisionKind::SiegeFocus, siege_focus(observer, &siege, &self.config))
        })
    }

    fn cascade(&mut self, observer: &EntityView, index: &dyn EntityIndex) -> Decision {
        if observer.archetype != PROTECTED_ARCHETYPE {
            let outcome =
                coordinate_support(index, observer, &self.config.escort, &self.config.targeting);
            let memory = self.memory.entry(observer.id);
            if memory.escort != outcome.ally {
                debug!(agent = ?observer.id, from = ?memory.escort, to = ?outcome.ally, "escort binding changed");
                memory.escort = outcome.ally;
            }
            match outcome.phase {
                EscortPhase::Fighting => return Decision::new(DecisionKind::EscortFight, outcome.action),
                EscortPhase::Formation => {
                    return Decision::new(DecisionKind::EscortFormation, outcome.action)
                }
                EscortPhase::Unassigned => {}
            }
        }

        if let Some(base) = assess_base(index, observer.team, &self.config.base_defense) {
            if base.needs_defender() {
                trace!(
                    agent = ?observer.id,
                    attackers = base.attackers,
                    needed = base.needed,
                    current = base.current,
                    "stronghold understaffed"
                );
                let action = defend_base(index, observer, &base.stronghold, &self.config.base_defense);
                return Decision::new(DecisionKind::BaseDefense, action);
            }
        }

        let balance = evaluate_forces(index, observer.position, observer.team, &self.config.force);
        match select_posture(balance.ratio(), &self.config.force) {
            Posture::Retreat => {
                Decision::new(DecisionKind::Retreat, tactical_retreat(index, observer, &self.config))
            }
            Posture::CautiousDefense => Decision::new(
                DecisionKind::CautiousDefense,
                cautious_defense(index, observer, &self.config),
            ),
            Posture::Engage => Decision::new(DecisionKind::Engage, engage(index, observer, &self.config)),
            Posture::AggressivePush => Decision::new(
                DecisionKind::AggressivePush,
                aggressive_push(index, observer, &self.config),
            ),
        }
    }

    fn follow_route(&mut self, observer: &EntityView, sink: &mut dyn IntentSink, report: &mut TickReport) {
        let reach = self.config.navigation.waypoint_reach_distance;
        let memory = self.memory.entry(observer.id);
        let Some(route) = memory.route.as_mut() else {
            return;
        };
        match route.advance(observer.position, reach) {
            RouteStep::MoveTo(waypoint) => {
                sink.submit(observer.id, Intent::MoveToward(waypoint));
                report.routes_followed += 1;
            }
            RouteStep::Arrived => {
                trace!(agent = ?observer.id, "route complete");
                memory.route = None;
                sink.submit(observer.id, Intent::HoldPosition);
            }
        }
    }

    fn execute(
        &mut self,
        observer: &EntityView,
        action: TacticalAction,
        terrain: &dyn TerrainMap,
        sink: &mut dyn IntentSink,
        report: &mut TickReport,
    ) {
        match action {
            TacticalAction::Hold => {
                self.memory.entry(observer.id).route = None;
                sink.submit(observer.id, Intent::HoldPosition);
            }
            TacticalAction::MoveTo(destination) => {
                self.move_to(observer, destination, terrain, sink, report);
            }
            TacticalAction::Attack { target, reposition } => {
                sink.submit(observer.id, Intent::Attack(target));
                match reposition {
                    Some(destination) => self.move_to(observer, destination, terrain, sink, report),
                    None => {
                        self.memory.entry(observer.id).route = None;
                        sink.submit(observer.id, Intent::HoldPosition);
                    }
                }
            }
        }
    }

    /// Direct move when the straight line is safe, planned route otherwise
    fn move_to(
        &mut self,
        observer: &EntityView,
        destination: Vec2,
        terrain: &dyn TerrainMap,
        sink: &mut dyn IntentSink,
        report: &mut TickReport,
    ) {
        let margin = self.config.navigation.edge_margin_tiles * terrain.tile_size();
        let destination = clamp_to_map(destination, terrain.world_size(), margin);
        let movement = observer.archetype.movement();

        // A new destination always discards the old route
        let memory = self.memory.entry(observer.id);
        memory.route = None;

        if is_direct_path_safe(terrain, observer.position, destination, movement) {
            sink.submit(observer.id, Intent::MoveToward(destination));
            return;
        }

        match self.planner.plan(terrain, observer.position, destination, movement) {
            Ok(path) => {
                report.paths_planned += 1;
                let mut route = ActiveRoute::new(destination, path);
                match route.advance(observer.position, self.config.navigation.waypoint_reach_distance) {
                    RouteStep::MoveTo(waypoint) => {
                        sink.submit(observer.id, Intent::MoveToward(waypoint));
                        memory.route = Some(route);
                    }
                    RouteStep::Arrived => sink.submit(observer.id, Intent::MoveToward(destination)),
                }
            }
            Err(err) => {
                report.path_failures += 1;
                warn!(agent = ?observer.id, error = %err, "no route, holding position");
                sink.submit(observer.id, Intent::HoldPosition);
            }
        }
    }
}
