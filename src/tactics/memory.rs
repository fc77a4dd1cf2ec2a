//! Per-agent state kept between decision cycles
//!
//! Only three things persist: when the agent last decided, which ally it
//! escorted, and the route it is walking. Everything else is recomputed.

use ahash::AHashMap;

use crate::core::types::{EntityId, TimestampMs};
use crate::navigation::route::ActiveRoute;

#[derive(Debug, Clone, Default)]
pub struct AgentMemory {
    pub last_decision_ms: Option<TimestampMs>,
    /// Escorted ally id; re-resolved every cycle, never dereferenced
    pub escort: Option<EntityId>,
    pub route: Option<ActiveRoute>,
}

impl AgentMemory {
    /// First evaluation always happens
    pub fn decision_due(&self, now: TimestampMs, interval_ms: u64) -> bool {
        match self.last_decision_ms {
            None => true,
            Some(last) => now >= last.saturating_add(interval_ms),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    agents: AHashMap<EntityId, AgentMemory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory for `agent`, created on first use
    pub fn entry(&mut self, agent: EntityId) -> &mut AgentMemory {
        self.agents.entry(agent).or_default()
    }

    pub fn get(&self, agent: EntityId) -> Option<&AgentMemory> {
        self.agents.get(&agent)
    }

    /// Drop memory for every agent `is_alive` rejects; returns how many
    pub fn prune(&mut self, mut is_alive: impl FnMut(EntityId) -> bool) -> usize {
        let before = self.agents.len();
        self.agents.retain(|id, _| is_alive(*id));
        before - self.agents.len()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
