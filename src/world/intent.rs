use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Vec2};
use crate::world::IntentSink;

/// Command handed to the host simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    MoveToward(Vec2),
    HoldPosition,
    Attack(EntityId),
}

/// Buffering sink, used by tests and the sandbox
impl IntentSink for Vec<(EntityId, Intent)> {
    fn submit(&mut self, agent: EntityId, intent: Intent) {
        self.push((agent, intent));
    }
}
