use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Vec2};

/// Outcome of one cascade evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TacticalAction {
    Hold,
    MoveTo(Vec2),
    /// Attack, optionally while repositioning
    Attack {
        target: EntityId,
        reposition: Option<Vec2>,
    },
}

impl TacticalAction {
    pub fn attack(target: EntityId) -> Self {
        TacticalAction::Attack { target, reposition: None }
    }

    pub fn target(&self) -> Option<EntityId> {
        match self {
            TacticalAction::Attack { target, .. } => Some(*target),
            _ => None,
        }
    }
}

/// Which rule of the cascade produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    FollowPath,
    SiegeFocus,
    EscortFight,
    EscortFormation,
    BaseDefense,
    Retreat,
    CautiousDefense,
    Engage,
    AggressivePush,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub kind: DecisionKind,
    pub action: TacticalAction,
}

impl Decision {
    pub fn new(kind: DecisionKind, action: TacticalAction) -> Self {
        Self { kind, action }
    }
}
