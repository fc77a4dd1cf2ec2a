//! Tactical decision layer
//!
//! Stateless functions over an [`EntityIndex`](crate::world::EntityIndex)
//! plus configuration, driven per agent by [`DecisionEngine`].

pub mod action;
pub mod base_defense;
pub mod behaviors;
pub mod engine;
pub mod force;
pub mod memory;
pub mod support;
pub mod targeting;

pub use action::{Decision, DecisionKind, TacticalAction};
pub use base_defense::{assess_base, defend_base, defenders_needed, BaseAssessment};
pub use engine::{DecisionEngine, DecisionRecord, TickReport};
pub use force::{evaluate_forces, select_posture, ForceBalance, Posture};
pub use memory::{AgentMemory, MemoryStore};
pub use support::{coordinate_support, EscortPhase, SupportOutcome};
pub use targeting::{detect_siege_threat, effective_attack_range, score_target, select_escort_target};
