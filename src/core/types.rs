//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for entities, assigned by the world collaborator
///
/// Ordering is meaningful: every tie in the decision layer is broken by
/// ascending id so repeated runs pick the same candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Team (side) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    pub fn new(id: u8) -> Self {
        Self(id)
    }
}

/// Simulation clock in milliseconds
pub type TimestampMs = u64;

/// Unit archetype as seen by the tactical layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitArchetype {
    /// Slow melee bruiser; the protected ally of the escort policy
    HeavyMelee,
    Ranged,
    /// Flying siege unit; top-priority target class
    AerialSiege,
    /// Team base structure
    Stronghold,
}

impl UnitArchetype {
    pub fn is_structure(&self) -> bool {
        matches!(self, UnitArchetype::Stronghold)
    }

    pub fn movement(&self) -> MovementProfile {
        match self {
            UnitArchetype::AerialSiege => MovementProfile::Flying,
            _ => MovementProfile::Ground,
        }
    }
}

/// Passability rules used by navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementProfile {
    Ground,
    /// Ignores hazards and impassable cells, but not the map edge
    Flying,
}

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Point `step` units from self toward `target`, never past it
    pub fn step_toward(&self, target: Vec2, step: f32) -> Self {
        let dist = self.distance(&target);
        if dist <= step {
            target
        } else {
            *self + (target - *self).normalize() * step
        }
    }

    /// Point `step` units from self directly away from `from`
    pub fn step_away(&self, from: Vec2, step: f32) -> Self {
        let dir = (*self - from).normalize();
        if dir.length() == 0.0 {
            // Coincident points: back off along +x
            return Self { x: self.x + step, y: self.y };
        }
        *self + dir * step
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}
