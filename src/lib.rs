//! Skirmish AI - per-agent combat decisions and grid pathfinding

pub mod core;
pub mod navigation;
pub mod sandbox;
pub mod spatial;
pub mod tactics;
pub mod world;
