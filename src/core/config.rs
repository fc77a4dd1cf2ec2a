//! Tactical tuning loaded from TOML
//!
//! Every radius, threshold and step used by the decision layer lives here.
//! Files must supply every field: a missing key is a parse error, and
//! `validate()` rejects values that are internally inconsistent. There are
//! no silent fallbacks, so a tuning mistake surfaces at startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, SkirmishError};
use crate::core::types::UnitArchetype;

/// One value per unit archetype
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeTable {
    pub heavy_melee: f32,
    pub ranged: f32,
    pub aerial_siege: f32,
    pub stronghold: f32,
}

impl ArchetypeTable {
    pub fn get(&self, archetype: UnitArchetype) -> f32 {
        match archetype {
            UnitArchetype::HeavyMelee => self.heavy_melee,
            UnitArchetype::Ranged => self.ranged,
            UnitArchetype::AerialSiege => self.aerial_siege,
            UnitArchetype::Stronghold => self.stronghold,
        }
    }

    fn values(&self) -> [f32; 4] {
        [self.heavy_melee, self.ranged, self.aerial_siege, self.stronghold]
    }
}

/// Grid connectivity used by the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborMode {
    /// 4-connected, Manhattan heuristic
    Cardinal,
    /// 8-connected, octile heuristic
    Octile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// World units per grid cell
    pub tile_size: f32,
    pub neighbor_mode: NeighborMode,
    /// Cost of a horizontal or vertical step
    pub cardinal_cost: f32,
    /// Cost of a diagonal step (1.4, deliberately not sqrt(2))
    pub diagonal_cost: f32,
    /// Added cost for a cell directly next to a hazard (Manhattan distance 1)
    pub hazard_penalty_adjacent: f32,
    /// Added cost for a cell two steps from a hazard
    pub hazard_penalty_near: f32,
    /// Step cost multiplier for ground units entering slow terrain
    ///
    /// Must be at least 1 so the heuristic stays admissible.
    pub slow_terrain_cost: f32,
    /// Ring radius (cells) searched for a passable substitute goal
    pub goal_search_radius: u32,
    /// Upper bound on node expansions per request
    ///
    /// Planning is synchronous inside the tick, so this bounds the worst
    /// case. Exhausting it reports NoPathFound.
    pub max_expansions: usize,
    /// Distance at which a waypoint counts as reached (world units)
    pub waypoint_reach_distance: f32,
    /// Movement destinations are clamped this many tiles inside the map edge
    pub edge_margin_tiles: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            neighbor_mode: NeighborMode::Octile,
            cardinal_cost: 1.0,
            diagonal_cost: 1.4,
            hazard_penalty_adjacent: 5.0,
            hazard_penalty_near: 2.0,
            slow_terrain_cost: 2.0,
            goal_search_radius: 5,
            max_expansions: 20_000,
            waypoint_reach_distance: 16.0,
            edge_margin_tiles: 1.0,
        }
    }
}

/// One step of the force distance multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    /// Inclusive upper bound of the band
    pub max_distance: f32,
    pub multiplier: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceConfig {
    /// Radius around the observer that contributes to either force
    pub radius: f32,
    /// Combat power per archetype
    pub base_values: ArchetypeTable,
    /// Ascending bands; beyond the last band an entity contributes nothing
    pub distance_bands: Vec<DistanceBand>,
    /// ratio < retreat_below => retreat
    pub retreat_below: f32,
    /// retreat_below <= ratio < cautious_below => cautious defense
    pub cautious_below: f32,
    /// cautious_below <= ratio <= engage_up_to => engage, above => push
    pub engage_up_to: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            radius: 400.0,
            base_values: ArchetypeTable {
                heavy_melee: 3.0,
                ranged: 5.0,
                aerial_siege: 8.0,
                stronghold: 0.0,
            },
            distance_bands: vec![
                DistanceBand { max_distance: 100.0, multiplier: 1.0 },
                DistanceBand { max_distance: 200.0, multiplier: 0.75 },
                DistanceBand { max_distance: 300.0, multiplier: 0.5 },
                DistanceBand { max_distance: 400.0, multiplier: 0.25 },
            ],
            retreat_below: 0.5,
            cautious_below: 0.8,
            engage_up_to: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetingConfig {
    /// Wide scan radius for aerial siege units, independent of attack range
    pub siege_detection_radius: f32,
    pub base_scores: ArchetypeTable,
    /// Bonus window: score += max(0, window - distance_to_protected_ally)
    pub proximity_window: f32,
    /// Penalty: score -= distance_to_self / divisor
    pub distance_divisor: f32,
    /// Candidates must be this close to the protected ally
    pub defensive_radius: f32,
    /// World units per point of attack range
    pub unit_to_pixel: f32,
    /// Multiplier applied on top of the scaled attack range
    pub range_safety_multiplier: f32,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            siege_detection_radius: 600.0,
            base_scores: ArchetypeTable {
                heavy_melee: 60.0,
                ranged: 80.0,
                aerial_siege: 100.0,
                stronghold: 0.0,
            },
            proximity_window: 120.0,
            distance_divisor: 10.0,
            defensive_radius: 150.0,
            unit_to_pixel: 24.0,
            range_safety_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscortConfig {
    /// Protected allies farther than this are not checked for combat
    pub influence_radius: f32,
    /// An ally with a non-structure enemy this close is "in combat"
    pub threat_radius: f32,
    /// Standoff kept from the bound ally in formation
    pub ideal_distance: f32,
    /// Half-width of the hold band around ideal_distance
    pub tolerance: f32,
    pub approach_step: f32,
    /// Smaller than approach_step so the formation does not oscillate
    pub retreat_step: f32,
    /// Escorts this close to a protected ally count as its supporters
    pub support_radius: f32,
    /// Most escorts an ally in combat asks for
    pub max_supporters: u32,
}

impl Default for EscortConfig {
    fn default() -> Self {
        Self {
            influence_radius: 200.0,
            threat_radius: 120.0,
            ideal_distance: 90.0,
            tolerance: 25.0,
            approach_step: 50.0,
            retreat_step: 30.0,
            support_radius: 150.0,
            max_supporters: 3,
        }
    }
}

/// Defender count for attacker counts up to `max_attackers`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenderStep {
    pub max_attackers: u32,
    pub defenders: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseDefenseConfig {
    /// Non-structure enemies this close to the stronghold are attackers
    pub threat_radius: f32,
    /// Allies this close to the stronghold count as defenders
    pub defender_radius: f32,
    /// Enemies beyond this distance from the stronghold are not engaged
    pub perimeter_radius: f32,
    /// Observer's own detection radius for defense targets
    pub detection_radius: f32,
    /// Ascending steps; attacker counts past the last step get max_defenders
    pub defender_steps: Vec<DefenderStep>,
    pub max_defenders: u32,
    /// Preferred distance to the engaged enemy
    pub optimal_range: f32,
    pub advance_step: f32,
    /// Advancing never ends farther than this from the stronghold
    pub leash_radius: f32,
    /// Kite back when closer than optimal_range * too_close_fraction
    pub too_close_fraction: f32,
    pub kite_step: f32,
    /// With no threat, return when farther than this from the stronghold
    pub return_distance: f32,
    /// With no threat, settle this far from the stronghold
    pub idle_distance: f32,
}

impl Default for BaseDefenseConfig {
    fn default() -> Self {
        Self {
            threat_radius: 200.0,
            defender_radius: 150.0,
            perimeter_radius: 250.0,
            detection_radius: 300.0,
            defender_steps: vec![
                DefenderStep { max_attackers: 2, defenders: 1 },
                DefenderStep { max_attackers: 4, defenders: 2 },
            ],
            max_defenders: 3,
            optimal_range: 100.0,
            advance_step: 40.0,
            leash_radius: 200.0,
            too_close_fraction: 0.6,
            kite_step: 30.0,
            return_distance: 160.0,
            idle_distance: 120.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum time between two cascade evaluations of one agent
    pub decision_interval_ms: u64,
    /// Retreat stops this far short of the friendly stronghold
    pub retreat_standoff: f32,
    /// Push converges on the enemy stronghold when an ally is this close to it
    pub push_join_radius: f32,
    /// ... or when the agent itself is this close
    pub push_commit_radius: f32,
    /// Closing on a target stops at effective_range * this fraction
    pub approach_fraction: f32,
    /// Siege focus backs off when closer than the approach distance * this
    pub siege_backoff_fraction: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decision_interval_ms: 500,
            retreat_standoff: 96.0,
            push_join_radius: 200.0,
            push_commit_radius: 300.0,
            approach_fraction: 0.9,
            siege_backoff_fraction: 0.6,
        }
    }
}

/// Complete tactical tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TacticsConfig {
    pub navigation: NavigationConfig,
    pub force: ForceConfig,
    pub targeting: TargetingConfig,
    pub escort: EscortConfig,
    pub base_defense: BaseDefenseConfig,
    pub engine: EngineConfig,
}

impl TacticsConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TacticsConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Load a named profile from `data/tactics/`
    pub fn load_profile(name: &str) -> Result<Self> {
        Self::load(profile_path(name))
    }

    /// Validate internal consistency
    pub fn validate(&self) -> Result<()> {
        let nav = &self.navigation;
        positive("navigation.tile_size", nav.tile_size)?;
        positive("navigation.cardinal_cost", nav.cardinal_cost)?;
        if nav.diagonal_cost < nav.cardinal_cost {
            return invalid(format!(
                "navigation.diagonal_cost ({}) must be >= cardinal_cost ({})",
                nav.diagonal_cost, nav.cardinal_cost
            ));
        }
        non_negative("navigation.hazard_penalty_adjacent", nav.hazard_penalty_adjacent)?;
        non_negative("navigation.hazard_penalty_near", nav.hazard_penalty_near)?;
        if !(nav.slow_terrain_cost >= 1.0 && nav.slow_terrain_cost.is_finite()) {
            return invalid(format!(
                "navigation.slow_terrain_cost must be >= 1, got {}",
                nav.slow_terrain_cost
            ));
        }
        if nav.max_expansions == 0 {
            return invalid("navigation.max_expansions must be > 0".into());
        }
        positive("navigation.waypoint_reach_distance", nav.waypoint_reach_distance)?;
        non_negative("navigation.edge_margin_tiles", nav.edge_margin_tiles)?;

        let force = &self.force;
        positive("force.radius", force.radius)?;
        if force.base_values.values().iter().any(|v| *v < 0.0) {
            return invalid("force.base_values must be non-negative".into());
        }
        if force.distance_bands.is_empty() {
            return invalid("force.distance_bands must not be empty".into());
        }
        for pair in force.distance_bands.windows(2) {
            if pair[1].max_distance <= pair[0].max_distance {
                return invalid("force.distance_bands must have ascending max_distance".into());
            }
            if pair[1].multiplier > pair[0].multiplier {
                return invalid("force.distance_bands multipliers must not increase".into());
            }
        }
        if !(0.0 < force.retreat_below
            && force.retreat_below <= force.cautious_below
            && force.cautious_below <= force.engage_up_to)
        {
            return invalid(format!(
                "force thresholds must satisfy 0 < retreat_below ({}) <= cautious_below ({}) <= engage_up_to ({})",
                force.retreat_below, force.cautious_below, force.engage_up_to
            ));
        }

        let tgt = &self.targeting;
        positive("targeting.siege_detection_radius", tgt.siege_detection_radius)?;
        non_negative("targeting.proximity_window", tgt.proximity_window)?;
        positive("targeting.distance_divisor", tgt.distance_divisor)?;
        positive("targeting.defensive_radius", tgt.defensive_radius)?;
        positive("targeting.unit_to_pixel", tgt.unit_to_pixel)?;
        positive("targeting.range_safety_multiplier", tgt.range_safety_multiplier)?;

        let esc = &self.escort;
        positive("escort.influence_radius", esc.influence_radius)?;
        positive("escort.threat_radius", esc.threat_radius)?;
        positive("escort.approach_step", esc.approach_step)?;
        positive("escort.retreat_step", esc.retreat_step)?;
        positive("escort.support_radius", esc.support_radius)?;
        if esc.max_supporters == 0 {
            return invalid("escort.max_supporters must be > 0".into());
        }
        if esc.tolerance < 0.0 || esc.tolerance >= esc.ideal_distance {
            return invalid(format!(
                "escort.tolerance ({}) must be in [0, ideal_distance ({}))",
                esc.tolerance, esc.ideal_distance
            ));
        }

        let def = &self.base_defense;
        positive("base_defense.threat_radius", def.threat_radius)?;
        positive("base_defense.defender_radius", def.defender_radius)?;
        positive("base_defense.perimeter_radius", def.perimeter_radius)?;
        positive("base_defense.detection_radius", def.detection_radius)?;
        positive("base_defense.optimal_range", def.optimal_range)?;
        positive("base_defense.advance_step", def.advance_step)?;
        positive("base_defense.kite_step", def.kite_step)?;
        positive("base_defense.leash_radius", def.leash_radius)?;
        positive("base_defense.return_distance", def.return_distance)?;
        non_negative("base_defense.idle_distance", def.idle_distance)?;
        if !(0.0..1.0).contains(&def.too_close_fraction) {
            return invalid("base_defense.too_close_fraction must be in [0, 1)".into());
        }
        if def.max_defenders == 0 {
            return invalid("base_defense.max_defenders must be > 0".into());
        }
        for pair in def.defender_steps.windows(2) {
            if pair[1].max_attackers <= pair[0].max_attackers
                || pair[1].defenders < pair[0].defenders
            {
                return invalid("base_defense.defender_steps must be ascending".into());
            }
        }
        if def.defender_steps.iter().any(|s| s.defenders > def.max_defenders) {
            return invalid("base_defense.defender_steps exceed max_defenders".into());
        }

        let eng = &self.engine;
        positive("engine.retreat_standoff", eng.retreat_standoff)?;
        positive("engine.push_join_radius", eng.push_join_radius)?;
        positive("engine.push_commit_radius", eng.push_commit_radius)?;
        positive("engine.approach_fraction", eng.approach_fraction)?;
        if !(0.0..1.0).contains(&eng.siege_backoff_fraction) {
            return invalid("engine.siege_backoff_fraction must be in [0, 1)".into());
        }

        Ok(())
    }
}

fn invalid(message: String) -> Result<()> {
    Err(SkirmishError::InvalidConfig(message))
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        invalid(format!("{} must be positive, got {}", name, value))
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        invalid(format!("{} must be non-negative, got {}", name, value))
    }
}

fn profile_path(name: &str) -> PathBuf {
    PathBuf::from("data/tactics").join(format!("{}.toml", name))
}
