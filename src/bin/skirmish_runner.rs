//! Headless Skirmish Runner
//!
//! Drives two engine-controlled teams through a seeded sandbox and prints
//! the outcome.

use std::collections::BTreeMap;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use skirmish_ai::core::{Result, TacticsConfig, TeamId};
use skirmish_ai::sandbox::{random_skirmish, Outcome};
use skirmish_ai::tactics::DecisionEngine;
use skirmish_ai::world::Intent;

/// Headless Skirmish Runner - engine vs engine on a random map
#[derive(Parser, Debug)]
#[command(name = "skirmish_runner")]
#[command(about = "Run a seeded skirmish between two engine-controlled teams")]
struct Args {
    /// Tactics profile name (data/tactics/<name>.toml) or a path to a TOML file
    #[arg(long, default_value = "default")]
    config: String,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum ticks before the run counts as undecided
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Map width in tiles
    #[arg(long, default_value_t = 40)]
    map_width: i32,

    /// Map height in tiles
    #[arg(long, default_value_t = 30)]
    map_height: i32,

    /// Units spawned per team, strongholds excluded
    #[arg(long, default_value_t = 8)]
    units_per_team: usize,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Log every decision
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Sandbox milliseconds per tick
const TICK_MS: u64 = 100;

#[derive(Serialize)]
struct SkirmishResult {
    outcome: Outcome,
    ticks: u64,
    seed: u64,
    team_one_survivors: usize,
    team_two_survivors: usize,
    decisions: BTreeMap<String, usize>,
    paths_planned: usize,
    path_failures: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = if args.config.ends_with(".toml") {
        TacticsConfig::load(&args.config)?
    } else {
        TacticsConfig::load_profile(&args.config)?
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut sandbox = random_skirmish(
        &mut rng,
        args.map_width,
        args.map_height,
        config.navigation.tile_size,
        args.units_per_team,
    );
    let mut engine = DecisionEngine::new(config)?;

    info!(seed, width = args.map_width, height = args.map_height, "skirmish started");

    let mut decisions: BTreeMap<String, usize> = BTreeMap::new();
    let mut paths_planned = 0;
    let mut path_failures = 0;
    let mut ticks = 0;

    while ticks < args.ticks && sandbox.outcome() == Outcome::Undecided {
        let snapshot = sandbox.snapshot();
        let agents = sandbox.agents();
        let mut intents: Vec<(skirmish_ai::core::EntityId, Intent)> = Vec::new();

        let report = engine.tick(sandbox.now(), &agents, &snapshot, sandbox.terrain(), &mut intents);
        for record in &report.decisions {
            *decisions.entry(format!("{:?}", record.kind)).or_default() += 1;
        }
        paths_planned += report.paths_planned;
        path_failures += report.path_failures;

        sandbox.apply(&intents);
        sandbox.step(TICK_MS);
        ticks += 1;
    }

    let result = SkirmishResult {
        outcome: sandbox.outcome(),
        ticks,
        seed,
        team_one_survivors: sandbox.alive_units(TeamId(1)),
        team_two_survivors: sandbox.alive_units(TeamId(2)),
        decisions,
        paths_planned,
        path_failures,
    };
    info!(outcome = ?result.outcome, ticks, "skirmish finished");

    match args.format.as_str() {
        "text" => {
            println!("Skirmish Result");
            println!("===============");
            println!("Outcome: {:?}", result.outcome);
            println!("Ticks: {}", result.ticks);
            println!("Survivors: {} vs {}", result.team_one_survivors, result.team_two_survivors);
            println!("Paths planned: {} ({} failed)", result.paths_planned, result.path_failures);
            for (kind, count) in &result.decisions {
                println!("  {}: {}", kind, count);
            }
            println!("Seed: {}", result.seed);
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}
