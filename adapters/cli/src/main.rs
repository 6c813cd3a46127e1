#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for the tile-world simulation.

mod logging;
mod scenario;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tileworld_core::{Command, Event};
use tileworld_world::{self as world, query, World};

use crate::scenario::Scenario;

/// Command-line options accepted by the runner.
#[derive(Debug, Parser)]
#[command(name = "tileworld", about = "Runs a tile-world navigation scenario")]
struct Cli {
    /// Scenario file in TOML format. The built-in demo runs when omitted.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 240)]
    ticks: u64,
    /// Overrides the random seed from the scenario.
    #[arg(long)]
    seed: Option<u64>,
    /// Prints every navigation mesh edge before running.
    #[arg(long)]
    dump_mesh: bool,
    /// Enables debug logging unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Tallies of the events observed while the simulation ran.
#[derive(Clone, Copy, Debug, Default)]
struct RunSummary {
    moves: usize,
    paths_planned: usize,
    paths_unavailable: usize,
    paths_abandoned: usize,
    goals_reached: usize,
}

impl RunSummary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EntityMoved { .. } => self.moves += 1,
                Event::PathPlanned { .. } => self.paths_planned += 1,
                Event::PathUnavailable { .. } => self.paths_unavailable += 1,
                Event::PathAbandoned { .. } => self.paths_abandoned += 1,
                Event::GoalReached { .. } => self.goals_reached += 1,
                _ => {}
            }
        }
    }
}

/// Entry point for the tile-world command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut scenario = match &cli.scenario {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read scenario {}", path.display()))?;
            Scenario::from_toml_str(&source)
                .with_context(|| format!("failed to load scenario {}", path.display()))?
        }
        None => Scenario::demo().context("built-in demo scenario is invalid")?,
    };
    if let Some(seed) = cli.seed {
        scenario.config.seed = seed;
    }

    let mut world = scenario.instantiate()?;
    if cli.dump_mesh {
        dump_mesh(&world);
    }

    let summary = run(&mut world, cli.ticks);
    info!(
        "{} ticks: {} moves, {} paths planned, {} unavailable, {} abandoned, {} goals reached",
        cli.ticks,
        summary.moves,
        summary.paths_planned,
        summary.paths_unavailable,
        summary.paths_abandoned,
        summary.goals_reached
    );
    print_entities(&world);
    Ok(())
}

fn run(world: &mut World, ticks: u64) -> RunSummary {
    let mut summary = RunSummary::default();
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.clear();
        world::apply(world, Command::Tick, &mut events);
        summary.record(&events);
    }
    summary
}

fn dump_mesh(world: &World) {
    let mesh = query::nav_mesh(world);
    println!(
        "navigation mesh: {} nodes, {} edges",
        mesh.node_count(),
        mesh.edge_count()
    );
    for (from, to) in mesh.edges() {
        println!(
            "  ({:.1}, {:.1}) -> ({:.1}, {:.1})",
            from.x, from.y, to.x, to.y
        );
    }
}

fn print_entities(world: &World) {
    let tile_size = query::tile_size(world);
    for entity in query::entities(world) {
        let tile = tile_size.tile_containing(entity.position);
        println!(
            "{:>3} {:<10} ({:>7.1}, {:>7.1}) tile {:?} goal {:?}",
            entity.id.get(),
            format!("{:?}", entity.kind),
            entity.position.x,
            entity.position.y,
            tile,
            entity.goal
        );
    }
}
