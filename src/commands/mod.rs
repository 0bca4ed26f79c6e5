use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use dredge::{
    Grid, LAST_SPAWN_TURN, MAX_SHIPS, OreProfile, PlanEvent, PlannerSettings, Position, RunRecord,
    RunStats, Rules, SPAWN_COOLDOWN, Session, SimEvent, Simulation, TurnOutcome, plan_turn,
    save_run_record, timestamp_now,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

mod map;
mod replay;

use map::run_map;
use replay::run_replay;

#[derive(Parser)]
#[command(
    name = "dredge",
    version,
    about = "Dredge seabed mining sandbox CLI (fleet runs, maps, records)",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Play a full mining match with the fleet planner
    Sim {
        /// Map width in cells
        #[arg(long, default_value_t = 32)]
        width: i32,
        /// Map height in cells
        #[arg(long, default_value_t = 32)]
        height: i32,
        /// RNG seed (omit for a random one; the run record keeps whichever was used)
        #[arg(long)]
        seed: Option<u64>,
        /// Number of turns to play
        #[arg(short = 't', long, default_value_t = 400)]
        turns: u32,
        /// Most ships kept alive at once
        #[arg(long, default_value_t = MAX_SHIPS)]
        max_ships: u32,
        /// Last turn on which producing a new ship is considered
        #[arg(long, default_value_t = LAST_SPAWN_TURN)]
        spawn_until: u32,
        /// Turns that must pass between two productions
        #[arg(long, default_value_t = SPAWN_COOLDOWN)]
        spawn_cooldown: u32,
        /// Starting bank balance
        #[arg(long, default_value_t = 5000)]
        bank: u32,
        /// Ore layout for the generated map
        #[arg(long, default_value_t = OreProfile::Clustered, value_enum)]
        profile: OreProfile,
        /// Print a fleet summary every N turns (0 to stay quiet between turns)
        #[arg(long, default_value_t = 50)]
        every: u32,
        /// Print every planner decision and seabed event
        #[arg(long)]
        verbose: bool,
        /// Write a run record when the match ends (disable with --no-record)
        #[arg(long = "no-record", action = ArgAction::SetFalse, default_value_t = true)]
        record: bool,
    },
    /// Generate an ore map and report its layout
    Map {
        /// Map width in cells
        #[arg(long, default_value_t = 32)]
        width: i32,
        /// Map height in cells
        #[arg(long, default_value_t = 32)]
        height: i32,
        /// RNG seed (omit for a random one)
        #[arg(long)]
        seed: Option<u64>,
        /// Ore layout for the generated map
        #[arg(long, default_value_t = OreProfile::Clustered, value_enum)]
        profile: OreProfile,
        /// Print the full map JSON to stdout
        #[arg(long)]
        json: bool,
    },
    /// Show the record of a saved run
    Replay {
        /// Path to a run record JSON (defaults to the latest run)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli.command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Sim {
            width,
            height,
            seed,
            turns,
            max_ships,
            spawn_until,
            spawn_cooldown,
            bank,
            profile,
            every,
            verbose,
            record,
        } => run_sim(
            width,
            height,
            seed,
            turns,
            max_ships,
            spawn_until,
            spawn_cooldown,
            bank,
            profile,
            every,
            verbose,
            record,
        ),
        Command::Map {
            width,
            height,
            seed,
            profile,
            json,
        } => run_map(width, height, seed, profile, json),
        Command::Replay { path } => run_replay(path),
    }
}

fn run_sim(
    width: i32,
    height: i32,
    seed: Option<u64>,
    turns: u32,
    max_ships: u32,
    spawn_until: u32,
    spawn_cooldown: u32,
    bank: u32,
    profile: OreProfile,
    every: u32,
    verbose: bool,
    record: bool,
) -> Result<(), String> {
    if width < 4 || height < 4 {
        return Err("map must be at least 4x4".into());
    }
    if turns == 0 {
        return Err("turns must be at least 1".into());
    }

    let seed = match seed {
        Some(seed) => seed,
        None => rand::random(),
    };
    let mut rng = StdRng::seed_from_u64(seed);

    let shipyard = Position::new(width / 2, height / 2);
    let rules = Rules {
        max_turns: turns,
        ..Rules::default()
    };
    let settings = PlannerSettings {
        max_ships,
        last_spawn_turn: spawn_until,
        spawn_cooldown,
    };

    let grid = Grid::generate(width, height, shipyard, profile, &mut rng);
    println!(
        "Map {}x{} ({}) | seed={} | total ore {} | shipyard at {}",
        width,
        height,
        profile,
        seed,
        grid.total_ore(),
        shipyard
    );

    let mut sim = Simulation::new(grid, shipyard, bank, rules);
    let mut session = Session::new();
    let mut stats = RunStats::default();

    while !sim.is_over() {
        let plan = plan_turn(&sim.view(), &settings, &mut session, &mut rng);
        for event in &plan.events {
            stats.record(event);
        }
        let outcome = sim.step(&plan.commands);
        report_turn(&sim, &outcome, &plan.events, every, verbose);
    }

    let digest = sim.state_digest();
    println!(
        "Run complete: {} turn(s) | bank={} | fleet={} (built {}, lost {})",
        turns,
        sim.bank(),
        sim.ships().len(),
        sim.ships_built(),
        sim.ships_lost()
    );
    println!(
        "Planner totals: targets={} flips={} holds={} low_energy={} boxed_in={} spawns={}",
        stats.targets_assigned,
        stats.state_changes,
        stats.extraction_holds,
        stats.low_energy_holds,
        stats.soft_collisions,
        stats.spawns_requested
    );
    println!("State digest: {}", digest);

    if record {
        let finished = RunRecord {
            finished_at: timestamp_now(),
            seed,
            width,
            height,
            profile,
            rules,
            settings,
            turns_played: turns,
            bank: sim.bank(),
            ships_alive: sim.ships().len() as u32,
            ships_built: sim.ships_built(),
            ships_lost: sim.ships_lost(),
            stats,
            final_digest: digest,
        };
        let path =
            save_run_record(&finished).map_err(|e| format!("failed to save run record: {}", e))?;
        println!("Run record written to {}", path.display());
    }

    Ok(())
}

fn report_turn(
    sim: &Simulation,
    outcome: &TurnOutcome,
    plan_events: &[PlanEvent],
    every: u32,
    verbose: bool,
) {
    if verbose {
        println!(
            "Turn {}: {} event(s), {} rejection(s)",
            outcome.turn,
            outcome.events.len(),
            outcome.rejections.len()
        );
        for event in plan_events {
            println!(" - {}", describe_plan_event(event));
        }
        for event in &outcome.events {
            println!(" - {}", describe_sim_event(event));
        }
    } else if every > 0 && outcome.turn % every == 0 {
        let aboard: u32 = sim.ships().iter().map(|ship| ship.cargo).sum();
        println!(
            "Turn {} | bank={} | fleet={} | cargo aboard={} | ore left={}",
            outcome.turn,
            sim.bank(),
            sim.ships().len(),
            aboard,
            sim.grid().total_ore()
        );
    }

    for rejection in &outcome.rejections {
        eprintln!("warning: turn {}: {}", outcome.turn, rejection);
    }
}

fn describe_plan_event(event: &PlanEvent) -> String {
    match event {
        PlanEvent::TargetAssigned { ship, target } => {
            format!("ship {} assigned target {}", ship, target)
        }
        PlanEvent::StateChanged { ship, state } => {
            format!("ship {} switched to {}", ship, state)
        }
        PlanEvent::LowEnergyHold { ship } => {
            format!("ship {} held still to refuel from its cell", ship)
        }
        PlanEvent::ExtractionHold { ship } => {
            format!("ship {} held still over a rich cell", ship)
        }
        PlanEvent::BoxedIn { ship } => {
            format!("ship {} boxed in with nowhere safe to go", ship)
        }
        PlanEvent::SpawnRequested => "production ordered at the shipyard".to_string(),
    }
}

fn describe_sim_event(event: &SimEvent) -> String {
    match event {
        SimEvent::Moved { ship, from, to } => {
            format!("ship {} moved from {} to {}", ship, from, to)
        }
        SimEvent::Extracted { ship, amount } => {
            format!("ship {} extracted {} ore", ship, amount)
        }
        SimEvent::Deposited { ship, amount } => {
            format!("ship {} deposited {} ore", ship, amount)
        }
        SimEvent::Spawned { ship } => format!("ship {} launched from the shipyard", ship),
        SimEvent::Wrecked { ships, position } => {
            let ids: Vec<String> = ships.iter().map(|id| id.to_string()).collect();
            format!("ships {} wrecked at {}", ids.join(", "), position)
        }
    }
}
