use std::path::PathBuf;

use dredge::{RunRecord, load_latest_record, load_run_record};

pub(super) fn run_replay(path: Option<PathBuf>) -> Result<(), String> {
    let record = match path {
        Some(path) => load_run_record(&path).map_err(|e| e.to_string())?,
        None => match load_latest_record().map_err(|e| e.to_string())? {
            Some(record) => record,
            None => {
                println!("No finished runs recorded yet. Run `dredge sim` first.");
                return Ok(());
            }
        },
    };

    print_record(&record);
    Ok(())
}

fn print_record(record: &RunRecord) {
    println!(
        "Run finished {} | seed={} | map {}x{} ({})",
        record.finished_at, record.seed, record.width, record.height, record.profile
    );
    println!(
        "Result: {} turn(s) | bank={} | fleet={} (built {}, lost {})",
        record.turns_played, record.bank, record.ships_alive, record.ships_built, record.ships_lost
    );
    println!(
        "Planner totals: targets={} flips={} holds={} low_energy={} boxed_in={} spawns={}",
        record.stats.targets_assigned,
        record.stats.state_changes,
        record.stats.extraction_holds,
        record.stats.low_energy_holds,
        record.stats.soft_collisions,
        record.stats.spawns_requested
    );
    println!(
        "Rules: cargo max {} | ship cost {} | extract 1/{} per stay | toll 1/{} to leave",
        record.rules.max_cargo,
        record.rules.ship_cost,
        record.rules.extract_ratio,
        record.rules.move_cost_ratio
    );
    println!(
        "Production policy: cap {} | window ends turn {} | cooldown {} turn(s)",
        record.settings.max_ships, record.settings.last_spawn_turn, record.settings.spawn_cooldown
    );
    println!("State digest: {}", record.final_digest);
}
