use dredge::{Grid, OreProfile, Position};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub(super) fn run_map(
    width: i32,
    height: i32,
    seed: Option<u64>,
    profile: OreProfile,
    json: bool,
) -> Result<(), String> {
    if width < 4 || height < 4 {
        return Err("map must be at least 4x4".into());
    }

    let seed = match seed {
        Some(seed) => seed,
        None => rand::random(),
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let shipyard = Position::new(width / 2, height / 2);
    let grid = Grid::generate(width, height, shipyard, profile, &mut rng);

    let (richest, peak) = grid.richest_cell();
    let cells = (width as u64) * (height as u64);
    let mean = grid.total_ore() / cells.max(1);
    println!(
        "Map {}x{} ({}) | seed={} | shipyard at {}",
        width, height, profile, seed, shipyard
    );
    println!(
        "Ore: total={} | mean per cell={} | richest cell {} holding {}",
        grid.total_ore(),
        mean,
        richest,
        peak
    );

    if json {
        let json_str = serde_json::to_string_pretty(&grid).map_err(|e| e.to_string())?;
        println!("{}", json_str);
    }

    Ok(())
}
