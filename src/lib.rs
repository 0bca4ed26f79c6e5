pub mod modules;

pub use modules::fleet::{Command, Rules, Ship, ShipId, TurnView};
pub use modules::grid::{CARDINALS, Direction, Grid, MAX_CELL_ORE, OreProfile, Position};
pub use modules::navigator::{Reservations, Step, navigate};
pub use modules::planner::{
    LAST_SPAWN_TURN, MAX_SHIPS, PlanEvent, PlannerSettings, SPAWN_COOLDOWN, TurnPlan,
    hold_threshold, plan_turn,
};
pub use modules::record::{
    RunRecord, RunStats, load_latest_record, load_run_record, save_run_record, timestamp_now,
};
pub use modules::search::{
    MIN_SEARCH_RADIUS, QUADRANTS, Quadrant, richest_in_window, search_radius, select_target,
};
pub use modules::session::{Session, ShipState};
pub use modules::sim::{CommandRejection, SimError, SimEvent, Simulation, TurnOutcome};
