use crate::modules::grid::{Grid, Position};
use crate::modules::session::Session;

/// Smallest half-size of the target search window, in cells.
pub const MIN_SEARCH_RADIUS: i32 = 10;

/// Sign pair aiming a search window away from the shipyard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quadrant {
    pub x_sign: i32,
    pub y_sign: i32,
}

/// Rotation order of search quadrants across successive assignments.
pub const QUADRANTS: [Quadrant; 4] = [
    Quadrant { x_sign: 1, y_sign: 1 },
    Quadrant { x_sign: -1, y_sign: 1 },
    Quadrant { x_sign: 1, y_sign: -1 },
    Quadrant { x_sign: -1, y_sign: -1 },
];

impl Quadrant {
    pub fn from_ordinal(ordinal: u64) -> Quadrant {
        QUADRANTS[(ordinal % 4) as usize]
    }
}

/// Window half-size for the given turn. Starts at [`MIN_SEARCH_RADIUS`] and
/// widens linearly toward half the map height as the match runs out.
pub fn search_radius(turn: u32, max_turns: u32, grid_height: i32) -> i32 {
    let widest = f64::from(grid_height) / 2.0;
    let progress = f64::from(turn) / f64::from(max_turns.max(1));
    let radius = f64::from(MIN_SEARCH_RADIUS) + progress * (widest - f64::from(MIN_SEARCH_RADIUS));
    (radius as i32).max(MIN_SEARCH_RADIUS)
}

/// Richest cell in a `radius` by `radius` window stepped out from the
/// shipyard along the quadrant's signs. Scan order is x-major from the
/// shipyard outward; ties keep the first cell seen. Falls back to the
/// shipyard itself when the window holds no ore.
pub fn richest_in_window(
    grid: &Grid,
    shipyard: Position,
    quadrant: Quadrant,
    radius: i32,
) -> Position {
    let shipyard = grid.normalize(shipyard);
    let mut best = shipyard;
    let mut best_ore = 0;
    for x_offset in 0..radius {
        for y_offset in 0..radius {
            let candidate = grid.normalize(Position::new(
                shipyard.x + x_offset * quadrant.x_sign,
                shipyard.y + y_offset * quadrant.y_sign,
            ));
            let ore = grid.ore_at(candidate);
            if ore > best_ore {
                best = candidate;
                best_ore = ore;
            }
        }
    }
    best
}

/// Picks the next exploration target and advances the quadrant rotation.
pub fn select_target(
    session: &mut Session,
    grid: &Grid,
    shipyard: Position,
    turn: u32,
    max_turns: u32,
) -> Position {
    let quadrant = Quadrant::from_ordinal(session.next_assignment());
    let radius = search_radius(turn, max_turns, grid.height());
    richest_in_window(grid, shipyard, quadrant, radius)
}
