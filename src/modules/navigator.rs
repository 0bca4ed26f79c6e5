use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::modules::grid::{CARDINALS, Direction, Grid, Position};

/// Turn-scoped set of cells already promised as some ship's next position.
/// Built empty each turn; whoever is processed first claims first.
#[derive(Debug, Clone, Default)]
pub struct Reservations {
    claimed: HashSet<Position>,
}

impl Reservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_claimed(&self, position: Position) -> bool {
        self.claimed.contains(&position)
    }

    /// Claims a cell. Returns false when someone already holds it.
    pub fn try_claim(&mut self, position: Position) -> bool {
        self.claimed.insert(position)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// A resolved single-step move. `reserved` is false only when every escape
/// cell was taken and the ship stays put on a possibly contested cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub direction: Direction,
    pub reserved: bool,
}

/// Resolves one ship's desired destination into a single step.
///
/// Tier 1 tries the distance-reducing directions in random order and takes
/// the first free cell. Tier 2 stays put if the ship's own cell is free.
/// Tier 3 wanders to a random free neighbour. When all of those cells are
/// claimed the ship stays anyway and the collision is accepted.
pub fn navigate(
    grid: &Grid,
    position: Position,
    destination: Position,
    reservations: &mut Reservations,
    rng: &mut impl Rng,
) -> Step {
    let position = grid.normalize(position);

    let mut toward = grid.moves_toward(position, destination);
    toward.shuffle(rng);
    for direction in toward {
        if reservations.try_claim(grid.step_from(position, direction)) {
            return Step {
                direction,
                reserved: true,
            };
        }
    }

    if reservations.try_claim(position) {
        return Step {
            direction: Direction::Still,
            reserved: true,
        };
    }

    let open: Vec<Direction> = CARDINALS
        .iter()
        .copied()
        .filter(|&direction| !reservations.is_claimed(grid.step_from(position, direction)))
        .collect();
    match open.choose(rng) {
        Some(&direction) => {
            reservations.try_claim(grid.step_from(position, direction));
            Step {
                direction,
                reserved: true,
            }
        }
        None => Step {
            direction: Direction::Still,
            reserved: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn grid() -> Grid {
        Grid::new(32, 32)
    }

    #[test]
    fn moves_straight_at_the_destination_when_free() {
        let grid = grid();
        let mut reservations = Reservations::new();
        let mut rng = StdRng::seed_from_u64(1);
        let step = navigate(
            &grid,
            Position::new(16, 16),
            Position::new(19, 16),
            &mut reservations,
            &mut rng,
        );
        assert_eq!(step.direction, Direction::East);
        assert!(step.reserved);
        assert!(reservations.is_claimed(Position::new(17, 16)));
    }

    #[test]
    fn contested_cell_goes_to_the_first_ship() {
        let grid = grid();
        let mut reservations = Reservations::new();
        let mut rng = StdRng::seed_from_u64(2);
        let contested = Position::new(17, 16);

        let first = navigate(
            &grid,
            Position::new(16, 16),
            contested,
            &mut reservations,
            &mut rng,
        );
        assert_eq!(first.direction, Direction::East);
        assert!(reservations.is_claimed(contested));

        // The loser wanted the same cell from the other side; it must end
        // up somewhere else, on a cell nobody had claimed before.
        let second = navigate(
            &grid,
            Position::new(18, 16),
            contested,
            &mut reservations,
            &mut rng,
        );
        let landed = grid.step_from(Position::new(18, 16), second.direction);
        assert_ne!(landed, contested);
        assert!(second.reserved);
        assert!(reservations.is_claimed(landed));
    }

    #[test]
    fn stays_put_when_every_approach_is_taken() {
        let grid = grid();
        let mut reservations = Reservations::new();
        let mut rng = StdRng::seed_from_u64(3);
        let here = Position::new(10, 10);
        reservations.try_claim(Position::new(11, 10));

        let step = navigate(&grid, here, Position::new(13, 10), &mut reservations, &mut rng);
        assert_eq!(step.direction, Direction::Still);
        assert!(step.reserved);
        assert!(reservations.is_claimed(here));
    }

    #[test]
    fn wanders_to_the_only_open_neighbour() {
        let grid = grid();
        let mut reservations = Reservations::new();
        let mut rng = StdRng::seed_from_u64(4);
        let here = Position::new(10, 10);
        // Approach cell, own cell, and all neighbours but one are taken.
        reservations.try_claim(Position::new(11, 10));
        reservations.try_claim(here);
        reservations.try_claim(Position::new(10, 9));
        reservations.try_claim(Position::new(10, 11));

        let step = navigate(&grid, here, Position::new(13, 10), &mut reservations, &mut rng);
        assert_eq!(step.direction, Direction::West);
        assert!(step.reserved);
        assert!(reservations.is_claimed(Position::new(9, 10)));
    }

    #[test]
    fn boxed_in_ship_accepts_the_collision() {
        let grid = grid();
        let mut reservations = Reservations::new();
        let mut rng = StdRng::seed_from_u64(5);
        let here = Position::new(10, 10);
        for direction in CARDINALS {
            reservations.try_claim(grid.step_from(here, direction));
        }
        reservations.try_claim(here);
        let before = reservations.len();

        let step = navigate(&grid, here, Position::new(12, 12), &mut reservations, &mut rng);
        assert_eq!(step.direction, Direction::Still);
        assert!(!step.reserved);
        assert_eq!(reservations.len(), before);
    }

    #[test]
    fn navigating_to_the_own_cell_claims_it() {
        let grid = grid();
        let mut reservations = Reservations::new();
        let mut rng = StdRng::seed_from_u64(6);
        let here = Position::new(4, 4);
        let step = navigate(&grid, here, here, &mut reservations, &mut rng);
        assert_eq!(step.direction, Direction::Still);
        assert!(step.reserved);
        assert!(reservations.is_claimed(here));
    }

    #[test]
    fn same_seed_resolves_the_same_way() {
        let grid = grid();
        let run = |seed: u64| {
            let mut reservations = Reservations::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut directions = Vec::new();
            for ship in 0..6 {
                let from = Position::new(10 + ship, 10);
                let step = navigate(&grid, from, Position::new(13, 13), &mut reservations, &mut rng);
                directions.push(step.direction);
            }
            directions
        };
        assert_eq!(run(9), run(9));
    }
}
