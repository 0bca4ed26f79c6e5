use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Most ore a freshly generated cell can hold.
pub const MAX_CELL_ORE: u32 = 1000;

/// Fixed order in which the four neighbour cells are scanned.
pub const CARDINALS: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Still,
}

impl Direction {
    /// Unit offset for one step. North decreases y; y grows southward.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::Still => (0, 0),
        }
    }

    pub const fn invert(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Still => Direction::Still,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Still => "still",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    /// One unnormalized step; callers wrap through [`Grid::normalize`].
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// How generated ore is laid out over the seabed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OreProfile {
    Clustered,
    Uniform,
}

impl OreProfile {
    pub const fn label(self) -> &'static str {
        match self {
            OreProfile::Clustered => "clustered",
            OreProfile::Uniform => "uniform",
        }
    }
}

impl Default for OreProfile {
    fn default() -> Self {
        OreProfile::Clustered
    }
}

impl fmt::Display for OreProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for OreProfile {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clustered" => Ok(OreProfile::Clustered),
            "uniform" => Ok(OreProfile::Uniform),
            _ => Err(()),
        }
    }
}

/// Toroidal seabed: every coordinate wraps on both axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<u32>,
}

impl Grid {
    /// Empty grid. Dimensions are clamped to at least one cell per axis.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![0; (width * height) as usize],
        }
    }

    /// Seeded ore field with the shipyard cell kept bare.
    pub fn generate(
        width: i32,
        height: i32,
        shipyard: Position,
        profile: OreProfile,
        rng: &mut impl Rng,
    ) -> Self {
        let mut grid = Self::new(width, height);
        match profile {
            OreProfile::Uniform => {
                for cell in grid.cells.iter_mut() {
                    *cell = rng.gen_range(20..=280);
                }
            }
            OreProfile::Clustered => {
                let lodes = ((grid.width * grid.height) / 48).max(4);
                for _ in 0..lodes {
                    let center = Position::new(
                        rng.gen_range(0..grid.width),
                        rng.gen_range(0..grid.height),
                    );
                    let peak = rng.gen_range(400..=900);
                    let reach = rng.gen_range(2..=4);
                    for dx in -reach..=reach {
                        for dy in -reach..=reach {
                            let spot = grid.normalize(Position::new(center.x + dx, center.y + dy));
                            let span = (dx.abs() + dy.abs()) as u32;
                            if span > reach as u32 {
                                continue;
                            }
                            let deposit = peak / (1 + span);
                            let index = grid.index(spot);
                            grid.cells[index] =
                                (grid.cells[index] + deposit).min(MAX_CELL_ORE);
                        }
                    }
                }
            }
        }
        let home = grid.index(shipyard);
        grid.cells[home] = 0;
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Wraps a coordinate onto the grid on both axes.
    pub fn normalize(&self, position: Position) -> Position {
        Position {
            x: position.x.rem_euclid(self.width),
            y: position.y.rem_euclid(self.height),
        }
    }

    fn index(&self, position: Position) -> usize {
        let position = self.normalize(position);
        (position.y * self.width + position.x) as usize
    }

    pub fn ore_at(&self, position: Position) -> u32 {
        self.cells[self.index(position)]
    }

    pub fn set_ore(&mut self, position: Position, amount: u32) {
        let index = self.index(position);
        self.cells[index] = amount;
    }

    pub fn total_ore(&self) -> u64 {
        self.cells.iter().map(|&cell| u64::from(cell)).sum()
    }

    /// Richest cell and its ore; ties resolve to the lowest index.
    pub fn richest_cell(&self) -> (Position, u32) {
        let mut best = Position::origin();
        let mut best_ore = self.cells[0];
        for y in 0..self.height {
            for x in 0..self.width {
                let here = Position::new(x, y);
                let ore = self.ore_at(here);
                if ore > best_ore {
                    best = here;
                    best_ore = ore;
                }
            }
        }
        (best, best_ore)
    }

    /// One step in `direction`, wrapped back onto the grid.
    pub fn step_from(&self, position: Position, direction: Direction) -> Position {
        self.normalize(position.step(direction))
    }

    /// Wrap-aware Manhattan distance: per axis, the shorter way around.
    pub fn wrap_distance(&self, a: Position, b: Position) -> i32 {
        let a = self.normalize(a);
        let b = self.normalize(b);
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        dx.min(self.width - dx) + dy.min(self.height - dy)
    }

    /// Directions that shorten the path to `destination`, one per axis,
    /// x axis first. A direct span of half the grid or more goes the
    /// wrapped way. Empty when already there.
    pub fn moves_toward(&self, source: Position, destination: Position) -> Vec<Direction> {
        let source = self.normalize(source);
        let destination = self.normalize(destination);
        let mut moves = Vec::with_capacity(2);

        let dx = (destination.x - source.x).abs();
        if dx != 0 {
            let direct = if destination.x > source.x {
                Direction::East
            } else {
                Direction::West
            };
            moves.push(if dx * 2 < self.width {
                direct
            } else {
                direct.invert()
            });
        }

        let dy = (destination.y - source.y).abs();
        if dy != 0 {
            let direct = if destination.y > source.y {
                Direction::South
            } else {
                Direction::North
            };
            moves.push(if dy * 2 < self.height {
                direct
            } else {
                direct.invert()
            });
        }

        moves
    }
}
