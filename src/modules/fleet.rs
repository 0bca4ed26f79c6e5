use serde::{Deserialize, Serialize};

use crate::modules::grid::{Direction, Grid, Position};

pub type ShipId = u64;

/// One dredging ship as the planner sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub id: ShipId,
    pub position: Position,
    pub cargo: u32,
}

impl Ship {
    pub fn new(id: ShipId, position: Position) -> Self {
        Self {
            id,
            position,
            cargo: 0,
        }
    }

    pub fn is_full(&self, max_cargo: u32) -> bool {
        self.cargo >= max_cargo
    }
}

/// Fixed constants a match runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Most ore a ship can carry.
    pub max_cargo: u32,
    /// Bank cost of producing a new ship.
    pub ship_cost: u32,
    /// Divisor for per-turn extraction while staying on a cell.
    pub extract_ratio: u32,
    /// Divisor for the ore cost of leaving a cell.
    pub move_cost_ratio: u32,
    /// Last turn of the match.
    pub max_turns: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_cargo: 1000,
            ship_cost: 1000,
            extract_ratio: 4,
            move_cost_ratio: 10,
            max_turns: 400,
        }
    }
}

impl Rules {
    /// Ore deducted from cargo for leaving a cell holding `cell_ore`.
    pub fn move_cost(&self, cell_ore: u32) -> u32 {
        cell_ore / self.move_cost_ratio.max(1)
    }

    /// Ore lifted in one turn of extraction from a cell holding `cell_ore`.
    pub fn extraction(&self, cell_ore: u32) -> u32 {
        let ratio = self.extract_ratio.max(1);
        cell_ore.div_ceil(ratio)
    }
}

/// Read surface handed to the planner each turn.
#[derive(Clone, Copy, Debug)]
pub struct TurnView<'a> {
    pub grid: &'a Grid,
    pub ships: &'a [Ship],
    pub shipyard: Position,
    pub bank: u32,
    pub turn: u32,
    pub rules: &'a Rules,
}

/// One entry of the per-turn command batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Move { ship: ShipId, direction: Direction },
    Spawn,
}
