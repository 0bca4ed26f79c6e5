use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::fleet::ShipId;
use crate::modules::grid::Position;

/// Persistent role a ship carries between turns. Extraction holds are
/// per-turn decisions and never stored here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipState {
    Exploring,
    Returning,
}

impl ShipState {
    pub const fn label(self) -> &'static str {
        match self {
            ShipState::Exploring => "exploring",
            ShipState::Returning => "returning",
        }
    }
}

impl fmt::Display for ShipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Planner memory for one match. Entries appear the first time a ship id
/// shows up and are never evicted; ids do not recycle within a match, so
/// records of lost ships simply go stale.
#[derive(Debug, Clone, Default)]
pub struct Session {
    states: HashMap<ShipId, ShipState>,
    targets: HashMap<ShipId, Position>,
    assignment_counter: u64,
    last_spawn_turn: Option<u32>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current role for `ship`, registering an unseen id as `Exploring`.
    pub fn state_of(&mut self, ship: ShipId) -> ShipState {
        *self.states.entry(ship).or_insert(ShipState::Exploring)
    }

    pub fn set_state(&mut self, ship: ShipId, state: ShipState) {
        self.states.insert(ship, state);
    }

    pub fn target(&self, ship: ShipId) -> Option<Position> {
        self.targets.get(&ship).copied()
    }

    pub fn set_target(&mut self, ship: ShipId, target: Position) {
        self.targets.insert(ship, target);
    }

    pub fn clear_target(&mut self, ship: ShipId) {
        self.targets.remove(&ship);
    }

    /// Hands out the next target-assignment ordinal. Never resets, so the
    /// quadrant rotation keeps cycling across the whole match.
    pub fn next_assignment(&mut self) -> u64 {
        let ordinal = self.assignment_counter;
        self.assignment_counter += 1;
        ordinal
    }

    pub fn assignments_made(&self) -> u64 {
        self.assignment_counter
    }

    pub fn last_spawn_turn(&self) -> Option<u32> {
        self.last_spawn_turn
    }

    pub fn record_spawn(&mut self, turn: u32) {
        self.last_spawn_turn = Some(turn);
    }

    pub fn tracked(&self) -> usize {
        self.states.len()
    }
}
