use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::modules::fleet::{Command, Rules, Ship, ShipId, TurnView};
use crate::modules::grid::{Direction, Grid, Position};

/// Why the engine refused a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimError {
    UnknownShip(ShipId),
    DuplicateOrder(ShipId),
    DuplicateSpawn,
    MoveUnaffordable { ship: ShipId, cost: u32, cargo: u32 },
    SpawnUnaffordable { cost: u32, bank: u32 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::UnknownShip(ship) => write!(f, "no ship with id {}", ship),
            SimError::DuplicateOrder(ship) => {
                write!(f, "ship {} was given more than one order", ship)
            }
            SimError::DuplicateSpawn => write!(f, "more than one production order this turn"),
            SimError::MoveUnaffordable { ship, cost, cargo } => write!(
                f,
                "ship {} cannot pay {} ore to move with {} aboard",
                ship, cost, cargo
            ),
            SimError::SpawnUnaffordable { cost, bank } => {
                write!(f, "production costs {} but the bank holds {}", cost, bank)
            }
        }
    }
}

/// A refused command together with the reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRejection {
    pub command: Command,
    pub error: SimError,
}

impl fmt::Display for CommandRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// What happened on the seabed while one turn's commands were applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    Moved {
        ship: ShipId,
        from: Position,
        to: Position,
    },
    Extracted {
        ship: ShipId,
        amount: u32,
    },
    Deposited {
        ship: ShipId,
        amount: u32,
    },
    Spawned {
        ship: ShipId,
    },
    Wrecked {
        ships: Vec<ShipId>,
        position: Position,
    },
}

/// Result of applying one turn's command batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub turn: u32,
    pub events: Vec<SimEvent>,
    pub rejections: Vec<CommandRejection>,
}

/// Local match engine: a wraparound ore field, one shipyard, one fleet.
///
/// Turn order: moves (each paying the exit toll of its origin cell), then
/// production, then collision wrecks, then shipyard deposits, then
/// extraction for every ship that stayed put.
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: Grid,
    ships: Vec<Ship>,
    shipyard: Position,
    bank: u32,
    turn: u32,
    rules: Rules,
    next_ship_id: ShipId,
    ships_built: u32,
    ships_lost: u32,
}

impl Simulation {
    pub fn new(grid: Grid, shipyard: Position, bank: u32, rules: Rules) -> Self {
        let shipyard = grid.normalize(shipyard);
        Self {
            grid,
            ships: Vec::new(),
            shipyard,
            bank,
            turn: 1,
            rules,
            next_ship_id: 1,
            ships_built: 0,
            ships_lost: 0,
        }
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn bank(&self) -> u32 {
        self.bank
    }

    pub fn shipyard(&self) -> Position {
        self.shipyard
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn ships_built(&self) -> u32 {
        self.ships_built
    }

    pub fn ships_lost(&self) -> u32 {
        self.ships_lost
    }

    pub fn is_over(&self) -> bool {
        self.turn > self.rules.max_turns
    }

    /// Read surface for the planner.
    pub fn view(&self) -> TurnView<'_> {
        TurnView {
            grid: &self.grid,
            ships: &self.ships,
            shipyard: self.shipyard,
            bank: self.bank,
            turn: self.turn,
            rules: &self.rules,
        }
    }

    /// Places a ship directly, without charging the bank.
    pub fn add_ship(&mut self, position: Position) -> ShipId {
        let id = self.next_ship_id;
        self.next_ship_id += 1;
        self.ships.push(Ship::new(id, self.grid.normalize(position)));
        id
    }

    /// Applies one turn's command batch and advances the turn counter.
    pub fn step(&mut self, commands: &[Command]) -> TurnOutcome {
        let mut events = Vec::new();
        let mut rejections = Vec::new();

        let mut orders: HashMap<ShipId, Direction> = HashMap::new();
        let mut spawn_requested = false;
        for command in commands {
            match *command {
                Command::Move { ship, direction } => {
                    if !self.ships.iter().any(|s| s.id == ship) {
                        rejections.push(CommandRejection {
                            command: *command,
                            error: SimError::UnknownShip(ship),
                        });
                    } else if orders.contains_key(&ship) {
                        rejections.push(CommandRejection {
                            command: *command,
                            error: SimError::DuplicateOrder(ship),
                        });
                    } else {
                        orders.insert(ship, direction);
                    }
                }
                Command::Spawn => {
                    if spawn_requested {
                        rejections.push(CommandRejection {
                            command: *command,
                            error: SimError::DuplicateSpawn,
                        });
                    } else {
                        spawn_requested = true;
                    }
                }
            }
        }

        // Moves. The exit toll comes out of cargo before the ship leaves.
        let mut moved: HashSet<ShipId> = HashSet::new();
        for index in 0..self.ships.len() {
            let id = self.ships[index].id;
            let direction = orders.get(&id).copied().unwrap_or(Direction::Still);
            if direction == Direction::Still {
                continue;
            }
            let origin = self.ships[index].position;
            let cost = self.rules.move_cost(self.grid.ore_at(origin));
            if self.ships[index].cargo < cost {
                rejections.push(CommandRejection {
                    command: Command::Move {
                        ship: id,
                        direction,
                    },
                    error: SimError::MoveUnaffordable {
                        ship: id,
                        cost,
                        cargo: self.ships[index].cargo,
                    },
                });
                continue;
            }
            self.ships[index].cargo -= cost;
            let landing = self.grid.step_from(origin, direction);
            self.ships[index].position = landing;
            moved.insert(id);
            events.push(SimEvent::Moved {
                ship: id,
                from: origin,
                to: landing,
            });
        }

        if spawn_requested {
            if self.bank >= self.rules.ship_cost {
                self.bank -= self.rules.ship_cost;
                let id = self.next_ship_id;
                self.next_ship_id += 1;
                self.ships.push(Ship::new(id, self.shipyard));
                self.ships_built += 1;
                events.push(SimEvent::Spawned { ship: id });
            } else {
                rejections.push(CommandRejection {
                    command: Command::Spawn,
                    error: SimError::SpawnUnaffordable {
                        cost: self.rules.ship_cost,
                        bank: self.bank,
                    },
                });
            }
        }

        // Any cell holding two or more ships wrecks all of them. Cargo
        // drops onto the cell, or into the bank over the shipyard.
        let mut occupancy: BTreeMap<Position, Vec<ShipId>> = BTreeMap::new();
        for ship in &self.ships {
            occupancy.entry(ship.position).or_default().push(ship.id);
        }
        for (position, ids) in occupancy {
            if ids.len() < 2 {
                continue;
            }
            let dropped: u32 = self
                .ships
                .iter()
                .filter(|ship| ids.contains(&ship.id))
                .map(|ship| ship.cargo)
                .sum();
            if position == self.shipyard {
                self.bank += dropped;
            } else {
                let pile = self.grid.ore_at(position) + dropped;
                self.grid.set_ore(position, pile);
            }
            self.ships.retain(|ship| !ids.contains(&ship.id));
            self.ships_lost += ids.len() as u32;
            events.push(SimEvent::Wrecked { ships: ids, position });
        }

        for ship in self.ships.iter_mut() {
            if ship.position == self.shipyard && ship.cargo > 0 {
                self.bank += ship.cargo;
                events.push(SimEvent::Deposited {
                    ship: ship.id,
                    amount: ship.cargo,
                });
                ship.cargo = 0;
            }
        }

        // Extraction for everyone who stayed put and survived.
        for index in 0..self.ships.len() {
            let ship = self.ships[index];
            if moved.contains(&ship.id) || ship.cargo >= self.rules.max_cargo {
                continue;
            }
            let cell = self.grid.ore_at(ship.position);
            if cell == 0 {
                continue;
            }
            let lifted = self
                .rules
                .extraction(cell)
                .min(self.rules.max_cargo - ship.cargo);
            if lifted == 0 {
                continue;
            }
            self.ships[index].cargo += lifted;
            self.grid.set_ore(ship.position, cell - lifted);
            events.push(SimEvent::Extracted {
                ship: ship.id,
                amount: lifted,
            });
        }

        let turn = self.turn;
        self.turn += 1;
        TurnOutcome {
            turn,
            events,
            rejections,
        }
    }

    /// Hex digest of the full world state. Two runs from the same seed end
    /// on the same digest.
    pub fn state_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.turn.to_le_bytes());
        hasher.update(self.bank.to_le_bytes());
        hasher.update((self.ships.len() as u64).to_le_bytes());
        for ship in &self.ships {
            hasher.update(ship.id.to_le_bytes());
            hasher.update(ship.position.x.to_le_bytes());
            hasher.update(ship.position.y.to_le_bytes());
            hasher.update(ship.cargo.to_le_bytes());
        }
        hasher.update(self.grid.width().to_le_bytes());
        hasher.update(self.grid.height().to_le_bytes());
        for &cell in self.grid.cells() {
            hasher.update(cell.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}
