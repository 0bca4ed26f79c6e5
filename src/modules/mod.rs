pub mod fleet;
pub mod grid;
pub mod navigator;
pub mod planner;
pub mod record;
pub mod search;
pub mod session;
pub mod sim;
