use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::modules::fleet::Rules;
use crate::modules::grid::OreProfile;
use crate::modules::planner::{PlanEvent, PlannerSettings};

/// Planner decision tallies across a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub targets_assigned: u64,
    pub state_changes: u64,
    pub low_energy_holds: u64,
    pub extraction_holds: u64,
    pub soft_collisions: u64,
    pub spawns_requested: u64,
}

impl RunStats {
    pub fn record(&mut self, event: &PlanEvent) {
        match event {
            PlanEvent::TargetAssigned { .. } => {
                self.targets_assigned = self.targets_assigned.saturating_add(1)
            }
            PlanEvent::StateChanged { .. } => {
                self.state_changes = self.state_changes.saturating_add(1)
            }
            PlanEvent::LowEnergyHold { .. } => {
                self.low_energy_holds = self.low_energy_holds.saturating_add(1)
            }
            PlanEvent::ExtractionHold { .. } => {
                self.extraction_holds = self.extraction_holds.saturating_add(1)
            }
            PlanEvent::BoxedIn { .. } => {
                self.soft_collisions = self.soft_collisions.saturating_add(1)
            }
            PlanEvent::SpawnRequested => {
                self.spawns_requested = self.spawns_requested.saturating_add(1)
            }
        }
    }
}

/// Everything worth keeping about one finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub finished_at: String,
    pub seed: u64,
    pub width: i32,
    pub height: i32,
    pub profile: OreProfile,
    pub rules: Rules,
    pub settings: PlannerSettings,
    pub turns_played: u32,
    pub bank: u32,
    pub ships_alive: u32,
    pub ships_built: u32,
    pub ships_lost: u32,
    pub stats: RunStats,
    pub final_digest: String,
}

fn record_dir() -> PathBuf {
    PathBuf::from(".dredge")
}

fn runs_dir() -> PathBuf {
    record_dir().join("runs")
}

fn latest_path() -> PathBuf {
    record_dir().join("latest.json")
}

/// Current wall-clock stamp in the format run records carry.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339()
}

/// Writes the record under `.dredge/runs/` and refreshes the latest pointer.
pub fn save_run_record(record: &RunRecord) -> io::Result<PathBuf> {
    let dir = runs_dir();
    fs::create_dir_all(&dir)?;
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("run_{}_{}.json", stamp, record.seed));
    let json = serde_json::to_vec_pretty(record)?;
    fs::write(&path, &json)?;
    fs::write(latest_path(), &json)?;
    Ok(path)
}

pub fn load_run_record(path: &Path) -> io::Result<RunRecord> {
    let bytes = fs::read(path)?;
    let record: RunRecord = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse run record {}; delete it to reset: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(record)
}

/// Latest finished run, if any run has completed in this directory.
pub fn load_latest_record() -> io::Result<Option<RunRecord>> {
    let path = latest_path();
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let record: RunRecord = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse run record {}; delete it to reset: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(Some(record))
}
