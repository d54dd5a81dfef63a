//! Snapshot serialization: full simulation state to/from JSON.
//!
//! A snapshot is a flat structural copy of every persisted ledger field
//! and every cell. Loading restores exactly what was saved: aggregates
//! are NOT re-derived, so a hand-edited snapshot comes back as written.
//! The only reconstructed value is the maintenance total, which is not
//! persisted and is summed from the cells' building kinds.

use crate::{
    building::{self, BuildingKind, Color},
    config::SimConfig,
    error::{SimError, SimResult},
    grid::{Cell, Grid},
    ledger::{CityLedger, LedgerRecord},
    types::{Amount, RunId, CELL_COUNT, GRID_SIZE},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub row:    usize,
    pub column: usize,
    pub kind:   Option<BuildingKind>,
    pub color:  Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ledger: LedgerRecord,
    /// Exactly one record per cell.
    pub cells:  Vec<CellRecord>,
}

/// On-disk envelope around a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub run_id:   RunId,
    pub saved_at: DateTime<Utc>,
    pub snapshot: Snapshot,
}

impl SnapshotFile {
    pub fn new(run_id: RunId, snapshot: Snapshot) -> Self {
        Self { run_id, saved_at: Utc::now(), snapshot }
    }
}

pub struct SnapshotStore;

impl SnapshotStore {
    pub fn save(ledger: &CityLedger, grid: &Grid) -> Snapshot {
        let cells = grid
            .cells()
            .iter()
            .map(|cell| CellRecord {
                row:    cell.row(),
                column: cell.column(),
                kind:   cell.building(),
                color:  cell.color(),
            })
            .collect();
        Snapshot { ledger: ledger.record().clone(), cells }
    }

    /// Rebuild the ledger and grid. Checks shape only.
    pub fn load(snapshot: &Snapshot, config: &SimConfig) -> SimResult<(CityLedger, Grid)> {
        if snapshot.cells.len() != CELL_COUNT {
            return Err(SimError::MalformedSnapshot {
                reason: format!("expected {CELL_COUNT} cells, found {}", snapshot.cells.len()),
            });
        }

        let mut slots: Vec<Option<Cell>> = vec![None; CELL_COUNT];
        for record in &snapshot.cells {
            if !Grid::in_bounds(record.row, record.column) {
                return Err(SimError::MalformedSnapshot {
                    reason: format!("cell ({}, {}) is outside the grid", record.row, record.column),
                });
            }
            if record.kind.is_some_and(|kind| !kind.is_building()) {
                return Err(SimError::MalformedSnapshot {
                    reason: format!("cell ({}, {}) holds a tool, not a building", record.row, record.column),
                });
            }
            let slot = &mut slots[record.row * GRID_SIZE + record.column];
            if slot.is_some() {
                return Err(SimError::MalformedSnapshot {
                    reason: format!("cell ({}, {}) appears twice", record.row, record.column),
                });
            }
            *slot = Some(Cell::new(record.row, record.column, record.kind, record.color));
        }
        // 225 unique in-bounds records fill every slot.
        let cells: Vec<Cell> = slots.into_iter().flatten().collect();

        let maintenance: Amount = cells
            .iter()
            .filter_map(Cell::building)
            .map(|kind| building::describe(kind).maintenance_cost)
            .sum();

        let ledger = CityLedger::restore(snapshot.ledger.clone(), maintenance, config);
        Ok((ledger, Grid::from_cells(cells)))
    }

    /// Write pretty JSON to `{path}.tmp`, then rename it over `path`.
    pub fn write(path: &Path, file: &SnapshotFile) -> SimResult<()> {
        let json = serde_json::to_string_pretty(file)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        let mut out = File::create(&tmp_path)?;
        out.write_all(json.as_bytes())?;
        out.sync_all()?;
        fs::rename(&tmp_path, path)?;

        log::info!("Snapshot written to {}", path.display());
        Ok(())
    }

    pub fn read(path: &Path) -> SimResult<SnapshotFile> {
        let content = fs::read_to_string(path)?;
        let file: SnapshotFile = serde_json::from_str(&content)?;
        if file.snapshot.cells.len() != CELL_COUNT {
            return Err(SimError::MalformedSnapshot {
                reason: format!("expected {CELL_COUNT} cells, found {}", file.snapshot.cells.len()),
            });
        }
        Ok(file)
    }
}
