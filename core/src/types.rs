//! Shared primitive types used across the entire simulation.

/// A simulation time unit. The runner maps one unit to one real second.
pub type Tick = u64;

/// Currency and every ledger quantity. Signed: money may go negative.
pub type Amount = i64;

/// The canonical run identifier (uuid v4, regenerated on reset).
pub type RunId = String;

/// Rows and columns of the city grid.
pub const GRID_SIZE: usize = 15;

/// Total number of cells in the city grid.
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

pub fn new_run_id() -> RunId {
    uuid::Uuid::new_v4().to_string()
}
