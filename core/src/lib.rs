//! City-economy simulation core.
//!
//! Players place buildings on a 15x15 grid. Buildings cost money and
//! consume or produce power, water and housing. Two independent clock
//! schedules drive income collection and population growth; two
//! consecutive cycles in debt end the game.

pub mod building;
pub mod clock;
pub mod command;
pub mod config;
pub mod economy_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod grid;
pub mod ledger;
pub mod population_subsystem;
pub mod realtime;
pub mod snapshot;
pub mod subsystem;
pub mod types;

pub use building::{describe, BuildingDescriptor, BuildingKind, Color};
pub use command::{CommandOutcome, PlayerCommand, RejectReason};
pub use config::SimConfig;
pub use engine::{GamePhase, SimEngine};
pub use error::{SimError, SimResult};
pub use event::SimEvent;
pub use grid::{Cell, Grid};
pub use ledger::{CityLedger, LedgerField};
pub use snapshot::{Snapshot, SnapshotStore};
