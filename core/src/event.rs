//! The event bus: every state-changed notification the engine emits.
//!
//! RULE: Observers learn about changes ONLY through events.
//! A mutation publishes one batch of field names per entity touched.

use crate::{
    building::BuildingKind,
    engine::GamePhase,
    grid::CellField,
    ledger::LedgerField,
    types::{Amount, RunId},
};
use serde::{Deserialize, Serialize};

/// Every event emitted by the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Field notifications ────────────────────────
    LedgerChanged {
        fields: Vec<LedgerField>,
    },
    CellChanged {
        row:    usize,
        column: usize,
        fields: Vec<CellField>,
    },
    StatusChanged {
        message: String,
    },

    // ── Lifecycle ──────────────────────────────────
    PhaseChanged {
        from: GamePhase,
        to:   GamePhase,
    },
    GameReset {
        run_id: RunId,
    },
    SnapshotRestored {
        run_id: RunId,
    },
    GameOver {
        cycle: u64,
    },

    // ── Player actions ─────────────────────────────
    BuildingPlaced {
        row:    usize,
        column: usize,
        kind:   BuildingKind,
        cost:   Amount,
    },
    BuildingRemoved {
        row:    usize,
        column: usize,
        kind:   BuildingKind,
        refund: Amount,
    },

    // ── Ticks ──────────────────────────────────────
    IncomeCollected {
        cycle:           u64,
        income:          Amount,
        money:           Amount,
        negative_cycles: u32,
    },
    CitizensArrived {
        count:      Amount,
        population: Amount,
    },
}

impl SimEvent {
    /// Stable snake_case name of the variant, for logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::LedgerChanged { .. }    => "ledger_changed",
            SimEvent::CellChanged { .. }      => "cell_changed",
            SimEvent::StatusChanged { .. }    => "status_changed",
            SimEvent::PhaseChanged { .. }     => "phase_changed",
            SimEvent::GameReset { .. }        => "game_reset",
            SimEvent::SnapshotRestored { .. } => "snapshot_restored",
            SimEvent::GameOver { .. }         => "game_over",
            SimEvent::BuildingPlaced { .. }   => "building_placed",
            SimEvent::BuildingRemoved { .. }  => "building_removed",
            SimEvent::IncomeCollected { .. }  => "income_collected",
            SimEvent::CitizensArrived { .. }  => "citizens_arrived",
        }
    }
}

pub type Listener = Box<dyn FnMut(&SimEvent) + Send>;

/// Fan-out of events to every registered listener, in registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn subscribe(&mut self, listener: impl FnMut(&SimEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn publish(&mut self, event: &SimEvent) {
        log::trace!("event {}", event.type_name());
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}
