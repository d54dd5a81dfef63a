use crate::{building::BuildingKind, clock::SimSpeed, types::Tick};
use serde::{Deserialize, Serialize};

/// All player-issued commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Game control ──────────────────────────────
    Start,
    Stop,
    Reset,
    Advance { units: Tick },
    SetSpeed { speed: SimSpeed },

    // ── Building ──────────────────────────────────
    PlaceBuilding { row: usize, column: usize, kind: BuildingKind },
    RemoveBuilding { row: usize, column: usize },
    SelectTool { kind: Option<BuildingKind> },
    ClickCell { row: usize, column: usize },

    // ── Persistence ───────────────────────────────
    Save { path: String },
    Load { path: String },
}

/// Why a command was refused. Nothing was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    GameOver,
    NotABuilding,
    NoToolSelected,
    CellOccupied,
    CellEmpty,
    InsufficientFunds,
    InsufficientResources,
    AlreadyRunning,
    NotRunning,
}

impl RejectReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::GameOver              => "The game is over. Reset to play again.",
            Self::NotABuilding          => "Select a building to place.",
            Self::NoToolSelected        => "Select a building or the removal tool first.",
            Self::CellOccupied          => "Cannot place building here. Select 'Remove Building' option first.",
            Self::CellEmpty             => "No building to remove at this location.",
            Self::InsufficientFunds     => "Cannot place building. Check resources and money.",
            Self::InsufficientResources => "Cannot place building. Check resources and money.",
            Self::AlreadyRunning        => "Game already in progress.",
            Self::NotRunning            => "Game is not running.",
        }
    }
}

/// Result of a command that may be refused without being an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Applied { status: String },
    Rejected { reason: RejectReason },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn status(&self) -> &str {
        match self {
            Self::Applied { status } => status,
            Self::Rejected { reason } => reason.message(),
        }
    }
}
