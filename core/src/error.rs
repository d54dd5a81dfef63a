use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Cell ({row}, {column}) is outside the city grid")]
    OutOfBounds { row: usize, column: usize },

    #[error("Cell ({row}, {column}) is already occupied")]
    CellOccupied { row: usize, column: usize },

    #[error("Cell ({row}, {column}) is already empty")]
    CellEmpty { row: usize, column: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot advance {units} time units at once (max {max})")]
    AdvanceTooLong { units: u64, max: u64 },

    #[error("Malformed snapshot: {reason}")]
    MalformedSnapshot { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
