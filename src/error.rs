use thiserror::Error;

/// Top-level error type for the history engine.
#[derive(Debug, Error)]
pub enum GeohistError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Geometry that cannot be constructed or evaluated.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Shell lookups and structural checks.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("{kind} index {index} is out of range (shell has {count})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("{kind} {index} was recorded on {recorded} but now lies on {found}")]
    StaleReference {
        kind: &'static str,
        index: usize,
        recorded: String,
        found: String,
    },
}

/// Errors raised by modeling operations and creators.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("geometrically infeasible: {0}")]
    Infeasible(String),

    #[error("incompatible creator: {0}")]
    Incompatible(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors raised while editing or replaying a creator history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("creator index {index} is out of range (history has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("active count {count} exceeds history length {len}")]
    ActiveCountExceeds { count: usize, len: usize },

    #[error("histories differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("step {index} ({name}) failed: {source}")]
    StepFailed {
        index: usize,
        name: &'static str,
        #[source]
        source: Box<GeohistError>,
    },

    #[error("rebuild cancelled after {completed} steps")]
    Cancelled { completed: usize },
}

/// Convenience type alias for results using [`GeohistError`].
pub type Result<T> = std::result::Result<T, GeohistError>;
