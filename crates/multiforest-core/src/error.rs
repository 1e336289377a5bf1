//! Error types for Multiforest

use thiserror::Error;

/// Main error type for Multiforest operations.
///
/// Construction and configuration problems are reported through this type
/// and abort the setup. Solver results (infeasible, unbounded, ...) are not
/// errors; they travel as a `SolveStatus` inside the solve outcome.
#[derive(Debug, Error)]
pub enum MultiforestError {
    /// A referenced attribute, stand, regime, objective or constraint is absent.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Unknown stand-wise or year-wise aggregation code.
    #[error("Undefined aggregation policy: {0}")]
    UndefinedAggregationPolicy(String),

    /// Scalarization requested before the objective's range is known.
    #[error("Objective range not computed for '{0}'")]
    RangeNotComputed(String),

    /// Lower and upper bound coincide, so the objective cannot be normalized.
    #[error("Objective '{objective}' has zero range width (lower = upper = {value})")]
    ZeroRangeWidth { objective: String, value: f64 },

    /// Declared optimize direction contradicts the year-aggregation policy.
    #[error("Objective '{objective}' uses policy '{policy}' which requires direction '{expected}'")]
    InconsistentDirection {
        objective: String,
        policy: String,
        expected: String,
    },

    /// Structurally invalid definition (bad parameters, empty groups, ...).
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// An objective with the same name is already registered.
    #[error("Objective '{0}' is already registered")]
    DuplicateObjective(String),

    /// Operation not allowed in the current solver state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Filesystem error while exporting or importing artifacts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Multiforest operations
pub type Result<T> = std::result::Result<T, MultiforestError>;
