//! Error types for the rationality crate

use thiserror::Error;

/// Main error type for the rationality crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("trajectory has no steps")]
    EmptyTrajectory,

    #[error("beta {value} must be positive and finite")]
    InvalidBeta { value: f64 },

    #[error("state {state} is out of bounds for an MDP with {num_states} states")]
    StateOutOfBounds { state: usize, num_states: usize },

    #[error("transition from state {state} via '{action}' is undefined")]
    UndefinedTransition { state: usize, action: String },

    #[error("grid cell ({x}, {y}) is out of bounds for a {rows}x{cols} grid")]
    CellOutOfBounds {
        x: usize,
        y: usize,
        rows: usize,
        cols: usize,
    },

    #[error("reward {value} for state {state} must be finite")]
    NonFiniteReward { state: usize, value: f64 },

    #[error("reward {value} at state {state} must be non-positive for shortest-path costs")]
    PositiveReward { state: usize, value: f64 },

    #[error("destination set is empty")]
    EmptyDestinationSet,

    #[error("no destination in the candidate set is reachable")]
    UnreachableDestinations,

    #[error("state {state} has no reachable successor toward the goal")]
    NoReachableSuccessor { state: usize },

    #[error("search update {value} at iteration {iteration} is not finite")]
    NonFiniteUpdate { value: f64, iteration: usize },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
