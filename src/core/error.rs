use crate::models::Role;
use thiserror::Error;

/// Internal failures of the assignment solver
///
/// Any of these means the solver could not produce a trustworthy
/// assignment; callers must treat the whole run as failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("capacity vector has {got} entries but the score matrix has {expected} mentor columns")]
    CapacityMismatch { expected: usize, got: usize },

    #[error("non-finite score at mentee {row}, mentor {col}")]
    NonFiniteScore { row: usize, col: usize },

    #[error("no augmenting path for mentee row {row}")]
    NoAugmentingPath { row: usize },

    #[error("solved assignment violates constraints: {0}")]
    Inconsistent(String),
}

/// Errors reported by a matching run
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("duplicate {role} id: {id}")]
    DuplicateId { role: Role, id: String },

    #[error("mentor {id} already sponsors {assigned} mentees (max {max})")]
    InvalidCapacity { id: String, assigned: u32, max: u32 },

    #[error("invalid matching configuration: {0}")]
    InvalidConfig(String),

    #[error("solver failure: {0}")]
    Solver(#[from] SolverError),
}

impl MatchError {
    /// True when the caller sent input the engine refuses to run on
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, MatchError::DuplicateId { .. } | MatchError::InvalidCapacity { .. })
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::DuplicateId { .. } | MatchError::InvalidCapacity { .. } => "invalid_input",
            MatchError::InvalidConfig(_) => "invalid_config",
            MatchError::Solver(_) => "solver_failure",
        }
    }
}
