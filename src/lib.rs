//! Padrinho Match - mentor/mentee matching engine for the padrinho program
//!
//! This library pairs incoming students (bixes) with veterans and admins,
//! each of whom can sponsor at most two of them. Pairings maximize total
//! profile compatibility and are solved exactly as a capacitated
//! assignment problem.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{MatchError, MatchOutcome, Matcher, ScoreMatrix, SolverError};
pub use crate::models::{
    Assignment, Candidate, MatchingParams, RawCandidate, RelationMap, ScoringWeights,
};
