// Core engine exports
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod scoring;
pub mod serialize;
pub mod solver;

pub use error::{MatchError, SolverError};
pub use matcher::{MatchOutcome, Matcher};
pub use normalize::normalize_candidate;
pub use scoring::{build_score_matrix, calculate_compatibility, sub_scores, SubScores};
pub use serialize::{relation_rows, to_relation_map};
pub use solver::{solve, total_score, ScoreMatrix};
