// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Assignment, Candidate, Course, GodparentRelation, MatchingParams, RawCandidate, RawRole,
    RelationMap, Role, ScoringWeights,
};
pub use requests::{PersistRelationsRequest, RunMatchingRequest};
pub use responses::{ErrorResponse, HealthResponse, PersistRelationsResponse, RunMatchingResponse};
