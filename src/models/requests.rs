use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{RawCandidate, RelationMap};

/// Request to run one matching round over an explicit snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunMatchingRequest {
    #[validate(nested)]
    pub candidates: Vec<RawCandidate>,
}

/// Request to persist relations produced by an earlier run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistRelationsRequest {
    pub relations: RelationMap,
}
