use serde::{Deserialize, Serialize};
use crate::models::domain::RelationMap;

/// Response for a completed matching run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMatchingResponse {
    pub run_id: String,
    pub relations: RelationMap,
    pub unmatched: Vec<String>,
    pub total_score: f64,
    pub matched_pairs: usize,
    pub mentee_count: usize,
    pub mentor_count: usize,
    pub elapsed_ms: u64,
}

/// Response for relation persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistRelationsResponse {
    pub requested: usize,
    pub inserted: u64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
