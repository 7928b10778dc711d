use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::relation_rows;
use crate::models::{
    ErrorResponse, HealthResponse, PersistRelationsRequest, PersistRelationsResponse, RawCandidate,
    RunMatchingRequest, RunMatchingResponse,
};
use crate::services::{CompletedRun, MatchRunner, PostgresClient, RunError};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<MatchRunner>,
    pub postgres: Option<Arc<PostgresClient>>,
    pub max_pool_size: usize,
}

/// Configure all matching-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matching/run", web::post().to(run_matching))
        .route("/matching/pool/run", web::post().to(run_pool_matching))
        .route("/relations", web::post().to(persist_relations));
}

fn error_response(
    status: actix_web::http::StatusCode,
    error: &str,
    message: impl Into<String>,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

/// Invalid input is echoed back; everything else stays opaque
fn run_error_response(err: &RunError) -> HttpResponse {
    use actix_web::http::StatusCode;

    match err {
        RunError::Engine(e) if e.is_invalid_input() => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, err.code(), e.to_string())
        }
        RunError::Timeout(_) => {
            error_response(StatusCode::GATEWAY_TIMEOUT, err.code(), "Matching run timed out")
        }
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.code(), "Matching run failed"),
    }
}

fn store_unavailable() -> HttpResponse {
    error_response(
        actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
        "store_unavailable",
        "No eligible-user database is configured",
    )
}

/// Both run routes share the same pool ceiling
fn ensure_pool_size(len: usize, max_pool_size: usize) -> Result<(), HttpResponse> {
    if len > max_pool_size {
        return Err(error_response(
            actix_web::http::StatusCode::PAYLOAD_TOO_LARGE,
            "pool_too_large",
            format!("At most {} candidates per run, got {}", max_pool_size, len),
        ));
    }
    Ok(())
}

fn run_response(run: CompletedRun) -> RunMatchingResponse {
    RunMatchingResponse {
        run_id: run.run_id.to_string(),
        relations: run.outcome.relations(),
        matched_pairs: run.outcome.assignment.len(),
        unmatched: run.outcome.unmatched,
        total_score: run.outcome.total_score,
        mentee_count: run.outcome.mentee_count,
        mentor_count: run.outcome.mentor_count,
        elapsed_ms: run.elapsed.as_millis() as u64,
    }
}

async fn execute(state: &AppState, candidates: Vec<RawCandidate>) -> HttpResponse {
    match state.runner.run(candidates).await {
        Ok(run) => HttpResponse::Ok().json(run_response(run)),
        Err(e) => run_error_response(&e),
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Run matching over an explicit snapshot
///
/// POST /api/v1/matching/run
///
/// Request body:
/// ```json
/// {
///   "candidates": [
///     { "id": "string", "role": "bixe|veterane|ADMIN", "course": "CC", "city": "string",
///       "pronouns": ["string"], "ethnicity": ["string"], "lgbt": ["string"],
///       "hobby": "string", "music": "string", "games": "string", "sports": "string",
///       "parties": 5 }
///   ]
/// }
/// ```
async fn run_matching(
    state: web::Data<AppState>,
    req: web::Json<RunMatchingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for run_matching request: {:?}", errors);
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "validation_failed",
            errors.to_string(),
        );
    }

    if let Err(response) = ensure_pool_size(req.candidates.len(), state.max_pool_size) {
        return response;
    }

    execute(&state, req.into_inner().candidates).await
}

/// Load the eligible pool from the user database and run matching on it
///
/// POST /api/v1/matching/pool/run
///
/// Nothing is persisted; review the result and send it to `/relations`.
async fn run_pool_matching(state: web::Data<AppState>) -> impl Responder {
    let Some(postgres) = &state.postgres else {
        return store_unavailable();
    };

    let max_capacity = state.runner.matcher().params().max_capacity;
    let candidates = match postgres.fetch_eligible_pool(max_capacity).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to load eligible pool: {}", e);
            return error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "store_failure",
                "Failed to load eligible pool",
            );
        }
    };

    if let Err(response) = ensure_pool_size(candidates.len(), state.max_pool_size) {
        tracing::warn!(
            "Eligible pool of {} exceeds max_pool_size {}",
            candidates.len(),
            state.max_pool_size
        );
        return response;
    }

    execute(&state, candidates).await
}

/// Persist relations from a reviewed run
///
/// POST /api/v1/relations
///
/// Request body:
/// ```json
/// { "relations": { "menteeId": ["mentorId"] } }
/// ```
async fn persist_relations(
    state: web::Data<AppState>,
    req: web::Json<PersistRelationsRequest>,
) -> impl Responder {
    let Some(postgres) = &state.postgres else {
        return store_unavailable();
    };

    let rows = relation_rows(&req.relations);

    match postgres.insert_relations(&rows).await {
        Ok(inserted) => HttpResponse::Ok().json(PersistRelationsResponse {
            requested: rows.len(),
            inserted,
        }),
        Err(e) => {
            tracing::error!("Failed to persist {} relations: {}", rows.len(), e);
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "store_failure",
                "Failed to persist relations",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MatchError, SolverError};

    #[test]
    fn test_invalid_input_maps_to_422() {
        let err = RunError::Engine(MatchError::DuplicateId {
            role: crate::models::Role::Mentee,
            id: "b1".to_string(),
        });
        assert_eq!(run_error_response(&err).status().as_u16(), 422);
    }

    #[test]
    fn test_internal_failures_are_opaque() {
        let err = RunError::Engine(SolverError::NoAugmentingPath { row: 0 }.into());
        assert_eq!(run_error_response(&err).status().as_u16(), 500);

        let err = RunError::Timeout(std::time::Duration::from_secs(1));
        assert_eq!(run_error_response(&err).status().as_u16(), 504);
    }

    #[test]
    fn test_pool_ceiling_applies_to_loaded_pools() {
        assert!(ensure_pool_size(1500, 1500).is_ok());
        assert!(ensure_pool_size(0, 0).is_ok());

        let response = ensure_pool_size(1501, 1500).unwrap_err();
        assert_eq!(response.status().as_u16(), 413);
    }
}
