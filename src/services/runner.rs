use crate::core::{MatchError, MatchOutcome, Matcher};
use crate::models::RawCandidate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

/// Failures at the invocation boundary of a matching run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("matching run timed out after {0:?}")]
    Timeout(Duration),

    #[error("matching worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Engine(#[from] MatchError),
}

impl RunError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            RunError::Timeout(_) => "run_timeout",
            RunError::Worker(_) => "worker_failure",
            RunError::Engine(e) => e.code(),
        }
    }
}

/// A finished run with its bookkeeping
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub run_id: uuid::Uuid,
    pub outcome: MatchOutcome,
    pub elapsed: Duration,
}

/// Executes matching runs one at a time on a blocking worker thread
///
/// The run lock guard moves into the worker, so an abandoned (timed out)
/// run still blocks the next one until it really finishes.
pub struct MatchRunner {
    matcher: Arc<Matcher>,
    run_lock: Arc<Mutex<()>>,
    timeout: Duration,
}

impl MatchRunner {
    pub fn new(matcher: Matcher, timeout: Duration) -> Self {
        Self {
            matcher: Arc::new(matcher),
            run_lock: Arc::new(Mutex::new(())),
            timeout,
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Run the engine over one snapshot, waiting at most `timeout` for the
    /// run lock and the computation together
    pub async fn run(&self, candidates: Vec<RawCandidate>) -> Result<CompletedRun, RunError> {
        let pool_size = candidates.len();
        self.run_job(pool_size, move |matcher| matcher.run(candidates)).await
    }

    /// Execute `job` under the run lock on a blocking thread
    async fn run_job<F>(&self, pool_size: usize, job: F) -> Result<CompletedRun, RunError>
    where
        F: FnOnce(&Matcher) -> Result<MatchOutcome, MatchError> + Send + 'static,
    {
        let run_id = uuid::Uuid::new_v4();
        let started = Instant::now();

        tracing::info!("Matching run {} started ({} candidates)", run_id, pool_size);

        let matcher = Arc::clone(&self.matcher);
        let run_lock = Arc::clone(&self.run_lock);

        let work = async move {
            let guard = run_lock.lock_owned().await;
            tokio::task::spawn_blocking(move || {
                let result = job(&matcher);
                drop(guard);
                result
            })
            .await
        };

        let result = match tokio::time::timeout(self.timeout, work).await {
            Err(_) => Err(RunError::Timeout(self.timeout)),
            Ok(Err(join_error)) => Err(RunError::Worker(join_error.to_string())),
            Ok(Ok(Err(engine_error))) => Err(RunError::Engine(engine_error)),
            Ok(Ok(Ok(outcome))) => Ok(outcome),
        };

        let elapsed = started.elapsed();

        match result {
            Ok(outcome) => {
                tracing::info!(
                    "Matching run {} finished in {:?}: {} pairs, {} unmatched",
                    run_id,
                    elapsed,
                    outcome.assignment.len(),
                    outcome.unmatched.len()
                );
                Ok(CompletedRun { run_id, outcome, elapsed })
            }
            Err(e) => {
                tracing::error!("Matching run {} failed after {:?}: {}", run_id, elapsed, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, RawRole};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn create_candidate(id: &str, role: RawRole) -> RawCandidate {
        RawCandidate {
            id: id.to_string(),
            role,
            course: Some(Course::CC),
            ..RawCandidate::default()
        }
    }

    #[tokio::test]
    async fn test_run_returns_outcome() {
        let runner = MatchRunner::new(Matcher::with_default_weights(), Duration::from_secs(5));
        let run = runner
            .run(vec![
                create_candidate("b1", RawRole::MenteeEligible),
                create_candidate("v1", RawRole::MentorEligible),
            ])
            .await
            .unwrap();

        assert_eq!(run.outcome.assignment.mentor_of("b1"), Some("v1"));
    }

    #[tokio::test]
    async fn test_engine_error_surfaces() {
        let runner = MatchRunner::new(Matcher::with_default_weights(), Duration::from_secs(5));
        let err = runner
            .run(vec![
                create_candidate("b1", RawRole::MenteeEligible),
                create_candidate("b1", RawRole::MenteeEligible),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(matches!(err, RunError::Engine(MatchError::DuplicateId { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_serialized() {
        let runner = Arc::new(MatchRunner::new(
            Matcher::with_default_weights(),
            Duration::from_secs(5),
        ));
        let pool = vec![
            create_candidate("b1", RawRole::MenteeEligible),
            create_candidate("v1", RawRole::MentorEligible),
        ];

        let a = tokio::spawn({
            let runner = Arc::clone(&runner);
            let pool = pool.clone();
            async move { runner.run(pool).await }
        });
        let b = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run(pool).await }
        });

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert_eq!(a.outcome, b.outcome);
        assert_ne!(a.run_id, b.run_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_run_holds_lock_until_finished() {
        let runner = MatchRunner::new(Matcher::with_default_weights(), Duration::from_millis(50));
        let finished = Arc::new(AtomicBool::new(false));

        let slow = {
            let finished = Arc::clone(&finished);
            move |matcher: &Matcher| {
                std::thread::sleep(Duration::from_millis(400));
                finished.store(true, Ordering::SeqCst);
                matcher.run(Vec::new())
            }
        };

        let err = runner.run_job(0, slow).await.unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));
        assert_eq!(err.code(), "run_timeout");
        assert!(!finished.load(Ordering::SeqCst));

        // The next run waits for the abandoned one to release the lock
        let patient = MatchRunner {
            matcher: Arc::clone(&runner.matcher),
            run_lock: Arc::clone(&runner.run_lock),
            timeout: Duration::from_secs(5),
        };
        let run = patient
            .run(vec![
                create_candidate("b1", RawRole::MenteeEligible),
                create_candidate("v1", RawRole::MentorEligible),
            ])
            .await
            .unwrap();

        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(run.outcome.assignment.mentor_of("b1"), Some("v1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_over_timeout_on_large_pool() {
        let runner = MatchRunner::new(Matcher::with_default_weights(), Duration::from_millis(1));
        let pool: Vec<RawCandidate> = (0..200)
            .map(|i| create_candidate(&format!("b{:04}", i), RawRole::MenteeEligible))
            .chain(
                (0..100).map(|i| create_candidate(&format!("v{:04}", i), RawRole::MentorEligible)),
            )
            .collect();

        let err = runner.run(pool).await.unwrap_err();
        assert!(matches!(err, RunError::Timeout(d) if d == Duration::from_millis(1)));
    }

    #[tokio::test]
    async fn test_panicking_engine_is_worker_error() {
        let runner = MatchRunner::new(Matcher::with_default_weights(), Duration::from_secs(5));

        let err = runner
            .run_job(0, |_: &Matcher| -> Result<MatchOutcome, MatchError> {
                panic!("engine exploded")
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Worker(_)));
        assert_eq!(err.code(), "worker_failure");

        // The lock is released by unwinding, so later runs still go through
        let run = runner
            .run(vec![create_candidate("b1", RawRole::MenteeEligible)])
            .await
            .unwrap();
        assert_eq!(run.outcome.unmatched, vec!["b1".to_string()]);
    }
}
