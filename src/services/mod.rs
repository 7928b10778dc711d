// Service exports
pub mod postgres;
pub mod runner;

pub use postgres::{PoolRow, PostgresClient, PostgresError};
pub use runner::{CompletedRun, MatchRunner, RunError};
