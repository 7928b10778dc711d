//! One-shot matching worker.
//!
//! Reads the eligible-user snapshot (a JSON array of candidate records) on
//! stdin and prints the mentee -> [mentor] relation map on stdout. Any
//! failure prints `{"error": "..."}` on stderr and exits with status 1, so
//! the caller never sees a partial result.

use padrinho_match::config::Settings;
use padrinho_match::core::Matcher;
use padrinho_match::models::RawCandidate;
use std::io::{Read, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn run() -> Result<String, String> {
    let settings = Settings::load().map_err(|e| format!("configuration error: {}", e))?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("failed to read stdin: {}", e))?;

    let candidates: Vec<RawCandidate> =
        serde_json::from_str(&input).map_err(|e| format!("invalid input: {}", e))?;

    let matcher = Matcher::new(settings.weights(), settings.matching.params());
    let outcome = matcher.run(candidates).map_err(|e| e.to_string())?;

    serde_json::to_string(&outcome.relations()).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // stdout carries the result, so logs go to stderr
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run() {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if writeln!(stdout, "{}", output).is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(message) => {
            tracing::error!("Matching failed: {}", message);
            eprintln!("{}", serde_json::json!({ "error": message }));
            ExitCode::FAILURE
        }
    }
}
