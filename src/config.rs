use crate::models::{MatchingParams, ScoringWeights};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8090 }

/// Eligible-pool store; matching over explicit snapshots works without it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,
    #[serde(default)]
    pub min_score: f64,
    #[serde(default = "default_party_scale")]
    pub party_scale: u8,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    /// Largest snapshot accepted per run. Size it together with
    /// `run_timeout_secs`: an oversized run keeps the run lock past its
    /// timeout and starves the runs queued behind it.
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            min_score: 0.0,
            party_scale: default_party_scale(),
            run_timeout_secs: default_run_timeout_secs(),
            max_pool_size: default_max_pool_size(),
        }
    }
}

impl MatchingSettings {
    pub fn params(&self) -> MatchingParams {
        MatchingParams {
            max_capacity: self.max_capacity,
            min_score: self.min_score,
            party_scale: self.party_scale,
        }
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

fn default_max_capacity() -> u32 { 2 }
fn default_party_scale() -> u8 { 10 }
fn default_run_timeout_secs() -> u64 { 30 }
fn default_max_pool_size() -> usize { 1500 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_course_weight")]
    pub course: f64,
    #[serde(default = "default_city_weight")]
    pub city: f64,
    #[serde(default = "default_pronouns_weight")]
    pub pronouns: f64,
    #[serde(default = "default_ethnicity_weight")]
    pub ethnicity: f64,
    #[serde(default = "default_lgbt_weight")]
    pub lgbt: f64,
    #[serde(default = "default_hobby_weight")]
    pub hobby: f64,
    #[serde(default = "default_music_weight")]
    pub music: f64,
    #[serde(default = "default_games_weight")]
    pub games: f64,
    #[serde(default = "default_sports_weight")]
    pub sports: f64,
    #[serde(default = "default_parties_weight")]
    pub parties: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            course: default_course_weight(),
            city: default_city_weight(),
            pronouns: default_pronouns_weight(),
            ethnicity: default_ethnicity_weight(),
            lgbt: default_lgbt_weight(),
            hobby: default_hobby_weight(),
            music: default_music_weight(),
            games: default_games_weight(),
            sports: default_sports_weight(),
            parties: default_parties_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            course: config.course,
            city: config.city,
            pronouns: config.pronouns,
            ethnicity: config.ethnicity,
            lgbt: config.lgbt,
            hobby: config.hobby,
            music: config.music,
            games: config.games,
            sports: config.sports,
            parties: config.parties,
        }
    }
}

fn default_course_weight() -> f64 { 3.0 }
fn default_city_weight() -> f64 { 1.0 }
fn default_pronouns_weight() -> f64 { 8.0 }
fn default_ethnicity_weight() -> f64 { 4.0 }
fn default_lgbt_weight() -> f64 { 3.0 }
fn default_hobby_weight() -> f64 { 2.0 }
fn default_music_weight() -> f64 { 1.0 }
fn default_games_weight() -> f64 { 1.0 }
fn default_sports_weight() -> f64 { 2.0 }
fn default_parties_weight() -> f64 { 2.0 }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PADRINHO_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PADRINHO__MATCHING__MIN_SCORE -> matching.min_score
            .add_source(
                Environment::with_prefix("PADRINHO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PADRINHO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn weights(&self) -> ScoringWeights {
        ScoringWeights::from(&self.scoring.weights)
    }
}

/// The conventional DATABASE_URL wins over the file value
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        _ => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.course, 3.0);
        assert_eq!(weights.pronouns, 8.0);
        assert_eq!(weights.ethnicity, 4.0);
        assert_eq!(weights.city, 1.0);
        assert_eq!(ScoringWeights::from(&weights), ScoringWeights::default());
    }

    #[test]
    fn test_default_matching() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.params(), MatchingParams::default());
        assert_eq!(matching.run_timeout(), Duration::from_secs(30));
        assert_eq!(matching.max_pool_size, 1500);
    }

    #[test]
    fn test_empty_config_deserializes() {
        let settings: Settings = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.server.port, 8090);
        assert!(settings.database.url.is_none());
        assert_eq!(settings.matching.max_capacity, 2);
    }

    #[test]
    fn test_partial_weights_override() {
        let settings: Settings = Config::builder()
            .set_override("scoring.weights.hobby", 5.0)
            .unwrap()
            .set_override("matching.min_score", 2.5)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.weights().hobby, 5.0);
        assert_eq!(settings.weights().pronouns, 8.0);
        assert_eq!(settings.matching.min_score, 2.5);
    }
}
