//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::game::model::MAX_MANA;
use crate::game::{MatchConfig, MatchMode};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Timing, economy and mode for matches
    pub match_config: MatchConfig,
    /// Fixed RNG seed, drawn from entropy when absent
    pub seed: Option<u64>,

    /// Troop/tower catalog, built-in roster when absent
    pub catalog_path: Option<PathBuf>,
    /// Player profile file
    pub profiles_path: PathBuf,

    /// Delay between bot deploy attempts
    pub bot_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = MatchConfig::default();

        let mode = match env::var("MATCH_MODE") {
            Ok(raw) => raw
                .parse::<MatchMode>()
                .map_err(|_| ConfigError::Invalid("MATCH_MODE"))?,
            Err(_) => defaults.mode,
        };

        let tick_ms: u64 = parse_or("TICK_INTERVAL_MS", 1000)?;
        if tick_ms == 0 {
            return Err(ConfigError::Invalid("TICK_INTERVAL_MS"));
        }
        let bot_ms: u64 = parse_or("BOT_INTERVAL_MS", 700)?;
        if bot_ms == 0 {
            return Err(ConfigError::Invalid("BOT_INTERVAL_MS"));
        }

        let match_config = MatchConfig {
            mode,
            tick_interval: Duration::from_millis(tick_ms),
            duration: Duration::from_secs(parse_or(
                "MATCH_DURATION_SECS",
                defaults.duration.as_secs(),
            )?),
            starting_mana: parse_or("STARTING_MANA", defaults.starting_mana)?.min(MAX_MANA),
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            match_config,
            seed: parse_opt("MATCH_SEED")?,
            catalog_path: env::var("CATALOG_PATH").ok().map(PathBuf::from),
            profiles_path: env::var("PROFILES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("players.json")),
            bot_interval: Duration::from_millis(bot_ms),
        })
    }
}

/// Parse an optional variable
fn parse_opt<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

/// Parse a variable, falling back to a default when unset
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_opt(name)?.unwrap_or(default))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
