// Configuration loading and validation (config/league.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::scoring::MAX_ACHIEVEMENT_POINTS;
use crate::engine::{MAX_RANDOM_ACHIEVEMENTS, MAX_TOTAL_WEEKS};
use crate::orchestrator::{DefaultAchievement, TournamentDefaults};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub league: LeagueConfig,
    pub default_achievement: DefaultAchievementConfig,
    /// Resolved SQLite path.
    pub db_path: PathBuf,
}

impl Config {
    pub fn default_achievement(&self) -> DefaultAchievement {
        DefaultAchievement {
            name: self.default_achievement.name.clone(),
            points: self.default_achievement.points,
            always_on: self.default_achievement.always_on,
        }
    }

    pub fn tournament_defaults(&self) -> TournamentDefaults {
        TournamentDefaults {
            total_weeks: self.league.default_total_weeks,
            random_achievements_per_week: self.league.default_random_achievements,
        }
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for league.toml. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct LeagueFile {
    #[serde(default)]
    league: LeagueConfig,
    #[serde(default)]
    default_achievement: DefaultAchievementConfig,
    #[serde(default)]
    database: DatabaseSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub name: String,
    /// Pre-filled week count on the new-tournament form.
    pub default_total_weeks: u32,
    /// Pre-filled random achievements per week on the new-tournament form.
    pub default_random_achievements: u32,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        let form = TournamentDefaults::default();
        LeagueConfig {
            name: "Pod League".to_string(),
            default_total_weeks: form.total_weeks,
            default_random_achievements: form.random_achievements_per_week,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefaultAchievementConfig {
    pub name: String,
    pub points: u32,
    pub always_on: bool,
}

impl Default for DefaultAchievementConfig {
    fn default() -> Self {
        let seed = DefaultAchievement::default();
        DefaultAchievementConfig {
            name: seed.name,
            points: seed.points,
            always_on: seed.always_on,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/league.toml` under `base_dir`.
///
/// A missing file is not an error: every setting has a default. A relative
/// database path is resolved against `base_dir`; an absent one falls back to
/// the platform data directory.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let league_path = base_dir.join("config").join("league.toml");
    let file = if league_path.exists() {
        let text = read_file(&league_path)?;
        toml::from_str::<LeagueFile>(&text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?
    } else {
        LeagueFile::default()
    };

    let db_path = match file.database.path {
        Some(path) => {
            let path = PathBuf::from(path);
            if path.is_relative() {
                base_dir.join(path)
            } else {
                path
            }
        }
        None => default_db_path(base_dir),
    };

    let config = Config {
        league: file.league,
        default_achievement: file.default_achievement,
        db_path,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

/// `<data dir>/podleague.db`, or `base_dir/podleague.db` when the platform
/// has no data directory.
fn default_db_path(base_dir: &Path) -> PathBuf {
    directories::ProjectDirs::from("", "", "podleague")
        .map(|dirs| dirs.data_dir().join("podleague.db"))
        .unwrap_or_else(|| base_dir.join("podleague.db"))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.name".into(),
            message: "must not be empty".into(),
        });
    }

    let weeks = config.league.default_total_weeks;
    if !(1..=MAX_TOTAL_WEEKS).contains(&weeks) {
        return Err(ConfigError::ValidationError {
            field: "league.default_total_weeks".into(),
            message: format!("must be between 1 and {MAX_TOTAL_WEEKS}, got {weeks}"),
        });
    }

    let randoms = config.league.default_random_achievements;
    if randoms > MAX_RANDOM_ACHIEVEMENTS {
        return Err(ConfigError::ValidationError {
            field: "league.default_random_achievements".into(),
            message: format!("must be at most {MAX_RANDOM_ACHIEVEMENTS}, got {randoms}"),
        });
    }

    if config.default_achievement.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "default_achievement.name".into(),
            message: "must not be empty".into(),
        });
    }

    let points = config.default_achievement.points;
    if points > MAX_ACHIEVEMENT_POINTS {
        return Err(ConfigError::ValidationError {
            field: "default_achievement.points".into(),
            message: format!("must be at most {MAX_ACHIEVEMENT_POINTS}, got {points}"),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
