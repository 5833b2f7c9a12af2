use std::path::Path;
use serde::{Serialize, Deserialize};
use simplelog::LevelFilter;

use crate::error::ConfigError;
use crate::yamlrw::YamlRW;

pub const DEFAULT_PATH: &str = "tropesearch.yaml";

/// What happens to a match when it is activated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivateMode {
    /// Append the match to the accumulator line.
    Append,
    /// Replace the query text with the match.
    Replace,
}

/// How the query text is turned into a matcher.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The query is a case-insensitive regular expression.
    #[default]
    Pattern,
    /// The query is matched literally, ignoring case.
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub field: String,
    pub min_query_len: usize,
    pub on_activate: ActivateMode,
    pub match_mode: MatchMode,
    pub accumulator: String,
    pub log_file: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/api/1/tropes".to_string(),
            field: "tropes".to_string(),
            min_query_len: 2,
            on_activate: ActivateMode::Append,
            match_mode: MatchMode::Pattern,
            accumulator: "Haunted House, Ironic Nursery Tune".to_string(),
            log_file: "tropesearch.log".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl YamlRW for Config {}

impl Config {
    /// Reads the config at `path`, writing the defaults there first if it does not exist.
    pub fn load_or_init(path: &str) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            Self::read_yaml(path)
        } else {
            let config = Self::default();
            config.write_yaml(path)?;
            Ok(config)
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level.parse().map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
