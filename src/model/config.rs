use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config file found; searched:\n{}", format_locations(.searched))]
    NotFound { searched: Vec<PathBuf> },
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

fn format_locations(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User configuration, loaded from a TOML file. Holds the API credentials
/// plus a handful of switches that modify each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: String,
    pub api_token: String,
    /// Board to work with; defaults to the first open board on the account
    #[serde(default)]
    pub board: Option<String>,
    /// Override the service base URL (mainly for testing)
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_true")]
    pub color: bool,
    #[serde(default = "default_true")]
    pub banner: bool,
    /// Review: offer to open attachments on cards that have them
    #[serde(default = "default_true")]
    pub prompt_for_open_attachments: bool,
    /// Review: offer the tag flow on cards with no labels
    #[serde(default = "default_true")]
    pub prompt_for_untagged_cards: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Candidate config file locations, in search order. `$KARD_CONFIG`
    /// always wins when set.
    pub fn locations() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(explicit) = std::env::var_os("KARD_CONFIG") {
            paths.push(PathBuf::from(explicit));
        }
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            paths.push(home.join(".config/kard/kard.toml"));
            paths.push(home.join(".kard.toml"));
        }
        paths
    }

    /// Load the config from the first location that exists.
    pub fn load() -> Result<Config, ConfigError> {
        let searched = Config::locations();
        for path in &searched {
            if path.is_file() {
                return Config::from_path(path.clone());
            }
        }
        Err(ConfigError::NotFound { searched })
    }

    pub fn from_path(path: PathBuf) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "kard configuration:")?;
        writeln!(f, "  API key: {}", self.api_key)?;
        writeln!(f, "  API token: {}", self.api_token)?;
        writeln!(f, "  Board: {}", self.board.as_deref().unwrap_or("(first open board)"))?;
        writeln!(f, "  Use ANSI color? {}", self.color)?;
        writeln!(f, "  Banner? {}", self.banner)?;
        writeln!(
            f,
            "  Prompt to open attachments? {}",
            self.prompt_for_open_attachments
        )?;
        write!(
            f,
            "  Prompt to tag untagged cards? {}",
            self.prompt_for_untagged_cards
        )
    }
}
