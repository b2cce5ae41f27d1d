use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::similarity::SimilarityKind;

/// Environment variable holding a comma-separated list of API keys.
pub const API_KEYS_ENV: &str = "YOUTUBE_API_KEYS";

pub const DEFAULT_MAX_RESULTS: u32 = 15;
pub const DEFAULT_ANALYSIS_LIMIT: u32 = 15;
pub const DEFAULT_MIN_IMPROVEMENT: f64 = 5.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Settings that can be saved to a file.  Every field is optional; the
/// accessor methods supply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<Vec<String>>,

    /// Search hits requested per song
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    /// Hits requested when listing all scored candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_limit: Option<u32>,

    /// Score gain needed before a stored match is replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_improvement: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<SimilarityKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// `~/.state/chartvid/defaults.toml`
    pub fn get_config_path() -> io::Result<PathBuf> {
        Ok(state_dir()?.join("defaults.toml"))
    }

    /// Load the config file; a missing file gives an empty config.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Overlay the fields that are set in `other`.
    pub fn merge(&mut self, other: &Config) {
        if other.api_keys.is_some() {
            self.api_keys = other.api_keys.clone();
        }
        if other.max_results.is_some() {
            self.max_results = other.max_results;
        }
        if other.analysis_limit.is_some() {
            self.analysis_limit = other.analysis_limit;
        }
        if other.min_improvement.is_some() {
            self.min_improvement = other.min_improvement;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.similarity.is_some() {
            self.similarity = other.similarity;
        }
        if other.store_path.is_some() {
            self.store_path = other.store_path.clone();
        }
    }

    /// API keys from `YOUTUBE_API_KEYS` if set, else from the file.
    pub fn resolve_api_keys(&self) -> Vec<String> {
        let from_env = std::env::var(API_KEYS_ENV).ok().map(|v| parse_key_list(&v));
        self.api_keys_with_override(from_env)
    }

    fn api_keys_with_override(&self, from_env: Option<Vec<String>>) -> Vec<String> {
        match from_env {
            Some(keys) if !keys.is_empty() => {
                log::info!("Loaded {} API key(s) from {}", keys.len(), API_KEYS_ENV);
                keys
            }
            _ => self
                .api_keys
                .iter()
                .flatten()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn max_results(&self) -> u32 {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS).clamp(1, 50)
    }

    pub fn analysis_limit(&self) -> u32 {
        self.analysis_limit.unwrap_or(DEFAULT_ANALYSIS_LIMIT).clamp(1, 50)
    }

    pub fn min_improvement(&self) -> f64 {
        self.min_improvement.unwrap_or(DEFAULT_MIN_IMPROVEMENT)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn similarity(&self) -> SimilarityKind {
        self.similarity.unwrap_or_default()
    }

    /// `~/.state/chartvid/matches.db` unless configured.
    pub fn store_path(&self) -> io::Result<PathBuf> {
        match &self.store_path {
            Some(p) => Ok(p.clone()),
            None => Ok(state_dir()?.join("matches.db")),
        }
    }

    /// Print the effective settings (keys are counted, never shown).
    pub fn print(&self, title: &str) {
        println!("{}:", title);
        println!("  API keys:           {}", self.resolve_api_keys().len());
        println!("  Max results:        {}", self.max_results());
        println!("  Analysis limit:     {}", self.analysis_limit());
        println!("  Min improvement:    {:.1}", self.min_improvement());
        println!("  Timeout:            {} seconds", self.timeout_secs());
        println!("  Similarity:         {:?}", self.similarity());
        if let Ok(path) = self.store_path() {
            println!("  Match store:        {}", path.display());
        }
    }
}

fn state_dir() -> io::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "HOME environment variable not set"))?;
    Ok(Path::new(&home).join(".state").join("chartvid"))
}

/// Split a comma-separated key list, dropping blanks.
pub fn parse_key_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_list() {
        assert_eq!(parse_key_list("a, b ,,c"), vec!["a", "b", "c"]);
        assert!(parse_key_list("").is_empty());
        assert!(parse_key_list(" , ").is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.max_results(), 15);
        assert_eq!(config.analysis_limit(), 15);
        assert_eq!(config.min_improvement(), 5.0);
        assert_eq!(config.timeout_secs(), 20);
        assert_eq!(config.similarity(), SimilarityKind::default());
    }

    #[test]
    fn test_limits_are_clamped() {
        let config = Config { max_results: Some(500), analysis_limit: Some(0), ..Config::new() };
        assert_eq!(config.max_results(), 50);
        assert_eq!(config.analysis_limit(), 1);
    }

    #[test]
    fn test_env_keys_override_file_keys() {
        let config = Config {
            api_keys: Some(vec!["file-key".to_string(), " ".to_string()]),
            ..Config::new()
        };
        assert_eq!(config.api_keys_with_override(None), vec!["file-key"]);
        assert_eq!(config.api_keys_with_override(Some(Vec::new())), vec!["file-key"]);
        assert_eq!(
            config.api_keys_with_override(Some(vec!["env-1".into(), "env-2".into()])),
            vec!["env-1", "env-2"]
        );
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config { max_results: Some(10), timeout_secs: Some(5), ..Config::new() };
        let other = Config {
            max_results: Some(25),
            similarity: Some(SimilarityKind::TokenOverlap),
            ..Config::new()
        };
        base.merge(&other);
        assert_eq!(base.max_results, Some(25));
        assert_eq!(base.timeout_secs, Some(5));
        assert_eq!(base.similarity, Some(SimilarityKind::TokenOverlap));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("defaults.toml");
        let config = Config {
            api_keys: Some(vec!["k1".to_string()]),
            min_improvement: Some(7.5),
            similarity: Some(SimilarityKind::None),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("similarity = \"none\""));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.toml");
        fs::write(&path, "request_interval_ms = 250\nmax_results = 20\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config { max_results: Some(20), ..Config::new() });
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "max_results = \"many\"").unwrap();
        assert!(matches!(Config::load_from(&path), Err(crate::Error::ConfigParse(_))));
    }
}
