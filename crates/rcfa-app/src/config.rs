//! Configuration management for bearing-rcfa
//!
//! Config stored at: ~/.config/bearing-rcfa/config.json
//!
//! `GOOGLE_API_KEY` and `GEMINI_MODEL` are also read from the process
//! environment and from a `.env` file in the working directory.

use rcfa_types::{ConfigError, OutputFormat, Result};
use rcfa_vision::ai::backend_impl::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use rcfa_vision::{AnalyzerConfig, GeminiBackend};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_DIR: &str = "bearing-rcfa";

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable overriding the model name
pub const MODEL_ENV: &str = "GEMINI_MODEL";

/// Dotenv file consulted when a variable is missing from the environment
pub const DOTENV_FILE: &str = ".env";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key. The environment takes precedence.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name, with or without the `models/` prefix
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL override (proxy, local test server)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Upper bound on one model call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Enable caching
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Cache directory override
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_base_url: None,
            timeout_secs: default_timeout_secs(),
            cache_enabled: true,
            cache_dir: None,
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }

        let cache_dir = dirs::cache_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(cache_dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the analyzer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "model".to_string(),
                value: self.model.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Overlay `GOOGLE_API_KEY` and `GEMINI_MODEL` from the process environment,
    /// falling back to `.env` in the working directory
    pub fn apply_env(&mut self) {
        let dotenv = read_dotenv(Path::new(DOTENV_FILE));
        self.apply_env_from(|name| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| dotenv.get(name).cloned())
        });
    }

    /// Overlay values from `lookup`; blank values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_blank(MODEL_ENV) {
            self.model = model;
        }
    }

    /// Gemini backend built from this config
    pub fn backend(&self) -> GeminiBackend {
        let backend = GeminiBackend::new(self.api_key.clone(), Some(self.model.clone()));
        match self.api_base_url.as_deref() {
            Some(url) if !url.trim().is_empty() => backend.with_base_url(url),
            _ => backend,
        }
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::default().with_timeout_secs(self.timeout_secs)
    }

    /// API key for display: first and last four characters only
    pub fn masked_api_key(&self) -> String {
        match self.api_key.as_deref() {
            None => "(not set)".to_string(),
            Some(key) => mask_secret(key),
        }
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Bearing RCFA Configuration")?;
        writeln!(f, "==========================")?;
        writeln!(f)?;
        writeln!(f, "API key:        {}", self.masked_api_key())?;
        writeln!(f, "Model:          {}", self.model)?;
        writeln!(
            f,
            "API base URL:   {}",
            self.api_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
        )?;
        writeln!(f, "Timeout:        {}s", self.timeout_secs)?;
        writeln!(f, "Cache enabled:  {}", self.cache_enabled)?;
        writeln!(
            f,
            "Cache dir:      {}",
            self.cache_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:  {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}

/// Key/value pairs from a dotenv file. A missing file yields an empty map.
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return HashMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open dotenv file");
            return HashMap::new();
        }
    };

    iter.filter_map(|item| match item {
        Ok(pair) => Some(pair),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping malformed dotenv line");
            None
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcfa_types::Error;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model, "models/gemini-2.5-flash");
        assert_eq!(config.timeout_secs, 60);
        assert!(config.cache_enabled);
        assert_eq!(config.output_format, OutputFormat::Table);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"cache_enabled": false}"#).unwrap();
        assert!(!config.cache_enabled);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            model: "gemini-1.5-pro".to_string(),
            timeout_secs: 30,
            output_format: OutputFormat::Json,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model, "gemini-1.5-pro");
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));

        std::fs::write(&path, r#"{"timeout_secs": 0}"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(API_KEY_ENV, "AIzaSyExampleKey1234"), (MODEL_ENV, "  ")]
            .into_iter()
            .collect();

        let mut config = Config::default();
        config.apply_env_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("AIzaSyExampleKey1234"));
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_dotenv_file_supplies_missing_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DOTENV_FILE);
        std::fs::write(
            &path,
            "# local credentials\nGOOGLE_API_KEY=AIzaSyDotenvKey5678\nGEMINI_MODEL=\"models/gemini-2.0-flash\"\n",
        )
        .unwrap();

        let dotenv = read_dotenv(&path);
        assert_eq!(dotenv.len(), 2);

        // Process environment wins where it has a value
        let env: HashMap<&str, &str> = [(MODEL_ENV, "models/gemini-2.5-pro")].into_iter().collect();
        let mut config = Config::default();
        config.apply_env_from(|name| {
            env.get(name)
                .map(|v| v.to_string())
                .or_else(|| dotenv.get(name).cloned())
        });

        assert_eq!(config.api_key.as_deref(), Some("AIzaSyDotenvKey5678"));
        assert_eq!(config.model, "models/gemini-2.5-pro");
    }

    #[test]
    fn test_missing_dotenv_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(read_dotenv(&dir.path().join(DOTENV_FILE)).is_empty());
    }

    #[test]
    fn test_api_key_is_masked() {
        let config = Config {
            api_key: Some("AIzaSyExampleKey1234".to_string()),
            ..Default::default()
        };
        assert_eq!(config.masked_api_key(), "AIza...1234");

        let shown = config.to_string();
        assert!(!shown.contains("AIzaSyExampleKey1234"));
        assert!(shown.contains("AIza...1234"));

        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(Config::default().masked_api_key(), "(not set)");
    }

    #[test]
    fn test_backend_readiness_follows_key() {
        use rcfa_vision::VisionBackend;

        assert!(!Config::default().backend().is_ready());
        let config = Config {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(config.backend().is_ready());
    }
}
