//! Run configuration.
//!
//! Everything a run needs besides the credential comes from an optional TOML
//! file; every field has a default, so an empty file (or no file) gives the
//! standard setup: SPY as benchmark, Polygon as provider, artifacts in the
//! working directory.

use rsrank_core::data::{DataError, PolygonSettings};
use rsrank_core::engine::CompactionPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Credential(#[from] DataError),
}

/// Complete configuration for a rebuild or update run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub provider: ProviderConfig,
    pub benchmark: BenchmarkConfig,
    pub paths: OutputPaths,
    /// Calendar days of history requested per symbol on a full rebuild.
    pub lookback_days: u32,
    /// A symbol needs more than this many raw bars to be considered.
    pub min_raw_bars: usize,
    pub compaction: CompactionPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            benchmark: BenchmarkConfig::default(),
            paths: OutputPaths::default(),
            lookback_days: 450,
            min_raw_bars: 200,
            compaction: CompactionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub rate_limit_wait_secs: u64,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: rsrank_core::data::polygon::DEFAULT_BASE_URL.to_string(),
            max_retries: 1,
            base_delay_ms: 1_000,
            rate_limit_wait_secs: 30,
            min_interval_ms: 200,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub symbol: String,
    /// Display name used in the formula and benchmark label.
    pub name: String,
}

impl BenchmarkConfig {
    /// `S&P 500 (SPY)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            name: "S&P 500".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    pub rankings: PathBuf,
    pub history: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            rankings: PathBuf::from("rankings.json"),
            history: PathBuf::from("historical_data.json"),
        }
    }
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// The file at `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.benchmark.symbol.trim().is_empty() {
            return invalid("benchmark.symbol must not be empty");
        }
        if self.lookback_days == 0 {
            return invalid("lookback_days must be positive");
        }
        if self.compaction.stride == 0 {
            return invalid("compaction.stride must be at least 1");
        }
        if self.compaction.max_window < self.compaction.recent_window {
            return invalid("compaction.max_window must be >= compaction.recent_window");
        }
        Ok(())
    }

    /// Polygon settings with the key from `POLYGON_API_KEY`.
    ///
    /// Fails before any network call when the key is missing.
    pub fn polygon_settings(&self) -> Result<PolygonSettings, ConfigError> {
        let mut settings = PolygonSettings::from_env()?;
        self.provider.apply(&mut settings);
        Ok(settings)
    }
}

impl ProviderConfig {
    pub fn apply(&self, settings: &mut PolygonSettings) {
        settings.base_url = self.base_url.clone();
        settings.max_retries = self.max_retries;
        settings.base_delay = Duration::from_millis(self.base_delay_ms);
        settings.rate_limit_wait = Duration::from_secs(self.rate_limit_wait_secs);
        settings.min_interval = Duration::from_millis(self.min_interval_ms);
        settings.timeout = Duration::from_secs(self.timeout_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.lookback_days, 450);
        assert_eq!(config.min_raw_bars, 200);
        assert_eq!(config.benchmark.label(), "S&P 500 (SPY)");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = RunConfig::from_toml(
            r#"
            min_raw_bars = 150

            [benchmark]
            symbol = "QQQ"

            [compaction]
            stride = 1

            [paths]
            rankings = "out/rankings.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.min_raw_bars, 150);
        assert_eq!(config.benchmark.symbol, "QQQ");
        assert_eq!(config.benchmark.name, "S&P 500");
        assert_eq!(config.compaction, CompactionPolicy::uncompacted());
        assert_eq!(config.paths.rankings, PathBuf::from("out/rankings.json"));
        assert_eq!(config.paths.history, PathBuf::from("historical_data.json"));
    }

    #[test]
    fn rejects_zero_stride() {
        let err = RunConfig::from_toml("[compaction]\nstride = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_window_smaller_than_recent() {
        let err =
            RunConfig::from_toml("[compaction]\nrecent_window = 50\nmax_window = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = RunConfig::from_toml("lookback_days = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunConfig::from_file(&dir.path().join("none.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn provider_settings_are_applied() {
        let provider = ProviderConfig {
            base_url: "http://localhost:8080".into(),
            max_retries: 3,
            rate_limit_wait_secs: 5,
            ..ProviderConfig::default()
        };
        let mut settings = PolygonSettings::new(SecretString::new("k".into()));
        provider.apply(&mut settings);
        assert_eq!(settings.base_url, "http://localhost:8080");
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.rate_limit_wait, Duration::from_secs(5));
        assert_eq!(settings.min_interval, Duration::from_millis(200));
    }
}
