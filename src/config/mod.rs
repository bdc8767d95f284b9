use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Complete nas-state configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Remote fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Upper bound for one refresh's remote calls (seconds, 0 = unbounded)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Repeated refresh configuration for the CLI listing commands
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Pause between refresh cycles (seconds)
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Number of refresh cycles
    #[serde(default = "default_cycles")]
    pub cycles: u32,
}

fn default_interval_seconds() -> u64 {
    5
}

fn default_cycles() -> u32 {
    1
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            cycles: default_cycles(),
        }
    }
}

impl Config {
    /// Apply `NAS_STATE_*` environment overrides.
    ///
    /// Unset or unparsable variables leave the current value in place.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_parse("NAS_STATE_FETCH_TIMEOUT_SECONDS") {
            self.fetch.timeout_seconds = n;
        }
        if let Some(n) = env_parse("NAS_STATE_WATCH_INTERVAL_SECONDS") {
            self.watch.interval_seconds = n;
        }
        if let Some(n) = env_parse("NAS_STATE_WATCH_CYCLES") {
            self.watch.cycles = n;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
