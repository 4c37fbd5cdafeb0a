//! Application configuration for indicoharvest.
//!
//! User config lives at `~/.indicoharvest/indicoharvest.toml`. The tool has
//! no runtime extraction flags; everything is defaults baked in here,
//! optionally overridden by the config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "indicoharvest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".indicoharvest";

// ---------------------------------------------------------------------------
// Config structs (matching indicoharvest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Event source settings.
    #[serde(default)]
    pub event: EventConfig,

    /// Network fetch policies.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Processing limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// `[event]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Indico event identifier.
    #[serde(default = "default_event_id")]
    pub event_id: String,

    /// Base URL of the Indico server (origin, no path).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Output directory for the extracted tree.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            event_id: default_event_id(),
            base_url: default_base_url(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_event_id() -> String {
    "939".into()
}
fn default_base_url() -> String {
    "https://indico.jlab.org".into()
}
fn default_output_dir() -> String {
    "LLRF2025_Data".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Fixed delay in ms before each network request.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Timeout in seconds for API requests.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout in seconds for attachment downloads.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Maximum attempts per request before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial retry backoff in ms (doubles per attempt).
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_request_delay_ms() -> u64 {
    500
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_download_timeout_secs() -> u64 {
    60
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    1000
}

/// `[limits]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Cap on the number of contributions processed (unset = all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_contributions: Option<usize>,
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Bounded retry policy applied to every network request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Initial backoff interval; doubles after each failed attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay to wait after `completed_attempts` failed attempts.
    pub fn delay_after(&self, completed_attempts: u32) -> Duration {
        let exp = completed_attempts.saturating_sub(1).min(6);
        self.backoff.saturating_mul(1 << exp)
    }
}

// ---------------------------------------------------------------------------
// Harvest config (runtime, merged from file + defaults)
// ---------------------------------------------------------------------------

/// Runtime configuration threaded explicitly through the pipeline stages.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Indico event identifier.
    pub event_id: String,
    /// Base URL of the Indico server.
    pub base_url: String,
    /// Output directory for the extracted tree.
    pub output_dir: PathBuf,
    /// Fixed delay before each network request.
    pub request_delay: Duration,
    /// Timeout for API requests.
    pub timeout: Duration,
    /// Timeout for attachment downloads.
    pub download_timeout: Duration,
    /// Retry policy for all network requests.
    pub retry: RetryPolicy,
    /// Cap on the number of contributions processed (unset = all).
    pub max_contributions: Option<usize>,
}

impl From<&AppConfig> for HarvestConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            event_id: config.event.event_id.clone(),
            base_url: config.event.base_url.clone(),
            output_dir: PathBuf::from(&config.event.output_dir),
            request_delay: Duration::from_millis(config.fetch.request_delay_ms),
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            download_timeout: Duration::from_secs(config.fetch.download_timeout_secs),
            retry: RetryPolicy {
                max_attempts: config.fetch.max_attempts.max(1),
                backoff: Duration::from_millis(config.fetch.backoff_ms),
            },
            max_contributions: config.limits.max_contributions,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.indicoharvest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HarvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.indicoharvest/indicoharvest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HarvestError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| HarvestError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HarvestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HarvestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
