//! Application-level configuration loading for timeouts, expiry windows, and
//! the matchmaking leave policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GRID_DUEL_BACK_CONFIG_PATH";

/// What happens to a waiting match when its sole participant leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeavePolicy {
    /// Drop the emptied match and its waiting-queue entry.
    Discard,
    /// Keep the emptied match queued so the next joiner can reuse the slot.
    Requeue,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// How long a `/sub` request may wait before answering with a timeout.
    pub poll_timeout: Duration,
    /// Lower bound of the jittered sleep between poll re-reads.
    pub poll_retry_min: Duration,
    /// Upper bound of the jittered sleep between poll re-reads.
    pub poll_retry_max: Duration,
    /// Interval between two reaper sweeps of the waiting queue.
    pub reaper_interval: Duration,
    /// Store expiry for sessions; doubles as the inactivity window after which
    /// a participant counts as gone.
    pub session_ttl: Duration,
    /// Store expiry for matches nobody touches anymore.
    pub match_ttl: Duration,
    /// Behaviour when a session leaves a match that is still waiting.
    pub leave_policy: LeavePolicy,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults when the file is absent or unparsable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize, Default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    poll_timeout_secs: Option<u64>,
    #[serde(default)]
    poll_retry_min_ms: Option<u64>,
    #[serde(default)]
    poll_retry_max_ms: Option<u64>,
    #[serde(default)]
    reaper_interval_secs: Option<u64>,
    #[serde(default)]
    session_ttl_secs: Option<u64>,
    #[serde(default)]
    match_ttl_secs: Option<u64>,
    #[serde(default)]
    leave_policy: Option<LeavePolicy>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            poll_timeout: Duration::from_secs(raw.poll_timeout_secs.unwrap_or(5)),
            poll_retry_min: Duration::from_millis(raw.poll_retry_min_ms.unwrap_or(30)),
            poll_retry_max: Duration::from_millis(raw.poll_retry_max_ms.unwrap_or(300)),
            reaper_interval: Duration::from_secs(raw.reaper_interval_secs.unwrap_or(60)),
            session_ttl: Duration::from_secs(raw.session_ttl_secs.unwrap_or(600)),
            match_ttl: Duration::from_secs(raw.match_ttl_secs.unwrap_or(3600)),
            leave_policy: raw.leave_policy.unwrap_or(LeavePolicy::Discard),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
