//! Client configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use lorekeeper_narrative::domain::phase::PlaybackTiming;

use crate::error::AppError;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const STATE_FILE_NAME: &str = "state.json";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(AppError::Config(format!(
                "LOREKEEPER_LOG_FORMAT must be json or pretty, got {other:?}"
            ))),
        }
    }
}

/// Everything the client needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub api_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Background poll period.
    pub poll_interval: Duration,
    /// Where resume state is persisted.
    pub state_file: PathBuf,
    /// Log output format.
    pub log_format: LogFormat,
    /// Playback reveal timing.
    pub timing: PlaybackTiming,
}

impl ClientConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value or
    /// no state file location can be determined.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_url = lookup("LOREKEEPER_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let request_timeout = Duration::from_secs(parse_secs(
            &lookup,
            "LOREKEEPER_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let poll_interval = Duration::from_secs(parse_secs(
            &lookup,
            "LOREKEEPER_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?);
        if poll_interval.is_zero() {
            return Err(AppError::Config(
                "LOREKEEPER_POLL_INTERVAL_SECS must be > 0".into(),
            ));
        }

        let state_file = match lookup("LOREKEEPER_STATE_FILE") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_state_file()?,
        };

        let log_format = lookup("LOREKEEPER_LOG_FORMAT")
            .map(|raw| raw.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            api_url,
            request_timeout,
            poll_interval,
            state_file,
            log_format,
            timing: PlaybackTiming::default(),
        })
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, AppError> {
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a whole number of seconds: {e}")))
    })
}

fn default_state_file() -> Result<PathBuf, AppError> {
    ProjectDirs::from("io", "lorekeeper", "client")
        .map(|dirs| dirs.config_dir().join(STATE_FILE_NAME))
        .ok_or_else(|| {
            AppError::Config(
                "cannot determine a config directory; set LOREKEEPER_STATE_FILE".into(),
            )
        })
}
