//! Client configuration loading: remote endpoints, polling policies and quiz timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::{
    dao::{content_api::ContentEndpoints, progress::DEFAULT_UNLOCK_THRESHOLD},
    services::{
        polling::PollPolicy,
        session_service::{DEFAULT_JOIN_START_DELAY, SessionSettings},
    },
    state::DEFAULT_QUESTION_SECONDS,
};

/// Default location on disk where the client looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/client.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BINGE_BRAIN_CONFIG_PATH";
/// Base URL of the local stub service.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8787";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the client.
pub struct ClientConfig {
    /// Room Service endpoint receiving every action.
    pub room_endpoint: String,
    /// Level questions endpoint.
    pub questions_url: String,
    /// Weekly challenge endpoint.
    pub challenge_url: String,
    /// Leaderboard endpoint.
    pub leaderboard_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Polling while waiting for the opponent.
    pub opponent_poll: PollPolicy,
    /// Polling while waiting for the winner.
    pub result_poll: PollPolicy,
    /// Pause between a successful join and the first question.
    pub join_start_delay: Duration,
    /// Countdown per question.
    pub question_seconds: u32,
    /// Pause after a question is decided.
    pub advance_delay: Duration,
    /// Score percentage that unlocks the next level.
    pub unlock_threshold_percent: f64,
    /// Location of the local store file.
    pub store_path: PathBuf,
}

impl ClientConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        room_endpoint = %config.room_endpoint,
                        "loaded client config"
                    );
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

    /// Parse a JSON document. Absent keys keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Room session timings.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            opponent_poll: self.opponent_poll,
            join_start_delay: self.join_start_delay,
        }
    }

    /// URLs of the content endpoints.
    pub fn content_endpoints(&self) -> ContentEndpoints {
        ContentEndpoints {
            questions: self.questions_url.clone(),
            challenge: self.challenge_url.clone(),
            leaderboard: self.leaderboard_url.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            room_endpoint: format!("{DEFAULT_BASE_URL}/prod/"),
            questions_url: format!("{DEFAULT_BASE_URL}/questions"),
            challenge_url: format!("{DEFAULT_BASE_URL}/challenge"),
            leaderboard_url: format!("{DEFAULT_BASE_URL}/leaderboard"),
            request_timeout: Duration::from_secs(10),
            opponent_poll: PollPolicy::OPPONENT,
            result_poll: PollPolicy::RESULT,
            join_start_delay: DEFAULT_JOIN_START_DELAY,
            question_seconds: DEFAULT_QUESTION_SECONDS,
            advance_delay: Duration::from_secs(1),
            unlock_threshold_percent: DEFAULT_UNLOCK_THRESHOLD,
            store_path: PathBuf::from("binge-brain-store.json"),
        }
    }
}

/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    room_endpoint: Option<String>,
    questions_url: Option<String>,
    challenge_url: Option<String>,
    leaderboard_url: Option<String>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(rename = "requestTimeoutMs")]
    request_timeout: Option<Duration>,
    opponent_poll: Option<PollPolicy>,
    result_poll: Option<PollPolicy>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(rename = "joinStartDelayMs")]
    join_start_delay: Option<Duration>,
    question_seconds: Option<u32>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(rename = "advanceDelayMs")]
    advance_delay: Option<Duration>,
    unlock_threshold_percent: Option<f64>,
    store_path: Option<PathBuf>,
}

impl From<RawConfig> for ClientConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            room_endpoint: raw.room_endpoint.unwrap_or(defaults.room_endpoint),
            questions_url: raw.questions_url.unwrap_or(defaults.questions_url),
            challenge_url: raw.challenge_url.unwrap_or(defaults.challenge_url),
            leaderboard_url: raw.leaderboard_url.unwrap_or(defaults.leaderboard_url),
            request_timeout: raw.request_timeout.unwrap_or(defaults.request_timeout),
            opponent_poll: raw.opponent_poll.unwrap_or(defaults.opponent_poll),
            result_poll: raw.result_poll.unwrap_or(defaults.result_poll),
            join_start_delay: raw.join_start_delay.unwrap_or(defaults.join_start_delay),
            question_seconds: raw
                .question_seconds
                .filter(|seconds| *seconds > 0)
                .unwrap_or(defaults.question_seconds),
            advance_delay: raw.advance_delay.unwrap_or(defaults.advance_delay),
            unlock_threshold_percent: raw
                .unlock_threshold_percent
                .unwrap_or(defaults.unlock_threshold_percent),
            store_path: raw.store_path.unwrap_or(defaults.store_path),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ClientConfig::from_json("{}").unwrap();
        assert_eq!(config.opponent_poll, PollPolicy::OPPONENT);
        assert_eq!(config.result_poll, PollPolicy::RESULT);
        assert_eq!(config.join_start_delay, Duration::from_secs(3));
        assert_eq!(config.question_seconds, 10);
    }

    #[test]
    fn durations_are_milliseconds() {
        let config = ClientConfig::from_json(
            r#"{
                "roomEndpoint": "https://rooms.example.com/prod/",
                "requestTimeoutMs": 2500,
                "opponentPoll": { "intervalMs": 5000, "maxAttempts": 12, "maxBackoffMs": 20000 },
                "joinStartDelayMs": 0,
                "questionSeconds": 0
            }"#,
        )
        .unwrap();

        assert_eq!(config.room_endpoint, "https://rooms.example.com/prod/");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.opponent_poll.interval, Duration::from_secs(5));
        assert_eq!(config.opponent_poll.max_attempts, 12);
        assert_eq!(config.join_start_delay, Duration::ZERO);
        // A zero-second clock would time every question out instantly.
        assert_eq!(config.question_seconds, 10);
    }

    #[test]
    fn unknown_shape_is_an_error() {
        assert!(ClientConfig::from_json(r#"{ "opponentPoll": 15 }"#).is_err());
    }
}
