//! Client configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// What to do with an optimistic move whose echo never arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Restore the board and turn from before the move.
    #[default]
    #[display("rollback")]
    Rollback,
    /// Keep the speculative board and turn; only release the move lock.
    #[display("keep_optimistic")]
    KeepOptimistic,
}

/// Configuration for a game client.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Milliseconds to wait for a move echo.
    #[serde(default = "default_ack_timeout_ms")]
    ack_timeout_ms: u64,

    /// Handling of unacknowledged moves.
    #[serde(default)]
    timeout_policy: TimeoutPolicy,

    /// Outbound move destination; `{room}` is replaced with the room id.
    #[serde(default = "default_move_destination")]
    move_destination: String,

    /// Topic carrying move echoes.
    #[serde(default = "default_game_topic")]
    game_topic: String,

    /// Topic carrying room lifecycle events.
    #[serde(default = "default_room_topic")]
    room_topic: String,

    /// Base URL for bootstrap reads.
    #[serde(default = "default_api_base_url")]
    api_base_url: String,
}

fn default_ack_timeout_ms() -> u64 {
    2000
}

fn default_move_destination() -> String {
    "/app/game/{room}/move".to_string()
}

fn default_game_topic() -> String {
    "/topic/game/{room}".to_string()
}

fn default_room_topic() -> String {
    "/topic/room/{room}".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: default_ack_timeout_ms(),
            timeout_policy: TimeoutPolicy::default(),
            move_destination: default_move_destination(),
            game_topic: default_game_topic(),
            room_topic: default_room_topic(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(
            ack_timeout_ms = config.ack_timeout_ms,
            policy = %config.timeout_policy,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Ack timeout as a duration.
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// Overrides the ack timeout.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Overrides the timeout policy.
    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout_policy = policy;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ack_timeout_ms == 0 {
            return Err(ConfigError::new("ack_timeout_ms must be positive".to_string()));
        }
        for (name, template) in [
            ("move_destination", &self.move_destination),
            ("game_topic", &self.game_topic),
            ("room_topic", &self.room_topic),
        ] {
            if !template.contains("{room}") {
                return Err(ConfigError::new(format!(
                    "{} must contain the {{room}} placeholder",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ClientConfig::from_toml("").expect("defaults");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.ack_timeout(), Duration::from_secs(2));
        assert_eq!(*config.timeout_policy(), TimeoutPolicy::Rollback);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_toml(
            r#"
            ack_timeout_ms = 500
            timeout_policy = "keep_optimistic"
            game_topic = "/topic/gomoku/{room}"
            "#,
        )
        .expect("valid config");
        assert_eq!(config.ack_timeout(), Duration::from_millis(500));
        assert_eq!(*config.timeout_policy(), TimeoutPolicy::KeepOptimistic);
        assert_eq!(config.game_topic(), "/topic/gomoku/{room}");
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let err = ClientConfig::from_toml(r#"room_topic = "/topic/room""#).expect_err("invalid");
        assert!(err.message.contains("room_topic"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(ClientConfig::from_toml("ack_timeout_ms = 0").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "ack_timeout_ms = 750").expect("write");
        let config = ClientConfig::from_file(file.path()).expect("loads");
        assert_eq!(*config.ack_timeout_ms(), 750);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ClientConfig::from_file("/nonexistent/strictly_gomoku.toml").expect_err("missing");
        assert!(err.message.contains("Failed to read"));
    }
}
