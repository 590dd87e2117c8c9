//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use courier_core::{Activity, ActivityKind};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourierConfig {
    /// Bot credentials, registration scope and presence.
    #[serde(default)]
    pub bot: BotConfig,

    /// Where handler manifests are loaded from.
    #[serde(default)]
    pub handlers: HandlerConfig,

    /// The command registration API.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Bot credentials and identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Token used for the gateway login and the registration API.
    #[serde(default, deserialize_with = "lenient_string")]
    pub auth_token: Option<String>,

    /// The application the commands belong to.
    #[serde(default, deserialize_with = "lenient_string")]
    pub application_id: Option<String>,

    /// Register commands to this guild only. Global registration if unset.
    #[serde(default, deserialize_with = "lenient_string")]
    pub guild_id: Option<String>,

    /// Presence shown once connected.
    #[serde(default)]
    pub presence: PresenceConfig,
}

/// The activity shown in the bot's presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Activity text, e.g. `/help`.
    #[serde(default = "default_presence_name")]
    pub name: String,

    #[serde(default)]
    pub kind: ActivityKind,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_presence_name(),
            kind: ActivityKind::default(),
        }
    }
}

impl PresenceConfig {
    /// The activity to set, or `None` if presence is disabled.
    pub fn activity(&self) -> Option<Activity> {
        self.enabled
            .then(|| Activity::new(self.kind, self.name.clone()))
    }
}

fn default_true() -> bool {
    true
}

fn default_presence_name() -> String {
    "/help".to_string()
}

/// Accepts a string or an integer. Ids supplied through environment
/// variables are parsed as numbers. Blank text counts as unset.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(
        Option::<Lenient>::deserialize(deserializer)?.and_then(|value| match value {
            Lenient::Text(s) if s.trim().is_empty() => None,
            Lenient::Text(s) => Some(s),
            Lenient::Unsigned(n) => Some(n.to_string()),
            Lenient::Signed(n) => Some(n.to_string()),
        }),
    )
}

// =============================================================================
// Handlers and API
// =============================================================================

/// Handler manifest directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    #[serde(default = "default_commands_dir")]
    pub commands_dir: PathBuf,

    #[serde(default = "default_components_dir")]
    pub components_dir: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            commands_dir: default_commands_dir(),
            components_dir: default_components_dir(),
        }
    }
}

fn default_commands_dir() -> PathBuf {
    PathBuf::from("commands")
}

fn default_components_dir() -> PathBuf {
    PathBuf::from("components")
}

/// The REST API used for command registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the API version.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_timeout_ms() -> u64 {
    30000
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    /// Per-target levels, e.g. `courier_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = CourierConfig::default();
        assert_eq!(config.handlers.commands_dir, PathBuf::from("commands"));
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.level, LogLevel::Info);

        let activity = config.bot.presence.activity().unwrap();
        assert_eq!(activity.name, "/help");
        assert_eq!(activity.kind, ActivityKind::Watching);
    }

    #[test]
    fn test_ids_accept_numbers() {
        let bot: BotConfig = serde_json::from_value(json!({
            "auth_token": "abc",
            "application_id": 1234567890123_u64,
            "guild_id": "42"
        }))
        .unwrap();
        assert_eq!(bot.application_id.as_deref(), Some("1234567890123"));
        assert_eq!(bot.guild_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_blank_ids_are_unset() {
        let bot: BotConfig = serde_json::from_value(json!({
            "auth_token": "abc",
            "application_id": "123",
            "guild_id": ""
        }))
        .unwrap();
        assert!(bot.guild_id.is_none());

        let bot: BotConfig = serde_json::from_value(json!({ "guild_id": "   " })).unwrap();
        assert!(bot.guild_id.is_none());
    }

    #[test]
    fn test_disabled_presence() {
        let presence = PresenceConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(presence.activity().is_none());
    }
}
