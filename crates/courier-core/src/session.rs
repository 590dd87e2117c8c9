//! Gateway session types: the connected user and presence.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The bot account the gateway session is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl CurrentUser {
    /// Returns the display tag (`name#1234`, or just `name`).
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" => format!("{}#{}", self.name, d),
            _ => self.name.clone(),
        }
    }
}

/// Information delivered once the gateway session is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyInfo {
    pub user: CurrentUser,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub guild_count: usize,
}

/// The kind of activity shown in the bot's presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    #[default]
    Watching,
    Competing,
}

impl ActivityKind {
    /// The numeric activity type used on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::Playing => 0,
            Self::Streaming => 1,
            Self::Listening => 2,
            Self::Watching => 3,
            Self::Competing => 5,
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Playing => "playing",
            Self::Streaming => "streaming",
            Self::Listening => "listening",
            Self::Watching => "watching",
            Self::Competing => "competing",
        };
        f.write_str(s)
    }
}

/// A presence activity, e.g. "watching /help".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(default)]
    pub kind: ActivityKind,
}

impl Activity {
    /// Creates an activity.
    pub fn new(kind: ActivityKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
