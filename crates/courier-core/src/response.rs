//! Interaction responses and the reply capability.
//!
//! A [`Responder`] is the per-event channel back to the platform. It is
//! provided by the gateway together with each interaction and knows nothing
//! about reply-once rules; those are enforced by
//! [`Interaction`](crate::Interaction), which wraps every call to the
//! responder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReplyResult;
use crate::schema::OptionChoice;

/// A message sent in reply to an interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub content: String,

    /// Visible only to the invoking user.
    #[serde(default)]
    pub ephemeral: bool,
}

impl ReplyMessage {
    /// Creates a public message.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    /// Creates a message visible only to the invoking user.
    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }

    /// Sets the visibility flag.
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}

impl From<&str> for ReplyMessage {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for ReplyMessage {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

/// A response to an interaction, as handed to the [`Responder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InteractionResponse {
    /// The initial reply.
    Message(ReplyMessage),
    /// Acknowledge now, answer later with a follow-up.
    Deferred { ephemeral: bool },
    /// Replace the message the component is attached to.
    UpdateMessage(ReplyMessage),
    /// Suggestions for an autocomplete request.
    Autocomplete { choices: Vec<OptionChoice> },
    /// An additional message after the interaction was acknowledged.
    FollowUp(ReplyMessage),
}

impl InteractionResponse {
    /// Whether this response acknowledges the interaction.
    pub fn is_initial(&self) -> bool {
        !matches!(self, Self::FollowUp(_))
    }

    /// Returns the message carried by this response, if any.
    pub fn message(&self) -> Option<&ReplyMessage> {
        match self {
            Self::Message(m) | Self::UpdateMessage(m) | Self::FollowUp(m) => Some(m),
            Self::Deferred { .. } | Self::Autocomplete { .. } => None,
        }
    }
}

/// The reply capability attached to an inbound interaction.
///
/// Implementations deliver a response for the interaction with the given id.
/// They may fail, for example once the platform's reply window has closed;
/// callers decide whether that failure matters.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Delivers a response for the interaction.
    async fn respond(&self, interaction_id: &str, response: InteractionResponse)
    -> ReplyResult<()>;
}
