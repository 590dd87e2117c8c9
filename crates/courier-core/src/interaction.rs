//! Inbound interactions.
//!
//! An [`Interaction`] is one user action delivered by the gateway: a slash
//! command, a button press, a select-menu choice or an autocomplete
//! keystroke. It carries the payload ([`InteractionData`]) and the reply
//! capability, and it enforces exactly-once acknowledgement: the first
//! [`reply`](Interaction::reply), [`update`](Interaction::update),
//! [`autocomplete`](Interaction::autocomplete) or
//! [`defer`](Interaction::defer) wins, later attempts fail with
//! [`ReplyError::AlreadyAcknowledged`].
//!
//! ```rust,ignore
//! let interaction = Interaction::new("1", InteractionData::button("confirm:42"), responder);
//! interaction.reply_private("Confirmed").await?;
//! assert!(interaction.is_replied());
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReplyError, ReplyResult};
use crate::response::{InteractionResponse, ReplyMessage, Responder};
use crate::schema::OptionChoice;

// ============================================================================
// Interaction Kind
// ============================================================================

/// Classification of an inbound interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    ChatInput,
    Button,
    SelectMenu,
    Autocomplete,
    ModalSubmit,
    Unknown,
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ChatInput => "chat_input",
            Self::Button => "button",
            Self::SelectMenu => "select_menu",
            Self::Autocomplete => "autocomplete",
            Self::ModalSubmit => "modal_submit",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Payload
// ============================================================================

/// The value a user supplied for a command option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl OptionValue {
    /// Returns the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// One option supplied with a command or autocomplete request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOptionValue {
    pub name: String,
    pub value: OptionValue,
    /// Set on the option the user is currently typing (autocomplete only).
    #[serde(default)]
    pub focused: bool,
}

impl CommandOptionValue {
    /// Creates an unfocused option value.
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Self {
            name: name.into(),
            value,
            focused: false,
        }
    }

    /// Marks this option as focused.
    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }
}

/// The payload of an interaction, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionData {
    ChatInput {
        command_name: String,
        #[serde(default)]
        options: Vec<CommandOptionValue>,
    },
    Button {
        custom_id: String,
    },
    SelectMenu {
        custom_id: String,
        #[serde(default)]
        values: Vec<String>,
    },
    Autocomplete {
        command_name: String,
        #[serde(default)]
        options: Vec<CommandOptionValue>,
    },
    ModalSubmit {
        custom_id: String,
    },
    #[serde(other)]
    Unknown,
}

impl InteractionData {
    /// Creates a chat-input command payload without options.
    pub fn command(name: impl Into<String>) -> Self {
        Self::ChatInput {
            command_name: name.into(),
            options: Vec::new(),
        }
    }

    /// Creates a button payload.
    pub fn button(custom_id: impl Into<String>) -> Self {
        Self::Button {
            custom_id: custom_id.into(),
        }
    }

    /// Creates a select-menu payload.
    pub fn select_menu(custom_id: impl Into<String>, values: Vec<String>) -> Self {
        Self::SelectMenu {
            custom_id: custom_id.into(),
            values,
        }
    }

    /// Creates an autocomplete payload.
    pub fn autocomplete(name: impl Into<String>, options: Vec<CommandOptionValue>) -> Self {
        Self::Autocomplete {
            command_name: name.into(),
            options,
        }
    }

    /// Returns the kind of this payload.
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::ChatInput { .. } => InteractionKind::ChatInput,
            Self::Button { .. } => InteractionKind::Button,
            Self::SelectMenu { .. } => InteractionKind::SelectMenu,
            Self::Autocomplete { .. } => InteractionKind::Autocomplete,
            Self::ModalSubmit { .. } => InteractionKind::ModalSubmit,
            Self::Unknown => InteractionKind::Unknown,
        }
    }
}

// ============================================================================
// Interaction
// ============================================================================

const UNACKNOWLEDGED: u8 = 0;
const REPLIED: u8 = 1;
const DEFERRED: u8 = 2;

/// One inbound interaction together with its reply capability.
pub struct Interaction {
    id: String,
    data: InteractionData,
    user_id: Option<String>,
    guild_id: Option<String>,
    responder: Arc<dyn Responder>,
    state: AtomicU8,
}

impl Interaction {
    /// Creates an interaction.
    pub fn new(id: impl Into<String>, data: InteractionData, responder: Arc<dyn Responder>) -> Self {
        Self {
            id: id.into(),
            data,
            user_id: None,
            guild_id: None,
            responder,
            state: AtomicU8::new(UNACKNOWLEDGED),
        }
    }

    /// Sets the invoking user.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the guild the interaction happened in.
    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &InteractionData {
        &self.data
    }

    pub fn kind(&self) -> InteractionKind {
        self.data.kind()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.guild_id.as_deref()
    }

    /// The command name, for chat-input and autocomplete interactions.
    pub fn command_name(&self) -> Option<&str> {
        match &self.data {
            InteractionData::ChatInput { command_name, .. }
            | InteractionData::Autocomplete { command_name, .. } => Some(command_name),
            _ => None,
        }
    }

    /// The routing token, for component and modal interactions.
    pub fn custom_id(&self) -> Option<&str> {
        match &self.data {
            InteractionData::Button { custom_id }
            | InteractionData::SelectMenu { custom_id, .. }
            | InteractionData::ModalSubmit { custom_id } => Some(custom_id),
            _ => None,
        }
    }

    /// The values picked in a select menu; empty for other kinds.
    pub fn values(&self) -> &[String] {
        match &self.data {
            InteractionData::SelectMenu { values, .. } => values,
            _ => &[],
        }
    }

    /// The options supplied with a command or autocomplete request.
    pub fn options(&self) -> &[CommandOptionValue] {
        match &self.data {
            InteractionData::ChatInput { options, .. }
            | InteractionData::Autocomplete { options, .. } => options,
            _ => &[],
        }
    }

    /// Looks up an option value by name.
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options()
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.value)
    }

    /// The option the user is typing, for autocomplete requests.
    pub fn focused_option(&self) -> Option<&CommandOptionValue> {
        self.options().iter().find(|o| o.focused)
    }

    /// Whether an initial reply has been sent.
    pub fn is_replied(&self) -> bool {
        self.state.load(Ordering::SeqCst) == REPLIED
    }

    /// Whether the interaction has been deferred.
    pub fn is_deferred(&self) -> bool {
        self.state.load(Ordering::SeqCst) == DEFERRED
    }

    /// Whether the interaction was replied to or deferred.
    pub fn is_acknowledged(&self) -> bool {
        self.state.load(Ordering::SeqCst) != UNACKNOWLEDGED
    }

    /// Sends the initial reply.
    pub async fn reply(&self, message: impl Into<ReplyMessage>) -> ReplyResult<()> {
        self.acknowledge(REPLIED, InteractionResponse::Message(message.into()))
            .await
    }

    /// Sends the initial reply, visible only to the invoking user.
    pub async fn reply_private(&self, content: impl Into<String>) -> ReplyResult<()> {
        self.reply(ReplyMessage::private(content)).await
    }

    /// Replaces the message a component is attached to.
    pub async fn update(&self, message: impl Into<ReplyMessage>) -> ReplyResult<()> {
        self.acknowledge(REPLIED, InteractionResponse::UpdateMessage(message.into()))
            .await
    }

    /// Answers an autocomplete request with suggestions.
    pub async fn autocomplete(&self, choices: Vec<OptionChoice>) -> ReplyResult<()> {
        self.acknowledge(REPLIED, InteractionResponse::Autocomplete { choices })
            .await
    }

    /// Acknowledges the interaction without a message yet.
    pub async fn defer(&self, ephemeral: bool) -> ReplyResult<()> {
        self.acknowledge(DEFERRED, InteractionResponse::Deferred { ephemeral })
            .await
    }

    /// Sends an additional message after the interaction was acknowledged.
    pub async fn follow_up(&self, message: impl Into<ReplyMessage>) -> ReplyResult<()> {
        if !self.is_acknowledged() {
            return Err(ReplyError::NotAcknowledged {
                id: self.id.clone(),
            });
        }
        self.responder
            .respond(&self.id, InteractionResponse::FollowUp(message.into()))
            .await
    }

    async fn acknowledge(&self, target: u8, response: InteractionResponse) -> ReplyResult<()> {
        if self
            .state
            .compare_exchange(UNACKNOWLEDGED, target, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ReplyError::AlreadyAcknowledged {
                id: self.id.clone(),
            });
        }

        // An undelivered response does not count as an acknowledgement.
        if let Err(e) = self.responder.respond(&self.id, response).await {
            debug!(interaction = %self.id, error = %e, "Response was not delivered");
            self.state.store(UNACKNOWLEDGED, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("user_id", &self.user_id)
            .field("guild_id", &self.guild_id)
            .field("replied", &self.is_replied())
            .field("deferred", &self.is_deferred())
            .finish_non_exhaustive()
    }
}
