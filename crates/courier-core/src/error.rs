//! Unified error types for the Courier core.
//!
//! Framework-level errors (handler and loader failures) are defined in
//! `courier-framework`; runtime errors live in `courier-runtime`.

use thiserror::Error;

// =============================================================================
// Reply Errors
// =============================================================================

/// Errors that can occur while answering an interaction.
#[derive(Debug, Clone, Error)]
pub enum ReplyError {
    /// The interaction was already replied to or deferred.
    #[error("interaction {id} was already acknowledged")]
    AlreadyAcknowledged {
        /// The interaction id.
        id: String,
    },

    /// A follow-up was attempted before the interaction was acknowledged.
    #[error("interaction {id} has not been acknowledged yet")]
    NotAcknowledged {
        /// The interaction id.
        id: String,
    },

    /// The reply window of the interaction has closed.
    #[error("interaction {id} has expired")]
    Expired {
        /// The interaction id.
        id: String,
    },

    /// The remote side rejected the response.
    #[error("response rejected ({status}): {message}")]
    Rejected {
        /// Status code reported by the remote side.
        status: u16,
        /// Error body or description.
        message: String,
    },

    /// The response could not be delivered.
    #[error("failed to deliver response: {0}")]
    Transport(String),
}

impl ReplyError {
    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Reasons a command schema cannot be converted to the registration format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A command or option name breaks the platform naming rules.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// What rule was broken.
        reason: &'static str,
    },

    /// A description is empty or too long.
    #[error("invalid description for '{name}': must be 1-{max} characters")]
    InvalidDescription {
        /// Name of the command or option owning the description.
        name: String,
        /// Maximum allowed length.
        max: usize,
    },

    /// Too many options or choices.
    #[error("'{name}' declares {count} {what}, at most {max} allowed")]
    TooMany {
        /// Name of the command or option.
        name: String,
        /// What was counted ("options", "choices").
        what: &'static str,
        /// Declared count.
        count: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Two options share the same name.
    #[error("command '{command}' declares option '{option}' twice")]
    DuplicateOption {
        /// The command name.
        command: String,
        /// The repeated option name.
        option: String,
    },

    /// A required option follows an optional one.
    #[error("required option '{option}' of '{command}' must precede optional options")]
    RequiredAfterOptional {
        /// The command name.
        command: String,
        /// The misplaced option.
        option: String,
    },

    /// Choices or autocomplete on an option type that does not support them.
    #[error("option '{option}' of type {kind} cannot declare {what}")]
    Unsupported {
        /// The option name.
        option: String,
        /// The option type.
        kind: String,
        /// The unsupported feature.
        what: &'static str,
    },

    /// The schema could not be serialized.
    #[error("schema is not serializable: {0}")]
    Serialize(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for reply operations.
pub type ReplyResult<T> = Result<T, ReplyError>;

/// Result type for schema validation.
pub type SchemaResult<T> = Result<T, SchemaError>;
