//! Error types for the Courier framework.

use courier_core::{ReplyError, SchemaError};
use thiserror::Error;

/// Errors raised by handler actions.
///
/// The router treats every variant the same way: the error is logged and a
/// generic private message is sent if the interaction is still unanswered.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Replying to the interaction failed.
    #[error("reply failed: {0}")]
    Reply(#[from] ReplyError),

    /// The action failed.
    #[error("{0}")]
    Failed(String),

    /// The action panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Creates a failure with the given message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Wraps any error as a failure.
    pub fn other(err: impl std::error::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Result type returned by handler actions.
pub type HandlerResult = Result<(), HandlerError>;

/// Why a handler manifest was skipped by the loader.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    /// The file could not be read.
    #[error("unreadable: {0}")]
    Unreadable(String),

    /// The file is not valid TOML or JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// The document is not a table/object.
    #[error("manifest must be a table")]
    NotATable,

    /// A required field is absent.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A field is present but has the wrong type or an invalid value.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// The field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The command schema breaks the registration rules.
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// The named action is not registered in the action table.
    #[error("field '{field}' names unregistered action '{action}'")]
    UnknownAction {
        /// The field naming the action.
        field: &'static str,
        /// The action id.
        action: String,
    },
}
