//! # Courier Core
//!
//! The interaction model shared by every layer of the Courier dispatcher.
//!
//! - **Interactions**: inbound user actions with exactly-once acknowledgement
//!   ([`Interaction`], [`InteractionData`], [`InteractionKind`])
//! - **Reply capability**: the per-event channel back to the platform
//!   ([`Responder`], [`InteractionResponse`], [`ReplyMessage`])
//! - **Command schemas**: declarative command descriptions in registration
//!   format ([`CommandSchema`], [`RegistrationBatch`])
//! - **Session types**: the connected bot user and its presence
//!   ([`ReadyInfo`], [`Activity`])

pub mod error;
pub mod interaction;
pub mod response;
pub mod schema;
pub mod session;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::{ReplyError, ReplyResult, SchemaError, SchemaResult};
pub use interaction::{
    CommandOptionValue, Interaction, InteractionData, InteractionKind, OptionValue,
};
pub use response::{InteractionResponse, ReplyMessage, Responder};
pub use schema::{
    ChoiceValue, CommandOption, CommandSchema, OptionChoice, OptionType, RegistrationBatch,
};
pub use session::{Activity, ActivityKind, CurrentUser, ReadyInfo};
