//! # Courier Framework
//!
//! Handler loading, the handler registry and interaction routing.
//!
//! This layer provides:
//! - Action traits with closure support and the [`ActionTable`] that binds
//!   manifest action ids to code
//! - The [`HandlerLoader`], which turns manifest directories into handler
//!   units and reports what it skipped
//! - The read-only [`Registry`] with exact-then-prefix component resolution
//! - The [`Router`], which dispatches interactions and isolates failures
//!
//! The framework does not talk to the network. Connecting to a gateway and
//! registering commands remotely is the runtime's job.

pub mod context;
pub mod error;
pub mod handler;
pub mod loader;
pub mod registry;
pub mod router;
pub mod routing;
pub mod unit;

pub use context::BotContext;
pub use error::{HandlerError, HandlerResult, SkipReason};
pub use handler::{
    ActionTable, AutocompleteAction, BoxFuture, BoxedAutocompleteAction, BoxedCommandAction,
    BoxedComponentAction, CommandAction, ComponentAction,
};
pub use loader::{HandlerLoader, LoadOutcome, LoadReport, LoadWarning};
pub use registry::{Registry, RegistryBuilder};
pub use router::{DispatchOutcome, Router, RouterMessages};
pub use routing::{MatchKind, ROUTING_DELIMITER, Resolution, routing_payload, routing_prefix};
pub use unit::{CommandUnit, ComponentUnit, HandlerKind, HandlerUnit, UnitSource};
