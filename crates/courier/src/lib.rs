//! # Courier
//!
//! A dispatcher that connects a chat-platform gateway to slash commands and
//! interactive components.
//!
//! ## Architecture
//!
//! ```text
//!  startup:   manifests ──▶ HandlerLoader ──▶ Registry ──▶ command sync ──▶ REST API
//!
//!  per event: Gateway ──▶ CourierRuntime ──▶ Router ──▶ action (own task)
//!                                              │
//!                                              └─▶ "not found" / "an error occurred"
//! ```
//!
//! - **Runtime**: loads configuration, runs startup once, owns the event loop
//! - **Registry**: commands by name, components by routing key
//! - **Router**: exact match, then prefix match on `key:payload` tokens;
//!   isolates failures so every interaction gets an answer
//! - **Actions**: async functions bound to manifest ids in an `ActionTable`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! async fn ping(interaction: Arc<Interaction>, _ctx: Arc<BotContext>) -> HandlerResult {
//!     interaction.reply("pong").await?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = CourierRuntime::builder().build()?;
//!     let (gateway, _events) = ChannelGateway::new(user, 64);
//!
//!     runtime
//!         .actions(ActionTable::new().command("ping", ping))
//!         .gateway(Arc::new(gateway))
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): `courier.toml` configuration files
//! - `yaml-config`: `courier.yaml` configuration files
//! - `json-log`: JSON log output
//! - `test-util`: a recording `Responder` for tests

pub use courier_core as core;
pub use courier_framework as framework;
pub use courier_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use courier_runtime::{
        ChannelGateway, CourierConfig, CourierRuntime, Gateway, RestRegistrar, RunReport,
    };

    // Actions and routing
    pub use courier_framework::{
        ActionTable, BotContext, CommandUnit, ComponentUnit, DispatchOutcome, HandlerError,
        HandlerResult, Router, RouterMessages, routing_payload,
    };

    // Interaction model
    pub use courier_core::{
        Activity, ActivityKind, CommandOption, CommandSchema, CurrentUser, Interaction,
        InteractionData, OptionChoice, OptionType, ReplyMessage,
    };
}
